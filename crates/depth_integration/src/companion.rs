//! Companion image lookup with a preference order.

use contracts::{CompanionImageType, ImageBuffer, ResourceKey, ResourceStore};
use tracing::trace;

/// Companion image found for a depth map
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionImage {
    pub kind: CompanionImageType,
    pub image: ImageBuffer,
}

/// Probes the resource store for the first available companion image
pub struct CompanionImageResolver<'a> {
    store: &'a dyn ResourceStore,
}

impl<'a> CompanionImageResolver<'a> {
    pub fn new(store: &'a dyn ResourceStore) -> Self {
        Self { store }
    }

    /// First hit in `preference` order; `None` is a valid outcome
    pub fn resolve(
        &self,
        key: &ResourceKey,
        preference: &[CompanionImageType],
    ) -> Option<CompanionImage> {
        let found = preference.iter().find_map(|kind| {
            self.store
                .lookup(key, kind.resource_type())
                .map(|image| CompanionImage { kind: *kind, image })
        });

        match &found {
            Some(companion) => trace!(
                key = %key,
                kind = %companion.kind.resource_type(),
                "Found depth map with intensity information"
            ),
            None => trace!(key = %key, "Found depth map without intensity information"),
        }
        found
    }
}
