//! Resource types, temporal resource buffers and image payloads.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{ContractError, MissionId, ResourceId, SensorId, TimestampNs, VertexId};

/// Kind of a stored resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    RawImage,
    RawColorImage,
    RawDepthMap,
    OptimizedDepthMap,
    ImageForDepthMap,
    ColorImageForDepthMap,
    PointCloudXyz,
}

impl ResourceType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RawImage => "raw_image",
            Self::RawColorImage => "raw_color_image",
            Self::RawDepthMap => "raw_depth_map",
            Self::OptimizedDepthMap => "optimized_depth_map",
            Self::ImageForDepthMap => "image_for_depth_map",
            Self::ColorImageForDepthMap => "color_image_for_depth_map",
            Self::PointCloudXyz => "point_cloud_xyz",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Depth map kinds that can be integrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMapInputType {
    Raw,
    Optimized,
}

impl DepthMapInputType {
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            Self::Raw => ResourceType::RawDepthMap,
            Self::Optimized => ResourceType::OptimizedDepthMap,
        }
    }
}

impl TryFrom<ResourceType> for DepthMapInputType {
    type Error = ContractError;

    fn try_from(resource_type: ResourceType) -> Result<Self, Self::Error> {
        match resource_type {
            ResourceType::RawDepthMap => Ok(Self::Raw),
            ResourceType::OptimizedDepthMap => Ok(Self::Optimized),
            other => Err(ContractError::UnsupportedInputType {
                resource_type: other,
            }),
        }
    }
}

/// Auxiliary image kinds that can add appearance to a depth map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionImageType {
    /// Dedicated grayscale image registered to the depth map
    ImageForDepthMap,
    /// Dedicated color image registered to the depth map
    ColorImageForDepthMap,
    /// Raw grayscale image of the same frame
    RawImage,
}

impl CompanionImageType {
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            Self::ImageForDepthMap => ResourceType::ImageForDepthMap,
            Self::ColorImageForDepthMap => ResourceType::ColorImageForDepthMap,
            Self::RawImage => ResourceType::RawImage,
        }
    }

    /// Preference used on the frame-attached path
    pub fn frame_preference() -> Vec<Self> {
        vec![Self::ImageForDepthMap, Self::RawImage]
    }

    /// Preference used on the free-running sensor path
    pub fn sensor_preference() -> Vec<Self> {
        vec![Self::ImageForDepthMap, Self::ColorImageForDepthMap]
    }
}

/// Pixel layout of an [`ImageBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Mono8,
    Rgb8,
    Depth16,
    DepthF32,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Mono8 => 1,
            Self::Rgb8 => 3,
            Self::Depth16 => 2,
            Self::DepthF32 => 4,
        }
    }
}

/// Image or depth map payload (zero-copy clone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    #[serde(default)]
    pub data: Bytes,
}

impl ImageBuffer {
    /// Zero-filled buffer of the given size
    pub fn zeroed(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: Bytes::from(vec![0u8; len]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Ordered mapping capture timestamp -> resource id for one (mission, sensor, type)
///
/// Keys are unique and iteration is ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBuffer {
    entries: BTreeMap<TimestampNs, ResourceId>,
}

impl ResourceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the id it replaced if the timestamp was taken
    pub fn insert(&mut self, timestamp_ns: TimestampNs, id: ResourceId) -> Option<ResourceId> {
        self.entries.insert(timestamp_ns, id)
    }

    pub fn get(&self, timestamp_ns: TimestampNs) -> Option<&ResourceId> {
        self.entries.get(&timestamp_ns)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in ascending timestamp order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (TimestampNs, &ResourceId)> + '_ {
        self.entries.iter().map(|(ts, id)| (*ts, id))
    }

    pub fn first_timestamp(&self) -> Option<TimestampNs> {
        self.entries.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<TimestampNs> {
        self.entries.keys().next_back().copied()
    }
}

impl FromIterator<(TimestampNs, ResourceId)> for ResourceBuffer {
    fn from_iter<I: IntoIterator<Item = (TimestampNs, ResourceId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Address of a resource in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Resource attached to a frame of a pose-graph vertex
    Frame { vertex: VertexId, frame_idx: usize },
    /// Resource of a free-running sensor, addressed by capture time
    Sensor {
        mission: MissionId,
        sensor: SensorId,
        timestamp_ns: TimestampNs,
    },
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame { vertex, frame_idx } => write!(f, "vertex {vertex} / frame {frame_idx}"),
            Self::Sensor {
                mission,
                sensor,
                timestamp_ns,
            } => write!(f, "mission {mission} / sensor {sensor} @ {timestamp_ns}ns"),
        }
    }
}
