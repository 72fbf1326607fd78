//! Constraints used to capture local video.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Aspect ratio requested for every camera capture.
pub const VIDEO_ASPECT_RATIO: f64 = 1.334;

/// Resolution tier of a camera capture.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VideoResolution {
    /// 320x240.
    #[display(fmt = "qvga")]
    Qvga,

    /// 640x480.
    #[display(fmt = "vga")]
    Vga,

    /// 800x600.
    #[default]
    #[display(fmt = "hd")]
    Hd,
}

impl VideoResolution {
    /// Returns the tier following this one in the `qvga -> vga -> hd -> qvga`
    /// cycle.
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Qvga => Self::Vga,
            Self::Vga => Self::Hd,
            Self::Hd => Self::Qvga,
        }
    }

    /// Returns ideal `(width, height)` of this tier.
    #[inline]
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Qvga => (320, 240),
            Self::Vga => (640, 480),
            Self::Hd => (800, 600),
        }
    }
}

/// Constraints of a camera capture bound to an exact device.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    /// Exact ID of the device to capture.
    pub device_id: String,

    /// Ideal width of the captured video.
    pub width: u32,

    /// Ideal height of the captured video.
    pub height: u32,

    /// Requested aspect ratio of the captured video.
    pub aspect_ratio: f64,
}

impl VideoConstraints {
    /// Builds [`VideoConstraints`] capturing the given device at the given
    /// [`VideoResolution`].
    pub fn new<S: Into<String>>(
        device_id: S,
        resolution: VideoResolution,
    ) -> Self {
        let (width, height) = resolution.dimensions();
        Self {
            device_id: device_id.into(),
            width,
            height,
            aspect_ratio: VIDEO_ASPECT_RATIO,
        }
    }
}

/// Constraints of a screen capture.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConstraints {
    /// Width of the captured video.
    pub width: u32,

    /// Height of the captured video.
    pub height: u32,

    /// Frame rate of the captured video.
    pub frame_rate: u32,
}
