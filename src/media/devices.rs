//! Capture collaborators: media devices and screen sharing.

use async_trait::async_trait;
use derive_more::Display;

use super::{InputDeviceInfo, ScreenConstraints, Track, VideoConstraints};

/// Error of acquiring local media.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum MediaDevicesError {
    /// Device enumeration failed.
    #[display(fmt = "Failed to enumerate devices: {}", _0)]
    EnumerateDevices(String),

    /// No device satisfies the requested constraints.
    #[display(fmt = "Requested device not found: {}", _0)]
    NotFound(String),

    /// User or platform denied access to the device.
    #[display(fmt = "Access to device is not allowed: {}", _0)]
    NotAllowed(String),

    /// Capture failed for any other reason.
    #[display(fmt = "Failed to capture media: {}", _0)]
    CaptureFailed(String),
}

impl MediaDevicesError {
    /// Returns name of this [`MediaDevicesError`] as it's shown to the user.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnumerateDevices(_) => "EnumerateDevicesError",
            Self::NotFound(_) => "NotFoundError",
            Self::NotAllowed(_) => "NotAllowedError",
            Self::CaptureFailed(_) => "CaptureError",
        }
    }
}

/// Access to local capture devices.
#[async_trait(?Send)]
pub trait MediaDevices {
    /// Lists all the available input devices.
    async fn enumerate_devices(
        &self,
    ) -> Result<Vec<InputDeviceInfo>, MediaDevicesError>;

    /// Captures an audio track from the default microphone.
    async fn get_user_audio(&self) -> Result<Track, MediaDevicesError>;

    /// Captures a video track from the camera described by the provided
    /// [`VideoConstraints`].
    async fn get_user_video(
        &self,
        constraints: VideoConstraints,
    ) -> Result<Track, MediaDevicesError>;
}

/// Screen capture facility.
#[async_trait(?Send)]
pub trait ScreenShare {
    /// Indicates whether screen capture is supported by the platform at all.
    fn is_available(&self) -> bool;

    /// Indicates whether screen capture requires an external extension which
    /// is not installed yet.
    fn needs_extension(&self) -> bool;

    /// Starts capturing the screen.
    async fn start(
        &self,
        constraints: ScreenConstraints,
    ) -> Result<Track, MediaDevicesError>;

    /// Installs the external extension required for screen capture.
    async fn install_extension(&self) -> Result<(), MediaDevicesError>;
}
