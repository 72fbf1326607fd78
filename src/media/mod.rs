//! Local media: kinds, sources, tracks, capture devices and webcam selection.

pub mod constraints;
pub mod devices;
pub mod webcam;

use std::{fmt, rc::Rc};

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{
    constraints::{ScreenConstraints, VideoConstraints, VideoResolution},
    devices::{MediaDevices, MediaDevicesError, ScreenShare},
    webcam::{WebcamSelection, WebcamType},
};

/// Kind of a media track.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio track.
    #[display(fmt = "audio")]
    Audio,

    /// Video track.
    #[display(fmt = "video")]
    Video,
}

/// Source a local media track is captured from.
///
/// Each [`MediaSource`] occupies a single producer slot in a room: there is
/// never more than one producer per source.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    /// Microphone.
    #[display(fmt = "mic")]
    Mic,

    /// Camera.
    #[display(fmt = "webcam")]
    Webcam,

    /// Screen capture.
    #[display(fmt = "screen")]
    Screen,
}

impl MediaSource {
    /// Returns [`MediaKind`] of the tracks captured from this [`MediaSource`].
    #[inline]
    pub fn kind(self) -> MediaKind {
        match self {
            Self::Mic => MediaKind::Audio,
            Self::Webcam | Self::Screen => MediaKind::Video,
        }
    }
}

/// Handle to a captured or received media track.
///
/// Implemented by the platform layer. The controller only ever stops tracks
/// and passes them around.
pub trait MediaTrack {
    /// Returns unique ID of this track.
    fn id(&self) -> String;

    /// Returns [`MediaKind`] of this track.
    fn kind(&self) -> MediaKind;

    /// Stops this track, releasing the underlying capture source.
    fn stop(&self);
}

/// Shared [`MediaTrack`] handle.
pub type Track = Rc<dyn MediaTrack>;

impl fmt::Debug for dyn MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Kind of an input device.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDeviceKind {
    /// Audio input device (e.g. microphone).
    AudioInput,

    /// Video input device (e.g. camera).
    VideoInput,
}

/// Representation of an enumerated input device.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDeviceInfo {
    /// Unique identifier of the represented device.
    pub device_id: String,

    /// Kind of the represented device.
    pub kind: InputDeviceKind,

    /// Label describing this device (for example "External USB Webcam").
    ///
    /// Empty if the device has no associated label.
    pub label: String,
}

impl InputDeviceInfo {
    /// Creates a new [`InputDeviceKind::VideoInput`] [`InputDeviceInfo`].
    #[inline]
    pub fn video<I: Into<String>, L: Into<String>>(id: I, label: L) -> Self {
        Self {
            device_id: id.into(),
            kind: InputDeviceKind::VideoInput,
            label: label.into(),
        }
    }

    /// Creates a new [`InputDeviceKind::AudioInput`] [`InputDeviceInfo`].
    #[inline]
    pub fn audio<I: Into<String>, L: Into<String>>(id: I, label: L) -> Self {
        Self {
            device_id: id.into(),
            kind: InputDeviceKind::AudioInput,
            label: label.into(),
        }
    }
}
