//! Camera selection: enumerated cameras, selected device and resolution tier.

use serde::{Deserialize, Serialize};

use super::{
    InputDeviceInfo, InputDeviceKind, VideoConstraints, VideoResolution,
};

/// Facing of a camera guessed from its label.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebcamType {
    /// User-facing camera.
    Front,

    /// Environment-facing camera.
    Back,
}

impl WebcamType {
    /// Guesses [`WebcamType`] of the camera with the provided label.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("back") || label.contains("rear") {
            Self::Back
        } else {
            Self::Front
        }
    }
}

/// Currently selected camera and resolution along with the last enumerated
/// cameras.
#[derive(Clone, Debug, Default)]
pub struct WebcamSelection {
    /// Enumerated cameras in enumeration order, unique by device ID.
    webcams: Vec<InputDeviceInfo>,

    /// Selected camera.
    device: Option<InputDeviceInfo>,

    /// Selected resolution tier.
    resolution: VideoResolution,
}

impl WebcamSelection {
    /// Returns the selected camera.
    #[inline]
    pub fn device(&self) -> Option<&InputDeviceInfo> {
        self.device.as_ref()
    }

    /// Returns the selected resolution tier.
    #[inline]
    pub fn resolution(&self) -> VideoResolution {
        self.resolution
    }

    /// Overrides the selected resolution tier.
    #[inline]
    pub fn set_resolution(&mut self, resolution: VideoResolution) {
        self.resolution = resolution;
    }

    /// Returns the enumerated cameras.
    #[inline]
    pub fn webcams(&self) -> &[InputDeviceInfo] {
        &self.webcams
    }

    /// Indicates whether there is more than one camera to switch between.
    #[inline]
    pub fn can_change(&self) -> bool {
        self.webcams.len() >= 2
    }

    /// Replaces the known cameras with the video inputs of the provided
    /// enumeration.
    ///
    /// Keeps the selected camera if it's still present, otherwise selects the
    /// first one, or nothing if there are no cameras at all.
    pub fn update<I>(&mut self, devices: I)
    where
        I: IntoIterator<Item = InputDeviceInfo>,
    {
        self.webcams.clear();
        for device in devices {
            if device.kind != InputDeviceKind::VideoInput {
                continue;
            }
            if let Some(known) = self
                .webcams
                .iter_mut()
                .find(|w| w.device_id == device.device_id)
            {
                *known = device;
            } else {
                self.webcams.push(device);
            }
        }

        let still_present = self.device.as_ref().map_or(false, |current| {
            self.webcams
                .iter()
                .any(|w| w.device_id == current.device_id)
        });
        if !still_present {
            self.device = self.webcams.first().cloned();
        }
    }

    /// Selects the camera following the selected one (wrapping to the first
    /// one after the last) and resets resolution to the highest tier.
    ///
    /// Returns the newly selected camera.
    pub fn advance(&mut self) -> Option<&InputDeviceInfo> {
        let current = self.device.as_ref().and_then(|current| {
            self.webcams
                .iter()
                .position(|w| w.device_id == current.device_id)
        });
        let next = match current {
            Some(idx) if idx + 1 < self.webcams.len() => idx + 1,
            Some(_) | None => 0,
        };
        self.device = self.webcams.get(next).cloned();
        self.resolution = VideoResolution::Hd;
        self.device.as_ref()
    }

    /// Moves the resolution tier one step along its cycle.
    ///
    /// Returns the previous tier, so it can be restored on failure.
    pub fn cycle_resolution(&mut self) -> VideoResolution {
        let old = self.resolution;
        self.resolution = old.next();
        old
    }

    /// Returns [`VideoConstraints`] capturing the selected camera at the
    /// selected resolution, or `None` if no camera is selected.
    pub fn constraints(&self) -> Option<VideoConstraints> {
        self.device.as_ref().map(|d| {
            VideoConstraints::new(d.device_id.clone(), self.resolution)
        })
    }
}
