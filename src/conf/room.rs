//! Room session settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::media::ScreenConstraints;

/// Room session settings.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Room {
    /// Capacity of the active speakers window: only video of that many
    /// recently speaking peers is received.
    ///
    /// Defaults to `3`.
    #[default(3)]
    pub last_n: usize,

    /// Time to wait for a response to an outbound signalling request.
    ///
    /// Defaults to `10s`.
    #[default(Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Options of the created media transports.
    pub transport: Transport,

    /// Whether webcam video is sent as several simulcast layers.
    ///
    /// Defaults to `true`.
    #[default(true)]
    pub use_simulcast: bool,

    /// Delay between leaving the room and closing the signalling channel,
    /// letting the final notifications to be flushed.
    ///
    /// Defaults to `250ms`.
    #[default(Duration::from_millis(250))]
    #[serde(with = "humantime_serde")]
    pub leave_grace: Duration,

    /// Expiry of the "You are in the room" notification.
    ///
    /// Defaults to `5s`.
    #[default(Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub joined_notification_timeout: Duration,

    /// How long ICE restart is shown as in progress.
    ///
    /// Defaults to `500ms`.
    #[default(Duration::from_millis(500))]
    #[serde(with = "humantime_serde")]
    pub restart_ice_delay: Duration,

    /// Constraints of the screen capture.
    #[default(ScreenConstraints {
        width: 1280,
        height: 720,
        frame_rate: 3,
    })]
    pub screen_share: ScreenConstraints,
}

/// Options of the created media transports.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Transport {
    /// Whether TCP candidates are allowed.
    ///
    /// Defaults to `true`.
    #[default(true)]
    pub tcp: bool,
}
