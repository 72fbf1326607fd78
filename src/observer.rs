//! Outbound state projections of a room session.

use std::time::Duration;

use serde_json::Value;

use crate::{
    engine::{ConsumerId, DeviceInfo, Profile, ProducerId},
    media::{MediaKind, MediaSource, Track, WebcamType},
    state::{Originator, PauseState, RoomState},
};

/// Kind of a user-facing [`Notification`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationKind {
    /// Informational message.
    Info,

    /// Something went wrong.
    Error,
}

/// Transient user-facing message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    /// Kind of this [`Notification`].
    pub kind: NotificationKind,

    /// Text to show.
    pub text: String,

    /// Time after which this [`Notification`] expires, if it should.
    pub timeout: Option<Duration>,
}

impl Notification {
    /// Creates a new [`NotificationKind::Info`] [`Notification`].
    pub fn info<T: Into<String>>(text: T) -> Self {
        Self {
            kind: NotificationKind::Info,
            text: text.into(),
            timeout: None,
        }
    }

    /// Creates a new [`NotificationKind::Error`] [`Notification`].
    pub fn error<T: Into<String>>(text: T) -> Self {
        Self {
            kind: NotificationKind::Error,
            text: text.into(),
            timeout: None,
        }
    }

    /// Sets expiry of this [`Notification`].
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Long-running user activity shown as in progress.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Activity {
    /// Webcam is being enabled, disabled or switched.
    Webcam,

    /// Screen sharing is being started or stopped.
    ScreenShare,

    /// Audio-only mode is being toggled.
    AudioOnly,

    /// ICE is being restarted.
    RestartIce,

    /// Local raise-hand state is being sent.
    RaiseHand,

    /// Audio of the remote peer with the given name is being muted or
    /// unmuted.
    PeerAudio(String),

    /// Video of the remote peer with the given name is being paused or
    /// resumed.
    PeerVideo(String),
}

/// Projection of a local producer.
#[derive(Clone, Debug)]
pub struct ProducerInfo {
    /// ID of the producer.
    pub id: ProducerId,

    /// Source the media is captured from.
    pub source: MediaSource,

    /// Device label (webcam only).
    pub device_label: Option<String>,

    /// Facing of the camera (webcam only).
    pub webcam_type: Option<WebcamType>,

    /// Pause state of the producer.
    pub pause_state: PauseState,

    /// Track being sent.
    pub track: Option<Track>,

    /// Negotiated codec.
    pub codec: Option<String>,
}

/// Projection of a remote peer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerInfo {
    /// Unique name of the peer.
    pub name: String,

    /// Human-readable name of the peer.
    pub display_name: String,

    /// Device the peer joined from.
    pub device: DeviceInfo,
}

/// Projection of a consumer.
#[derive(Clone, Debug)]
pub struct ConsumerInfo {
    /// ID of the consumer.
    pub id: ConsumerId,

    /// Name of the peer the consumer belongs to.
    pub peer_name: String,

    /// Kind of the received media.
    pub kind: MediaKind,

    /// Source the remote peer captures the media from.
    pub source: Option<MediaSource>,

    /// Whether this client is able to receive the media.
    pub supported: bool,

    /// Pause state of the consumer.
    pub pause_state: PauseState,

    /// Received track, `None` until reception completes.
    pub track: Option<Track>,

    /// Negotiated codec.
    pub codec: Option<String>,
}

/// State change of a room session.
#[derive(Clone, Debug)]
pub enum StateUpdate {
    /// Connection state changed.
    RoomState(RoomState),

    /// Peer is speaking now.
    RoomActiveSpeaker(Option<String>),

    /// Local media sending capabilities are known.
    MediaCapabilities {
        /// Whether audio may be sent.
        can_send_mic: bool,

        /// Whether video may be sent.
        can_send_webcam: bool,
    },

    /// Screen sharing capabilities are known.
    ScreenCapabilities {
        /// Whether screen may be shared.
        can_share_screen: bool,

        /// Whether an external extension must be installed first.
        need_extension: bool,
    },

    /// Whether there is more than one camera to switch between.
    CanChangeWebcam(bool),

    /// Activity started or finished.
    InProgress(Activity, bool),

    /// Local display name changed, `None` means the change was reverted.
    DisplayName(Option<String>),

    /// Audio-only mode toggled.
    AudioOnly(bool),

    /// Local raise-hand state changed.
    MyRaiseHandState(bool),

    /// Local producer created.
    AddProducer(ProducerInfo),

    /// Local producer closed.
    RemoveProducer(ProducerId),

    /// Local producer paused.
    ProducerPaused(ProducerId, Originator),

    /// Local producer resumed.
    ProducerResumed(ProducerId, Originator),

    /// Track of a local producer replaced.
    ProducerTrack(ProducerId, Option<Track>),

    /// Remote peer appeared.
    AddPeer(PeerInfo),

    /// Remote peer left.
    RemovePeer(String),

    /// Remote peer changed its display name.
    PeerDisplayName {
        /// Name of the peer.
        peer_name: String,

        /// New display name.
        display_name: String,
    },

    /// Remote peer raised or lowered its hand.
    PeerRaiseHandState {
        /// Name of the peer.
        peer_name: String,

        /// New raise-hand state.
        raised: bool,
    },

    /// Consumer created.
    AddConsumer(ConsumerInfo),

    /// Consumer closed.
    RemoveConsumer {
        /// ID of the consumer.
        id: ConsumerId,

        /// Name of the peer the consumer belonged to.
        peer_name: String,
    },

    /// Consumer paused.
    ConsumerPaused(ConsumerId, Originator),

    /// Consumer resumed.
    ConsumerResumed(ConsumerId, Originator),

    /// Received simulcast layer changed.
    ConsumerEffectiveProfile(ConsumerId, Profile),

    /// Reception of a consumer completed.
    ConsumerTrack(ConsumerId, Option<Track>),

    /// Chat messages sent before joining.
    AddChatHistory(Vec<Value>),

    /// Chat message received.
    AddResponseMessage(Value),

    /// User-facing notification.
    Notify(Notification),

    /// Every shown notification should be dismissed.
    RemoveAllNotifications,
}

/// Receiver of [`StateUpdate`]s.
pub trait RoomObserver {
    /// Applies the provided [`StateUpdate`].
    fn apply(&self, update: StateUpdate);
}

impl<F: Fn(StateUpdate)> RoomObserver for F {
    #[inline]
    fn apply(&self, update: StateUpdate) {
        (self)(update)
    }
}
