//! Interface of the media session engine.
//!
//! The engine negotiates transports, producers and consumers of a single
//! room-scoped session. Its internals are opaque: the controller only drives
//! it through the traits below and reacts to the events it emits.

use std::{fmt, rc::Rc};

use async_trait::async_trait;
use derive_more::{Display, From};
use futures::{channel::oneshot, stream::LocalBoxStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    media::{MediaKind, MediaSource, Track},
    state::{Originator, PauseState},
};

/// ID of a [`Producer`].
#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[from(forward)]
pub struct ProducerId(pub String);

/// ID of a [`Consumer`].
#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[from(forward)]
pub struct ConsumerId(pub String);

/// Direction of a [`Transport`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransportDirection {
    /// Transport carrying [`Producer`]s.
    #[display(fmt = "send")]
    Send,

    /// Transport carrying [`Consumer`]s.
    #[display(fmt = "recv")]
    Recv,
}

/// Failure reported by the engine.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{}: {}", name, message)]
pub struct EngineError {
    /// Name of the failure.
    pub name: String,

    /// Human-readable description of the failure.
    pub message: String,
}

impl EngineError {
    /// Creates a new [`EngineError`].
    #[inline]
    pub fn new<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Reason given to the engine when a [`Consumer`] is paused locally.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum PauseReason {
    /// Remote video is suppressed by the audio-only mode.
    #[display(fmt = "audio-only-mode")]
    AudioOnlyMode,

    /// Remote peer dropped out of the active speakers window.
    #[display(fmt = "not-speaking")]
    NotSpeaking,

    /// User muted the remote peer's audio.
    #[display(fmt = "mute-audio")]
    MuteAudio,

    /// User paused the remote peer's video.
    #[display(fmt = "pause-video")]
    PauseVideo,
}

/// Simulcast layer currently received by a [`Consumer`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Nothing is received.
    #[display(fmt = "none")]
    None,

    /// Single-layer stream.
    #[display(fmt = "default")]
    Default,

    /// Lowest simulcast layer.
    #[display(fmt = "low")]
    Low,

    /// Middle simulcast layer.
    #[display(fmt = "medium")]
    Medium,

    /// Highest simulcast layer.
    #[display(fmt = "high")]
    High,
}

/// Description of the client device a peer joined from.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Short machine-readable device flag (e.g. `chrome`).
    pub flag: String,

    /// Human-readable device name.
    pub name: String,

    /// Device version.
    pub version: String,
}

/// Application data a peer joins the room with.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAppData {
    /// Human-readable name of the peer.
    pub display_name: String,

    /// Device the peer joined from.
    pub device: DeviceInfo,
}

/// Options of a [`Transport`] creation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransportOptions {
    /// Whether TCP candidates are allowed.
    pub tcp: bool,
}

/// Options of a [`Producer`] creation.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProducerOptions {
    /// Whether the media is sent as several simulcast layers.
    pub simulcast: bool,
}

/// One-shot reply channel of an [`EngineEvent::Request`].
#[derive(Debug)]
pub struct EngineResponder(oneshot::Sender<Result<Value, EngineError>>);

impl EngineResponder {
    /// Creates a new [`EngineResponder`] along with the receiving side of the
    /// reply.
    pub fn new() -> (Self, oneshot::Receiver<Result<Value, EngineError>>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Replies to the engine with the server response.
    pub fn respond(self, response: Result<Value, EngineError>) {
        // Engine may give up waiting, that's not our concern.
        let _ = self.0.send(response);
    }
}

/// Room-level event of a [`MediaEngine`].
pub enum EngineEvent {
    /// Remote peer joined the room.
    NewPeer(Rc<dyn RemotePeer>),

    /// Room session was closed.
    Close(Originator),

    /// Engine needs the server to answer the provided request.
    Request {
        /// Engine request to be relayed.
        request: Value,

        /// Channel to reply on.
        responder: EngineResponder,
    },

    /// Engine wants the provided notification delivered to the server.
    Notify(Value),
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewPeer(peer) => {
                f.debug_tuple("NewPeer").field(&peer.name()).finish()
            }
            Self::Close(originator) => {
                f.debug_tuple("Close").field(originator).finish()
            }
            Self::Request { request, .. } => {
                f.debug_struct("Request").field("request", request).finish()
            }
            Self::Notify(notification) => {
                f.debug_tuple("Notify").field(notification).finish()
            }
        }
    }
}

/// Event of a [`RemotePeer`].
pub enum PeerEvent {
    /// Peer left the room.
    Close(Originator),

    /// Peer started sending new media.
    NewConsumer(Rc<dyn Consumer>),
}

/// Event of a [`Transport`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportEvent {
    /// Transport was closed.
    Close(Originator),
}

/// Event of a [`Producer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProducerEvent {
    /// Producer was closed.
    Close(Originator),

    /// Producer was paused.
    Pause(Originator),

    /// Producer was resumed.
    Resume(Originator),

    /// Producer got associated with a [`Transport`].
    Handled,

    /// Producer lost its [`Transport`].
    Unhandled,

    /// Underlying track ended (e.g. user stopped screen sharing).
    TrackEnded,
}

/// Event of a [`Consumer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsumerEvent {
    /// Consumer was closed.
    Close(Originator),

    /// Consumer was paused.
    Pause(Originator),

    /// Consumer was resumed.
    Resume(Originator),

    /// Received simulcast layer changed.
    EffectiveProfileChange(Profile),
}

/// Room-scoped media session.
#[async_trait(?Send)]
pub trait MediaEngine {
    /// Joins the room as the provided peer.
    async fn join(
        &self,
        peer_name: &str,
        app_data: PeerAppData,
    ) -> Result<(), EngineError>;

    /// Creates a new [`Transport`] in the provided direction.
    fn create_transport(
        &self,
        direction: TransportDirection,
        options: TransportOptions,
    ) -> Result<Rc<dyn Transport>, EngineError>;

    /// Creates a new [`Producer`] of the provided track.
    ///
    /// Engine keeps its own reference to the track, so the provided handle
    /// may be stopped right after.
    fn create_producer(
        &self,
        track: &Track,
        options: ProducerOptions,
        source: MediaSource,
    ) -> Result<Rc<dyn Producer>, EngineError>;

    /// Indicates whether this client is allowed to send the provided
    /// [`MediaKind`].
    fn can_send(&self, kind: MediaKind) -> bool;

    /// Indicates whether the room is joined.
    fn is_joined(&self) -> bool;

    /// Returns all the remote peers of the room.
    fn peers(&self) -> Vec<Rc<dyn RemotePeer>>;

    /// Looks up a remote peer by its name.
    fn get_peer_by_name(&self, name: &str) -> Option<Rc<dyn RemotePeer>>;

    /// Leaves the room, notifying the server.
    fn leave(&self);

    /// Tears the session down without notifying the server.
    ///
    /// # Errors
    ///
    /// If the session cannot be torn down in its current state.
    fn remote_close(&self, cause: &str) -> Result<(), EngineError>;

    /// Feeds a server notification into the engine.
    ///
    /// # Errors
    ///
    /// If the notification cannot be applied.
    fn receive_notification(&self, notification: Value)
        -> Result<(), EngineError>;

    /// Restarts ICE of all the transports.
    fn restart_ice(&self);

    /// Subscribes to [`EngineEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, EngineEvent>;

    /// Drops all the subscriptions made via [`MediaEngine::subscribe()`].
    fn remove_all_listeners(&self);
}

/// Negotiated media path.
pub trait Transport {
    /// Returns ID of this [`Transport`].
    fn id(&self) -> String;

    /// Returns direction of this [`Transport`].
    fn direction(&self) -> TransportDirection;

    /// Indicates whether this [`Transport`] is closed.
    fn is_closed(&self) -> bool;

    /// Closes this [`Transport`].
    fn close(&self);

    /// Subscribes to [`TransportEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, TransportEvent>;
}

/// Local outgoing media registered in the engine.
#[async_trait(?Send)]
pub trait Producer {
    /// Returns ID of this [`Producer`].
    fn id(&self) -> ProducerId;

    /// Returns [`MediaKind`] of this [`Producer`].
    fn kind(&self) -> MediaKind;

    /// Returns current [`PauseState`] of this [`Producer`].
    fn pause_state(&self) -> PauseState;

    /// Returns track being sent.
    fn track(&self) -> Option<Track>;

    /// Returns name of the negotiated codec.
    fn codec(&self) -> Option<String>;

    /// Indicates whether this [`Producer`] is closed.
    fn is_closed(&self) -> bool;

    /// Pauses this [`Producer`] locally.
    fn pause(&self);

    /// Resumes this [`Producer`] locally.
    fn resume(&self);

    /// Closes this [`Producer`].
    fn close(&self);

    /// Starts sending this [`Producer`] over the provided [`Transport`].
    async fn send(&self, transport: &Rc<dyn Transport>)
        -> Result<(), EngineError>;

    /// Replaces the track being sent, returning the engine's own handle of
    /// the new track.
    async fn replace_track(&self, track: &Track) -> Result<Track, EngineError>;

    /// Subscribes to [`ProducerEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, ProducerEvent>;
}

/// Remote incoming media registered in the engine.
#[async_trait(?Send)]
pub trait Consumer {
    /// Returns ID of this [`Consumer`].
    fn id(&self) -> ConsumerId;

    /// Returns [`MediaKind`] of this [`Consumer`].
    fn kind(&self) -> MediaKind;

    /// Returns name of the peer this [`Consumer`] belongs to.
    fn peer_name(&self) -> String;

    /// Returns source the remote peer captures this media from.
    fn source(&self) -> Option<MediaSource>;

    /// Indicates whether this client is able to receive this [`Consumer`].
    fn is_supported(&self) -> bool;

    /// Returns current [`PauseState`] of this [`Consumer`].
    fn pause_state(&self) -> PauseState;

    /// Returns name of the negotiated codec.
    fn codec(&self) -> Option<String>;

    /// Pauses this [`Consumer`] locally.
    fn pause(&self, reason: PauseReason);

    /// Resumes this [`Consumer`] locally.
    fn resume(&self);

    /// Starts receiving this [`Consumer`] over the provided [`Transport`].
    async fn receive(
        &self,
        transport: &Rc<dyn Transport>,
    ) -> Result<Track, EngineError>;

    /// Subscribes to [`ConsumerEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, ConsumerEvent>;
}

/// Remote participant of the room.
pub trait RemotePeer {
    /// Returns unique name of this peer.
    fn name(&self) -> String;

    /// Returns application data this peer joined with.
    fn app_data(&self) -> PeerAppData;

    /// Returns the [`Consumer`]s this peer currently exposes.
    fn consumers(&self) -> Vec<Rc<dyn Consumer>>;

    /// Subscribes to [`PeerEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, PeerEvent>;
}
