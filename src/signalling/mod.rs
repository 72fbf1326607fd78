//! Signalling channel to the room server.
//!
//! The channel itself is an opaque collaborator supporting outbound requests
//! and notifications along with inbound requests which require exactly one
//! accept or reject reply.

mod request;

use async_trait::async_trait;
use derive_more::Display;
use futures::{channel::oneshot, stream::LocalBoxStream};
use serde_json::Value;

#[doc(inline)]
pub use self::request::{ServerRequest, ServerRequestHandler};

/// Names of the signalling methods.
pub mod method {
    /// Changes display name of the local peer.
    pub const CHANGE_DISPLAY_NAME: &str = "change-display-name";

    /// Broadcasts a chat message to the room.
    pub const CHAT_MESSAGE: &str = "chat-message";

    /// Requests bulk room data (chat history and active speakers).
    pub const ROOM_DATA: &str = "room-data";

    /// Broadcasts raise-hand state of a peer.
    pub const RAISEHAND_MESSAGE: &str = "raisehand-message";

    /// Media engine request relayed to the server.
    pub const MEDIASOUP_REQUEST: &str = "mediasoup-request";

    /// Media engine notification relayed in either direction.
    pub const MEDIASOUP_NOTIFICATION: &str = "mediasoup-notification";

    /// Server announces the currently speaking peer.
    pub const ACTIVE_SPEAKER: &str = "active-speaker";

    /// Server announces a display name change of a remote peer.
    pub const DISPLAY_NAME_CHANGED: &str = "display-name-changed";

    /// Server reports an authentication result.
    pub const AUTH: &str = "auth";

    /// Server delivers a chat message.
    pub const CHAT_MESSAGE_RECEIVE: &str = "chat-message-receive";

    /// Server delivers bulk room data.
    pub const ROOM_DATA_RECEIVE: &str = "room-data-receive";
}

/// Code the server is answered with for unknown inbound methods.
pub const UNKNOWN_METHOD_CODE: u16 = 404;

/// Reason the server is answered with for unknown inbound methods.
pub const UNKNOWN_METHOD_REASON: &str = "unknown method";

/// Errors of a [`SignallingChannel`] request.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum SignallingError {
    /// Server rejected the request.
    #[display(fmt = "request rejected [{}]: {}", code, reason)]
    Rejected {
        /// Rejection code.
        code: u16,

        /// Rejection reason.
        reason: String,
    },

    /// Server didn't answer in time.
    #[display(fmt = "request timeout")]
    Timeout,

    /// Channel is disconnected and is waiting to reconnect.
    #[display(fmt = "signalling channel disconnected")]
    Disconnected,

    /// Channel is closed for good.
    #[display(fmt = "signalling channel closed")]
    Closed,
}

/// Reply to an [`InboundRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Request is accepted with the provided data.
    Accept(Value),

    /// Request is rejected.
    Reject {
        /// Rejection code.
        code: u16,

        /// Rejection reason.
        reason: String,
    },
}

/// One-shot reply handle of an [`InboundRequest`].
///
/// Consumed by the reply, so a request can't be answered twice.
#[derive(Debug)]
pub struct Responder(oneshot::Sender<Response>);

impl Responder {
    /// Creates a new [`Responder`] along with the receiving side of the reply.
    pub fn new() -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Accepts the request with the provided data.
    pub fn accept(self, data: Value) {
        self.send(Response::Accept(data));
    }

    /// Rejects the request.
    pub fn reject<R: Into<String>>(self, code: u16, reason: R) {
        self.send(Response::Reject {
            code,
            reason: reason.into(),
        });
    }

    fn send(self, response: Response) {
        // Channel may already be gone, nobody to reply to then.
        let _ = self.0.send(response);
    }
}

/// Request initiated by the server.
#[derive(Debug)]
pub struct InboundRequest {
    /// Name of the requested method.
    pub method: String,

    /// Payload of the request.
    pub data: Value,

    /// Reply handle of the request.
    pub responder: Responder,
}

impl InboundRequest {
    /// Creates a new [`InboundRequest`] along with the receiving side of its
    /// reply.
    pub fn new<M: Into<String>>(
        method: M,
        data: Value,
    ) -> (Self, oneshot::Receiver<Response>) {
        let (responder, rx) = Responder::new();
        let req = Self {
            method: method.into(),
            data,
            responder,
        };
        (req, rx)
    }
}

/// Event of a [`SignallingChannel`].
#[derive(Debug)]
pub enum SignallingEvent {
    /// Channel connected (initially or after a reconnect).
    Open,

    /// Channel lost its connection and tries to restore it.
    Disconnected,

    /// Channel is closed for good.
    Close,

    /// Server sent a request.
    Request(InboundRequest),
}

/// Bidirectional request/notification channel to the room server.
#[async_trait(?Send)]
pub trait SignallingChannel {
    /// Sends a request and waits for its response.
    async fn request(
        &self,
        method: &str,
        data: Value,
    ) -> Result<Value, SignallingError>;

    /// Sends a notification which expects no response.
    async fn notify(
        &self,
        method: &str,
        data: Value,
    ) -> Result<(), SignallingError>;

    /// Subscribes to [`SignallingEvent`]s.
    fn subscribe(&self) -> LocalBoxStream<'static, SignallingEvent>;

    /// Closes this channel.
    fn close(&self);
}
