//! Typed requests initiated by the room server.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Request the server may send to the client.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "method", content = "data", rename_all = "kebab-case")]
pub enum ServerRequest {
    /// Notification to be fed into the media engine.
    MediasoupNotification(Value),

    /// Peer is currently speaking.
    #[serde(rename_all = "camelCase")]
    ActiveSpeaker {
        /// Name of the speaking peer, if any.
        #[serde(default)]
        peer_name: Option<String>,
    },

    /// Remote peer changed its display name.
    #[serde(rename_all = "camelCase")]
    DisplayNameChanged {
        /// Name of the peer.
        peer_name: String,

        /// New display name of the peer.
        display_name: String,

        /// Previous display name of the peer.
        old_display_name: String,
    },

    /// Result of the local peer authentication.
    Auth {
        /// Whether the authentication succeeded.
        #[serde(default)]
        verified: bool,

        /// Display name to be adopted by the local peer.
        #[serde(default)]
        name: Option<String>,
    },

    /// Remote peer raised or lowered its hand.
    #[serde(rename_all = "camelCase")]
    RaisehandMessage {
        /// Name of the peer.
        peer_name: String,

        /// New raise-hand state of the peer.
        raise_hand_state: bool,
    },

    /// Chat message sent to the room.
    #[serde(rename_all = "camelCase")]
    ChatMessageReceive {
        /// Name of the sender.
        peer_name: String,

        /// Message itself.
        chat_message: Value,
    },

    /// Bulk room data.
    #[serde(rename_all = "camelCase")]
    RoomDataReceive {
        /// Chat messages sent before joining.
        #[serde(default)]
        chat_history: Vec<Value>,

        /// Names of the currently active speakers, the most recent first.
        #[serde(default)]
        last_n: Vec<String>,
    },
}

impl ServerRequest {
    /// Decodes a [`ServerRequest`] from the method name and its payload.
    ///
    /// # Errors
    ///
    /// If the method is unknown or its payload doesn't match the method.
    pub fn parse(method: &str, data: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({ "method": method, "data": data }))
    }

    /// Dispatches this [`ServerRequest`] with the provided
    /// [`ServerRequestHandler`].
    pub async fn dispatch_with<T: ServerRequestHandler + ?Sized>(
        self,
        handler: &T,
    ) -> T::Output {
        match self {
            Self::MediasoupNotification(notification) => {
                handler.on_mediasoup_notification(notification).await
            }
            Self::ActiveSpeaker { peer_name } => {
                handler.on_active_speaker(peer_name).await
            }
            Self::DisplayNameChanged {
                peer_name,
                display_name,
                old_display_name,
            } => {
                handler
                    .on_display_name_changed(
                        peer_name,
                        display_name,
                        old_display_name,
                    )
                    .await
            }
            Self::Auth { verified, name } => {
                handler.on_auth(verified, name).await
            }
            Self::RaisehandMessage {
                peer_name,
                raise_hand_state,
            } => {
                handler
                    .on_raisehand_message(peer_name, raise_hand_state)
                    .await
            }
            Self::ChatMessageReceive {
                peer_name,
                chat_message,
            } => {
                handler
                    .on_chat_message_receive(peer_name, chat_message)
                    .await
            }
            Self::RoomDataReceive {
                chat_history,
                last_n,
            } => handler.on_room_data_receive(chat_history, last_n).await,
        }
    }
}

/// Handler of [`ServerRequest`] variants.
///
/// Using [`ServerRequest::dispatch_with()`] method dispatches
/// [`ServerRequest`] variants to appropriate methods of this trait.
#[async_trait(?Send)]
pub trait ServerRequestHandler {
    /// Output of every handler method.
    type Output;

    /// Handles [`ServerRequest::MediasoupNotification`] variant.
    async fn on_mediasoup_notification(
        &self,
        notification: Value,
    ) -> Self::Output;

    /// Handles [`ServerRequest::ActiveSpeaker`] variant.
    async fn on_active_speaker(&self, peer_name: Option<String>)
        -> Self::Output;

    /// Handles [`ServerRequest::DisplayNameChanged`] variant.
    async fn on_display_name_changed(
        &self,
        peer_name: String,
        display_name: String,
        old_display_name: String,
    ) -> Self::Output;

    /// Handles [`ServerRequest::Auth`] variant.
    async fn on_auth(&self, verified: bool, name: Option<String>)
        -> Self::Output;

    /// Handles [`ServerRequest::RaisehandMessage`] variant.
    async fn on_raisehand_message(
        &self,
        peer_name: String,
        raise_hand_state: bool,
    ) -> Self::Output;

    /// Handles [`ServerRequest::ChatMessageReceive`] variant.
    async fn on_chat_message_receive(
        &self,
        peer_name: String,
        chat_message: Value,
    ) -> Self::Output;

    /// Handles [`ServerRequest::RoomDataReceive`] variant.
    async fn on_room_data_receive(
        &self,
        chat_history: Vec<Value>,
        last_n: Vec<String>,
    ) -> Self::Output;
}
