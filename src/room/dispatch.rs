//! Handling of the requests initiated by the room server.

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    log::prelude::*,
    observer::{Notification, StateUpdate},
    signalling::{
        InboundRequest, ServerRequest, ServerRequestHandler,
        UNKNOWN_METHOD_CODE, UNKNOWN_METHOD_REASON,
    },
    utils::spawn,
};

use super::InnerRoom;

impl InnerRoom {
    /// Answers the provided [`InboundRequest`] and dispatches it.
    ///
    /// Known requests are accepted before any of their effects take place,
    /// anything else is rejected.
    pub(super) fn handle_request(self: &Rc<Self>, request: InboundRequest) {
        let InboundRequest {
            method,
            data,
            responder,
        } = request;

        match ServerRequest::parse(&method, data) {
            Ok(req) => {
                debug!("Server request: {}", method);
                responder.accept(Value::Null);
                let room = Rc::clone(self);
                spawn(async move {
                    req.dispatch_with(room.as_ref()).await;
                });
            }
            Err(e) => {
                warn!("Rejecting server request {}: {}", method, e);
                responder.reject(UNKNOWN_METHOD_CODE, UNKNOWN_METHOD_REASON);
            }
        }
    }
}

#[async_trait(?Send)]
impl ServerRequestHandler for InnerRoom {
    type Output = ();

    async fn on_mediasoup_notification(&self, notification: Value) {
        if let Err(e) = self.engine.receive_notification(notification) {
            error!("Engine failed to apply notification: {}", e);
        }
    }

    async fn on_active_speaker(&self, peer_name: Option<String>) {
        let is_me = peer_name.as_deref()
            == Some(self.session.borrow().peer_name.as_str());
        if is_me {
            return;
        }
        debug!("Active speaker: {:?}", peer_name);

        self.emit(StateUpdate::RoomActiveSpeaker(peer_name.clone()));
        if let Some(name) = peer_name {
            self.handle_active_speaker(&name);
        }
    }

    async fn on_display_name_changed(
        &self,
        peer_name: String,
        display_name: String,
        old_display_name: String,
    ) {
        if !self.rename_peer(&peer_name, &display_name) {
            error!("Cannot rename peer {}: peer not found", peer_name);
            return;
        }
        self.emit(StateUpdate::PeerDisplayName {
            peer_name,
            display_name: display_name.clone(),
        });
        self.notify(Notification::info(format!(
            "{} is now {}",
            old_display_name, display_name,
        )));
    }

    /// Trusts the server to tell who the local peer is: no verification
    /// happens on this side.
    async fn on_auth(&self, verified: bool, name: Option<String>) {
        debug!("Auth result [verified: {}, name: {:?}]", verified, name);
        if !verified {
            self.notify(Notification::info("Authentication failed"));
            return;
        }

        self.notify(Notification::info("Authenticated successfully"));
        if let Some(name) = name {
            // Failure is announced by the intent itself.
            let _ = self.change_display_name(name).await;
        }
    }

    async fn on_raisehand_message(
        &self,
        peer_name: String,
        raise_hand_state: bool,
    ) {
        debug!("Peer {} raise-hand state: {}", peer_name, raise_hand_state);
        self.notify(Notification::info(format!(
            "{} {} their hand",
            peer_name,
            if raise_hand_state { "raised" } else { "lowered" },
        )));
        self.emit(StateUpdate::PeerRaiseHandState {
            peer_name,
            raised: raise_hand_state,
        });
    }

    async fn on_chat_message_receive(
        &self,
        peer_name: String,
        chat_message: Value,
    ) {
        debug!("Chat message from {}", peer_name);
        self.emit(StateUpdate::AddResponseMessage(chat_message));
    }

    async fn on_room_data_receive(
        &self,
        chat_history: Vec<Value>,
        last_n: Vec<String>,
    ) {
        if !chat_history.is_empty() {
            debug!("Got chat history of {} messages", chat_history.len());
            self.emit(StateUpdate::AddChatHistory(chat_history));
        }
        if !last_n.is_empty() {
            debug!("Got active speakers: {:?}", last_n);
            self.last_n.borrow_mut().replace(last_n);
        }
    }
}
