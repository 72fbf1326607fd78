//! Join sequence of a [`Room`].
//!
//! [`Room`]: super::Room

use std::{cell::RefCell, rc::Rc};

use derive_more::Display;
use tracerr::Traced;

use crate::{
    engine::{
        EngineError, EngineEvent, PeerAppData, Transport, TransportDirection,
        TransportEvent, TransportOptions,
    },
    log::prelude::*,
    media::{MediaKind, MediaSource},
    observer::{Notification, StateUpdate},
    preferences::Preferences,
    signalling::method,
    state::{Originator, RoomState},
    utils::{spawn, spawn_watcher, SubscriptionKey},
};

use super::InnerRoom;

/// Step of the join sequence.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum JoinStep {
    /// Joining the room in the media engine.
    JoinEngine,

    /// Creating the send and the recv transports.
    CreateTransports,

    /// Publishing local media capabilities.
    PublishCapabilities,

    /// Producing local media, if requested.
    AutoProduce,

    /// Marking the session connected and adopting present peers.
    Finalize,
}

impl JoinStep {
    /// Every [`JoinStep`] in execution order.
    pub const ALL: [Self; 5] = [
        Self::JoinEngine,
        Self::CreateTransports,
        Self::PublishCapabilities,
        Self::AutoProduce,
        Self::Finalize,
    ];
}

/// Fatal failure of the join sequence.
#[derive(Clone, Debug, Display)]
#[display(fmt = "{} step failed: {}", step, cause)]
pub struct JoinError {
    /// Step that failed.
    pub step: JoinStep,

    /// Failure reported by the engine.
    pub cause: EngineError,
}

/// Send and recv transports of the session.
#[derive(Default)]
pub(super) struct Transports {
    send: RefCell<Option<Rc<dyn Transport>>>,
    recv: RefCell<Option<Rc<dyn Transport>>>,
}

impl_debug_by_struct_name!(Transports);

impl Transports {
    /// Returns the send transport.
    pub(super) fn send(&self) -> Option<Rc<dyn Transport>> {
        self.send.borrow().clone()
    }

    /// Returns the recv transport.
    pub(super) fn recv(&self) -> Option<Rc<dyn Transport>> {
        self.recv.borrow().clone()
    }

    /// Stores the provided transport by its direction, returning the one it
    /// replaces.
    fn replace(
        &self,
        transport: Rc<dyn Transport>,
    ) -> Option<Rc<dyn Transport>> {
        let slot = match transport.direction() {
            TransportDirection::Send => &self.send,
            TransportDirection::Recv => &self.recv,
        };
        slot.replace(Some(transport))
    }

    /// Forgets both transports, returning them.
    pub(super) fn take_all(&self) -> Vec<Rc<dyn Transport>> {
        self.send
            .take()
            .into_iter()
            .chain(self.recv.take())
            .collect()
    }
}

/// Indicates whether the webcam should be produced on join: unless it was
/// explicitly disabled before.
fn webcam_wanted(preferences: &dyn Preferences) -> bool {
    preferences.webcam_enabled().unwrap_or(true)
}

impl InnerRoom {
    /// Runs the join sequence.
    ///
    /// Every run detaches the engine listeners of the previous one first, so
    /// rejoining never doubles event handlers. Any failed step closes the
    /// [`Room`].
    ///
    /// [`Room`]: super::Room
    pub(super) async fn join(self: &Rc<Self>) {
        debug!("Joining room {}", self.session.borrow().room_id);
        self.subscribe_engine();

        for step in JoinStep::ALL.iter().copied() {
            if self.is_closed() {
                debug!("Join interrupted before {}: room is closed", step);
                return;
            }
            if let Err(e) = self.run_join_step(step).await {
                error!("Failed to join room: {}", e);
                self.notify(Notification::error(format!(
                    "Could not join the room: {}",
                    e.as_ref(),
                )));
                self.close();
                return;
            }
        }
    }

    async fn run_join_step(
        self: &Rc<Self>,
        step: JoinStep,
    ) -> Result<(), Traced<JoinError>> {
        debug!("Join step: {}", step);
        let fail = |cause| tracerr::new!(JoinError { step, cause });
        match step {
            JoinStep::JoinEngine => {
                let (peer_name, app_data) = {
                    let session = self.session.borrow();
                    let app_data = PeerAppData {
                        display_name: session.display_name.clone(),
                        device: self.device.clone(),
                    };
                    (session.peer_name.clone(), app_data)
                };
                self.engine.join(&peer_name, app_data).await.map_err(fail)
            }
            JoinStep::CreateTransports => {
                self.create_transports().map_err(fail)
            }
            JoinStep::PublishCapabilities => {
                self.publish_capabilities();
                Ok(())
            }
            JoinStep::AutoProduce => {
                self.auto_produce().await;
                Ok(())
            }
            JoinStep::Finalize => {
                self.finalize_join();
                Ok(())
            }
        }
    }

    /// Replaces every engine listener with a single fresh one.
    fn subscribe_engine(self: &Rc<Self>) {
        self.engine.remove_all_listeners();
        self.subscriptions.remove(&SubscriptionKey::Engine);

        let weak = Rc::downgrade(self);
        let handle = spawn_watcher(self.engine.subscribe(), move |event| {
            if let Some(room) = weak.upgrade() {
                room.on_engine_event(event);
            }
        });
        self.subscriptions.insert(SubscriptionKey::Engine, handle);
    }

    fn on_engine_event(self: &Rc<Self>, event: EngineEvent) {
        match event {
            EngineEvent::NewPeer(peer) => {
                debug!("New peer {}", peer.name());
                self.adopt_peer(&peer, true);
            }
            EngineEvent::Close(Originator::Remote) => {
                warn!("Room session closed remotely");
                self.set_room_state(RoomState::Closed);
            }
            EngineEvent::Close(Originator::Local) => {
                debug!("Room session closed locally");
            }
            EngineEvent::Request { request, responder } => {
                debug!("Relaying engine request: {}", request);
                let room = Rc::clone(self);
                spawn(async move {
                    let res = room
                        .request(method::MEDIASOUP_REQUEST, request)
                        .await
                        .map_err(|e| {
                            EngineError::new(
                                "SignallingError",
                                e.as_ref().to_string(),
                            )
                        });
                    responder.respond(res);
                });
            }
            EngineEvent::Notify(notification) => {
                debug!("Relaying engine notification: {}", notification);
                let signalling = Rc::clone(&self.signalling);
                spawn(async move {
                    if let Err(e) = signalling
                        .notify(method::MEDIASOUP_NOTIFICATION, notification)
                        .await
                    {
                        warn!("Could not send engine notification: {}", e);
                    }
                });
            }
        }
    }

    /// Creates exactly one send and one recv transport, closing the ones of
    /// a previous join.
    fn create_transports(self: &Rc<Self>) -> Result<(), EngineError> {
        let options = TransportOptions {
            tcp: self.conf.transport.tcp,
        };
        for direction in [TransportDirection::Send, TransportDirection::Recv]
            .iter()
            .copied()
        {
            let transport = self.engine.create_transport(direction, options)?;
            if let Some(prev) = self.transports.replace(Rc::clone(&transport))
            {
                prev.close();
            }

            let handle = spawn_watcher(transport.subscribe(), move |event| {
                let TransportEvent::Close(originator) = event;
                debug!(
                    "{} transport closed [originator: {}]",
                    direction, originator,
                );
            });
            self.subscriptions
                .insert(SubscriptionKey::Transport(direction), handle);
        }
        Ok(())
    }

    fn publish_capabilities(&self) {
        let can_send_mic = self.engine.can_send(MediaKind::Audio);
        let can_send_webcam = self.engine.can_send(MediaKind::Video);
        self.emit(StateUpdate::MediaCapabilities {
            can_send_mic,
            can_send_webcam,
        });
        self.emit(StateUpdate::ScreenCapabilities {
            can_share_screen: can_send_webcam && self.screen.is_available(),
            need_extension: self.screen.needs_extension(),
        });
    }

    /// Produces mic and webcam, if producing was requested.
    ///
    /// Failures here never fail the join.
    async fn auto_produce(self: &Rc<Self>) {
        if !self.session.borrow().produce {
            return;
        }
        if self.engine.can_send(MediaKind::Audio) {
            if let Err(e) = self.set_producer(MediaSource::Mic).await {
                debug!("Mic is not produced on join: {}", e);
            }
        }
        if self.engine.can_send(MediaKind::Video)
            && webcam_wanted(self.preferences.as_ref())
        {
            if let Err(e) = self.enable_webcam().await {
                debug!("Webcam is not produced on join: {}", e);
            }
        }
    }

    fn finalize_join(self: &Rc<Self>) {
        self.set_room_state(RoomState::Connected);
        self.emit(StateUpdate::RemoveAllNotifications);

        let room = Rc::clone(self);
        spawn(async move {
            // Failure is announced by the request itself.
            let _ = room.get_room_data().await;
        });

        self.notify(
            Notification::info("You are in the room")
                .with_timeout(self.conf.joined_notification_timeout),
        );
        for peer in self.engine.peers() {
            self.adopt_peer(&peer, false);
        }
    }
}
