//! Remote peers of a [`Room`] and the consumers they expose.
//!
//! [`Room`]: super::Room

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    engine::{
        Consumer, ConsumerEvent, ConsumerId, PauseReason, PeerEvent,
        RemotePeer,
    },
    log::prelude::*,
    media::MediaKind,
    observer::{ConsumerInfo, Notification, PeerInfo, StateUpdate},
    utils::{spawn, spawn_watcher, SubscriptionKey},
};

use super::{last_n::Touch, InnerRoom};

/// Adopted remote peer.
struct PeerRecord {
    /// Display name the peer is currently known by.
    display_name: String,

    /// Adopted consumers of the peer, in adoption order.
    consumers: Vec<Rc<dyn Consumer>>,
}

/// Repository of the adopted remote peers.
///
/// Every consumer belongs to exactly one peer.
#[derive(Default)]
pub(super) struct Peers(RefCell<HashMap<String, PeerRecord>>);

impl_debug_by_struct_name!(Peers);

impl Peers {
    /// Records a new peer, forgetting the previous record of the peer with
    /// the same name (if any).
    fn insert(&self, name: String, display_name: String) -> Vec<ConsumerId> {
        let prev = self.0.borrow_mut().insert(
            name,
            PeerRecord {
                display_name,
                consumers: Vec::new(),
            },
        );
        prev.map(|p| p.consumers.iter().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Forgets the peer with the provided name, returning its display name
    /// and the IDs of its consumers.
    fn remove(&self, name: &str) -> Option<(String, Vec<ConsumerId>)> {
        self.0.borrow_mut().remove(name).map(|p| {
            let ids = p.consumers.iter().map(|c| c.id()).collect();
            (p.display_name, ids)
        })
    }

    /// Indicates whether the peer with the provided name is recorded.
    pub(super) fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Returns names of all the recorded peers.
    pub(super) fn names(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Updates display name of the peer, returning `false` if there is no
    /// such peer.
    fn set_display_name(&self, name: &str, display_name: String) -> bool {
        self.0
            .borrow_mut()
            .get_mut(name)
            .map(|p| p.display_name = display_name)
            .is_some()
    }

    /// Attaches the provided consumer to its peer.
    ///
    /// Returns `false` if the peer is unknown or the consumer is attached
    /// already.
    fn add_consumer(&self, consumer: Rc<dyn Consumer>) -> bool {
        let id = consumer.id();
        let mut peers = self.0.borrow_mut();
        let owned = peers
            .values()
            .any(|p| p.consumers.iter().any(|c| c.id() == id));
        if owned {
            return false;
        }
        match peers.get_mut(&consumer.peer_name()) {
            Some(peer) => {
                peer.consumers.push(consumer);
                true
            }
            None => false,
        }
    }

    /// Detaches the consumer with the provided ID from its peer.
    fn remove_consumer(&self, id: &ConsumerId) {
        for peer in self.0.borrow_mut().values_mut() {
            peer.consumers.retain(|c| &c.id() != id);
        }
    }

    /// Returns consumers of the provided kind of the peer with the provided
    /// name.
    fn consumers_of(
        &self,
        name: &str,
        kind: MediaKind,
    ) -> Vec<Rc<dyn Consumer>> {
        self.0
            .borrow()
            .get(name)
            .map(|p| {
                p.consumers
                    .iter()
                    .filter(|c| c.kind() == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns consumers of the provided kind of every peer.
    fn all_consumers(&self, kind: MediaKind) -> Vec<Rc<dyn Consumer>> {
        self.0
            .borrow()
            .values()
            .flat_map(|p| p.consumers.iter())
            .filter(|c| c.kind() == kind)
            .cloned()
            .collect()
    }

    /// Forgets every peer.
    fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl InnerRoom {
    /// Records the provided remote peer, adopts every consumer it exposes and
    /// starts watching its events.
    ///
    /// Adopting an already known peer replaces its previous record.
    pub(super) fn adopt_peer(
        self: &Rc<Self>,
        peer: &Rc<dyn RemotePeer>,
        announce: bool,
    ) {
        let name = peer.name();
        let app_data = peer.app_data();
        debug!("Adopting peer {} [announce: {}]", name, announce);

        let stale =
            self.peers.insert(name.clone(), app_data.display_name.clone());
        for id in stale {
            self.subscriptions.remove(&SubscriptionKey::Consumer(id));
        }
        self.emit(StateUpdate::AddPeer(PeerInfo {
            name: name.clone(),
            display_name: app_data.display_name.clone(),
            device: app_data.device,
        }));
        if announce {
            self.notify(Notification::info(format!(
                "{} joined the room",
                app_data.display_name,
            )));
        }

        for consumer in peer.consumers() {
            self.adopt_consumer(consumer);
        }

        let weak = Rc::downgrade(self);
        let peer_name = name.clone();
        let handle = spawn_watcher(peer.subscribe(), move |event| {
            if let Some(room) = weak.upgrade() {
                room.on_peer_event(&peer_name, event);
            }
        });
        self.subscriptions.insert(SubscriptionKey::Peer(name), handle);
    }

    fn on_peer_event(self: &Rc<Self>, peer_name: &str, event: PeerEvent) {
        match event {
            PeerEvent::Close(originator) => {
                debug!(
                    "Peer {} closed [originator: {}]",
                    peer_name, originator
                );
                self.remove_peer(peer_name);
            }
            PeerEvent::NewConsumer(consumer) => {
                debug!("Peer {} got new consumer {}", peer_name, consumer.id());
                self.adopt_consumer(consumer);
            }
        }
    }

    /// Forgets the remote peer with the provided name along with its
    /// consumers.
    pub(super) fn remove_peer(&self, peer_name: &str) {
        self.subscriptions
            .remove(&SubscriptionKey::Peer(peer_name.to_owned()));
        let (display_name, consumers) = match self.peers.remove(peer_name) {
            Some(removed) => removed,
            None => return,
        };
        for id in consumers {
            self.subscriptions.remove(&SubscriptionKey::Consumer(id));
        }
        self.last_n.borrow_mut().remove(peer_name);

        self.emit(StateUpdate::RemovePeer(peer_name.to_owned()));
        if self.engine.is_joined() {
            self.notify(Notification::info(format!(
                "{} left the room",
                display_name,
            )));
        }
    }

    /// Forgets every remote peer without any announcements.
    pub(super) fn clear_peers(&self) {
        self.peers.clear();
        self.subscriptions.remove_where(|k| {
            matches!(k, SubscriptionKey::Peer(_) | SubscriptionKey::Consumer(_))
        });
    }

    /// Projects the provided consumer, starts watching its events and begins
    /// its reception if it's supported.
    pub(super) fn adopt_consumer(self: &Rc<Self>, consumer: Rc<dyn Consumer>) {
        let id = consumer.id();
        let peer_name = consumer.peer_name();
        if !self.peers.add_consumer(Rc::clone(&consumer)) {
            error!(
                "Consumer {} of peer {} is not adopted: unknown peer or \
                 consumer is owned already",
                id, peer_name,
            );
            return;
        }

        self.emit(StateUpdate::AddConsumer(ConsumerInfo {
            id: id.clone(),
            peer_name: peer_name.clone(),
            kind: consumer.kind(),
            source: consumer.source(),
            supported: consumer.is_supported(),
            pause_state: consumer.pause_state(),
            track: None,
            codec: consumer.codec(),
        }));

        let weak = Rc::downgrade(self);
        let (consumer_id, owner) = (id.clone(), peer_name);
        let handle = spawn_watcher(consumer.subscribe(), move |event| {
            if let Some(room) = weak.upgrade() {
                room.on_consumer_event(&consumer_id, &owner, event);
            }
        });
        self.subscriptions
            .insert(SubscriptionKey::Consumer(id.clone()), handle);

        if !consumer.is_supported() {
            return;
        }
        if consumer.kind() == MediaKind::Video
            && self.session.borrow().audio_only
        {
            consumer.pause(PauseReason::AudioOnlyMode);
        }
        let transport = match self.transports.recv() {
            Some(transport) => transport,
            None => {
                error!("Consumer {} is not received: no recv transport", id);
                return;
            }
        };
        let weak = Rc::downgrade(self);
        spawn(async move {
            match consumer.receive(&transport).await {
                Ok(track) => {
                    if let Some(room) = weak.upgrade() {
                        room.emit(StateUpdate::ConsumerTrack(id, Some(track)));
                    }
                }
                Err(e) => error!("Failed to receive consumer {}: {}", id, e),
            }
        });
    }

    fn on_consumer_event(
        &self,
        id: &ConsumerId,
        peer_name: &str,
        event: ConsumerEvent,
    ) {
        match event {
            ConsumerEvent::Close(originator) => {
                debug!("Consumer {} closed [originator: {}]", id, originator);
                self.subscriptions
                    .remove(&SubscriptionKey::Consumer(id.clone()));
                self.peers.remove_consumer(id);
                self.emit(StateUpdate::RemoveConsumer {
                    id: id.clone(),
                    peer_name: peer_name.to_owned(),
                });
            }
            ConsumerEvent::Pause(originator) => {
                self.emit(StateUpdate::ConsumerPaused(id.clone(), originator));
            }
            ConsumerEvent::Resume(originator) => {
                self.emit(StateUpdate::ConsumerResumed(
                    id.clone(),
                    originator,
                ));
            }
            ConsumerEvent::EffectiveProfileChange(profile) => {
                debug!("Consumer {} profile changed to {}", id, profile);
                self.emit(StateUpdate::ConsumerEffectiveProfile(
                    id.clone(),
                    profile,
                ));
            }
        }
    }

    /// Updates display name of the provided peer, returning `false` if the
    /// peer is unknown.
    pub(super) fn rename_peer(
        &self,
        peer_name: &str,
        display_name: &str,
    ) -> bool {
        self.peers
            .set_display_name(peer_name, display_name.to_owned())
    }

    /// Pauses every consumer of the provided kind of the provided peer.
    pub(super) fn pause_consumers_of(
        &self,
        peer_name: &str,
        kind: MediaKind,
        reason: PauseReason,
    ) {
        for consumer in self.peers.consumers_of(peer_name, kind) {
            consumer.pause(reason);
        }
    }

    /// Resumes every supported consumer of the provided kind of the provided
    /// peer.
    pub(super) fn resume_consumers_of(&self, peer_name: &str, kind: MediaKind) {
        for consumer in self.peers.consumers_of(peer_name, kind) {
            if consumer.is_supported() {
                consumer.resume();
            }
        }
    }

    /// Pauses every consumer of the provided kind.
    pub(super) fn pause_all_consumers(
        &self,
        kind: MediaKind,
        reason: PauseReason,
    ) {
        for consumer in self.peers.all_consumers(kind) {
            consumer.pause(reason);
        }
    }

    /// Resumes every supported consumer of the provided kind.
    pub(super) fn resume_all_consumers(&self, kind: MediaKind) {
        for consumer in self.peers.all_consumers(kind) {
            if consumer.is_supported() {
                consumer.resume();
            }
        }
    }

    /// Moves the provided peer to the front of the active speakers window,
    /// pausing video of the peer it pushes out and resuming video of the
    /// inserted one.
    pub(super) fn handle_active_speaker(&self, peer_name: &str) {
        let touch = self.last_n.borrow_mut().touch(peer_name);
        debug!("Active speaker {}: {:?}", peer_name, touch);
        match touch {
            Touch::Moved | Touch::Disabled => {}
            Touch::Inserted { evicted } => {
                if let Some(evicted) = evicted {
                    self.pause_consumers_of(
                        &evicted,
                        MediaKind::Video,
                        PauseReason::NotSpeaking,
                    );
                }
                if !self.session.borrow().audio_only {
                    self.resume_consumers_of(peer_name, MediaKind::Video);
                }
            }
        }
    }
}
