//! Room session controller.
//!
//! [`Room`] mediates between a [`SignallingChannel`] and a [`MediaEngine`]
//! of a single room session, keeping the session state and projecting it
//! into [`StateUpdate`]s.

mod dispatch;
mod join;
mod last_n;
mod peers;
mod producers;

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_more::{Display, From};
use serde_json::{json, Value};
use tracerr::Traced;

use crate::{
    conf,
    engine::{DeviceInfo, EngineError, MediaEngine, PauseReason},
    log::prelude::*,
    media::{
        MediaDevices, MediaDevicesError, MediaKind, MediaSource, ScreenShare,
        WebcamSelection,
    },
    observer::{Activity, Notification, RoomObserver, StateUpdate},
    preferences::Preferences,
    signalling::{method, SignallingChannel, SignallingError, SignallingEvent},
    state::{RoomState, Session},
    utils::{delay_for, spawn, spawn_watcher, Subscriptions, TaskHandle},
};

use self::{join::Transports, peers::Peers, producers::ProducerSlots};

#[doc(inline)]
pub use self::{
    join::{JoinError, JoinStep},
    last_n::{LastN, Touch},
    producers::{ChangeWebcamError, ProduceError},
};

/// Errors of the [`Room`] operations.
#[derive(Clone, Debug, Display, From)]
pub enum RoomError {
    /// [`RoomHandle`]'s [`Weak`] pointer is detached.
    #[display(fmt = "Room is in detached state")]
    #[from(ignore)]
    Detached,

    /// [`Room`] is closed already.
    #[display(fmt = "Room is closed")]
    #[from(ignore)]
    Closed,

    /// Local producer could not be created or controlled.
    Produce(ProduceError),

    /// Webcam producer track could not be replaced.
    ChangeWebcam(ChangeWebcamError),

    /// Signalling request failed.
    Signalling(SignallingError),

    /// Join sequence failed.
    Join(JoinError),

    /// Local media could not be acquired.
    MediaDevices(MediaDevicesError),

    /// Media engine failed.
    Engine(EngineError),
}

impl RoomError {
    /// Returns name of this [`RoomError`] as it's shown to the user.
    pub fn name(&self) -> String {
        match self {
            Self::Detached => "DetachedError".into(),
            Self::Closed => "RoomClosedError".into(),
            Self::Produce(e) => e.name(),
            Self::ChangeWebcam(_) => "ChangeWebcamError".into(),
            Self::Signalling(_) => "SignallingError".into(),
            Self::Join(_) => "JoinError".into(),
            Self::MediaDevices(e) => e.name().into(),
            Self::Engine(e) => e.name.clone(),
        }
    }
}

/// External collaborators driven by a [`Room`].
pub struct Collaborators {
    /// Channel to the room server.
    pub signalling: Rc<dyn SignallingChannel>,

    /// Media session of the room.
    pub engine: Rc<dyn MediaEngine>,

    /// Local capture devices.
    pub devices: Rc<dyn MediaDevices>,

    /// Screen capture facility.
    pub screen: Rc<dyn ScreenShare>,

    /// Storage of the persisted user choices.
    pub preferences: Rc<dyn Preferences>,

    /// Receiver of the [`StateUpdate`]s.
    pub observer: Rc<dyn RoomObserver>,
}

impl_debug_by_struct_name!(Collaborators);

/// Identity the local peer joins a [`Room`] with.
#[derive(Clone, Debug)]
pub struct JoinOptions {
    /// ID of the room to join.
    pub room_id: String,

    /// Unique name of the local peer.
    pub peer_name: String,

    /// Human-readable name of the local peer.
    pub display_name: String,

    /// Device the local peer joins from.
    pub device: DeviceInfo,

    /// Whether local media should be produced right after joining.
    pub produce: bool,
}

/// External handle to a [`Room`].
///
/// Every method fails with [`RoomError::Detached`] once the [`Room`] is
/// dropped.
#[derive(Clone)]
pub struct RoomHandle(Weak<InnerRoom>);

impl_debug_by_struct_name!(RoomHandle);

impl RoomHandle {
    /// Pauses the mic producer.
    ///
    /// # Errors
    ///
    /// With [`ProduceError::NotFound`] if there is no mic producer.
    pub fn mute_mic(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_mic_paused(true)
            .map_err(tracerr::wrap!())
    }

    /// Resumes the mic producer.
    ///
    /// # Errors
    ///
    /// With [`ProduceError::NotFound`] if there is no mic producer.
    pub fn unmute_mic(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_mic_paused(false)
            .map_err(tracerr::wrap!())
    }

    /// Starts producing the webcam.
    ///
    /// # Errors
    ///
    /// See [`ProduceError`] for details.
    pub async fn enable_webcam(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.enable_webcam().await.map_err(tracerr::wrap!())
    }

    /// Stops producing the webcam.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn disable_webcam(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .disable_webcam()
            .map_err(tracerr::wrap!())
    }

    /// Starts sharing the screen.
    ///
    /// # Errors
    ///
    /// See [`ProduceError`] for details.
    pub async fn enable_screen_sharing(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.enable_screen_sharing().await.map_err(tracerr::wrap!())
    }

    /// Stops sharing the screen.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn disable_screen_sharing(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .disable_screen_sharing()
            .map_err(tracerr::wrap!())
    }

    /// Switches the webcam producer to the next camera.
    ///
    /// # Errors
    ///
    /// See [`ChangeWebcamError`] for details.
    pub async fn change_webcam(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.change_webcam().await.map_err(tracerr::wrap!())
    }

    /// Switches the webcam producer to the next resolution tier.
    ///
    /// # Errors
    ///
    /// See [`ChangeWebcamError`] for details.
    pub async fn change_webcam_resolution(
        &self,
    ) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.change_webcam_resolution().await.map_err(tracerr::wrap!())
    }

    /// Installs the screen capture extension.
    ///
    /// # Errors
    ///
    /// With [`RoomError::MediaDevices`] if the installation fails.
    pub async fn install_extension(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.install_extension().await.map_err(tracerr::wrap!())
    }

    /// Stops receiving video of every peer and closes the webcam producer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn enable_audio_only(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .enable_audio_only()
            .map_err(tracerr::wrap!())
    }

    /// Resumes receiving video and restores the webcam producer.
    ///
    /// A webcam which can't be restored is announced, but doesn't keep the
    /// audio-only mode on.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub async fn disable_audio_only(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.disable_audio_only().await.map_err(tracerr::wrap!())
    }

    /// Changes display name of the local peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Signalling`] if the server fails the request.
    pub async fn change_display_name(
        &self,
        display_name: String,
    ) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner
            .change_display_name(display_name)
            .await
            .map_err(tracerr::wrap!())
    }

    /// Sends a chat message to the room.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Signalling`] if the server fails the request.
    pub async fn send_chat_message(
        &self,
        message: Value,
    ) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.send_chat_message(message).await.map_err(tracerr::wrap!())
    }

    /// Asks the server for the chat history and the active speakers.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Signalling`] if the server fails the request.
    pub async fn get_room_data(&self) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner.get_room_data().await.map_err(tracerr::wrap!())
    }

    /// Raises or lowers the hand of the local peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Signalling`] if the server fails the request.
    pub async fn send_raise_hand_state(
        &self,
        raised: bool,
    ) -> Result<(), Traced<RoomError>> {
        let inner = upgrade_or_detached!(self.0)?;
        inner
            .send_raise_hand_state(raised)
            .await
            .map_err(tracerr::wrap!())
    }

    /// Pauses audio of the provided peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn mute_peer_audio(
        &self,
        peer_name: &str,
    ) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_peer_media_paused(peer_name, MediaKind::Audio, true)
            .map_err(tracerr::wrap!())
    }

    /// Resumes audio of the provided peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn unmute_peer_audio(
        &self,
        peer_name: &str,
    ) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_peer_media_paused(peer_name, MediaKind::Audio, false)
            .map_err(tracerr::wrap!())
    }

    /// Pauses video of the provided peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn pause_peer_video(
        &self,
        peer_name: &str,
    ) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_peer_media_paused(peer_name, MediaKind::Video, true)
            .map_err(tracerr::wrap!())
    }

    /// Resumes video of the provided peer.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn resume_peer_video(
        &self,
        peer_name: &str,
    ) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .set_peer_media_paused(peer_name, MediaKind::Video, false)
            .map_err(tracerr::wrap!())
    }

    /// Restarts ICE of the media transports.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Closed`] if the [`Room`] is closed.
    pub fn restart_ice(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?
            .restart_ice()
            .map_err(tracerr::wrap!())
    }

    /// Leaves the room and closes the session for good.
    ///
    /// # Errors
    ///
    /// With [`RoomError::Detached`] if the [`Room`] is dropped already.
    pub fn close(&self) -> Result<(), Traced<RoomError>> {
        upgrade_or_detached!(self.0)?.close();
        Ok(())
    }
}

/// Room session where all the signalling and media happens.
///
/// Joins the room whenever its [`SignallingChannel`] opens and leaves it on
/// [`Drop`].
pub struct Room(Rc<InnerRoom>);

impl Room {
    /// Creates a new [`Room`] and starts listening to its
    /// [`SignallingChannel`].
    ///
    /// # Panics
    ///
    /// If called outside of a [`tokio::task::LocalSet`] context.
    pub fn new(
        options: JoinOptions,
        collaborators: Collaborators,
        conf: conf::Room,
    ) -> Self {
        let room = Rc::new(InnerRoom::new(options, collaborators, conf));
        room.emit(StateUpdate::RoomState(RoomState::Connecting));

        let inner = Rc::downgrade(&room);
        let task = spawn_watcher(room.signalling.subscribe(), move |event| {
            match inner.upgrade() {
                Some(inner) => inner.on_signalling_event(event),
                None => error!("Inner Room dropped unexpectedly"),
            }
        });
        room.signalling_task.replace(Some(task));

        Self(room)
    }

    /// Creates a new external handle to this [`Room`].
    #[inline]
    pub fn new_handle(&self) -> RoomHandle {
        RoomHandle(Rc::downgrade(&self.0))
    }

    /// Returns current connection state of this [`Room`].
    #[inline]
    pub fn state(&self) -> RoomState {
        self.0.session.borrow().state
    }

    /// Returns names of the active speakers, the most recent first.
    pub fn active_speakers(&self) -> Vec<String> {
        self.0.last_n.borrow().peers().to_vec()
    }

    /// Returns names of the remote peers of this [`Room`].
    pub fn peer_names(&self) -> Vec<String> {
        let mut names = self.0.peers.names();
        names.sort();
        names
    }

    /// Indicates whether a producer of the provided [`MediaSource`] exists.
    #[inline]
    pub fn has_producer(&self, source: MediaSource) -> bool {
        self.0.producers.is_occupied(source)
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Actual data of a [`Room`].
///
/// Shared between an external [`RoomHandle`] and the spawned tasks.
struct InnerRoom {
    /// Settings of this room session.
    conf: conf::Room,

    /// Identity and mode of the local participant.
    session: RefCell<Session>,

    /// Device the local peer joins from.
    device: DeviceInfo,

    /// Channel to the room server.
    signalling: Rc<dyn SignallingChannel>,

    /// Media session of the room.
    engine: Rc<dyn MediaEngine>,

    /// Local capture devices.
    devices: Rc<dyn MediaDevices>,

    /// Screen capture facility.
    screen: Rc<dyn ScreenShare>,

    /// Storage of the persisted user choices.
    preferences: Rc<dyn Preferences>,

    /// Receiver of the [`StateUpdate`]s.
    observer: Rc<dyn RoomObserver>,

    /// Send and recv transports of the current join.
    transports: Transports,

    /// Local producers, one per [`MediaSource`].
    producers: ProducerSlots,

    /// Selected camera and resolution.
    webcam: RefCell<WebcamSelection>,

    /// Adopted remote peers with their consumers.
    peers: Peers,

    /// Window of the most recently active speakers.
    last_n: RefCell<LastN>,

    /// Watchers of the engine entities.
    subscriptions: Subscriptions,

    /// Watcher of the [`SignallingChannel`] events.
    signalling_task: RefCell<Option<TaskHandle>>,
}

impl_debug_by_struct_name!(InnerRoom);

impl InnerRoom {
    fn new(
        options: JoinOptions,
        collaborators: Collaborators,
        conf: conf::Room,
    ) -> Self {
        let JoinOptions {
            room_id,
            peer_name,
            display_name,
            device,
            produce,
        } = options;
        let Collaborators {
            signalling,
            engine,
            devices,
            screen,
            preferences,
            observer,
        } = collaborators;

        Self {
            last_n: RefCell::new(LastN::new(conf.last_n)),
            conf,
            session: RefCell::new(Session::new(
                room_id,
                peer_name,
                display_name,
                produce,
            )),
            device,
            signalling,
            engine,
            devices,
            screen,
            preferences,
            observer,
            transports: Transports::default(),
            producers: ProducerSlots::default(),
            webcam: RefCell::new(WebcamSelection::default()),
            peers: Peers::default(),
            subscriptions: Subscriptions::default(),
            signalling_task: RefCell::new(None),
        }
    }

    /// Delivers the provided [`StateUpdate`] to the observer.
    #[inline]
    fn emit(&self, update: StateUpdate) {
        self.observer.apply(update);
    }

    /// Shows the provided [`Notification`] to the user.
    #[inline]
    fn notify(&self, notification: Notification) {
        self.emit(StateUpdate::Notify(notification));
    }

    /// Indicates whether this room session is terminated.
    #[inline]
    fn is_closed(&self) -> bool {
        self.session.borrow().closed
    }

    /// Fails with [`RoomError::Closed`] if this room session is terminated.
    fn ensure_open(&self) -> Result<(), Traced<RoomError>> {
        if self.is_closed() {
            return Err(tracerr::new!(RoomError::Closed));
        }
        Ok(())
    }

    /// Moves this room session to the provided [`RoomState`], publishing the
    /// change.
    fn set_room_state(&self, state: RoomState) {
        let prev =
            std::mem::replace(&mut self.session.borrow_mut().state, state);
        if prev != state {
            debug!("Room state: {} -> {}", prev, state);
            self.emit(StateUpdate::RoomState(state));
        }
    }

    /// Sends a signalling request, failing with [`SignallingError::Timeout`]
    /// if it isn't answered in the configured time.
    async fn request(
        &self,
        method: &str,
        data: Value,
    ) -> Result<Value, Traced<SignallingError>> {
        let res = tokio::time::timeout(
            self.conf.request_timeout,
            self.signalling.request(method, data),
        )
        .await;
        match res {
            Ok(res) => res.map_err(tracerr::wrap!()),
            Err(_) => Err(tracerr::new!(SignallingError::Timeout)),
        }
    }

    fn on_signalling_event(self: &Rc<Self>, event: SignallingEvent) {
        match event {
            SignallingEvent::Open => {
                if self.is_closed() {
                    debug!("Signalling opened after close, ignoring");
                    return;
                }
                info!("Signalling opened, joining the room");
                let room = Rc::clone(self);
                spawn(async move { room.join().await });
            }
            SignallingEvent::Disconnected => self.handle_disconnect(),
            SignallingEvent::Close => {
                if !self.is_closed() {
                    warn!("Signalling closed");
                    self.close();
                }
            }
            SignallingEvent::Request(request) => self.handle_request(request),
        }
    }

    /// Drops the media session, waiting for the signalling to reconnect.
    fn handle_disconnect(&self) {
        if self.is_closed() {
            return;
        }
        warn!("Signalling disconnected");
        self.notify(Notification::error("WebSocket disconnected"));

        if let Err(e) = self.engine.remote_close("signalling disconnected") {
            error!("Failed to close media session: {}", e);
        }
        self.close_all_producers();
        for peer_name in self.peers.names() {
            self.remove_peer(&peer_name);
        }
        self.set_room_state(RoomState::Connecting);
    }

    /// Terminates this room session for good.
    ///
    /// Does nothing if it's terminated already.
    fn close(&self) {
        {
            let mut session = self.session.borrow_mut();
            if session.closed {
                return;
            }
            session.closed = true;
        }
        info!("Closing room {}", self.session.borrow().room_id);

        self.close_all_producers();
        for transport in self.transports.take_all() {
            transport.close();
        }
        self.engine.leave();
        self.subscriptions.clear();
        self.clear_peers();
        self.set_room_state(RoomState::Closed);

        let signalling = Rc::clone(&self.signalling);
        let grace = self.conf.leave_grace;
        spawn(async move {
            delay_for(grace).await;
            signalling.close();
        });
    }

    async fn change_display_name(
        &self,
        display_name: String,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Changing display name to {}", display_name);
        self.preferences.set_display_name(&display_name);

        let res = self
            .request(
                method::CHANGE_DISPLAY_NAME,
                json!({ "displayName": display_name }),
            )
            .await;
        match res {
            Ok(_) => {
                self.session.borrow_mut().display_name = display_name.clone();
                self.emit(StateUpdate::DisplayName(Some(display_name)));
                self.notify(Notification::info("Display name changed"));
                Ok(())
            }
            Err(e) => {
                error!("Failed to change display name: {}", e);
                self.notify(Notification::error(format!(
                    "Could not change display name: {}",
                    e.as_ref(),
                )));
                self.emit(StateUpdate::DisplayName(None));
                Err(e).map_err(tracerr::map_from_and_wrap!())
            }
        }
    }

    async fn send_chat_message(
        &self,
        message: Value,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        let res = self
            .request(method::CHAT_MESSAGE, json!({ "chatMessage": message }))
            .await;
        if let Err(e) = &res {
            error!("Failed to send chat message: {}", e);
            self.notify(Notification::error(format!(
                "Could not send chat: {}",
                e.as_ref(),
            )));
        }
        res.map(drop).map_err(tracerr::map_from_and_wrap!())
    }

    async fn get_room_data(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        let res = self.request(method::ROOM_DATA, json!({})).await;
        if let Err(e) = &res {
            error!("Failed to get room data: {}", e);
            self.notify(Notification::error(format!(
                "Could not get chat history: {}",
                e.as_ref(),
            )));
        }
        res.map(drop).map_err(tracerr::map_from_and_wrap!())
    }

    async fn send_raise_hand_state(
        &self,
        raised: bool,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.emit(StateUpdate::InProgress(Activity::RaiseHand, true));

        let peer_name = self.session.borrow().peer_name.clone();
        let res = self
            .request(
                method::RAISEHAND_MESSAGE,
                json!({ "peerName": peer_name, "raiseHandState": raised }),
            )
            .await;
        match &res {
            Ok(_) => {
                self.session.borrow_mut().raised_hand = raised;
                self.emit(StateUpdate::MyRaiseHandState(raised));
                self.notify(Notification::info(format!(
                    "You {} your hand",
                    if raised { "raised" } else { "lowered" },
                )));
            }
            Err(e) => {
                error!("Failed to send raise-hand state: {}", e);
                self.notify(Notification::error(format!(
                    "Could not {} your hand: {}",
                    if raised { "raise" } else { "lower" },
                    e.as_ref(),
                )));
                self.emit(StateUpdate::MyRaiseHandState(!raised));
            }
        }

        self.emit(StateUpdate::InProgress(Activity::RaiseHand, false));
        res.map(drop).map_err(tracerr::map_from_and_wrap!())
    }

    /// Pauses or resumes every consumer of the provided kind of the provided
    /// peer.
    fn set_peer_media_paused(
        &self,
        peer_name: &str,
        kind: MediaKind,
        paused: bool,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Peer {} {} paused: {}", peer_name, kind, paused);

        let activity = match kind {
            MediaKind::Audio => Activity::PeerAudio(peer_name.to_owned()),
            MediaKind::Video => Activity::PeerVideo(peer_name.to_owned()),
        };
        self.emit(StateUpdate::InProgress(activity.clone(), true));
        if paused {
            let reason = match kind {
                MediaKind::Audio => PauseReason::MuteAudio,
                MediaKind::Video => PauseReason::PauseVideo,
            };
            self.pause_consumers_of(peer_name, kind, reason);
        } else {
            self.resume_consumers_of(peer_name, kind);
        }
        self.emit(StateUpdate::InProgress(activity, false));
        Ok(())
    }

    fn enable_audio_only(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Enabling audio-only mode");
        self.emit(StateUpdate::InProgress(Activity::AudioOnly, true));

        self.close_producer(MediaSource::Webcam);
        self.session.borrow_mut().audio_only = true;
        self.pause_all_consumers(MediaKind::Video, PauseReason::AudioOnlyMode);
        self.emit(StateUpdate::AudioOnly(true));

        self.emit(StateUpdate::InProgress(Activity::AudioOnly, false));
        Ok(())
    }

    async fn disable_audio_only(
        self: &Rc<Self>,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Disabling audio-only mode");
        self.emit(StateUpdate::InProgress(Activity::AudioOnly, true));

        if !self.producers.is_occupied(MediaSource::Webcam)
            && self.engine.can_send(MediaKind::Video)
        {
            // Failure is announced by the producer creation itself.
            if let Err(e) = self.enable_webcam().await {
                warn!("Leaving audio-only mode without webcam: {}", e);
            }
        }
        self.session.borrow_mut().audio_only = false;
        self.resume_all_consumers(MediaKind::Video);
        self.emit(StateUpdate::AudioOnly(false));

        self.emit(StateUpdate::InProgress(Activity::AudioOnly, false));
        Ok(())
    }

    fn restart_ice(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Restarting ICE");
        self.emit(StateUpdate::InProgress(Activity::RestartIce, true));
        self.engine.restart_ice();

        let observer = Rc::clone(&self.observer);
        let delay = self.conf.restart_ice_delay;
        spawn(async move {
            delay_for(delay).await;
            observer
                .apply(StateUpdate::InProgress(Activity::RestartIce, false));
        });
        Ok(())
    }

    async fn install_extension(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        debug!("Installing screen share extension");
        match self.screen.install_extension().await {
            Ok(()) => {
                self.emit(StateUpdate::ScreenCapabilities {
                    can_share_screen: self.engine.can_send(MediaKind::Video),
                    need_extension: false,
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to install screen share extension: {}", e);
                Err(tracerr::new!(RoomError::from(e)))
            }
        }
    }
}
