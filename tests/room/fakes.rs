//! Hand-written fakes of the room collaborators.

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::Rc,
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    channel::{mpsc, oneshot},
    stream::{self, LocalBoxStream},
};
use medea_room_client::{
    conf,
    engine::{
        Consumer, ConsumerEvent, ConsumerId, DeviceInfo, EngineError,
        EngineEvent, EngineResponder, MediaEngine, PauseReason, PeerAppData,
        PeerEvent, Producer, ProducerEvent, ProducerId, ProducerOptions,
        RemotePeer, Transport, TransportDirection, TransportEvent,
        TransportOptions,
    },
    media::{
        InputDeviceInfo, MediaDevices, MediaDevicesError, MediaKind,
        MediaSource, MediaTrack, ScreenConstraints, ScreenShare, Track,
        VideoConstraints,
    },
    observer::{Notification, RoomObserver, StateUpdate},
    preferences::Preferences,
    room::{Collaborators, JoinOptions},
    signalling::{
        InboundRequest, Response, SignallingChannel, SignallingError,
        SignallingEvent,
    },
    state::{Originator, PauseState, RoomState},
    Room, RoomHandle,
};
use serde_json::{json, Value};

/// Lets every spawned task run until it blocks.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Subscribers of a fake entity events.
pub struct Listeners<T>(RefCell<Vec<mpsc::UnboundedSender<T>>>);

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self(RefCell::new(Vec::new()))
    }
}

impl<T: 'static> Listeners<T> {
    pub fn subscribe(&self) -> LocalBoxStream<'static, T> {
        let (tx, rx) = mpsc::unbounded();
        self.0.borrow_mut().push(tx);
        Box::pin(rx)
    }

    /// Sends an event built by the provided function to every live
    /// subscriber.
    pub fn send_with<F: Fn() -> T>(&self, event: F) {
        self.0
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(event()).is_ok());
    }

    /// Returns count of subscribers still listening.
    pub fn count(&self) -> usize {
        let mut listeners = self.0.borrow_mut();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug)]
pub struct FakeTrack {
    pub id: String,
    pub kind: MediaKind,
    pub stopped: Cell<bool>,
}

impl FakeTrack {
    pub fn new<S: Into<String>>(id: S, kind: MediaKind) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            kind,
            stopped: Cell::new(false),
        })
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.set(true);
    }
}

pub struct FakeTransport {
    pub direction: TransportDirection,
    pub closed: Cell<bool>,
}

impl Transport for FakeTransport {
    fn id(&self) -> String {
        format!("{}-transport", self.direction)
    }

    fn direction(&self) -> TransportDirection {
        self.direction
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn close(&self) {
        self.closed.set(true);
    }

    fn subscribe(&self) -> LocalBoxStream<'static, TransportEvent> {
        Box::pin(stream::pending())
    }
}

pub struct FakeProducer {
    pub id: String,
    pub source: MediaSource,
    pub simulcast: bool,
    pub track: RefCell<Rc<FakeTrack>>,
    pub state: Cell<PauseState>,
    pub closed: Cell<bool>,
    pub send_error: Option<EngineError>,
    pub replace_error: RefCell<Option<EngineError>>,
    pub listeners: Listeners<ProducerEvent>,
}

impl FakeProducer {
    pub fn emit(&self, event: ProducerEvent) {
        self.listeners.send_with(|| event);
    }
}

#[async_trait(?Send)]
impl Producer for FakeProducer {
    fn id(&self) -> ProducerId {
        ProducerId(self.id.clone())
    }

    fn kind(&self) -> MediaKind {
        self.source.kind()
    }

    fn pause_state(&self) -> PauseState {
        self.state.get()
    }

    fn track(&self) -> Option<Track> {
        let track: Track = self.track.borrow().clone();
        Some(track)
    }

    fn codec(&self) -> Option<String> {
        Some(match self.source.kind() {
            MediaKind::Audio => "opus".into(),
            MediaKind::Video => "VP8".into(),
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn pause(&self) {
        let mut state = self.state.get();
        state.pause(Originator::Local);
        self.state.set(state);
        self.emit(ProducerEvent::Pause(Originator::Local));
    }

    fn resume(&self) {
        let mut state = self.state.get();
        state.resume(Originator::Local);
        self.state.set(state);
        self.emit(ProducerEvent::Resume(Originator::Local));
    }

    fn close(&self) {
        self.closed.set(true);
        self.emit(ProducerEvent::Close(Originator::Local));
    }

    async fn send(
        &self,
        _: &Rc<dyn Transport>,
    ) -> Result<(), EngineError> {
        match &self.send_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn replace_track(&self, track: &Track) -> Result<Track, EngineError> {
        if let Some(e) = self.replace_error.borrow().clone() {
            return Err(e);
        }
        let own =
            FakeTrack::new(format!("{}-engine", track.id()), track.kind());
        self.track.replace(Rc::clone(&own));
        Ok(own)
    }

    fn subscribe(&self) -> LocalBoxStream<'static, ProducerEvent> {
        self.listeners.subscribe()
    }
}

pub struct FakeConsumer {
    pub id: String,
    pub peer: String,
    pub kind: MediaKind,
    pub supported: bool,
    pub state: Cell<PauseState>,
    pub pauses: RefCell<Vec<PauseReason>>,
    pub resumes: Cell<usize>,
    pub received: Cell<bool>,
    pub listeners: Listeners<ConsumerEvent>,
}

impl FakeConsumer {
    pub fn new(id: &str, peer: &str, kind: MediaKind) -> Rc<Self> {
        Self::with_support(id, peer, kind, true)
    }

    pub fn with_support(
        id: &str,
        peer: &str,
        kind: MediaKind,
        supported: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            peer: peer.into(),
            kind,
            supported,
            state: Cell::new(PauseState::default()),
            pauses: RefCell::new(Vec::new()),
            resumes: Cell::new(0),
            received: Cell::new(false),
            listeners: Listeners::default(),
        })
    }

    pub fn emit(&self, event: ConsumerEvent) {
        self.listeners.send_with(|| event);
    }

    pub fn is_paused(&self) -> bool {
        self.state.get().is_paused()
    }
}

#[async_trait(?Send)]
impl Consumer for FakeConsumer {
    fn id(&self) -> ConsumerId {
        ConsumerId(self.id.clone())
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn peer_name(&self) -> String {
        self.peer.clone()
    }

    fn source(&self) -> Option<MediaSource> {
        Some(match self.kind {
            MediaKind::Audio => MediaSource::Mic,
            MediaKind::Video => MediaSource::Webcam,
        })
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn pause_state(&self) -> PauseState {
        self.state.get()
    }

    fn codec(&self) -> Option<String> {
        None
    }

    fn pause(&self, reason: PauseReason) {
        self.pauses.borrow_mut().push(reason);
        let mut state = self.state.get();
        state.pause(Originator::Local);
        self.state.set(state);
    }

    fn resume(&self) {
        self.resumes.set(self.resumes.get() + 1);
        let mut state = self.state.get();
        state.resume(Originator::Local);
        self.state.set(state);
    }

    async fn receive(
        &self,
        _: &Rc<dyn Transport>,
    ) -> Result<Track, EngineError> {
        self.received.set(true);
        Ok(FakeTrack::new(format!("{}-track", self.id), self.kind))
    }

    fn subscribe(&self) -> LocalBoxStream<'static, ConsumerEvent> {
        self.listeners.subscribe()
    }
}

pub struct FakePeer {
    pub name: String,
    pub display_name: String,
    pub consumers: RefCell<Vec<Rc<FakeConsumer>>>,
    pub listeners: Listeners<PeerEvent>,
}

impl FakePeer {
    /// Creates a peer exposing one audio and one video consumer.
    pub fn new(name: &str, display_name: &str) -> Rc<Self> {
        let peer = Self::bare(name, display_name);
        peer.consumers.borrow_mut().extend(
            [MediaKind::Audio, MediaKind::Video].iter().map(|&kind| {
                FakeConsumer::new(&format!("{}-{}", name, kind), name, kind)
            }),
        );
        peer
    }

    /// Creates a peer exposing no consumers.
    pub fn bare(name: &str, display_name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            display_name: display_name.into(),
            consumers: RefCell::new(Vec::new()),
            listeners: Listeners::default(),
        })
    }

    pub fn consumer(&self, kind: MediaKind) -> Rc<FakeConsumer> {
        self.consumers
            .borrow()
            .iter()
            .find(|c| c.kind == kind)
            .cloned()
            .unwrap()
    }

    pub fn add_consumer(&self, consumer: Rc<FakeConsumer>) {
        self.consumers.borrow_mut().push(Rc::clone(&consumer));
        self.listeners.send_with(|| {
            let consumer: Rc<dyn Consumer> = consumer.clone();
            PeerEvent::NewConsumer(consumer)
        });
    }

    pub fn close(&self) {
        self.listeners.send_with(|| PeerEvent::Close(Originator::Remote));
    }
}

impl RemotePeer for FakePeer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn app_data(&self) -> PeerAppData {
        PeerAppData {
            display_name: self.display_name.clone(),
            device: DeviceInfo {
                flag: "chrome".into(),
                name: "Chrome".into(),
                version: "90".into(),
            },
        }
    }

    fn consumers(&self) -> Vec<Rc<dyn Consumer>> {
        self.consumers
            .borrow()
            .iter()
            .map(|c| {
                let c: Rc<dyn Consumer> = c.clone();
                c
            })
            .collect()
    }

    fn subscribe(&self) -> LocalBoxStream<'static, PeerEvent> {
        self.listeners.subscribe()
    }
}

#[derive(Default)]
pub struct FakeEngine {
    pub join_error: RefCell<Option<EngineError>>,
    pub transport_error: RefCell<Option<(TransportDirection, EngineError)>>,
    pub producer_error: RefCell<Option<EngineError>>,
    pub send_error: RefCell<Option<EngineError>>,
    pub cannot_send: RefCell<HashSet<MediaKind>>,
    pub joined: Cell<bool>,
    pub join_calls: Cell<usize>,
    pub left: Cell<bool>,
    pub remote_closes: RefCell<Vec<String>>,
    pub ice_restarts: Cell<usize>,
    pub notifications: RefCell<Vec<Value>>,
    pub remote_peers: RefCell<Vec<Rc<FakePeer>>>,
    pub transports: RefCell<Vec<Rc<FakeTransport>>>,
    pub producers: RefCell<Vec<Rc<FakeProducer>>>,
    pub listeners: Listeners<EngineEvent>,
}

impl FakeEngine {
    /// Announces a new remote peer.
    pub fn new_peer(&self, peer: &Rc<FakePeer>) {
        self.remote_peers.borrow_mut().push(Rc::clone(peer));
        self.listeners.send_with(|| {
            let peer: Rc<dyn RemotePeer> = peer.clone();
            EngineEvent::NewPeer(peer)
        });
    }

    /// Asks the room to relay the provided request to the server.
    pub fn request(
        &self,
        request: Value,
    ) -> Vec<oneshot::Receiver<Result<Value, EngineError>>> {
        let mut replies = Vec::new();
        self.listeners.0.borrow_mut().retain(|tx| {
            let (responder, rx) = EngineResponder::new();
            let sent = tx
                .unbounded_send(EngineEvent::Request {
                    request: request.clone(),
                    responder,
                })
                .is_ok();
            if sent {
                replies.push(rx);
            }
            sent
        });
        replies
    }

    pub fn notify(&self, notification: Value) {
        self.listeners
            .send_with(|| EngineEvent::Notify(notification.clone()));
    }

    pub fn close_remotely(&self) {
        self.listeners
            .send_with(|| EngineEvent::Close(Originator::Remote));
    }

    pub fn transports_of(
        &self,
        direction: TransportDirection,
    ) -> Vec<Rc<FakeTransport>> {
        self.transports
            .borrow()
            .iter()
            .filter(|t| t.direction == direction)
            .cloned()
            .collect()
    }

    pub fn producer(&self, source: MediaSource) -> Rc<FakeProducer> {
        self.producers
            .borrow()
            .iter()
            .rev()
            .find(|p| p.source == source)
            .cloned()
            .unwrap()
    }
}

#[async_trait(?Send)]
impl MediaEngine for FakeEngine {
    async fn join(
        &self,
        _: &str,
        _: PeerAppData,
    ) -> Result<(), EngineError> {
        self.join_calls.set(self.join_calls.get() + 1);
        if let Some(e) = self.join_error.borrow().clone() {
            return Err(e);
        }
        self.joined.set(true);
        Ok(())
    }

    fn create_transport(
        &self,
        direction: TransportDirection,
        _: TransportOptions,
    ) -> Result<Rc<dyn Transport>, EngineError> {
        if let Some((failing, e)) = self.transport_error.borrow().clone() {
            if failing == direction {
                return Err(e);
            }
        }
        let transport = Rc::new(FakeTransport {
            direction,
            closed: Cell::new(false),
        });
        self.transports.borrow_mut().push(Rc::clone(&transport));
        Ok(transport)
    }

    fn create_producer(
        &self,
        track: &Track,
        options: ProducerOptions,
        source: MediaSource,
    ) -> Result<Rc<dyn Producer>, EngineError> {
        if let Some(e) = self.producer_error.borrow().clone() {
            return Err(e);
        }
        let producer = Rc::new(FakeProducer {
            id: format!("{}-{}", source, self.producers.borrow().len()),
            source,
            simulcast: options.simulcast,
            track: RefCell::new(FakeTrack::new(
                format!("{}-engine", track.id()),
                track.kind(),
            )),
            state: Cell::new(PauseState::default()),
            closed: Cell::new(false),
            send_error: self.send_error.borrow().clone(),
            replace_error: RefCell::new(None),
            listeners: Listeners::default(),
        });
        self.producers.borrow_mut().push(Rc::clone(&producer));
        Ok(producer)
    }

    fn can_send(&self, kind: MediaKind) -> bool {
        !self.cannot_send.borrow().contains(&kind)
    }

    fn is_joined(&self) -> bool {
        self.joined.get()
    }

    fn peers(&self) -> Vec<Rc<dyn RemotePeer>> {
        self.remote_peers
            .borrow()
            .iter()
            .map(|p| {
                let p: Rc<dyn RemotePeer> = p.clone();
                p
            })
            .collect()
    }

    fn get_peer_by_name(&self, name: &str) -> Option<Rc<dyn RemotePeer>> {
        self.remote_peers
            .borrow()
            .iter()
            .find(|p| p.name == name)
            .map(|p| {
                let p: Rc<dyn RemotePeer> = p.clone();
                p
            })
    }

    fn leave(&self) {
        self.left.set(true);
        self.joined.set(false);
    }

    fn remote_close(&self, cause: &str) -> Result<(), EngineError> {
        self.remote_closes.borrow_mut().push(cause.into());
        self.joined.set(false);
        Ok(())
    }

    fn receive_notification(
        &self,
        notification: Value,
    ) -> Result<(), EngineError> {
        self.notifications.borrow_mut().push(notification);
        Ok(())
    }

    fn restart_ice(&self) {
        self.ice_restarts.set(self.ice_restarts.get() + 1);
    }

    fn subscribe(&self) -> LocalBoxStream<'static, EngineEvent> {
        self.listeners.subscribe()
    }

    fn remove_all_listeners(&self) {
        self.listeners.clear();
    }
}

#[derive(Default)]
pub struct FakeSignalling {
    pub events: RefCell<Option<mpsc::UnboundedSender<SignallingEvent>>>,
    pub requests: RefCell<Vec<(String, Value)>>,
    pub notifications: RefCell<Vec<(String, Value)>>,
    pub failing: RefCell<HashSet<String>>,
    pub closed: Cell<bool>,
}

impl FakeSignalling {
    fn emit(&self, event: SignallingEvent) {
        if let Some(tx) = self.events.borrow().as_ref() {
            let _ = tx.unbounded_send(event);
        }
    }

    pub fn open(&self) {
        self.emit(SignallingEvent::Open);
    }

    pub fn disconnect(&self) {
        self.emit(SignallingEvent::Disconnected);
    }

    pub fn close_remotely(&self) {
        self.emit(SignallingEvent::Close);
    }

    /// Sends a server request, returning the receiving side of its reply.
    pub fn server_request(
        &self,
        method: &str,
        data: Value,
    ) -> oneshot::Receiver<Response> {
        let (request, rx) = InboundRequest::new(method, data);
        self.emit(SignallingEvent::Request(request));
        rx
    }

    /// Makes every request of the provided method rejected.
    pub fn fail(&self, method: &str) {
        self.failing.borrow_mut().insert(method.into());
    }

    pub fn requests_of(&self, method: &str) -> Vec<Value> {
        self.requests
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, data)| data.clone())
            .collect()
    }
}

#[async_trait(?Send)]
impl SignallingChannel for FakeSignalling {
    async fn request(
        &self,
        method: &str,
        data: Value,
    ) -> Result<Value, SignallingError> {
        self.requests.borrow_mut().push((method.into(), data));
        if self.failing.borrow().contains(method) {
            return Err(SignallingError::Rejected {
                code: 500,
                reason: "boom".into(),
            });
        }
        Ok(json!({}))
    }

    async fn notify(
        &self,
        method: &str,
        data: Value,
    ) -> Result<(), SignallingError> {
        self.notifications.borrow_mut().push((method.into(), data));
        Ok(())
    }

    fn subscribe(&self) -> LocalBoxStream<'static, SignallingEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.events.replace(Some(tx));
        Box::pin(rx)
    }

    fn close(&self) {
        self.closed.set(true);
    }
}

pub struct FakeDevices {
    pub webcams: RefCell<Vec<InputDeviceInfo>>,
    pub audio_error: RefCell<Option<MediaDevicesError>>,
    pub video_error: RefCell<Option<MediaDevicesError>>,
    pub video_requests: RefCell<Vec<VideoConstraints>>,
    pub captured: RefCell<Vec<Rc<FakeTrack>>>,
}

impl Default for FakeDevices {
    fn default() -> Self {
        Self {
            webcams: RefCell::new(vec![
                InputDeviceInfo::video("cam-front", "Front Camera"),
                InputDeviceInfo::video("cam-back", "Back Camera"),
            ]),
            audio_error: RefCell::new(None),
            video_error: RefCell::new(None),
            video_requests: RefCell::new(Vec::new()),
            captured: RefCell::new(Vec::new()),
        }
    }
}

impl FakeDevices {
    fn capture(&self, kind: MediaKind) -> Track {
        let id = format!("capture-{}", self.captured.borrow().len());
        let track = FakeTrack::new(id, kind);
        self.captured.borrow_mut().push(Rc::clone(&track));
        track
    }

    pub fn requested_devices(&self) -> Vec<String> {
        self.video_requests
            .borrow()
            .iter()
            .map(|c| c.device_id.clone())
            .collect()
    }

    pub fn requested_widths(&self) -> Vec<u32> {
        self.video_requests.borrow().iter().map(|c| c.width).collect()
    }
}

#[async_trait(?Send)]
impl MediaDevices for FakeDevices {
    async fn enumerate_devices(
        &self,
    ) -> Result<Vec<InputDeviceInfo>, MediaDevicesError> {
        let mut devices = vec![InputDeviceInfo::audio("mic", "Microphone")];
        devices.extend(self.webcams.borrow().iter().cloned());
        Ok(devices)
    }

    async fn get_user_audio(&self) -> Result<Track, MediaDevicesError> {
        if let Some(e) = self.audio_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.capture(MediaKind::Audio))
    }

    async fn get_user_video(
        &self,
        constraints: VideoConstraints,
    ) -> Result<Track, MediaDevicesError> {
        self.video_requests.borrow_mut().push(constraints);
        if let Some(e) = self.video_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.capture(MediaKind::Video))
    }
}

pub struct FakeScreen {
    pub available: Cell<bool>,
    pub needs_extension: Cell<bool>,
    pub install_error: RefCell<Option<MediaDevicesError>>,
    pub requests: RefCell<Vec<ScreenConstraints>>,
}

impl Default for FakeScreen {
    fn default() -> Self {
        Self {
            available: Cell::new(true),
            needs_extension: Cell::new(false),
            install_error: RefCell::new(None),
            requests: RefCell::new(Vec::new()),
        }
    }
}

#[async_trait(?Send)]
impl ScreenShare for FakeScreen {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn needs_extension(&self) -> bool {
        self.needs_extension.get()
    }

    async fn start(
        &self,
        constraints: ScreenConstraints,
    ) -> Result<Track, MediaDevicesError> {
        self.requests.borrow_mut().push(constraints);
        Ok(FakeTrack::new("screen-capture", MediaKind::Video))
    }

    async fn install_extension(&self) -> Result<(), MediaDevicesError> {
        match self.install_error.borrow().clone() {
            Some(e) => Err(e),
            None => {
                self.needs_extension.set(false);
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct FakePreferences {
    pub webcam_enabled: Cell<Option<bool>>,
    pub display_name: RefCell<Option<String>>,
}

impl Preferences for FakePreferences {
    fn webcam_enabled(&self) -> Option<bool> {
        self.webcam_enabled.get()
    }

    fn set_webcam_enabled(&self, enabled: bool) {
        self.webcam_enabled.set(Some(enabled));
    }

    fn set_display_name(&self, name: &str) {
        self.display_name.replace(Some(name.into()));
    }
}

/// [`RoomObserver`] recording every [`StateUpdate`].
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<StateUpdate>>>);

impl RoomObserver for Recorder {
    fn apply(&self, update: StateUpdate) {
        self.0.borrow_mut().push(update);
    }
}

impl Recorder {
    pub fn updates(&self) -> Vec<StateUpdate> {
        self.0.borrow().clone()
    }

    pub fn count<F: Fn(&StateUpdate) -> bool>(&self, matches: F) -> usize {
        self.0.borrow().iter().filter(|u| matches(u)).count()
    }

    pub fn has<F: Fn(&StateUpdate) -> bool>(&self, matches: F) -> bool {
        self.count(matches) > 0
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.0
            .borrow()
            .iter()
            .filter_map(|u| match u {
                StateUpdate::Notify(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notified(&self, text: &str) -> bool {
        self.notifications().iter().any(|n| n.text == text)
    }

    pub fn notified_starting_with(&self, prefix: &str) -> bool {
        self.notifications().iter().any(|n| n.text.starts_with(prefix))
    }

    pub fn room_states(&self) -> Vec<RoomState> {
        self.0
            .borrow()
            .iter()
            .filter_map(|u| match u {
                StateUpdate::RoomState(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub fn test_conf() -> conf::Room {
    conf::Room {
        leave_grace: Duration::from_millis(1),
        restart_ice_delay: Duration::from_millis(5),
        ..conf::Room::default()
    }
}

/// [`Room`] wired to fakes of all its collaborators.
pub struct Harness {
    pub room: Room,
    pub handle: RoomHandle,
    pub signalling: Rc<FakeSignalling>,
    pub engine: Rc<FakeEngine>,
    pub devices: Rc<FakeDevices>,
    pub screen: Rc<FakeScreen>,
    pub preferences: Rc<FakePreferences>,
    pub observer: Recorder,
}

impl Harness {
    pub fn new(produce: bool) -> Self {
        Self::with_conf(produce, test_conf())
    }

    pub fn with_conf(produce: bool, conf: conf::Room) -> Self {
        let signalling = Rc::new(FakeSignalling::default());
        let engine = Rc::new(FakeEngine::default());
        let devices = Rc::new(FakeDevices::default());
        let screen = Rc::new(FakeScreen::default());
        let preferences = Rc::new(FakePreferences::default());
        let observer = Recorder::default();

        let room = Room::new(
            JoinOptions {
                room_id: "room-1".into(),
                peer_name: "me".into(),
                display_name: "Me".into(),
                device: DeviceInfo::default(),
                produce,
            },
            Collaborators {
                signalling: signalling.clone(),
                engine: engine.clone(),
                devices: devices.clone(),
                screen: screen.clone(),
                preferences: preferences.clone(),
                observer: Rc::new(observer.clone()),
            },
            conf,
        );
        let handle = room.new_handle();

        Self {
            room,
            handle,
            signalling,
            engine,
            devices,
            screen,
            preferences,
            observer,
        }
    }

    /// Opens the signalling and waits for the join to complete.
    pub async fn join(&self) {
        settle().await;
        self.signalling.open();
        settle().await;
    }

    /// Sends a server request and waits for it to be handled.
    pub async fn server_request(
        &self,
        method: &str,
        data: Value,
    ) -> Option<Response> {
        let mut rx = self.signalling.server_request(method, data);
        settle().await;
        rx.try_recv().ok().flatten()
    }
}
