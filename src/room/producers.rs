//! Local producers of a [`Room`]: mic, webcam and screen share slots.
//!
//! [`Room`]: super::Room

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use derive_more::{Display, From};
use tracerr::Traced;

use crate::{
    engine::{EngineError, Producer, ProducerEvent, ProducerId, ProducerOptions},
    log::prelude::*,
    media::{
        MediaDevicesError, MediaKind, MediaSource, Track, VideoConstraints,
        WebcamType,
    },
    observer::{Activity, Notification, ProducerInfo, StateUpdate},
    utils::{spawn_watcher, SubscriptionKey},
};

use super::{InnerRoom, RoomError};

/// Errors of a producer creation.
#[derive(Clone, Debug, Display)]
pub enum ProduceError {
    /// Engine doesn't allow sending media of this kind.
    #[display(fmt = "Cannot send {}", _0)]
    CannotSend(MediaKind),

    /// Producer of this source already exists or is being created.
    #[display(fmt = "{} producer already exists", _0)]
    AlreadyExists(MediaSource),

    /// There is no producer of this source.
    #[display(fmt = "There is no {} producer", _0)]
    NotFound(MediaSource),

    /// No camera is available.
    #[display(fmt = "No webcam devices")]
    NoWebcam,

    /// Screen capture is unsupported or requires an extension.
    #[display(fmt = "Screen sharing is not available")]
    ScreenShareUnavailable,

    /// Capturing local media failed.
    #[display(fmt = "{}", _0)]
    CouldNotGetMedia(MediaDevicesError),

    /// Send transport doesn't exist yet.
    #[display(fmt = "Send transport is not created")]
    NoTransport,

    /// Engine failed to create or send the producer.
    #[display(fmt = "{}", _0)]
    Engine(EngineError),

    /// Room was closed while the producer was being created.
    #[display(fmt = "Room was closed")]
    RoomClosed,
}

impl ProduceError {
    /// Returns name of this [`ProduceError`] as it's shown to the user.
    pub fn name(&self) -> String {
        match self {
            Self::CannotSend(_) => "CannotSendError".into(),
            Self::AlreadyExists(_) => "AlreadyExistsError".into(),
            Self::NotFound(_) => "NotFoundError".into(),
            Self::NoWebcam => "NoWebcamError".into(),
            Self::ScreenShareUnavailable => {
                "ScreenShareUnavailableError".into()
            }
            Self::CouldNotGetMedia(e) => e.name().into(),
            Self::NoTransport => "NoTransportError".into(),
            Self::Engine(e) => e.name.clone(),
            Self::RoomClosed => "RoomClosedError".into(),
        }
    }

    /// Returns message of this [`ProduceError`] as it's shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::Engine(e) => e.message.clone(),
            _ => self.to_string(),
        }
    }
}

/// Errors of a webcam track replacement.
#[derive(Clone, Debug, Display, From)]
pub enum ChangeWebcamError {
    /// Webcam is not being produced.
    #[display(fmt = "There is no webcam producer")]
    #[from(ignore)]
    NoWebcamProducer,

    /// No camera is available.
    #[display(fmt = "No webcam devices")]
    #[from(ignore)]
    NoWebcam,

    /// Capturing local media failed.
    #[display(fmt = "{}", _0)]
    CouldNotGetMedia(MediaDevicesError),

    /// Engine failed to replace the track.
    #[display(fmt = "{}", _0)]
    Engine(EngineError),
}

/// State of a single producer slot.
enum Slot {
    /// Producer is being created.
    Reserved,

    /// Producer is created and sent.
    Occupied(Rc<dyn Producer>),
}

/// Single-producer slots of every [`MediaSource`].
#[derive(Default)]
pub(super) struct ProducerSlots(RefCell<HashMap<MediaSource, Slot>>);

impl_debug_by_struct_name!(ProducerSlots);

impl ProducerSlots {
    /// Reserves the slot of the provided [`MediaSource`] for a producer being
    /// created.
    ///
    /// # Errors
    ///
    /// With [`ProduceError::AlreadyExists`] if the slot is occupied or
    /// reserved already.
    pub(super) fn reserve(
        &self,
        source: MediaSource,
    ) -> Result<Reservation<'_>, ProduceError> {
        let mut slots = self.0.borrow_mut();
        if slots.contains_key(&source) {
            return Err(ProduceError::AlreadyExists(source));
        }
        slots.insert(source, Slot::Reserved);
        Ok(Reservation {
            slots: self,
            source,
            filled: false,
        })
    }

    /// Returns the producer occupying the slot of the provided
    /// [`MediaSource`].
    pub(super) fn get(&self, source: MediaSource) -> Option<Rc<dyn Producer>> {
        match self.0.borrow().get(&source) {
            Some(Slot::Occupied(producer)) => Some(Rc::clone(producer)),
            Some(Slot::Reserved) | None => None,
        }
    }

    /// Indicates whether the slot of the provided [`MediaSource`] is
    /// occupied by a created producer.
    pub(super) fn is_occupied(&self, source: MediaSource) -> bool {
        self.get(source).is_some()
    }

    /// Frees the slot of the provided [`MediaSource`], returning the producer
    /// it was occupied by.
    ///
    /// Reservations are left intact.
    pub(super) fn take(&self, source: MediaSource) -> Option<Rc<dyn Producer>> {
        let mut slots = self.0.borrow_mut();
        if let Some(Slot::Occupied(_)) = slots.get(&source) {
            if let Some(Slot::Occupied(producer)) = slots.remove(&source) {
                return Some(producer);
            }
        }
        None
    }

    /// Frees the slot of the provided [`MediaSource`] only if it's occupied
    /// by the producer with the provided [`ProducerId`].
    pub(super) fn release(&self, source: MediaSource, id: &ProducerId) -> bool {
        let mut slots = self.0.borrow_mut();
        let matches = matches!(
            slots.get(&source),
            Some(Slot::Occupied(producer)) if &producer.id() == id
        );
        if matches {
            slots.remove(&source);
        }
        matches
    }

    /// Frees every occupied slot, returning the producers they were
    /// occupied by.
    pub(super) fn take_all(&self) -> Vec<(MediaSource, Rc<dyn Producer>)> {
        [MediaSource::Mic, MediaSource::Webcam, MediaSource::Screen]
            .iter()
            .filter_map(|source| self.take(*source).map(|p| (*source, p)))
            .collect()
    }
}

/// Reserved producer slot.
///
/// Released on [`Drop`] unless filled with a created producer.
pub(super) struct Reservation<'a> {
    slots: &'a ProducerSlots,
    source: MediaSource,
    filled: bool,
}

impl Reservation<'_> {
    /// Occupies the reserved slot with the provided producer.
    pub(super) fn fill(mut self, producer: Rc<dyn Producer>) {
        self.slots
            .0
            .borrow_mut()
            .insert(self.source, Slot::Occupied(producer));
        self.filled = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.filled {
            return;
        }
        let mut slots = self.slots.0.borrow_mut();
        if let Some(Slot::Reserved) = slots.get(&self.source) {
            slots.remove(&self.source);
        }
    }
}

/// Returns the label a producer of the provided [`MediaSource`] is announced
/// with in notifications.
fn source_label(source: MediaSource) -> &'static str {
    match source {
        MediaSource::Mic => "Mic",
        MediaSource::Webcam => "Webcam",
        MediaSource::Screen => "Screen share",
    }
}

impl InnerRoom {
    /// Creates and sends a producer of the provided [`MediaSource`].
    ///
    /// Failures are announced to the user before being returned.
    pub(super) async fn set_producer(
        self: &Rc<Self>,
        source: MediaSource,
    ) -> Result<ProducerId, Traced<ProduceError>> {
        let res = self.create_producer(source).await;
        if let Err(e) = &res {
            let err = e.as_ref();
            error!("Failed to create {} producer: {}", source, err);
            self.notify(Notification::error(format!(
                "{} producer failed: {}:{}",
                source_label(source),
                err.name(),
                err.message(),
            )));
        } else {
            debug!("{} producer created", source);
        }
        res
    }

    async fn create_producer(
        self: &Rc<Self>,
        source: MediaSource,
    ) -> Result<ProducerId, Traced<ProduceError>> {
        if !self.engine.can_send(source.kind()) {
            return Err(tracerr::new!(ProduceError::CannotSend(
                source.kind()
            )));
        }
        let reservation =
            self.producers.reserve(source).map_err(tracerr::wrap!())?;

        let (device_label, webcam_type) = match source {
            MediaSource::Mic => (None, None),
            MediaSource::Webcam => {
                let webcam = self.webcam.borrow();
                let device = webcam
                    .device()
                    .ok_or_else(|| tracerr::new!(ProduceError::NoWebcam))?;
                (
                    Some(device.label.clone()),
                    Some(WebcamType::from_label(&device.label)),
                )
            }
            MediaSource::Screen => (Some("screen".to_owned()), None),
        };

        let track = self.acquire_track(source).await?;
        let options = ProducerOptions {
            simulcast: source == MediaSource::Webcam && self.conf.use_simulcast,
        };
        let producer = self.engine.create_producer(&track, options, source);
        // Engine holds its own handle of the track.
        track.stop();
        let producer = producer
            .map_err(ProduceError::Engine)
            .map_err(tracerr::wrap!())?;

        if let Err(e) = self.send_producer(&producer).await {
            producer.close();
            return Err(e);
        }
        if self.is_closed() {
            producer.close();
            return Err(tracerr::new!(ProduceError::RoomClosed));
        }

        let id = producer.id();
        reservation.fill(Rc::clone(&producer));
        self.emit(StateUpdate::AddProducer(ProducerInfo {
            id: id.clone(),
            source,
            device_label,
            webcam_type,
            pause_state: producer.pause_state(),
            track: producer.track(),
            codec: producer.codec(),
        }));
        self.subscribe_producer(source, producer.as_ref());

        Ok(id)
    }

    /// Captures a local track of the provided [`MediaSource`].
    async fn acquire_track(
        &self,
        source: MediaSource,
    ) -> Result<Track, Traced<ProduceError>> {
        let track = match source {
            MediaSource::Mic => self.devices.get_user_audio().await,
            MediaSource::Webcam => {
                let constraints = self
                    .webcam
                    .borrow()
                    .constraints()
                    .ok_or_else(|| tracerr::new!(ProduceError::NoWebcam))?;
                self.devices.get_user_video(constraints).await
            }
            MediaSource::Screen => {
                if !self.screen.is_available() || self.screen.needs_extension()
                {
                    return Err(tracerr::new!(
                        ProduceError::ScreenShareUnavailable
                    ));
                }
                self.screen.start(self.conf.screen_share).await
            }
        };
        track
            .map_err(ProduceError::CouldNotGetMedia)
            .map_err(tracerr::wrap!())
    }

    /// Sends the provided producer over the send transport.
    async fn send_producer(
        &self,
        producer: &Rc<dyn Producer>,
    ) -> Result<(), Traced<ProduceError>> {
        let transport = self
            .transports
            .send()
            .ok_or_else(|| tracerr::new!(ProduceError::NoTransport))?;
        producer
            .send(&transport)
            .await
            .map_err(ProduceError::Engine)
            .map_err(tracerr::wrap!())
    }

    /// Watches events of the provided producer occupying the slot of the
    /// provided [`MediaSource`].
    fn subscribe_producer(
        self: &Rc<Self>,
        source: MediaSource,
        producer: &dyn Producer,
    ) {
        let id = producer.id();
        let key = SubscriptionKey::Producer(source, id.clone());
        let weak = Rc::downgrade(self);
        let handle = spawn_watcher(producer.subscribe(), move |event| {
            if let Some(room) = weak.upgrade() {
                room.on_producer_event(source, &id, event);
            }
        });
        self.subscriptions.insert(key, handle);
    }

    fn on_producer_event(
        &self,
        source: MediaSource,
        id: &ProducerId,
        event: ProducerEvent,
    ) {
        match event {
            ProducerEvent::Close(originator) => {
                debug!(
                    "{} producer {} closed [originator: {}]",
                    source, id, originator,
                );
                self.subscriptions
                    .remove(&SubscriptionKey::Producer(source, id.clone()));
                if self.producers.release(source, id) {
                    self.emit(StateUpdate::RemoveProducer(id.clone()));
                }
                if source == MediaSource::Screen {
                    self.stop_screen_sharing();
                }
            }
            ProducerEvent::TrackEnded => {
                if source == MediaSource::Screen {
                    debug!("Screen share track ended");
                    self.stop_screen_sharing();
                } else {
                    warn!("{} producer {} track ended", source, id);
                }
            }
            ProducerEvent::Pause(originator) => {
                self.emit(StateUpdate::ProducerPaused(id.clone(), originator));
            }
            ProducerEvent::Resume(originator) => {
                self.emit(StateUpdate::ProducerResumed(
                    id.clone(),
                    originator,
                ));
            }
            ProducerEvent::Handled => {
                debug!("{} producer {} handled", source, id);
            }
            ProducerEvent::Unhandled => {
                debug!("{} producer {} unhandled", source, id);
            }
        }
    }

    /// Closes the producer occupying the slot of the provided
    /// [`MediaSource`], if any.
    pub(super) fn close_producer(&self, source: MediaSource) {
        if let Some(producer) = self.producers.take(source) {
            let id = producer.id();
            self.subscriptions
                .remove(&SubscriptionKey::Producer(source, id.clone()));
            producer.close();
            self.emit(StateUpdate::RemoveProducer(id));
        }
    }

    /// Closes every local producer.
    pub(super) fn close_all_producers(&self) {
        for (source, producer) in self.producers.take_all() {
            let id = producer.id();
            self.subscriptions
                .remove(&SubscriptionKey::Producer(source, id.clone()));
            producer.close();
            self.emit(StateUpdate::RemoveProducer(id));
        }
    }

    fn stop_screen_sharing(&self) {
        self.emit(StateUpdate::InProgress(Activity::ScreenShare, true));
        self.close_producer(MediaSource::Screen);
        self.emit(StateUpdate::InProgress(Activity::ScreenShare, false));
    }

    /// Re-enumerates cameras, publishing whether they can be switched.
    pub(super) async fn update_webcams(
        &self,
    ) -> Result<(), Traced<MediaDevicesError>> {
        let devices = self
            .devices
            .enumerate_devices()
            .await
            .map_err(tracerr::wrap!())?;
        let can_change = {
            let mut webcam = self.webcam.borrow_mut();
            webcam.update(devices);
            debug!("Webcams updated: {:?}", webcam.webcams());
            webcam.can_change()
        };
        self.emit(StateUpdate::CanChangeWebcam(can_change));
        Ok(())
    }

    /// Refreshes cameras and creates the webcam producer.
    pub(super) async fn enable_webcam(
        self: &Rc<Self>,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.preferences.set_webcam_enabled(true);
        self.emit(StateUpdate::InProgress(Activity::Webcam, true));

        if let Err(e) = self.update_webcams().await {
            error!("Failed to update webcams: {}", e);
        }
        let res = self
            .set_producer(MediaSource::Webcam)
            .await
            .map(drop)
            .map_err(tracerr::map_from_and_wrap!());

        self.emit(StateUpdate::InProgress(Activity::Webcam, false));
        res
    }

    /// Closes the webcam producer.
    pub(super) fn disable_webcam(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.preferences.set_webcam_enabled(false);
        self.emit(StateUpdate::InProgress(Activity::Webcam, true));
        self.close_producer(MediaSource::Webcam);
        self.emit(StateUpdate::InProgress(Activity::Webcam, false));
        Ok(())
    }

    /// Creates the screen share producer.
    pub(super) async fn enable_screen_sharing(
        self: &Rc<Self>,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.emit(StateUpdate::InProgress(Activity::ScreenShare, true));
        let res = self
            .set_producer(MediaSource::Screen)
            .await
            .map(drop)
            .map_err(tracerr::map_from_and_wrap!());
        self.emit(StateUpdate::InProgress(Activity::ScreenShare, false));
        res
    }

    /// Closes the screen share producer.
    pub(super) fn disable_screen_sharing(
        &self,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.stop_screen_sharing();
        Ok(())
    }

    /// Pauses or resumes the mic producer locally.
    pub(super) fn set_mic_paused(
        &self,
        paused: bool,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        let mic = self.producers.get(MediaSource::Mic).ok_or_else(|| {
            tracerr::new!(RoomError::from(ProduceError::NotFound(
                MediaSource::Mic
            )))
        })?;
        if paused {
            mic.pause();
        } else {
            mic.resume();
        }
        Ok(())
    }

    /// Switches the webcam producer to the next camera.
    pub(super) async fn change_webcam(&self) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.emit(StateUpdate::InProgress(Activity::Webcam, true));

        let res = self.switch_webcam().await;
        if let Err(e) = &res {
            error!("Failed to change webcam: {}", e);
            self.notify(Notification::error(format!(
                "Could not change webcam: {}",
                e.as_ref(),
            )));
        }

        self.emit(StateUpdate::InProgress(Activity::Webcam, false));
        res.map_err(tracerr::map_from_and_wrap!())
    }

    async fn switch_webcam(&self) -> Result<(), Traced<ChangeWebcamError>> {
        let producer = self
            .producers
            .get(MediaSource::Webcam)
            .ok_or_else(|| tracerr::new!(ChangeWebcamError::NoWebcamProducer))?;

        self.update_webcams()
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        let constraints = {
            let mut webcam = self.webcam.borrow_mut();
            let selected = webcam.advance().map(|d| d.device_id.clone());
            debug!("Selected webcam: {:?}", selected);
            webcam.constraints()
        }
        .ok_or_else(|| tracerr::new!(ChangeWebcamError::NoWebcam))?;

        self.replace_webcam_track(producer.as_ref(), constraints).await
    }

    /// Moves the webcam producer to the next resolution tier.
    pub(super) async fn change_webcam_resolution(
        &self,
    ) -> Result<(), Traced<RoomError>> {
        self.ensure_open()?;
        self.emit(StateUpdate::InProgress(Activity::Webcam, true));

        let res = self.switch_webcam_resolution().await;
        if let Err(e) = &res {
            error!("Failed to change webcam resolution: {}", e);
            self.notify(Notification::error(format!(
                "Could not change webcam resolution: {}",
                e.as_ref(),
            )));
        }

        self.emit(StateUpdate::InProgress(Activity::Webcam, false));
        res.map_err(tracerr::map_from_and_wrap!())
    }

    async fn switch_webcam_resolution(
        &self,
    ) -> Result<(), Traced<ChangeWebcamError>> {
        let producer = self
            .producers
            .get(MediaSource::Webcam)
            .ok_or_else(|| tracerr::new!(ChangeWebcamError::NoWebcamProducer))?;

        let (old, constraints) = {
            let mut webcam = self.webcam.borrow_mut();
            let old = webcam.cycle_resolution();
            debug!("Webcam resolution: {} -> {}", old, webcam.resolution());
            (old, webcam.constraints())
        };
        let res = match constraints {
            Some(constraints) => {
                self.replace_webcam_track(producer.as_ref(), constraints)
                    .await
            }
            None => Err(tracerr::new!(ChangeWebcamError::NoWebcam)),
        };
        if res.is_err() {
            self.webcam.borrow_mut().set_resolution(old);
        }
        res
    }

    /// Captures a new camera track and swaps it into the provided producer.
    ///
    /// The captured handle is stopped only once the swap is done, leaving the
    /// producer intact on any failure.
    async fn replace_webcam_track(
        &self,
        producer: &dyn Producer,
        constraints: VideoConstraints,
    ) -> Result<(), Traced<ChangeWebcamError>> {
        let track = self
            .devices
            .get_user_video(constraints)
            .await
            .map_err(ChangeWebcamError::CouldNotGetMedia)
            .map_err(tracerr::wrap!())?;
        let replaced = producer.replace_track(&track).await;
        track.stop();
        let new_track = replaced
            .map_err(ChangeWebcamError::Engine)
            .map_err(tracerr::wrap!())?;

        self.emit(StateUpdate::ProducerTrack(producer.id(), Some(new_track)));
        Ok(())
    }
}
