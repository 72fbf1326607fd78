use medea_room_client::{
    engine::{EngineError, ProducerEvent},
    media::{MediaKind, MediaSource},
    observer::{Activity, StateUpdate},
    room::ProduceError,
    state::Originator,
    RoomError,
};

use crate::{
    fakes::{settle, Harness},
    local,
};

#[tokio::test]
async fn second_webcam_fails_and_keeps_first() {
    local(async {
        let h = Harness::new(false);
        h.join().await;

        let (first, second) = futures::join!(
            h.handle.enable_webcam(),
            h.handle.enable_webcam(),
        );

        assert!(first.is_ok());
        let err = second.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            RoomError::Produce(ProduceError::AlreadyExists(
                MediaSource::Webcam
            )),
        ));
        assert_eq!(h.engine.producers.borrow().len(), 1);
        assert!(!h.engine.producer(MediaSource::Webcam).closed.get());
        assert!(h.room.has_producer(MediaSource::Webcam));
        assert!(h.observer.notified_starting_with(
            "Webcam producer failed: AlreadyExistsError:"
        ));
    })
    .await;
}

#[tokio::test]
async fn webcam_without_cameras_fails_with_device_error() {
    local(async {
        let h = Harness::new(false);
        h.devices.webcams.borrow_mut().clear();
        h.join().await;

        let err = h.handle.enable_webcam().await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            RoomError::Produce(ProduceError::NoWebcam),
        ));
        assert!(!h.room.has_producer(MediaSource::Webcam));
        assert!(h
            .observer
            .has(|u| matches!(u, StateUpdate::CanChangeWebcam(false))));
        assert!(h.observer.notified(
            "Webcam producer failed: NoWebcamError:No webcam devices"
        ));
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::InProgress(Activity::Webcam, false)
        )));
    })
    .await;
}

#[tokio::test]
async fn refuses_unsendable_kind() {
    local(async {
        let h = Harness::new(false);
        h.engine.cannot_send.borrow_mut().insert(MediaKind::Video);
        h.join().await;

        let err = h.handle.enable_webcam().await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            RoomError::Produce(ProduceError::CannotSend(MediaKind::Video)),
        ));
        assert!(h.devices.video_requests.borrow().is_empty());
    })
    .await;
}

#[tokio::test]
async fn send_failure_closes_partial_producer() {
    local(async {
        let h = Harness::new(false);
        h.join().await;
        h.engine
            .send_error
            .replace(Some(EngineError::new("SendError", "no dtls")));

        let err = h.handle.enable_webcam().await.unwrap_err();

        assert_eq!(err.as_ref().name(), "SendError");
        assert!(h.engine.producer(MediaSource::Webcam).closed.get());
        assert!(!h.room.has_producer(MediaSource::Webcam));
        assert!(h
            .observer
            .notified("Webcam producer failed: SendError:no dtls"));
        assert!(h.devices.captured.borrow().iter().all(|t| t.stopped.get()));

        h.engine.send_error.replace(None);
        h.handle.enable_webcam().await.unwrap();

        assert!(h.room.has_producer(MediaSource::Webcam));
    })
    .await;
}

#[tokio::test]
async fn simulcast_is_only_for_webcam() {
    local(async {
        let h = Harness::new(true);
        h.join().await;

        h.handle.enable_screen_sharing().await.unwrap();

        assert!(h.engine.producer(MediaSource::Webcam).simulcast);
        assert!(!h.engine.producer(MediaSource::Mic).simulcast);
        assert!(!h.engine.producer(MediaSource::Screen).simulcast);
    })
    .await;
}

#[tokio::test]
async fn capture_handles_are_stopped_after_producing() {
    local(async {
        let h = Harness::new(true);

        h.join().await;

        let captured = h.devices.captured.borrow();
        assert_eq!(captured.len(), 2);
        assert!(captured.iter().all(|t| t.stopped.get()));
    })
    .await;
}

#[tokio::test]
async fn ended_screen_track_stops_sharing() {
    local(async {
        let h = Harness::new(false);
        h.join().await;

        h.handle.enable_screen_sharing().await.unwrap();
        assert!(h.room.has_producer(MediaSource::Screen));
        assert_eq!(h.screen.requests.borrow()[0].width, 1280);
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::AddProducer(p)
                if p.source == MediaSource::Screen
                    && p.device_label.as_deref() == Some("screen")
        )));

        let producer = h.engine.producer(MediaSource::Screen);
        h.observer.clear();
        producer.emit(ProducerEvent::TrackEnded);
        settle().await;

        assert!(!h.room.has_producer(MediaSource::Screen));
        assert!(producer.closed.get());
        assert_eq!(
            h.observer
                .count(|u| matches!(u, StateUpdate::RemoveProducer(_))),
            1,
        );
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::InProgress(Activity::ScreenShare, false)
        )));
    })
    .await;
}

#[tokio::test]
async fn screen_sharing_needs_extension() {
    local(async {
        let h = Harness::new(false);
        h.screen.needs_extension.set(true);
        h.join().await;

        let err = h.handle.enable_screen_sharing().await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            RoomError::Produce(ProduceError::ScreenShareUnavailable),
        ));

        h.handle.install_extension().await.unwrap();
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::ScreenCapabilities {
                can_share_screen: true,
                need_extension: false,
            }
        )));
        h.handle.enable_screen_sharing().await.unwrap();
        assert!(h.room.has_producer(MediaSource::Screen));
    })
    .await;
}

#[tokio::test]
async fn remote_close_frees_slot() {
    local(async {
        let h = Harness::new(true);
        h.join().await;
        let webcam = h.engine.producer(MediaSource::Webcam);

        webcam.emit(ProducerEvent::Close(Originator::Remote));
        settle().await;

        assert!(!h.room.has_producer(MediaSource::Webcam));
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::RemoveProducer(id) if id.0 == webcam.id
        )));
        h.handle.enable_webcam().await.unwrap();
        assert!(h.room.has_producer(MediaSource::Webcam));
    })
    .await;
}

#[tokio::test]
async fn mutes_and_unmutes_mic() {
    local(async {
        let h = Harness::new(true);
        h.join().await;
        let mic = h.engine.producer(MediaSource::Mic);

        h.handle.mute_mic().unwrap();
        settle().await;
        assert!(mic.state.get().locally_paused);
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::ProducerPaused(_, Originator::Local)
        )));

        h.handle.unmute_mic().unwrap();
        settle().await;
        assert!(!mic.state.get().is_paused());
        assert!(h.observer.has(|u| matches!(
            u,
            StateUpdate::ProducerResumed(_, Originator::Local)
        )));
    })
    .await;
}

#[tokio::test]
async fn muting_missing_mic_fails() {
    local(async {
        let h = Harness::new(false);
        h.join().await;

        let err = h.handle.mute_mic().unwrap_err();

        assert!(matches!(
            err.as_ref(),
            RoomError::Produce(ProduceError::NotFound(MediaSource::Mic)),
        ));
    })
    .await;
}

#[tokio::test]
async fn disabling_webcam_persists_choice() {
    local(async {
        let h = Harness::new(true);
        h.join().await;

        h.handle.disable_webcam().unwrap();

        assert!(!h.room.has_producer(MediaSource::Webcam));
        assert!(h.engine.producer(MediaSource::Webcam).closed.get());
        assert_eq!(h.preferences.webcam_enabled.get(), Some(false));
    })
    .await;
}
