use proctor_client::{CaptureConstraints, CaptureManager, SyntheticBackend, TrackKind};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{WAIT_TIMEOUT_MS, eventually};

#[tokio::test]
async fn test_mute_and_stop() {
    init_tracing();

    let backend = SyntheticBackend::new();
    let mut capture = CaptureManager::new(
        "cand-a".into(),
        Arc::new(backend.clone()),
        CaptureConstraints::default(),
    );

    let view = capture.start().await.unwrap();
    assert!(view.is_live());
    assert_eq!(backend.active(), 2);
    assert_eq!(capture.local_media().unwrap().tracks.len(), 2);

    // Starting twice reuses the devices.
    let again = capture.start().await.unwrap();
    assert!(again.same_stream(&view));
    assert_eq!(backend.opened(), 2);

    capture.set_audio_enabled(false).unwrap();
    let enabled = |kind| {
        view.tracks()
            .into_iter()
            .find(|t| t.kind == kind)
            .map(|t| t.enabled)
    };
    assert_eq!(enabled(TrackKind::Audio), Some(false));
    assert_eq!(enabled(TrackKind::Video), Some(true));

    capture.set_video_enabled(false).unwrap();
    capture.set_audio_enabled(true).unwrap();
    assert_eq!(enabled(TrackKind::Audio), Some(true));
    assert_eq!(enabled(TrackKind::Video), Some(false));

    capture.stop();
    assert!(!view.is_live());
    assert!(!capture.is_active());
    assert!(eventually(WAIT_TIMEOUT_MS, || backend.active() == 0).await);
    assert_eq!(backend.released(), 2);

    capture.stop();
    assert_eq!(backend.released(), 2, "Devices are released exactly once");
}
