use proctor_client::{CaptureConstraints, CaptureError, CaptureManager, SyntheticBackend};
use std::sync::Arc;

use crate::integration::init_tracing;

#[tokio::test]
async fn test_denied_capture_holds_nothing() {
    init_tracing();

    let backend = SyntheticBackend::denying("user dismissed the prompt");
    let mut capture = CaptureManager::new(
        "cand-a".into(),
        Arc::new(backend.clone()),
        CaptureConstraints::default(),
    );

    let err = capture.start().await.unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied(reason) if reason.contains("dismissed")));
    assert_eq!(backend.opened(), 0);
    assert!(!capture.is_active());
    assert!(capture.view().is_none());
    assert!(capture.local_media().is_none());
    assert!(matches!(capture.set_audio_enabled(false), Err(CaptureError::NotStarted)));

    // Stopping a capture that never started is harmless.
    capture.stop();
    capture.stop();
}
