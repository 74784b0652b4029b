use crate::error::CaptureError;
use crate::media::TrackKind;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            width: 640,
            height: 480,
            frame_rate: 15,
        }
    }
}

impl CaptureConstraints {
    pub fn requested_kinds(&self) -> Vec<TrackKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.video {
            kinds.push(TrackKind::Video);
        }
        if self.audio {
            kinds.push(TrackKind::Audio);
        }
        kinds
    }
}

/// One encoded unit produced by a device.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    pub data: Bytes,
    pub duration: Duration,
}

/// An opened camera or microphone. Paces itself: `next_frame` waits until
/// the next frame is due.
#[async_trait]
pub trait CaptureDevice: Send {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> String;

    async fn next_frame(&mut self) -> Result<MediaFrame, CaptureError>;

    /// Give the hardware back. Called exactly once.
    fn release(&mut self);
}

/// Source of capture devices, e.g. the platform camera stack.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn open(
        &self,
        kind: TrackKind,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError>;
}
