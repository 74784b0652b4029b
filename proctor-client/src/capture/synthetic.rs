use crate::capture::capture_backend::{CaptureBackend, CaptureConstraints, CaptureDevice, MediaFrame};
use crate::error::CaptureError;
use crate::media::TrackKind;
use async_trait::async_trait;
use bytes::Bytes;
use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

const AUDIO_SAMPLE_RATE: u32 = 48_000;
const AUDIO_FRAME: Duration = Duration::from_millis(20);
const TONE_HZ: f64 = 440.0;
/// Synthetic video is generated at a fraction of the requested resolution.
const VIDEO_SCALE: u32 = 8;

const MIN_FRAME_PERIOD: Duration = Duration::from_millis(1);

fn video_frame_period(frame_rate: u32) -> Duration {
    (Duration::from_secs(1) / frame_rate.max(1)).max(MIN_FRAME_PERIOD)
}

#[derive(Default)]
struct DeviceStats {
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// Deterministic test-pattern camera and microphone.
///
/// Denial and missing devices can be injected to exercise the failure paths.
///
/// Frames are raw RGB and raw 16-bit PCM, not VP8 or Opus. They travel the
/// link at the right pace and size, but a receiver cannot decode them.
#[derive(Clone, Default)]
pub struct SyntheticBackend {
    denial: Option<String>,
    unavailable: Option<TrackKind>,
    stats: Arc<DeviceStats>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open is refused as if the user declined the prompt.
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            denial: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Opening `kind` fails; other kinds work.
    pub fn unavailable(kind: TrackKind) -> Self {
        Self {
            unavailable: Some(kind),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.stats.released.load(Ordering::SeqCst)
    }

    /// Devices currently held.
    pub fn active(&self) -> usize {
        self.opened().saturating_sub(self.released())
    }
}

#[async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn open(
        &self,
        kind: TrackKind,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        if let Some(reason) = &self.denial {
            return Err(CaptureError::PermissionDenied(reason.clone()));
        }
        if self.unavailable == Some(kind) {
            return Err(CaptureError::DeviceUnavailable(kind));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticDevice::new(kind, constraints, self.stats.clone())))
    }
}

struct SyntheticDevice {
    kind: TrackKind,
    width: u32,
    height: u32,
    frame_duration: Duration,
    frame_number: u64,
    ticker: Interval,
    stats: Arc<DeviceStats>,
    released: bool,
}

impl SyntheticDevice {
    fn new(kind: TrackKind, constraints: &CaptureConstraints, stats: Arc<DeviceStats>) -> Self {
        let frame_duration = match kind {
            TrackKind::Video => video_frame_period(constraints.frame_rate),
            TrackKind::Audio => AUDIO_FRAME,
        };
        let mut ticker = tokio::time::interval(frame_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            kind,
            width: (constraints.width / VIDEO_SCALE).max(1),
            height: (constraints.height / VIDEO_SCALE).max(1),
            frame_duration,
            frame_number: 0,
            ticker,
            stats,
            released: false,
        }
    }

    /// RGB gradient shifted by the frame number.
    fn video_frame(&self) -> Vec<u8> {
        let base = (self.frame_number % 256) as u8;
        let mut data = vec![0u8; (self.width * self.height * 3) as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = ((y * self.width + x) * 3) as usize;
                data[idx] = base.wrapping_add((x % 256) as u8);
                data[idx + 1] = base.wrapping_add((y % 256) as u8);
                data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
            }
        }
        data
    }

    /// 16-bit little-endian mono sine tone.
    fn audio_frame(&self) -> Vec<u8> {
        let samples = (AUDIO_SAMPLE_RATE as u64 * AUDIO_FRAME.as_millis() as u64 / 1000) as usize;
        let offset = self.frame_number * samples as u64;
        let mut data = Vec::with_capacity(samples * 2);
        for i in 0..samples {
            let t = (offset + i as u64) as f64 / f64::from(AUDIO_SAMPLE_RATE);
            let value = ((2.0 * PI * TONE_HZ * t).sin() * 0.3 * f64::from(i16::MAX)) as i16;
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }
}

#[async_trait]
impl CaptureDevice for SyntheticDevice {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> String {
        format!("synthetic-{}", self.kind)
    }

    async fn next_frame(&mut self) -> Result<MediaFrame, CaptureError> {
        if self.released {
            return Err(CaptureError::Device("device released".into()));
        }
        self.ticker.tick().await;

        let data = match self.kind {
            TrackKind::Video => self.video_frame(),
            TrackKind::Audio => self.audio_frame(),
        };
        self.frame_number += 1;

        Ok(MediaFrame {
            data: Bytes::from(data),
            duration: self.frame_duration,
        })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}
