use crate::capture::capture_backend::{CaptureBackend, CaptureConstraints, CaptureDevice};
use crate::error::CaptureError;
use crate::media::{StreamHandle, StreamView, TrackInfo, TrackKind};
use proctor_core::ParticipantId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Local capture as seen by links that publish it.
#[derive(Clone)]
pub struct LocalMedia {
    pub view: StreamView,
    pub tracks: Vec<Arc<TrackLocalStaticSample>>,
}

struct LocalTrack {
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
}

struct ActiveCapture {
    handle: StreamHandle,
    tracks: Vec<LocalTrack>,
}

/// Releases the device however the pump task ends, abort included.
struct DeviceGuard(Box<dyn CaptureDevice>);

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        debug!(device = %self.0.label(), "Releasing capture device");
        self.0.release();
    }
}

/// Acquires and releases the local camera and microphone of one participant.
pub struct CaptureManager {
    owner: ParticipantId,
    backend: Arc<dyn CaptureBackend>,
    constraints: CaptureConstraints,
    active: Option<ActiveCapture>,
}

impl CaptureManager {
    pub fn new(
        owner: ParticipantId,
        backend: Arc<dyn CaptureBackend>,
        constraints: CaptureConstraints,
    ) -> Self {
        Self {
            owner,
            backend,
            constraints,
            active: None,
        }
    }

    /// Open every requested device. On failure nothing stays open.
    pub async fn start(&mut self) -> Result<StreamView, CaptureError> {
        if let Some(active) = &self.active {
            return Ok(active.handle.view());
        }

        let mut devices = Vec::new();
        for kind in self.constraints.requested_kinds() {
            match self.backend.open(kind, &self.constraints).await {
                Ok(device) => devices.push(DeviceGuard(device)),
                Err(e) => {
                    warn!(owner = %self.owner, %kind, "Capture failed: {}", e);
                    return Err(e);
                }
            }
        }
        if devices.is_empty() {
            return Err(CaptureError::Device("no tracks requested".into()));
        }

        let mut tracks = Vec::with_capacity(devices.len());
        let mut infos = Vec::with_capacity(devices.len());
        let mut pumps = Vec::with_capacity(devices.len());

        for device in devices {
            let kind = device.0.kind();
            let track = Arc::new(TrackLocalStaticSample::new(
                codec_for(kind),
                format!("{}-{}", self.owner, kind),
                self.owner.to_string(),
            ));
            let enabled = Arc::new(AtomicBool::new(true));

            infos.push(TrackInfo::new(format!("{}-{}", self.owner, kind), kind));
            pumps.push(tokio::spawn(pump(device, track.clone(), enabled.clone())).abort_handle());
            tracks.push(LocalTrack {
                kind,
                track,
                enabled,
            });
        }

        let handle = StreamHandle::new(self.owner.clone(), infos).with_release(move || {
            for pump in pumps {
                pump.abort();
            }
        });
        let view = handle.view();
        info!(owner = %self.owner, tracks = tracks.len(), "Capture started");

        self.active = Some(ActiveCapture { handle, tracks });
        Ok(view)
    }

    /// Release every device. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.handle.release();
            info!(owner = %self.owner, "Capture stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn view(&self) -> Option<StreamView> {
        self.active.as_ref().map(|a| a.handle.view())
    }

    pub fn local_media(&self) -> Option<LocalMedia> {
        self.active.as_ref().map(|a| LocalMedia {
            view: a.handle.view(),
            tracks: a.tracks.iter().map(|t| t.track.clone()).collect(),
        })
    }

    pub fn set_audio_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        self.set_enabled(TrackKind::Audio, enabled)
    }

    pub fn set_video_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        self.set_enabled(TrackKind::Video, enabled)
    }

    fn set_enabled(&self, kind: TrackKind, enabled: bool) -> Result<(), CaptureError> {
        let active = self.active.as_ref().ok_or(CaptureError::NotStarted)?;
        for track in active.tracks.iter().filter(|t| t.kind == kind) {
            track.enabled.store(enabled, Ordering::Release);
        }
        active.handle.set_enabled(kind, enabled);
        debug!(owner = %self.owner, %kind, enabled, "Track toggled");
        Ok(())
    }
}

impl Drop for CaptureManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
    }
}

async fn pump(
    mut device: DeviceGuard,
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
) {
    loop {
        let frame = match device.0.next_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(device = %device.0.label(), "Capture device stopped: {}", e);
                return;
            }
        };

        // Muted tracks keep pacing but send nothing.
        if !enabled.load(Ordering::Acquire) {
            continue;
        }

        let sample = Sample {
            data: frame.data,
            duration: frame.duration,
            ..Default::default()
        };
        if let Err(e) = track.write_sample(&sample).await {
            debug!(device = %device.0.label(), "Dropping sample: {}", e);
        }
    }
}
