use proctor_core::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub enabled: bool,
}

impl TrackInfo {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: true,
        }
    }
}

struct StreamInner {
    id: Uuid,
    owner: ParticipantId,
    tracks: RwLock<Vec<TrackInfo>>,
    live: AtomicBool,
}

type ReleaseFn = Box<dyn FnOnce() + Send + Sync>;

/// Exclusive owner of a media stream.
///
/// Not `Clone`. Releasing (explicitly or on drop) runs the release hook once
/// and revokes every [`StreamView`] handed out.
pub struct StreamHandle {
    inner: Arc<StreamInner>,
    on_release: Option<ReleaseFn>,
}

impl StreamHandle {
    pub fn new(owner: ParticipantId, tracks: Vec<TrackInfo>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: Uuid::new_v4(),
                owner,
                tracks: RwLock::new(tracks),
                live: AtomicBool::new(true),
            }),
            on_release: None,
        }
    }

    /// Hook run exactly once when the stream is released.
    pub fn with_release(mut self, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(release));
        self
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn owner(&self) -> &ParticipantId {
        &self.inner.owner
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    pub fn view(&self) -> StreamView {
        StreamView {
            inner: self.inner.clone(),
        }
    }

    /// Track discovered after the stream was created, replacing one with the same id.
    pub fn add_track(&self, track: TrackInfo) {
        let mut tracks = self.inner.tracks.write().unwrap_or_else(PoisonError::into_inner);
        tracks.retain(|t| t.id != track.id);
        tracks.push(track);
    }

    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        let mut tracks = self.inner.tracks.write().unwrap_or_else(PoisonError::into_inner);
        for track in tracks.iter_mut().filter(|t| t.kind == kind) {
            track.enabled = enabled;
        }
    }

    pub fn release(&mut self) {
        if !self.inner.live.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.inner.id)
            .field("owner", &self.inner.owner)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Read-only reference to a stream owned elsewhere.
#[derive(Clone)]
pub struct StreamView {
    inner: Arc<StreamInner>,
}

impl StreamView {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn owner(&self) -> &ParticipantId {
        &self.inner.owner
    }

    /// `false` once the owning handle released the stream.
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.inner
            .tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_track(&self, kind: TrackKind) -> bool {
        self.tracks().iter().any(|t| t.kind == kind)
    }

    pub fn same_stream(&self, other: &StreamView) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StreamView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamView")
            .field("id", &self.inner.id)
            .field("owner", &self.inner.owner)
            .field("live", &self.is_live())
            .finish()
    }
}
