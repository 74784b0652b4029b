use crate::orchestrator::LinkDirection;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use proctor_core::{IceCandidate, LinkId, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Everything a factory needs to build the transport of one link.
#[derive(Clone)]
pub struct LinkSetup {
    pub link: LinkId,
    pub remote: ParticipantId,
    pub direction: LinkDirection,
    /// Published on `Push` links, ignored otherwise.
    pub local_tracks: Vec<Arc<TrackLocalStaticSample>>,
    pub config: TransportConfig,
}

/// Media path of one link. Descriptions created here are already applied
/// locally when returned.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        setup: LinkSetup,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
