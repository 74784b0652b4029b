use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub transport: TransportConfig,
    /// Proctor side: answer candidates that ask for this proctor's camera.
    #[serde(default)]
    pub push_camera: bool,
    /// Candidate side: pull the camera of every proctor in the room.
    #[serde(default)]
    pub accept_proctor_feed: bool,
    /// Optional per-link cap on candidates held before their offer arrives.
    /// Unbounded by default; the queue is dropped when its sender leaves.
    #[serde(default)]
    pub max_orphan_candidates: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            push_camera: false,
            accept_proctor_feed: false,
            max_orphan_candidates: None,
        }
    }
}
