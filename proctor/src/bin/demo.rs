//! One proctor watching synthetic candidates over loopback WebRTC, all in
//! one process.
//!
//! `PROCTOR_DEMO_CANDIDATES` sets the number of candidates (default 2),
//! `PROCTOR_DEMO_SECS` how long to watch before everyone leaves (default 10).

use anyhow::{Context, Result};
use proctor::client::{
    CaptureConstraints, CaptureManager, OrchestratorConfig, ParticipantSession, RegistryChange,
    RtcTransportFactory, SyntheticBackend, TransportConfig, TransportFactory,
};
use proctor::server::SignalingHub;
use proctor::{Role, RoomId};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} is not a valid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let candidates: usize = env_or("PROCTOR_DEMO_CANDIDATES", 2)?;
    let watch = Duration::from_secs(env_or("PROCTOR_DEMO_SECS", 10)?);

    let hub = SignalingHub::new();
    let room = RoomId::from("demo-exam");
    let transports: Arc<dyn TransportFactory> = Arc::new(RtcTransportFactory);
    let config = OrchestratorConfig {
        transport: TransportConfig::local_only(),
        ..Default::default()
    };

    let proctor = ParticipantSession::start(
        hub.join(room.clone(), "proctor".into(), Role::Proctor),
        config.clone(),
        transports.clone(),
        None,
    );

    let mut changes = proctor.registry().subscribe();
    let registry = proctor.registry().clone();
    let observer = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(RegistryChange::StreamAttached(id)) => {
                    let tracks = registry.stream(&id).map(|s| s.tracks().len()).unwrap_or_default();
                    info!(candidate = %id, tracks, "Watching candidate");
                }
                Ok(RegistryChange::StreamDetached(id)) => info!(candidate = %id, "Lost candidate feed"),
                Ok(RegistryChange::Cleared) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "Observer fell behind"),
            }
        }
    });

    let mut sessions = Vec::with_capacity(candidates);
    for n in 0..candidates {
        let id = format!("candidate-{}", n + 1);
        let mut capture = CaptureManager::new(
            id.as_str().into(),
            Arc::new(SyntheticBackend::new()),
            CaptureConstraints::default(),
        );
        capture
            .start()
            .await
            .with_context(|| format!("Capture failed for {id}"))?;

        sessions.push(ParticipantSession::start(
            hub.join(room.clone(), id.into(), Role::Candidate),
            config.clone(),
            transports.clone(),
            Some(capture),
        ));
    }

    tokio::select! {
        _ = tokio::time::sleep(watch) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    for link in proctor.links().await? {
        info!(candidate = %link.remote, state = ?link.state, "Final link state");
    }

    for session in sessions {
        session.leave().await;
    }
    proctor.leave().await;
    let _ = observer.await;

    info!(rooms = hub.rooms().len(), "Demo finished");
    Ok(())
}
