// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pulseoned`: loads the daemon configuration, wires up repositories
//! and the worker factory, starts a worker for every enabled device on
//! record, and runs until interrupted.

use pulseone_core::{Clock, SystemClock};
use pulseone_daemon::{DaemonConfig, Runtime};
use pulseone_storage::FakeSqlStore;
use pulseone_wire::fake::{FakePipelineSink, FakeStatusPublisher};
use pulseone_wire::{PipelineSink, StatusPublisher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "pulseone.toml";
const PIPELINE_QUEUE_CAPACITY: usize = 10_000;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "pulseone_daemon=info,pulseone_worker=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("PULSEONE_CONFIG").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match DaemonConfig::load(&config_path) {
        Ok(config) => {
            tracing::info!(path = %config_path.display(), "loaded daemon configuration");
            config
        }
        Err(e) => {
            tracing::warn!(path = %config_path.display(), error = %e, "no usable config file, starting with defaults");
            DaemonConfig::default()
        }
    };

    let store = Arc::new(FakeSqlStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let pipeline: Arc<dyn PipelineSink> = Arc::new(FakePipelineSink::new(PIPELINE_QUEUE_CAPACITY));
    let status_publisher: Option<Arc<dyn StatusPublisher>> =
        config.sinks.status_publisher_enabled.then(|| Arc::new(FakeStatusPublisher::default()) as Arc<dyn StatusPublisher>);

    let runtime = Runtime::new(store, clock, &config, pipeline, status_publisher);
    let started = runtime.start_all(config.max_devices_at_startup);
    tracing::info!(
        workers_started = started.len(),
        protocols = ?runtime.registered_protocols(),
        "pulseoned is running"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler, shutting down immediately");
    }
    tracing::info!("shutdown signal received, stopping workers");
    runtime.stop_all().await;
}
