//! C6 - periodic driver: collect keys, then fan out to every CouchDB server.

use crate::config::{Config, Credentials};
use crate::couchdb::cluster::reconcile_server;
use crate::keys::collector::collect_keys;
use crate::restart::RestartScheduler;
use crate::status::StatusStore;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const STARTUP_DELAY: Duration = Duration::from_secs(10);

pub struct Reconciler {
    http: reqwest::Client,
    config: Config,
    creds: Option<Credentials>,
    status: StatusStore,
    tick_gate: Mutex<()>,
}

impl Reconciler {
    pub fn new(config: Config, creds: Option<Credentials>, status: StatusStore) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            config,
            creds,
            status,
            tick_gate: Mutex::new(()),
        })
    }

    /// Runs forever: waits out the startup delay, then ticks on
    /// `update_interval_seconds`. A tick already in flight when the next one
    /// fires is skipped rather than queued, so overlapping runs never pile up.
    pub async fn run(self: Arc<Self>) {
        tokio::time::sleep(STARTUP_DELAY).await;

        let mut interval = tokio::time::interval(Duration::from_secs(
            self.config.update_interval_seconds.max(1),
        ));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Ok(_permit) = self.tick_gate.try_lock() else {
                tracing::warn!("previous tick still running, skipping this one");
                continue;
            };
            self.tick().await;
        }
    }

    async fn tick(&self) {
        let started = Instant::now();
        tracing::info!("reconciliation tick starting");

        let desired = match collect_keys(&self.http, &self.config.idps).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "no keys collected this tick, skipping");
                return;
            }
        };

        // One scheduler per tick, shared across every server/node reconciled
        // in it, so restarts triggered this tick are staggered as a whole.
        let restart_scheduler = RestartScheduler::new();

        let servers = self.config.couchdb_servers.iter().map(|server| {
            reconcile_server(
                &self.http,
                self.creds.as_ref(),
                server,
                &desired,
                &self.status,
                &restart_scheduler,
            )
        });
        join_all(servers).await;

        tracing::info!(elapsed_ms = started.elapsed().as_millis(), "reconciliation tick finished");
    }
}
