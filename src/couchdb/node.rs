//! C4 - per-node diff, update, and staggered restart.
//!
//! ```text
//! READ -> DIFF -> (no-change? -> DONE)
//!              -> (changed?   -> WRITES -> SCHEDULE_RESTART -> RESTART_SENT -> DONE)
//! ```
//! Any READ/WRITE failure transitions straight to DONE; sibling nodes are
//! unaffected (the caller fans this out with `join_all`, never `try_join`).

use super::client;
use crate::config::Credentials;
use crate::keys::KeySet;
use crate::restart::RestartScheduler;
use crate::status::StatusStore;
use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct NodeRef {
    pub server: String,
    pub node_id: String,
}

impl NodeRef {
    fn config_url(&self) -> String {
        format!("{}/_node/{}/_config/jwt_keys", self.server, self.node_id)
    }

    fn key_url(&self, key_id: &str) -> String {
        format!("{}/_node/{}/_config/jwt_keys/{key_id}", self.server, self.node_id)
    }

    fn restart_url(&self) -> String {
        format!("{}/_node/{}/_restart", self.server, self.node_id)
    }
}

/// Reconciles one node against `desired`. Restart is scheduled iff at least
/// one PUT in this call succeeded (see `DESIGN.md` for why PUT-succeeded,
/// not PUT-issued, gates the restart).
pub async fn reconcile_node(
    http: &reqwest::Client,
    creds: Option<&Credentials>,
    node: &NodeRef,
    desired: &KeySet,
    status: &StatusStore,
    restart_scheduler: &RestartScheduler,
) {
    let Some(creds) = creds else {
        tracing::warn!(server = %node.server, node = %node.node_id, "CouchDB credentials not configured, skipping node");
        return;
    };

    let current: HashMap<String, String> =
        match client::get_json(http, &node.config_url(), creds).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(server = %node.server, node = %node.node_id, error = %e, "failed to read jwt_keys, skipping node");
                return;
            }
        };

    let mut any_put_succeeded = false;
    for (key_id, desired_pem) in desired {
        let key_id = key_id.as_str();
        if current.get(key_id).map(String::as_str) == Some(desired_pem.as_str()) {
            continue;
        }

        let url = node.key_url(key_id);
        match client::put_key(http, &url, creds, desired_pem).await {
            Ok(()) => {
                status.record_write(&url, Utc::now());
                any_put_succeeded = true;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "PUT jwt_keys failed");
            }
        }
    }

    if !any_put_succeeded {
        return;
    }

    let delay = restart_scheduler.next_delay();
    tracing::info!(
        server = %node.server,
        node = %node.node_id,
        delay_secs = delay.as_secs(),
        "scheduling node restart"
    );
    tokio::time::sleep(delay).await;

    if let Err(e) = client::restart_node(http, &node.restart_url(), creds).await {
        tracing::warn!(server = %node.server, node = %node.node_id, error = %e, "restart failed");
    }
}
