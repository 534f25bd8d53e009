//! C5 - discover a CouchDB server's cluster membership and fan C4 across it.

use super::client;
use super::node::{NodeRef, reconcile_node};
use crate::config::Credentials;
use crate::keys::KeySet;
use crate::restart::RestartScheduler;
use crate::status::StatusStore;
use futures::future::join_all;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Membership {
    #[serde(default)]
    cluster_nodes: Vec<String>,
}

/// `GET {server}/_membership`, then reconciles every member node with join
/// semantics so one unreachable node never blocks its siblings.
pub async fn reconcile_server(
    http: &reqwest::Client,
    creds: Option<&Credentials>,
    server: &str,
    desired: &KeySet,
    status: &StatusStore,
    restart_scheduler: &RestartScheduler,
) {
    let Some(creds_ref) = creds else {
        tracing::warn!(server, "CouchDB credentials not configured, skipping server");
        return;
    };

    let membership_url = format!("{server}/_membership");
    let membership: Membership = match client::get_json(http, &membership_url, creds_ref).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(server, error = %e, "failed to read cluster membership, skipping server");
            return;
        }
    };

    if membership.cluster_nodes.is_empty() {
        tracing::warn!(server, "cluster membership reports no nodes");
        return;
    }

    let tasks = membership.cluster_nodes.into_iter().map(|node_id| {
        let node = NodeRef {
            server: server.to_string(),
            node_id,
        };
        reconcile_node(http, creds, &node, desired, status, restart_scheduler)
    });
    join_all(tasks).await;
}
