//! C2 - discover `jwks_uri` from an IdP's well-known document and fetch its JWKS.

use crate::error::AppError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    #[serde(default = "default_kty")]
    pub kty: String,
    pub kid: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub x5c: Vec<String>,
}

fn default_kty() -> String {
    "RSA".to_string()
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: Option<String>,
}

/// `GET {base_url}/.well-known/openid-configuration`, then `GET` the
/// advertised `jwks_uri`. Non-2xx, non-JSON, or missing `jwks_uri` are all
/// surfaced as errors scoped to this single IdP; callers isolate failures
/// per-branch rather than propagating them.
pub async fn fetch_jwks(http: &reqwest::Client, base_url: &str) -> Result<JwksDocument, AppError> {
    let discovery_url = format!(
        "{}/.well-known/openid-configuration",
        base_url.trim_end_matches('/')
    );

    let resp = http
        .get(&discovery_url)
        .send()
        .await
        .map_err(|e| AppError::HttpFetch(format!("GET {discovery_url}: {e}")))?;
    let resp = resp
        .error_for_status()
        .map_err(|e| AppError::HttpFetch(format!("{discovery_url}: {e}")))?;
    let discovery: DiscoveryDocument = resp
        .json()
        .await
        .map_err(|e| AppError::HttpFetch(format!("parse discovery {discovery_url}: {e}")))?;

    let jwks_uri = discovery
        .jwks_uri
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::DiscoveryMissingJwksUri(base_url.to_string()))?;

    let resp = http
        .get(&jwks_uri)
        .send()
        .await
        .map_err(|e| AppError::HttpFetch(format!("GET {jwks_uri}: {e}")))?;
    let resp = resp
        .error_for_status()
        .map_err(|e| AppError::HttpFetch(format!("{jwks_uri}: {e}")))?;
    resp.json()
        .await
        .map_err(|e| AppError::HttpFetch(format!("parse jwks {jwks_uri}: {e}")))
}
