//! Error taxonomy for the reconciliation pipeline.
//!
//! Each variant corresponds to one row of the error-handling table: most are
//! scoped to a single branch of a fan-out (an IdP, a key, a node) and are
//! logged and absorbed by the caller rather than propagated with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration unreadable: {0}")]
    ConfigUnreadable(String),

    #[error("IdP discovery document has no jwks_uri: {0}")]
    DiscoveryMissingJwksUri(String),

    #[error("HTTP fetch failed: {0}")]
    HttpFetch(String),

    #[error("certificate parse error: {0}")]
    CertificateParse(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("no keys retrieved from any configured IdP")]
    NoKeysRetrieved,

    #[error("CouchDB credentials are not configured")]
    Unauthorized,

    #[error("CouchDB request failed: {0}")]
    CouchDbHttp(String),

    #[error("restart request failed: {0}")]
    RestartFailed(String),

    #[error("failed to bind HTTP listener: {0}")]
    ListenerBind(String),
}
