//! C3 - fan `idp::fetch_jwks` across all configured IdPs and merge the result.

use super::pem::cert_to_pem;
use super::{KeyId, KeySet};
use crate::error::AppError;
use crate::idp::{Jwk, fetch_jwks};
use futures::future::join_all;

/// Fans C2 across every configured IdP with join semantics (every branch is
/// awaited regardless of individual failure), then merges the surviving
/// keys. Fails with `NoKeysRetrieved` iff the merged map ends up empty.
pub async fn collect_keys(http: &reqwest::Client, idps: &[String]) -> Result<KeySet, AppError> {
    let fetches = idps
        .iter()
        .map(|base_url| async move { (base_url.as_str(), fetch_jwks(http, base_url).await) });
    let results = join_all(fetches).await;

    let mut keys = KeySet::new();
    for (base_url, result) in results {
        let jwks = match result {
            Ok(jwks) => jwks,
            Err(e) => {
                tracing::warn!(idp = base_url, error = %e, "failed to fetch JWKS, IdP contributes no keys");
                continue;
            }
        };

        for jwk in &jwks.keys {
            match extract_key(jwk) {
                Ok((key_id, pem)) => {
                    // Later writes overwrite earlier ones on KeyId collision.
                    keys.insert(key_id, pem);
                }
                Err(e) => {
                    tracing::warn!(idp = base_url, kid = %jwk.kid, error = %e, "skipping key");
                }
            }
        }
    }

    if keys.is_empty() {
        return Err(AppError::NoKeysRetrieved);
    }
    Ok(keys)
}

fn extract_key(jwk: &Jwk) -> Result<(KeyId, String), AppError> {
    let alg = jwk
        .alg
        .as_deref()
        .ok_or_else(|| AppError::UnsupportedAlgorithm("<missing alg>".to_string()))?;
    let x5c_entry = jwk
        .x5c
        .first()
        .ok_or_else(|| AppError::CertificateParse(format!("kid {} has no x5c entries", jwk.kid)))?;

    let pem = cert_to_pem(x5c_entry, alg)?;
    Ok((KeyId::new(&jwk.kty, &jwk.kid), pem))
}
