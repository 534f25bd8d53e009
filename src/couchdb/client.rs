//! Shared HTTP Basic auth helpers used by C4 and C5.

use crate::config::Credentials;
use crate::error::AppError;
use serde::de::DeserializeOwned;

pub async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    creds: &Credentials,
) -> Result<T, AppError> {
    let resp = http
        .get(url)
        .basic_auth(&creds.user, Some(&creds.password))
        .send()
        .await
        .map_err(|e| AppError::CouchDbHttp(format!("GET {url}: {e}")))?;
    let resp = resp
        .error_for_status()
        .map_err(|e| AppError::CouchDbHttp(format!("{url}: {e}")))?;
    resp.json()
        .await
        .map_err(|e| AppError::CouchDbHttp(format!("parse {url}: {e}")))
}

/// PUTs `pem_single_line` as a JSON string body. `reqwest`'s `.json()`
/// serializes the string through `serde_json`, which escapes the literal
/// `\n` sequences already in `pem_single_line` into `\\n` - exactly the
/// wire form CouchDB expects, with no manual string surgery needed.
pub async fn put_key(
    http: &reqwest::Client,
    url: &str,
    creds: &Credentials,
    pem_single_line: &str,
) -> Result<(), AppError> {
    let resp = http
        .put(url)
        .basic_auth(&creds.user, Some(&creds.password))
        .json(pem_single_line)
        .send()
        .await
        .map_err(|e| AppError::CouchDbHttp(format!("PUT {url}: {e}")))?;
    resp.error_for_status()
        .map_err(|e| AppError::CouchDbHttp(format!("{url}: {e}")))?;
    Ok(())
}

pub async fn restart_node(
    http: &reqwest::Client,
    url: &str,
    creds: &Credentials,
) -> Result<(), AppError> {
    let resp = http
        .post(url)
        .basic_auth(&creds.user, Some(&creds.password))
        .send()
        .await
        .map_err(|e| AppError::RestartFailed(format!("POST {url}: {e}")))?;
    resp.error_for_status()
        .map_err(|e| AppError::RestartFailed(format!("{url}: {e}")))?;
    Ok(())
}
