pub mod collector;
pub mod pem;

use std::collections::HashMap;
use std::fmt;

/// `"<kty-lowercase>:<kid>"`, e.g. `rsa:abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(kty: &str, kid: &str) -> Self {
        Self(format!("{}:{kid}", kty.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// KeyId -> single-line PEM (literal `\n` separators, not raw newlines).
pub type KeySet = HashMap<KeyId, String>;
