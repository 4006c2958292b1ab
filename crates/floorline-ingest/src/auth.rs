// SPDX-License-Identifier: Apache-2.0

use crate::IngestError;

pub trait Authenticator: Send + Sync {
    /// `credential` is the bare token, scheme already stripped.
    fn authorize(&self, credential: Option<&str>) -> Result<(), IngestError>;
}

/// Accepts tokens from a fixed allow-list.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    allowed: Vec<String>,
    accept_any: bool,
}

impl StaticTokenAuthenticator {
    #[must_use]
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            accept_any: false,
        }
    }

    /// Any non-empty token passes. Used when a gateway in front already
    /// verified the caller.
    #[must_use]
    pub fn accept_any() -> Self {
        Self {
            allowed: Vec::new(),
            accept_any: true,
        }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authorize(&self, credential: Option<&str>) -> Result<(), IngestError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IngestError::Unauthorized("missing bearer token"))?;
        if self.accept_any || self.allowed.iter().any(|k| k == token) {
            Ok(())
        } else {
            Err(IngestError::Unauthorized("invalid bearer token"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_exact() {
        let auth = StaticTokenAuthenticator::new(vec!["tok-a".into(), " ".into()]);
        assert!(auth.authorize(Some("tok-a")).is_ok());
        assert!(auth.authorize(Some("tok-b")).is_err());
        assert!(auth.authorize(Some("")).is_err());
        assert!(auth.authorize(None).is_err());
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let auth = StaticTokenAuthenticator::new(Vec::new());
        assert!(auth.authorize(Some("anything")).is_err());
    }

    #[test]
    fn accept_any_still_needs_a_token() {
        let auth = StaticTokenAuthenticator::accept_any();
        assert!(auth.authorize(Some("anything")).is_ok());
        assert!(auth.authorize(Some("   ")).is_err());
        assert!(auth.authorize(None).is_err());
    }
}
