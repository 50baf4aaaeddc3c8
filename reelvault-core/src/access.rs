//! API key check for the protected operations (listing and deleting)

use subtle::ConstantTimeEq;

use crate::error::AccessError;

/// Holds the configured API key, if any
#[derive(Clone, Default)]
pub struct ApiKeyGuard {
    key: Option<String>,
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("configured", &self.key.is_some())
            .finish()
    }
}

impl ApiKeyGuard {
    /// An empty key counts as not configured
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn authorize(&self, provided: Option<&str>) -> Result<(), AccessError> {
        let Some(expected) = self.key.as_deref() else {
            tracing::error!("API key is not configured");
            return Err(AccessError::Misconfigured);
        };
        let provided = provided.unwrap_or_default();
        if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}
