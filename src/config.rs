//! Process-level configuration.
//!
//! Only the platform base URLs live here; credentials arrive per request in
//! headers and are never process-level settings. The listen port is read
//! directly in the server binary.

/// Base URLs for the platform services the agent calls out to.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Chat-completion API base, e.g. `https://api.modeldesk.ai/v1`.
    pub api_base: String,
    /// Model catalog base, e.g. `https://api.modeldesk.ai/catalog`.
    pub catalog_base: String,
    /// Signing-key metadata endpoint.
    pub keys_url: String,
}

impl ServiceConfig {
    /// Load from environment variables, with production defaults.
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("MODELDESK_API_BASE")
                .unwrap_or_else(|_| "https://api.modeldesk.ai/v1".into()),
            catalog_base: std::env::var("MODELDESK_CATALOG_BASE")
                .unwrap_or_else(|_| "https://api.modeldesk.ai/catalog".into()),
            keys_url: std::env::var("MODELDESK_KEYS_URL")
                .unwrap_or_else(|_| "https://api.modeldesk.ai/meta/signing_keys".into()),
        }
    }
}
