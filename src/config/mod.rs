pub mod api;
pub mod session;

/// Errors raised while validating startup configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Production environment requires HTTPS. Set FORCE_HTTPS=true")]
    HttpsRequired,
    #[error("SESSION_SECRET must be set in production")]
    MissingSessionSecret,
    #[error("SESSION_SECRET must be at least 64 bytes in production")]
    WeakSessionSecret,
    #[error("SESSION_SECRET appears to be a default value. Generate a secure secret!")]
    DefaultSessionSecret,
}
