//! Errors returned while resolving a live tracer.

/// Error type produced by tracer factories and other collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    #[error("Tracer value {raw:?} should have been a valid URL: {reason}")]
    InvalidIdentifier {
        raw: String,
        reason: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("Unable to extract tracer ID from {raw:?}")]
    MissingSelector { raw: String },

    #[error("Tracer {selector:?} is not registered")]
    UnknownTracer { selector: String },

    #[error("Failed to create tracer {selector:?}: {source}")]
    TracerConstructionFailed {
        selector: String,
        #[source]
        source: BoxError,
    },

    #[error("Live tracer registry has not been installed")]
    RegistryNotInstalled,

    #[error("Live tracer registry is already installed")]
    RegistryAlreadyInstalled,
}
