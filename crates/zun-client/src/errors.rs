//! Errors related to interacting with the Zun API

use thiserror::Error;

/// Errors surfaced by the capsule client.
///
/// `CapsuleNotFound` is the variant callers are expected to match on: it
/// distinguishes "no such workload" from a request that failed outright.
#[derive(Debug, Error)]
pub enum ZunError {
    /// No capsule exists under the requested name.
    #[error("capsule {name} not found")]
    CapsuleNotFound {
        /// The name the lookup used
        name: String,
    },
    /// A required OS_* environment variable was not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    /// The identity service rejected the credentials.
    #[error("keystone authentication failed: {0}")]
    AuthFailed(String),
    /// The service catalog has no usable endpoint for the requested region.
    #[error("no public {service} endpoint for region {region} in the service catalog")]
    EndpointNotFound {
        /// The catalog service type that was looked for
        service: String,
        /// The region that was requested
        region: String,
    },
    /// The Zun API answered with a non-success status.
    #[error("zun API error ({status}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Response body, if one could be read
        message: String,
    },
    /// The request could not be carried out at all.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}
