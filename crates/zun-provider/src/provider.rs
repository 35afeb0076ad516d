//! The provider surface exposed to a kubelet.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;
use tracing::debug;
use zun_client::{Client, ZunError};

use crate::config::Config;
use crate::pod::{capsule_to_pod, Pod};

/// A mapping of resource name to quantity, as reported to the control plane.
pub type ResourceList = BTreeMap<String, Quantity>;

/// A back-end for a kubelet, read path only.
///
/// A provider answers two questions about its backend: what is the observed
/// state of a given workload, and how much capacity does the backend offer.
/// Execution, deletion and log streaming are out of scope here.
#[async_trait]
pub trait Provider {
    /// Arch returns a string specifying what architecture this provider supports
    const ARCH: &'static str;

    /// Look up the observed state of the workload with the given identity.
    async fn pod(&self, namespace: &str, name: &str) -> Result<Pod, ProviderError>;

    /// The resource capacity this backend offers to the control plane.
    fn capacity(&self) -> ResourceList;
}

/// ZunProvider serves pod lookups from an OpenStack Zun deployment, with
/// each pod backed by one capsule.
pub struct ZunProvider {
    client: Client,
    node_name: String,
    operating_system: String,
    capacity: ResourceList,
}

impl ZunProvider {
    /// Create a provider over an authenticated capsule client.
    pub fn new(client: Client, config: &Config) -> Self {
        ZunProvider {
            client,
            node_name: config.node_name.clone(),
            operating_system: config.operating_system.clone(),
            capacity: static_capacity(config),
        }
    }

    /// The name of the node this provider registers as.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// The operating system advertised for the node.
    pub fn operating_system(&self) -> &str {
        &self.operating_system
    }
}

#[async_trait]
impl Provider for ZunProvider {
    const ARCH: &'static str = "amd64";

    async fn pod(&self, namespace: &str, name: &str) -> Result<Pod, ProviderError> {
        // Capsules live in one flat backend namespace, so they are created
        // under a composite name.
        let capsule_name = format!("{}-{}", namespace, name);
        debug!(%namespace, %name, %capsule_name, "looking up capsule");
        let capsule = self
            .client
            .capsule(&capsule_name)
            .await
            .map_err(|err| match err {
                ZunError::CapsuleNotFound { .. } => ProviderError::PodNotFound {
                    pod_name: name.to_owned(),
                },
                other => ProviderError::Zun(other),
            })?;
        Ok(capsule_to_pod(&capsule))
    }

    fn capacity(&self) -> ResourceList {
        self.capacity.clone()
    }
}

// Capacity is a static read of configured limits, not something measured
// from the backend.
fn static_capacity(config: &Config) -> ResourceList {
    let mut resources = ResourceList::new();
    resources.insert("cpu".to_owned(), Quantity(config.cpu.clone()));
    resources.insert("memory".to_owned(), Quantity(config.memory.clone()));
    resources.insert("pods".to_owned(), Quantity(config.max_pods.to_string()));
    resources
}

/// A Provider error
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Pod was not found
    #[error("cannot find pod {pod_name}")]
    PodNotFound {
        /// The pod's name
        pod_name: String,
    },
    /// The capsule lookup failed before any translation could happen.
    #[error(transparent)]
    Zun(#[from] ZunError),
}
