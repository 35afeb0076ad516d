//! Translation of Zun capsules into the Kubernetes pod API.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container as KubeContainer, ContainerStatus as KubeContainerStatus, Pod as KubePod, PodSpec,
    PodStatus, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use zun_client::{Capsule, Container};

use crate::status::{capsule_phase, container_phase, container_state, Phase};

/// A Kubernetes Pod
///
/// This is a new type around the k8s_openapi Pod definition
/// providing convenient accessor methods
#[derive(Default, Debug, Clone)]
pub struct Pod(KubePod);

impl Pod {
    /// Construct a new Pod
    pub fn new(inner: KubePod) -> Self {
        Self(inner)
    }

    /// Get the name of the pod
    pub fn name(&self) -> &str {
        self.0.metadata.name.as_deref().unwrap_or_default()
    }

    /// Get the pod's namespace
    ///
    /// Returns "default" if no namespace was explicitly set
    pub fn namespace(&self) -> &str {
        self.0.metadata.namespace.as_deref().unwrap_or("default")
    }

    /// Get the name of the node the workload is assigned to
    pub fn node_name(&self) -> Option<&str> {
        self.0.spec.as_ref()?.node_name.as_deref()
    }

    /// Get the pod's ip
    pub fn pod_ip(&self) -> Option<&str> {
        self.0.status.as_ref()?.pod_ip.as_deref()
    }

    /// Get the pod's observed phase
    pub fn phase(&self) -> Option<&str> {
        self.0.status.as_ref()?.phase.as_deref()
    }

    /// Get the pod's observed container statuses
    pub fn container_statuses(&self) -> Option<&Vec<KubeContainerStatus>> {
        self.0.status.as_ref()?.container_statuses.as_ref()
    }

    /// Turn the Pod into the Kubernetes API version of a Pod
    pub fn into_kube_pod(self) -> KubePod {
        self.0
    }

    /// Turn a reference to a Pod into a reference to the Kubernetes API version of a Pod
    pub fn as_kube_pod(&self) -> &KubePod {
        &self.0
    }
}

impl std::convert::From<KubePod> for Pod {
    fn from(api_pod: KubePod) -> Self {
        Self(api_pod)
    }
}

impl std::convert::From<Pod> for KubePod {
    fn from(pod: Pod) -> Self {
        pod.0
    }
}

/// Translate a capsule into a Kubernetes pod.
///
/// The translation is a pure function of the capsule: identity comes from
/// the capsule's meta labels, timestamps from its creation and update times,
/// and every status field goes through the classifiers in [`crate::status`].
/// It cannot fail; gaps in the capsule data fall back to documented defaults
/// instead of aborting the lookup.
pub fn capsule_to_pod(capsule: &Capsule) -> Pod {
    let mut containers = Vec::with_capacity(capsule.containers.len());
    let mut container_statuses = Vec::with_capacity(capsule.containers.len());
    for container in &capsule.containers {
        containers.push(container_spec(container));
        container_statuses.push(container_status(container));
    }

    // Zun records no capsule start time; the update time is the closest
    // available substitute.
    let start_time = capsule.updated_at.map(Time);

    Pod::new(KubePod {
        metadata: ObjectMeta {
            name: meta_label(capsule, "PodName"),
            namespace: meta_label(capsule, "Namespace"),
            cluster_name: meta_label(capsule, "ClusterName"),
            uid: Some(capsule.uuid.clone()),
            creation_timestamp: capsule.created_at.map(Time),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: meta_label(capsule, "NodeName"),
            containers,
            volumes: Some(Vec::new()),
            ..Default::default()
        }),
        status: Some(PodStatus {
            // The aggregate phase is classified from the capsule's own
            // status, independent of the per-container states below.
            phase: Some(capsule_phase(&capsule.status).to_string()),
            pod_ip: Some(primary_ipv4(capsule)),
            start_time,
            container_statuses: Some(container_statuses),
            ..Default::default()
        }),
    })
}

fn meta_label(capsule: &Capsule, key: &str) -> Option<String> {
    capsule.meta_labels.get(key).cloned()
}

// First IPv4 address attached to the capsule, or an empty string when it has
// none. Addresses are scanned in network-id order.
fn primary_ipv4(capsule: &Capsule) -> String {
    capsule
        .addresses
        .values()
        .flatten()
        .find(|address| address.version == 4.0)
        .map(|address| address.addr.clone())
        .unwrap_or_default()
}

fn container_spec(container: &Container) -> KubeContainer {
    let mut limits = BTreeMap::new();
    limits.insert(
        "cpu".to_owned(),
        Quantity(format!("{}", container.cpu as i64)),
    );
    limits.insert("memory".to_owned(), Quantity(format!("{}G", container.memory)));

    // The request scales the declared cpu into shares; Zun declares no
    // separate memory request.
    let mut requests = BTreeMap::new();
    requests.insert(
        "cpu".to_owned(),
        Quantity(format!("{}", (container.cpu * 1024.0 / 100.0) as i64)),
    );

    KubeContainer {
        name: container.name.clone(),
        image: Some(container.image.clone()),
        command: Some(vec![container.command.clone()]),
        resources: Some(ResourceRequirements {
            limits: Some(limits),
            requests: Some(requests),
        }),
        ..Default::default()
    }
}

fn container_status(container: &Container) -> KubeContainerStatus {
    let state = container_state(container);
    KubeContainerStatus {
        name: container.name.clone(),
        // Zun never distinguishes the current state from the last known
        // one, so both fields carry the same value.
        last_state: Some(state.clone()),
        state: Some(state),
        // Readiness is derived from the status classification, not from the
        // state tag above.
        ready: container_phase(&container.status) == Phase::Running,
        // Zun does not report restarts.
        restart_count: 0,
        image: container.image.clone(),
        image_id: String::new(),
        container_id: Some(container.container_id.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use zun_client::Address;

    fn container(name: &str, status: &str) -> Container {
        Container {
            name: name.to_owned(),
            uuid: format!("{}-uuid", name),
            container_id: format!("{}-docker-id", name),
            image: "nginx:1.15".to_owned(),
            command: "nginx".to_owned(),
            cpu: 2.0,
            memory: 0.5,
            status: status.to_owned(),
            status_detail: String::new(),
            created_at: Some(Utc.ymd(2021, 6, 1).and_hms(8, 0, 0)),
            updated_at: Some(Utc.ymd(2021, 6, 1).and_hms(8, 5, 0)),
        }
    }

    fn capsule(containers: Vec<Container>) -> Capsule {
        let mut meta_labels = HashMap::new();
        meta_labels.insert("PodName".to_owned(), "web".to_owned());
        meta_labels.insert("Namespace".to_owned(), "default".to_owned());
        meta_labels.insert("ClusterName".to_owned(), "c1".to_owned());
        meta_labels.insert("NodeName".to_owned(), "n1".to_owned());
        Capsule {
            uuid: "cc654059-1a77-47a3-bfcf-715bde5aad9e".to_owned(),
            status: "Running".to_owned(),
            meta_labels,
            created_at: Some(Utc.ymd(2021, 6, 1).and_hms(7, 59, 0)),
            updated_at: Some(Utc.ymd(2021, 6, 1).and_hms(8, 5, 30)),
            containers,
            ..Default::default()
        }
    }

    #[test]
    fn identity_is_sourced_from_meta_labels() {
        let pod = capsule_to_pod(&capsule(vec![container("web", "Running")]));
        assert_eq!("web", pod.name());
        assert_eq!("default", pod.namespace());
        assert_eq!(Some("n1"), pod.node_name());
        let kube_pod = pod.as_kube_pod();
        assert_eq!(Some("c1".to_owned()), kube_pod.metadata.cluster_name);
        assert_eq!(
            Some("cc654059-1a77-47a3-bfcf-715bde5aad9e".to_owned()),
            kube_pod.metadata.uid
        );
    }

    #[test]
    fn missing_labels_leave_identity_unset() {
        let mut c = capsule(vec![]);
        c.meta_labels.clear();
        let pod = capsule_to_pod(&c);
        let kube_pod = pod.as_kube_pod();
        assert_eq!(None, kube_pod.metadata.name);
        assert_eq!(None, kube_pod.metadata.namespace);
        assert_eq!(None, kube_pod.spec.as_ref().unwrap().node_name);
    }

    #[test]
    fn container_sequence_is_order_preserving() {
        let pod = capsule_to_pod(&capsule(vec![
            container("a", "Running"),
            container("b", "Creating"),
            container("c", "Error"),
        ]));
        let spec_names: Vec<_> = pod
            .as_kube_pod()
            .spec
            .as_ref()
            .unwrap()
            .containers
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let status_names: Vec<_> = pod
            .container_statuses()
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(vec!["a", "b", "c"], spec_names);
        assert_eq!(spec_names, status_names);
    }

    #[test]
    fn readiness_tracks_the_running_classification() {
        for status in [
            "Running",
            "Stopped",
            "Error",
            "Dead",
            "Creating",
            "Created",
            "Restarting",
            "Rebuilding",
            "Paused",
            "Deleting",
            "Deleted",
            "NotAStatus",
            "",
        ] {
            let pod = capsule_to_pod(&capsule(vec![container("web", status)]));
            let observed = &pod.container_statuses().unwrap()[0];
            assert_eq!(
                container_phase(status) == Phase::Running,
                observed.ready,
                "readiness for status {:?}",
                status
            );
        }
    }

    #[test]
    fn first_ipv4_address_wins() {
        let mut c = capsule(vec![container("web", "Running")]);
        c.addresses.insert(
            "net-a".to_owned(),
            vec![
                Address {
                    addr: "::1".to_owned(),
                    version: 6.0,
                    ..Default::default()
                },
                Address {
                    addr: "10.0.0.5".to_owned(),
                    version: 4.0,
                    ..Default::default()
                },
            ],
        );
        c.addresses.insert(
            "net-b".to_owned(),
            vec![Address {
                addr: "10.0.0.99".to_owned(),
                version: 4.0,
                ..Default::default()
            }],
        );
        let pod = capsule_to_pod(&c);
        assert_eq!(Some("10.0.0.5"), pod.pod_ip());
    }

    #[test]
    fn missing_addresses_leave_pod_ip_empty() {
        let pod = capsule_to_pod(&capsule(vec![container("web", "Running")]));
        assert_eq!(Some(""), pod.pod_ip());
    }

    #[test]
    fn error_container_translates_to_terminated() {
        let mut failed = container("web", "Error");
        failed.status_detail = "oom".to_owned();
        let pod = capsule_to_pod(&capsule(vec![failed.clone()]));
        let observed = &pod.container_statuses().unwrap()[0];
        let state = observed.state.as_ref().unwrap();
        let terminated = state.terminated.as_ref().expect("terminated state");
        assert_eq!(0, terminated.exit_code);
        assert_eq!(Some("Error".to_owned()), terminated.reason);
        assert_eq!(Some("oom".to_owned()), terminated.message);
        assert_eq!(failed.created_at.map(Time), terminated.started_at);
        assert_eq!(failed.updated_at.map(Time), terminated.finished_at);
        assert!(!observed.ready);
        // Zun has no history, so the last known state mirrors the current one.
        assert_eq!(observed.state, observed.last_state);
    }

    #[test]
    fn declared_quantities_become_limits_and_requests() {
        let pod = capsule_to_pod(&capsule(vec![container("web", "Running")]));
        let resources = pod.as_kube_pod().spec.as_ref().unwrap().containers[0]
            .resources
            .as_ref()
            .unwrap();
        let limits = resources.limits.as_ref().unwrap();
        assert_eq!(Some(&Quantity("2".to_owned())), limits.get("cpu"));
        assert_eq!(Some(&Quantity("0.5G".to_owned())), limits.get("memory"));
        let requests = resources.requests.as_ref().unwrap();
        assert_eq!(Some(&Quantity("20".to_owned())), requests.get("cpu"));
        assert_eq!(None, requests.get("memory"));
    }

    #[test]
    fn aggregate_phase_is_not_reconciled_with_container_states() {
        // Known limitation: the aggregate phase comes from the capsule
        // status alone, so a capsule reported Running while every container
        // is still Creating translates to a Running pod whose containers
        // are all Waiting.
        let pod = capsule_to_pod(&capsule(vec![
            container("a", "Creating"),
            container("b", "Creating"),
        ]));
        assert_eq!(Some("Running"), pod.phase());
        for observed in pod.container_statuses().unwrap() {
            assert!(observed.state.as_ref().unwrap().waiting.is_some());
        }
    }

    #[test]
    fn translation_is_idempotent() {
        let c = capsule(vec![container("a", "Running"), container("b", "Error")]);
        let first = capsule_to_pod(&c);
        let second = capsule_to_pod(&c);
        assert_eq!(first.as_kube_pod(), second.as_kube_pod());
    }

    #[test]
    fn start_time_is_the_capsule_update_time() {
        let c = capsule(vec![container("web", "Running")]);
        let pod = capsule_to_pod(&c);
        let status = pod.as_kube_pod().status.as_ref().unwrap();
        assert_eq!(c.updated_at.map(Time), status.start_time);
        assert_eq!(
            c.created_at.map(Time),
            pod.as_kube_pod().metadata.creation_timestamp
        );
    }
}
