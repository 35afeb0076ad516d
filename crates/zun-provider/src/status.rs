//! Classification of Zun status vocabularies into Kubernetes lifecycle values.
//!
//! Zun exposes two distinct vocabularies: a coarse one on the capsule as a
//! whole and a finer-grained one on each container. They are mapped by
//! separate tables on purpose; folding them into one table would silently
//! widen each vocabulary with the other's values.

use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateRunning, ContainerStateTerminated, ContainerStateWaiting,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use zun_client::Container;

/// Describe the lifecycle phase of a workload.
///
/// This is specified by Kubernetes itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Phase {
    /// The pod is being created.
    Pending,
    /// The workload is currently executing.
    Running,
    /// The workload has exited with an error.
    Failed,
    /// The workload has exited without error.
    Succeeded,
    /// The lifecycle phase of the workload cannot be determined.
    Unknown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Failed => "Failed",
            Phase::Succeeded => "Succeeded",
            Phase::Unknown => "Unknown",
        };
        write!(f, "{}", phase)
    }
}

/// Map a capsule status to a pod phase.
///
/// Total over arbitrary input: any status outside the capsule vocabulary,
/// including the empty string, maps to [`Phase::Unknown`] instead of failing
/// the lookup.
pub fn capsule_phase(status: &str) -> Phase {
    match status {
        "Running" => Phase::Running,
        "Succeeded" => Phase::Succeeded,
        "Failed" => Phase::Failed,
        "Pending" => Phase::Pending,
        _ => Phase::Unknown,
    }
}

/// Map a container status to a pod phase.
///
/// Containers report transitional states the capsule never does, so this
/// table is maintained separately from [`capsule_phase`]. Total over
/// arbitrary input; unrecognized statuses map to [`Phase::Unknown`].
pub fn container_phase(status: &str) -> Phase {
    match status {
        "Running" => Phase::Running,
        "Stopped" => Phase::Succeeded,
        "Error" | "Dead" => Phase::Failed,
        "Creating" | "Created" | "Restarting" | "Rebuilding" | "Paused" | "Deleting"
        | "Deleted" => Phase::Pending,
        _ => Phase::Unknown,
    }
}

/// Build the Kubernetes container state for a capsule container.
///
/// Zun does not expose a start time or an exit code through this interface:
/// started-at is substituted with the container's creation time, finished-at
/// with its update time, and the exit code is fixed at 0. These are
/// documented approximations, reproduced as-is.
pub fn container_state(container: &Container) -> ContainerState {
    match container.status.as_str() {
        "Running" | "Stopped" => ContainerState {
            running: Some(ContainerStateRunning {
                started_at: container.created_at.map(Time),
            }),
            ..Default::default()
        },
        "Error" | "Dead" => ContainerState {
            terminated: Some(ContainerStateTerminated {
                exit_code: 0,
                reason: Some(container.status.clone()),
                message: Some(container.status_detail.clone()),
                started_at: container.created_at.map(Time),
                finished_at: container.updated_at.map(Time),
                ..Default::default()
            }),
            ..Default::default()
        },
        _ => ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some(container.status.clone()),
                message: Some(container.status_detail.clone()),
            }),
            ..Default::default()
        },
    }
}
