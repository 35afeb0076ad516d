//! Wire models for the Zun capsule API.
//!
//! Only the fields the provider consumes are modeled; everything else in the
//! API payload is ignored. Optional fields default when absent so a partial
//! capsule record still deserializes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// A Zun capsule: a group of containers sharing network identity, analogous
/// to a Kubernetes pod.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Capsule {
    /// Unique identifier assigned by Zun.
    pub uuid: String,
    /// Aggregate capsule status ("Running", "Succeeded", "Failed", "Pending").
    pub status: String,
    /// Free-text explanation accompanying the status.
    #[serde(default)]
    pub status_reason: String,
    /// The name the capsule was created under.
    #[serde(default)]
    pub meta_name: String,
    /// Labels attached at creation time. The Kubernetes identity of the
    /// workload (pod name, namespace, cluster, node) is recovered from here.
    #[serde(default)]
    pub meta_labels: HashMap<String, String>,
    /// When the capsule was created.
    #[serde(default, deserialize_with = "optional_zun_time")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the capsule last changed. Zun records no start time, so
    /// consumers use this as the closest available substitute.
    #[serde(default, deserialize_with = "optional_zun_time")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Network addresses keyed by network id.
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<Address>>,
    /// The containers running inside the capsule.
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A container nested inside a capsule.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Unique identifier assigned by Zun.
    #[serde(default)]
    pub uuid: String,
    /// Identifier of the backing runtime container.
    #[serde(default)]
    pub container_id: String,
    /// Image reference the container was created from.
    #[serde(default)]
    pub image: String,
    /// The command run in the container.
    #[serde(default)]
    pub command: String,
    /// Declared number of virtual CPUs.
    #[serde(default)]
    pub cpu: f64,
    /// Declared memory quantity.
    #[serde(default)]
    pub memory: f64,
    /// Container status. Containers report a finer-grained vocabulary than
    /// the capsule does ("Running", "Stopped", "Error", "Dead", "Creating",
    /// "Created", "Restarting", "Rebuilding", "Paused", "Deleting",
    /// "Deleted").
    pub status: String,
    /// Free-text detail accompanying the status.
    #[serde(default)]
    pub status_detail: String,
    /// When the container was created.
    #[serde(default, deserialize_with = "optional_zun_time")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the container last changed.
    #[serde(default, deserialize_with = "optional_zun_time")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single network address attached to a capsule.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Address {
    /// The address itself.
    #[serde(default)]
    pub addr: String,
    /// IP version as reported by Zun (4 or 6).
    #[serde(default)]
    pub version: f64,
    /// Id of the Neutron port backing this address.
    #[serde(default)]
    pub port: String,
}

// Zun timestamps come back as "2018-01-12 09:37:25+00:00"; some deployments
// emit RFC 3339 or omit the offset entirely.
fn optional_zun_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_zun_time(s).map(Some).map_err(serde::de::Error::custom),
    }
}

fn parse_zun_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&t));
    }
    Err(format!("unrecognized timestamp {:?}", s))
}
