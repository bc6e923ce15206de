//! Wire model exchanged with the REST backend
//!
//! Keys follow the backend's PascalCase JSON. Payloads are decoded
//! structurally and handed to consumers untouched: collections default to
//! empty, unknown keys are ignored, nothing is validated.
//!
//! Backends written in Go send `null` for empty slices and maps, so every
//! non-optional field treats `null` like a missing key. Top-level keys also
//! accept their lower-case spelling.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `GET /fingerprint`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FingerprintResponse {
    #[serde(default, deserialize_with = "null_as_default", alias = "devices")]
    pub devices: Vec<DeviceGroup>,
    /// In-band error reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "error")]
    pub error: Option<String>,
}

/// Group of identical devices sharing vendor/type/name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: HashMap<String, Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Device {
    #[serde(rename = "ID", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub healthy: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_desc: String,
    #[serde(default)]
    pub hw_locality: Option<DeviceLocality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceLocality {
    #[serde(rename = "PciBusID", default, deserialize_with = "null_as_default")]
    pub pci_bus_id: String,
}

/// Typed attribute value, exactly one of the value fields is expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
}

/// Response of `GET /stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsResponse {
    #[serde(default, deserialize_with = "null_as_default", alias = "groups")]
    pub groups: Vec<DeviceGroupStats>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "error")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceGroupStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Per-device stats keyed by device ID
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_stats: HashMap<String, DeviceStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceStats {
    #[serde(default)]
    pub summary: Option<StatValue>,
    #[serde(default)]
    pub stats: Option<StatObject>,
    /// RFC3339 timestamp as sent by the backend
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatObject {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nested: HashMap<String, StatObject>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: HashMap<String, StatValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_numerator_val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_denominator_val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_numerator_val: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_denominator_val: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_val: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_val: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
}

/// Response of `POST /reserve`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerReservation {
    #[serde(default, deserialize_with = "null_as_default", alias = "envs")]
    pub envs: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "mounts")]
    pub mounts: Vec<Mount>,
    #[serde(default, deserialize_with = "null_as_default", alias = "devices")]
    pub devices: Vec<DeviceSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cgroup_perms: String,
}
