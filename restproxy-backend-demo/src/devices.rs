//! Local machine exposed as a single-device group
//!
//! - Fingerprint: host CPU as one device, with OS/kernel/core attributes
//! - Stats: CPU usage and memory usage, sampled on each request
//! - Reservation: one `OK` env entry per requested id

use restproxy_device::types::{
    Attribute, ContainerReservation, Device, DeviceGroup, DeviceGroupStats, DeviceStats,
    FingerprintResponse, StatObject, StatValue, StatsResponse,
};
use std::collections::HashMap;
use sysinfo::System;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const VENDOR: &str = "restproxy";
pub const DEVICE_TYPE: &str = "host";

/// Identity of the machine, resolved once at start-up
#[derive(Debug, Clone)]
pub struct LocalDevice {
    pub id: String,
    pub model: String,
    pub os: String,
    pub kernel: String,
    pub cores: usize,
}

impl LocalDevice {
    pub fn discover(sys: &System) -> Self {
        let model = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "cpu".to_string());

        Self {
            id: System::host_name().unwrap_or_else(|| "localhost".to_string()),
            model,
            os: System::long_os_version().unwrap_or_default(),
            kernel: System::kernel_version().unwrap_or_default(),
            cores: sys.cpus().len(),
        }
    }

    pub fn fingerprint(&self) -> FingerprintResponse {
        let mut attributes = HashMap::new();
        attributes.insert("os".to_string(), string_attr(&self.os));
        attributes.insert("kernel".to_string(), string_attr(&self.kernel));
        attributes.insert(
            "cores".to_string(),
            Attribute { int: Some(self.cores as i64), ..Default::default() },
        );

        FingerprintResponse {
            devices: vec![DeviceGroup {
                vendor: VENDOR.to_string(),
                r#type: DEVICE_TYPE.to_string(),
                name: self.model.clone(),
                devices: vec![Device {
                    id: self.id.clone(),
                    healthy: true,
                    health_desc: "OK".to_string(),
                    hw_locality: None,
                }],
                attributes,
            }],
            error: None,
        }
    }

    /// Refreshes CPU and memory counters before reading them
    pub fn stats(&self, sys: &mut System) -> StatsResponse {
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let cpu = sys.global_cpu_info().cpu_usage() as f64;
        let total_mb = (sys.total_memory() / (1024 * 1024)) as i64;
        let used_mb = (sys.used_memory() / (1024 * 1024)) as i64;

        let mut attributes = HashMap::new();
        attributes.insert(
            "cpu".to_string(),
            StatValue {
                float_numerator_val: Some(cpu),
                float_denominator_val: Some(100.0),
                unit: "%".to_string(),
                desc: "global CPU usage".to_string(),
                ..Default::default()
            },
        );
        attributes.insert(
            "memory".to_string(),
            StatValue {
                int_numerator_val: Some(used_mb),
                int_denominator_val: Some(total_mb),
                unit: "MiB".to_string(),
                desc: "used memory".to_string(),
                ..Default::default()
            },
        );

        let summary = StatValue {
            float_numerator_val: Some(cpu),
            unit: "%".to_string(),
            desc: "CPU usage".to_string(),
            ..Default::default()
        };

        let mut instance_stats = HashMap::new();
        instance_stats.insert(
            self.id.clone(),
            DeviceStats {
                summary: Some(summary),
                stats: Some(StatObject { nested: HashMap::new(), attributes }),
                timestamp: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
            },
        );

        StatsResponse {
            groups: vec![DeviceGroupStats {
                vendor: VENDOR.to_string(),
                r#type: DEVICE_TYPE.to_string(),
                name: self.model.clone(),
                instance_stats,
            }],
            error: None,
        }
    }
}

pub fn reservation(device_ids: &[String]) -> ContainerReservation {
    ContainerReservation {
        envs: device_ids.iter().map(|id| (id.clone(), "OK".to_string())).collect(),
        mounts: Vec::new(),
        devices: Vec::new(),
    }
}

fn string_attr(value: &str) -> Attribute {
    Attribute { string: Some(value.to_string()), ..Default::default() }
}
