/*!
Fixtures JSON pour les endpoints du backend

Construisent des corps conformes à ce que renvoie un backend réel
(clés PascalCase), pour alimenter le [`MockBackend`](crate::MockBackend).
*/

use serde_json::{json, Map, Value};

pub struct BackendFixtures;

impl BackendFixtures {
    /// Réponse `/fingerprint` : un groupe contenant les devices donnés
    pub fn fingerprint(vendor: &str, device_ids: &[&str]) -> Value {
        let devices: Vec<Value> = device_ids
            .iter()
            .map(|id| {
                json!({
                    "ID": id,
                    "Healthy": true,
                    "HealthDesc": "OK",
                    "HwLocality": null
                })
            })
            .collect();

        json!({
            "Devices": [{
                "Vendor": vendor,
                "Type": "gpu",
                "Name": "Test Accelerator",
                "Devices": devices,
                "Attributes": {
                    "memory": {"Int": 16384, "Unit": "MiB"},
                    "driver": {"String": "1.2.3", "Unit": ""}
                }
            }]
        })
    }

    /// Réponse `/fingerprint` signalant une erreur côté backend
    pub fn fingerprint_error(message: &str) -> Value {
        json!({"Devices": [], "Error": message})
    }

    /// Réponse `/stats` : une valeur `usage` par device
    pub fn stats(vendor: &str, samples: &[(&str, f64)]) -> Value {
        let mut instances = Map::new();
        for (id, usage) in samples {
            instances.insert(
                id.to_string(),
                json!({
                    "Summary": {"FloatNumeratorVal": usage, "Unit": "%", "Desc": "usage"},
                    "Stats": {
                        "Nested": {},
                        "Attributes": {
                            "usage": {"FloatNumeratorVal": usage, "FloatDenominatorVal": 100.0, "Unit": "%"}
                        }
                    },
                    "Timestamp": "2024-05-01T12:00:00+00:00"
                }),
            );
        }

        json!({
            "Groups": [{
                "Vendor": vendor,
                "Type": "gpu",
                "Name": "Test Accelerator",
                "InstanceStats": instances
            }]
        })
    }

    /// Réponse `/reserve` : une variable d'env par device réservé
    pub fn reservation(device_ids: &[&str]) -> Value {
        let envs: Map<String, Value> = device_ids
            .iter()
            .map(|id| (id.to_string(), Value::String("OK".into())))
            .collect();
        json!({
            "Envs": envs,
            "Mounts": [],
            "Devices": device_ids
                .iter()
                .map(|id| json!({"TaskPath": format!("/dev/{}", id), "HostPath": format!("/dev/{}", id), "CgroupPerms": "rw"}))
                .collect::<Vec<_>>()
        })
    }
}
