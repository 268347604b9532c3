//! Reading and writing device / topology snapshot files.
//!
//! JSON by default; `.yaml` and `.yml` files go through serde_yaml.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use iosim_core::{DeviceConfig, Topology};

use crate::error::CliError;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn read<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::read_failed(path, e))?;
    let parsed: Result<T, String> = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| CliError::BadSnapshot {
        path: path.display().to_string(),
        what,
        reason,
    })
}

pub fn read_device(path: &Path) -> Result<DeviceConfig, CliError> {
    let device: DeviceConfig = read(path, "device")?;
    device.validate().map_err(|reason| CliError::BadSnapshot {
        path: path.display().to_string(),
        what: "device",
        reason,
    })?;
    Ok(device)
}

/// Every device in the topology must pass the same checks as a lone
/// device file; the first failure names the device id.
pub fn read_topology(path: &Path) -> Result<Topology, CliError> {
    let topology: Topology = read(path, "topology")?;
    for (id, device) in &topology.devices {
        device.validate().map_err(|reason| CliError::BadSnapshot {
            path: path.display().to_string(),
            what: "topology",
            reason: format!("device {id}: {reason}"),
        })?;
    }
    Ok(topology)
}

pub fn write<T: Serialize>(path: &Path, data: &T) -> Result<(), CliError> {
    let mut text = if is_yaml(path) {
        serde_yaml::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|e| CliError::write_failed(path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn json_and_yaml_snapshots_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = DeviceConfig::router("R1");

        for name in ["r1.json", "r1.yaml"] {
            let path = dir.path().join(name);
            write(&path, &r1).unwrap();
            assert_eq!(read_device(&path).unwrap(), r1);
        }
    }

    #[test]
    fn malformed_snapshot_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"hostname\": ").unwrap();

        let err = read_device(&path).unwrap_err();
        assert!(matches!(err, CliError::BadSnapshot { what: "device", .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn topology_with_invalid_device_names_the_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.yaml");
        std::fs::write(
            &path,
            "devices:\n  \
               r1:\n    \
                 hostname: R1\n  \
               r2:\n    \
                 hostname: R2\n    \
                 mode: {kind: interface-config, interface: Serial0/0}\n\
             links: []\n",
        )
        .unwrap();

        let err = read_topology(&path).unwrap_err();
        assert!(matches!(err, CliError::BadSnapshot { what: "topology", .. }));
        let message = err.to_string();
        assert!(message.contains("lab.yaml"), "{message}");
        assert!(
            matches!(&err, CliError::BadSnapshot { reason, .. } if reason.starts_with("device r2:")),
            "{err:?}"
        );
    }

    #[test]
    fn valid_topology_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.json");
        let topology = Topology::new()
            .with_device("r1", DeviceConfig::router("R1"))
            .with_device("sw1", DeviceConfig::switch("SW1"));
        write(&path, &topology).unwrap();
        assert_eq!(read_topology(&path).unwrap(), topology);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = read_topology(Path::new("/nonexistent/lab.json")).unwrap_err();
        assert!(matches!(err, CliError::ReadFailed { .. }));
    }
}
