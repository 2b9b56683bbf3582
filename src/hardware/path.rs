//! Block Device Path Resolution
//!
//! Maps the names the orchestrator uses for its private device nodes back to
//! the host's block device paths.

use std::path::{Component, Path};

/// Device roots and partition naming conventions
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Host block device root
    pub host_dev_root: String,
    /// Root under which the orchestrator keeps its own device nodes
    pub managed_dev_root: String,
    /// Partition infix in orchestrator device names (sdb-part-1)
    pub managed_partition_infix: String,
    /// Partition infix in host device names (nvme0n1p1)
    pub host_partition_infix: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            host_dev_root: "/dev".to_string(),
            managed_dev_root: "/var/lib/smart-storage/devices".to_string(),
            managed_partition_infix: "-part-".to_string(),
            host_partition_infix: "p".to_string(),
        }
    }
}

/// Resolve a device name to its host block device path using the default roots
pub fn resolve_root_block_path(name: &str) -> String {
    PathConfig::default().resolve(name)
}

impl PathConfig {
    /// Resolve a device name to its host block device path.
    ///
    /// Names already under the host root are returned unchanged. Names under
    /// the orchestrator's root are resolved by their base name. Anything else
    /// has its partition infix rewritten and is placed under the host root.
    pub fn resolve(&self, name: &str) -> String {
        let host_root = Path::new(&self.host_dev_root);

        if Path::new(name).starts_with(host_root) {
            return name.to_string();
        }

        if name.contains(&self.managed_dev_root) {
            let base = Path::new(name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return self.resolve(&base);
        }

        let stripped = name.replacen(&self.managed_partition_infix, "", 1);
        let renamed = stripped.replace(&self.managed_partition_infix, &self.host_partition_infix);

        // Keep the result inside the host root whatever the input looks like
        let mut resolved = host_root.to_path_buf();
        for component in Path::new(&renamed).components() {
            if let Component::Normal(part) = component {
                resolved.push(part);
            }
        }
        resolved.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_host_path_unchanged() {
        assert_eq!(resolve_root_block_path("/dev/sda1"), "/dev/sda1");
        assert_eq!(resolve_root_block_path("/dev/nvme0n1p2"), "/dev/nvme0n1p2");
        assert_eq!(resolve_root_block_path("/dev/mapper/vg0-lv0"), "/dev/mapper/vg0-lv0");
    }

    #[test]
    fn test_bare_name_joined_under_host_root() {
        assert_eq!(resolve_root_block_path("sdb"), "/dev/sdb");
        assert_eq!(resolve_root_block_path("nvme0n1"), "/dev/nvme0n1");
    }

    #[test]
    fn test_partition_infix_rewritten() {
        assert_eq!(resolve_root_block_path("sdb-part-1"), "/dev/sdb1");
        assert_eq!(resolve_root_block_path("nvme0n1-part--part-1"), "/dev/nvme0n1p1");
    }

    #[test]
    fn test_managed_root_resolved_by_base_name() {
        assert_eq!(
            resolve_root_block_path("/var/lib/smart-storage/devices/sdb-part-3"),
            "/dev/sdb3"
        );
        assert_eq!(
            resolve_root_block_path("/var/lib/smart-storage/devices/nvme1n1"),
            "/dev/nvme1n1"
        );
    }

    #[test]
    fn test_lookalike_root_not_treated_as_host_path() {
        assert_eq!(resolve_root_block_path("/devices/sda"), "/dev/devices/sda");
        assert_eq!(resolve_root_block_path("../sda"), "/dev/sda");
    }

    #[test]
    fn test_custom_roots() {
        let config = PathConfig {
            managed_dev_root: "/run/drives".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve("/run/drives/sdc-part-2"), "/dev/sdc2");
        assert_eq!(config.resolve("/var/lib/smart-storage/devices/sdc"), "/dev/var/lib/smart-storage/devices/sdc");
    }

    proptest! {
        #[test]
        fn prop_resolve_is_idempotent(name in "(/dev/|/var/lib/smart-storage/devices/|/|\\.\\./)?[a-z0-9./-]{0,24}") {
            let once = resolve_root_block_path(&name);
            prop_assert_eq!(resolve_root_block_path(&once), once.clone());
            prop_assert!(Path::new(&once).starts_with("/dev") || once == name);
        }
    }
}
