//! Grid-resource naming scheme, reproduced exactly for in-cluster
//! interoperability. Every member of a cluster derives the same names from
//! the same entity kind and manager identity.

/// Map of manager-id → current local cache size, shared cluster-wide.
pub const DISTRO_REGISTRY_MAP: &str = "distroRegistry";

/// Cluster-wide admission-serialization lock shared by all managers.
pub const CORRELATE_UPDATE_LOCK: &str = "correlateUpdate";

/// The only recognized command on a manager's private command queue.
pub const COMMAND_RESET: &str = "reset";

/// Shared work queue of entities awaiting assignment.
pub fn available_objects_queue(kind: &str) -> String {
    format!("{kind}-available-objects")
}

/// Map of manager-id → entity kind, used to discover reset targets.
pub fn available_managers_map(kind: &str) -> String {
    format!("{kind}-available-managers")
}

/// Private per-manager command channel.
pub fn command_queue(manager_id: &str) -> String {
    format!("command-{manager_id}")
}

/// Cluster-wide loader-exclusion lock for one entity kind.
pub fn loader_lock(kind: &str) -> String {
    format!("{kind}-loader")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_cluster_scheme() {
        assert_eq!(available_objects_queue("Sensor"), "Sensor-available-objects");
        assert_eq!(available_managers_map("Sensor"), "Sensor-available-managers");
        assert_eq!(command_queue("abc-123"), "command-abc-123");
        assert_eq!(loader_lock("Sensor"), "Sensor-loader");
        assert_eq!(DISTRO_REGISTRY_MAP, "distroRegistry");
        assert_eq!(CORRELATE_UPDATE_LOCK, "correlateUpdate");
    }
}
