//! Canonical structured event names used across `flowmesh-distro`.

// Loader events.
pub const LOADER_LOAD_OK: &str = "loader_load_ok";
pub const LOADER_LOAD_EMPTY: &str = "loader_load_empty";
pub const LOADER_RESET_START: &str = "loader_reset_start";
pub const RESET_COMMAND_SENT: &str = "reset_command_sent";
pub const RESET_COMMAND_SKIPPED: &str = "reset_command_skipped";
pub const RESET_COMMAND_FAILED: &str = "reset_command_failed";

// Manager lifecycle events.
pub const MANAGER_ANNOUNCE: &str = "manager_announce";
pub const MANAGER_READY: &str = "manager_ready";
pub const MANAGER_RESET: &str = "manager_reset";
pub const MANAGER_SHUTDOWN: &str = "manager_shutdown";

// Manager loader-loop events.
pub const MANAGER_ADMIT: &str = "manager_admit";
pub const ADMISSION_LOCK_UNAVAILABLE: &str = "admission_lock_unavailable";
pub const LOADER_TAKE_INTERRUPTED: &str = "loader_take_interrupted";
pub const LOADER_STOPPED: &str = "loader_stopped";
pub const LOADER_STILL_ACTIVE: &str = "loader_still_active";
pub const REGISTRY_PUBLISH_FAILED: &str = "registry_publish_failed";

// Manager command-loop events.
pub const COMMAND_RESET_RECEIVED: &str = "command_reset_received";
pub const COMMAND_IGNORED: &str = "command_ignored";
pub const COMMAND_INTERRUPTED: &str = "command_interrupted";

// Live-update listener events.
pub const LIVE_UPDATE_APPLIED: &str = "live_update_applied";

// Registry watcher events.
pub const REGISTRY_WATCH_CLOSED: &str = "registry_watch_closed";
pub const REGISTRY_EVENT_PUBLISHED: &str = "registry_event_published";
