// method name constants
pub const DEFAULT_UP_NAME: &str = "up";
pub const DEFAULT_DOWN_NAME: &str = "down";

// storage constants
pub const DEFAULT_STORAGE_PATH: &str = "migratory.json";

// event constants
pub const MIGRATION_EVENT: &str = "migration_event";

// log line constants
pub const LOG_LINE_RULE: &str = "=======";
