/// Default Porkbun JSON API endpoint
pub const API_ENDPOINT: &str = "https://api.porkbun.com/api/json/v3/";

/// Smallest TTL the provider accepts for a record
pub const MIN_TTL: u32 = 300;

/// Largest TTL the provider accepts for a record
pub const MAX_TTL: u32 = 86400;

/// Largest TTL a zone file may declare (RFC 2181)
pub const MAX_ZONE_TTL: u32 = 2147483647;

/// Base name of the backup files written when an import fails
pub const BACKUP_BASE_NAME: &str = "pkb_client_dns_records_backup";

pub const BACKUP_EXTENSION: &str = "json";
