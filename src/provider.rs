use crate::error::ProviderError;
use crate::record::{RecordType, RemoteRecord};

/// Fields of a record the provider accepts on create and edit.
///
/// `name` is the subdomain relative to the registered domain; the apex is `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub name: String,
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    pub prio: Option<u16>,
}

/// The remote DNS management API. Every call is a single request with no retry.
pub trait DnsProvider {
    fn list_records(&self, domain: &str) -> Result<Vec<RemoteRecord>, ProviderError>;

    /// Returns the id the provider assigned to the new record.
    fn create_record(&self, domain: &str, record: &RecordSpec) -> Result<String, ProviderError>;

    fn update_record(&self, domain: &str, id: &str, record: &RecordSpec)
        -> Result<(), ProviderError>;

    fn delete_record(&self, domain: &str, id: &str) -> Result<(), ProviderError>;

    /// Replaces the authoritative name servers of `domain`.
    fn set_name_servers(&self, domain: &str, name_servers: &[String])
        -> Result<(), ProviderError>;
}
