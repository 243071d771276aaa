use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::output::bind::{write_bind, zone_from_records};
use crate::provider::DnsProvider;
use crate::snapshot::{write_snapshot, Snapshot};
use crate::transform::bare_domain;

/// Saves every record of `domain` as a snapshot file. Returns the number of records.
pub fn export_snapshot<P: DnsProvider + ?Sized>(
    provider: &P,
    domain: &str,
    path: &Path,
) -> Result<usize> {
    let domain = bare_domain(domain);
    debug!("retrieving DNS records of {domain}");
    let snapshot = Snapshot(provider.list_records(&domain)?);

    debug!("saving DNS records to {}", path.display());
    write_snapshot(path, &snapshot)?;
    info!("export finished: {} record(s)", snapshot.0.len());
    Ok(snapshot.0.len())
}

/// Saves every record of `domain` as a zone file, notes as comments.
pub fn export_zone<P: DnsProvider + ?Sized>(
    provider: &P,
    domain: &str,
    path: &Path,
) -> Result<usize> {
    let domain = bare_domain(domain);
    debug!("retrieving DNS records of {domain}");
    let records = provider.list_records(&domain)?;

    debug!("saving DNS records to {}", path.display());
    let zone = zone_from_records(&domain, &records);
    write_bind(path, &zone)?;
    info!("export finished: {} record(s)", zone.records.len());
    Ok(zone.records.len())
}
