//! Merging a target record set into the provider's records.
//!
//! A run validates the target, fetches the remote records once, plans every
//! provider call up front and then issues them in order. The first failing call
//! stops the run; calls already issued stay applied and the records fetched at
//! the start are written to a backup file.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::args::RestoreMode;
use crate::backup::write_backup;
use crate::constants::{BACKUP_BASE_NAME, BACKUP_EXTENSION};
use crate::error::{Error, ProviderError, Result};
use crate::parser::Zone;
use crate::provider::{DnsProvider, RecordSpec};
use crate::record::{RecordType, RemoteRecord};
use crate::snapshot::Snapshot;
use crate::transform::{bare_domain, subdomain, MatchKey};
use crate::validation::validate_record;

/// A record the import wants to exist. `name` may be relative, absolute or `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub name: String,
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    pub prio: Option<u16>,
}

impl TargetRecord {
    fn key(&self, domain: &str) -> MatchKey {
        MatchKey::new(self.record_type, &self.name, self.prio, domain)
    }

    fn spec(&self, domain: &str) -> Result<RecordSpec> {
        let name = subdomain(&self.name, domain).ok_or_else(|| {
            Error::validation(format!(
                "record name '{}' is outside of domain '{domain}'",
                self.name
            ))
        })?;
        Ok(RecordSpec {
            name,
            record_type: self.record_type,
            content: self.content.clone(),
            ttl: self.ttl,
            prio: self.prio,
        })
    }

    fn differs_from(&self, remote: &RemoteRecord) -> bool {
        self.content != remote.content || self.ttl != remote.ttl || self.prio != remote.prio
    }
}

/// The record set an import should produce for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Registered domain without trailing dot.
    pub domain: String,
    pub records: Vec<TargetRecord>,
    /// Name servers to set in one batch; empty leaves delegation alone.
    pub name_servers: Vec<String>,
}

impl Target {
    /// Every snapshot record, NS included, is an ordinary record.
    pub fn from_snapshot(domain: &str, snapshot: &Snapshot) -> Self {
        let records = snapshot
            .0
            .iter()
            .map(|record| TargetRecord {
                name: record.name.clone(),
                record_type: record.record_type,
                content: record.content.clone(),
                ttl: record.ttl,
                prio: record.prio,
            })
            .collect();

        Target {
            domain: bare_domain(domain),
            records,
            name_servers: Vec::new(),
        }
    }

    /// NS records of a zone file become the domain's name server list.
    pub fn from_zone(zone: &Zone) -> Self {
        let mut records = Vec::new();
        let mut name_servers = Vec::new();

        for record in &zone.records {
            if record.record_type == RecordType::NS {
                name_servers.push(record.data.trim_end_matches('.').to_string());
                continue;
            }
            records.push(TargetRecord {
                name: record.name.clone(),
                record_type: record.record_type,
                content: record.data.clone(),
                ttl: record.ttl,
                prio: record.prio,
            });
        }

        Target {
            domain: zone.domain(),
            records,
            name_servers,
        }
    }

    /// Rejects anything the provider would refuse, before a single request is made.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::validation("domain must not be empty"));
        }
        for record in &self.records {
            validate_record(record.record_type, record.ttl, record.prio).map_err(|e| match e {
                Error::Validation(message) => Error::validation(format!(
                    "{} {}: {message}",
                    record.name, record.record_type
                )),
                other => other,
            })?;
            record.spec(&self.domain)?;
        }
        if let Some(ns) = self.name_servers.iter().find(|ns| ns.trim().is_empty()) {
            return Err(Error::validation(format!("invalid name server '{ns}'")));
        }
        Ok(())
    }
}

/// One provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Delete { id: String },
    Create(RecordSpec),
    Update { id: String, record: RecordSpec },
    SetNameServers(Vec<String>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Delete { id } => write!(f, "delete record {id}"),
            Operation::Create(r) => write!(
                f,
                "create {} record '{}' -> {}",
                r.record_type, r.name, r.content
            ),
            Operation::Update { id, record } => write!(
                f,
                "update record {id} ({} '{}') -> {}",
                record.record_type, record.name, record.content
            ),
            Operation::SetNameServers(ns) => write!(f, "set name servers {}", ns.join(", ")),
        }
    }
}

/// Counts of the calls that went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub name_servers_set: bool,
}

impl Changes {
    fn record(&mut self, operation: &Operation) {
        match operation {
            Operation::Delete { .. } => self.deleted += 1,
            Operation::Create(_) => self.created += 1,
            Operation::Update { .. } => self.updated += 1,
            Operation::SetNameServers(_) => self.name_servers_set = true,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Applied(Changes),
    /// A provider call failed. `changes` were applied before it and were not rolled back.
    ///
    /// `backup` holds the backup file, or why it could not be written.
    Failed {
        error: ProviderError,
        backup: Result<PathBuf>,
        changes: Changes,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn backup_path(&self) -> Option<&Path> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Failed { backup, .. } => backup.as_deref().ok(),
        }
    }

    pub fn changes(&self) -> Changes {
        match self {
            Outcome::Applied(changes) | Outcome::Failed { changes, .. } => *changes,
        }
    }
}

/// Computes the provider calls realizing `mode`, in the order they must be issued.
pub fn plan(mode: RestoreMode, remote: &[RemoteRecord], target: &Target) -> Result<Vec<Operation>> {
    let domain = target.domain.as_str();
    let remote_key =
        |r: &RemoteRecord| MatchKey::new(r.record_type, &r.name, r.prio, domain);
    let mut operations = Vec::new();

    match mode {
        RestoreMode::Clear => {
            operations.extend(remote.iter().map(|r| Operation::Delete { id: r.id.clone() }));
            for record in &target.records {
                operations.push(Operation::Create(record.spec(domain)?));
            }
        }
        RestoreMode::Replace => {
            // records sharing a key pair up in order
            let mut by_key: HashMap<MatchKey, VecDeque<&TargetRecord>> = HashMap::new();
            for record in &target.records {
                by_key.entry(record.key(domain)).or_default().push_back(record);
            }
            for existing in remote {
                let Some(record) = by_key
                    .get_mut(&remote_key(existing))
                    .and_then(VecDeque::pop_front)
                else {
                    continue;
                };
                if record.differs_from(existing) {
                    operations.push(Operation::Update {
                        id: existing.id.clone(),
                        record: record.spec(domain)?,
                    });
                }
            }
        }
        RestoreMode::Keep => {
            let existing: HashSet<MatchKey> = remote.iter().map(remote_key).collect();
            for record in &target.records {
                if !existing.contains(&record.key(domain)) {
                    operations.push(Operation::Create(record.spec(domain)?));
                }
            }
        }
    }

    if !target.name_servers.is_empty() {
        match mode {
            RestoreMode::Clear | RestoreMode::Replace => {
                operations.push(Operation::SetNameServers(target.name_servers.clone()));
            }
            RestoreMode::Keep => {
                info!(
                    "keeping existing name servers, ignoring {} NS record(s)",
                    target.name_servers.len()
                );
            }
        }
    }

    Ok(operations)
}

/// Runs imports against a provider and writes backups on failure.
pub struct Reconciler<'a, P: DnsProvider + ?Sized> {
    provider: &'a P,
    backup_dir: PathBuf,
    backup_base_name: String,
}

impl<'a, P: DnsProvider + ?Sized> Reconciler<'a, P> {
    /// Backups go to the current directory by default.
    pub fn new(provider: &'a P) -> Self {
        Reconciler {
            provider,
            backup_dir: PathBuf::from("."),
            backup_base_name: BACKUP_BASE_NAME.to_string(),
        }
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    pub fn with_backup_base_name(mut self, name: impl Into<String>) -> Self {
        self.backup_base_name = name.into();
        self
    }

    /// Makes the provider's records for `target.domain` match `target` under `mode`.
    ///
    /// Validation errors and a failing initial fetch are returned as `Err` and
    /// change nothing. A failing call after that yields `Outcome::Failed`, even
    /// when the backup itself cannot be written.
    pub fn run(&self, target: &Target, mode: RestoreMode) -> Result<Outcome> {
        target.validate()?;
        let domain = target.domain.as_str();

        debug!("restore mode: {mode}");
        let remote = self.provider.list_records(domain)?;
        let operations = plan(mode, &remote, target)?;
        debug!(
            "{} existing record(s), {} call(s) planned",
            remote.len(),
            operations.len()
        );

        let mut changes = Changes::default();
        for operation in &operations {
            debug!("{operation}");
            if let Err(e) = self.apply(domain, operation) {
                error!("{operation} failed: {e}");
                let backup = write_backup(
                    &self.backup_dir,
                    &self.backup_base_name,
                    BACKUP_EXTENSION,
                    &Snapshot(remote),
                );
                match &backup {
                    Ok(path) => warn!(
                        "a backup of your existing DNS records was saved to {}",
                        path.display()
                    ),
                    Err(backup_error) => error!(
                        "could not write a backup of your existing DNS records to {}: {backup_error}",
                        self.backup_dir.display()
                    ),
                }
                error!("import failed");
                return Ok(Outcome::Failed {
                    error: e,
                    backup,
                    changes,
                });
            }
            changes.record(operation);
        }

        info!(
            "import completed: {} created, {} updated, {} deleted",
            changes.created, changes.updated, changes.deleted
        );
        Ok(Outcome::Applied(changes))
    }

    fn apply(&self, domain: &str, operation: &Operation) -> Result<(), ProviderError> {
        match operation {
            Operation::Delete { id } => self.provider.delete_record(domain, id),
            Operation::Create(record) => self.provider.create_record(domain, record).map(|id| {
                debug!("created record {id}");
            }),
            Operation::Update { id, record } => self.provider.update_record(domain, id, record),
            Operation::SetNameServers(ns) => self.provider.set_name_servers(domain, ns),
        }
    }
}
