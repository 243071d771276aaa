use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::parser::Zone;
use crate::record::{RecordClass, RemoteRecord, ZoneRecord};
use crate::transform::fqdn;

/// Comment text safe to follow quoted data on one line.
///
/// Quoted data ends at the rightmost `"` of a line, so a comment must not
/// contain one. Double quotes become single quotes and line breaks become spaces.
pub fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('"', "'")
}

/// `name ttl class type [prio] "data" [; comment]`
///
/// The TTL is always written and the data always quoted, so the line reads back
/// through the first column scheme whatever scheme it was parsed from.
impl fmt::Display for ZoneRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.ttl, self.class, self.record_type
        )?;
        if let Some(prio) = self.prio {
            write!(f, " {prio}")?;
        }
        write!(f, " \"{}\"", self.data)?;
        if let Some(comment) = &self.comment {
            write!(f, " ; {}", comment_text(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "$ORIGIN {}", self.origin)?;
        if let Some(ttl) = self.ttl {
            writeln!(f, "$TTL {ttl}")?;
        }
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Builds a zone from the provider's records. Notes become comments.
pub fn zone_from_records(domain: &str, records: &[RemoteRecord]) -> Zone {
    let records = records
        .iter()
        .map(|record| ZoneRecord {
            name: fqdn(&record.name),
            ttl: record.ttl,
            class: RecordClass::IN,
            record_type: record.record_type,
            data: record.content.clone(),
            prio: record.prio,
            comment: Some(comment_text(&record.notes)).filter(|notes| !notes.trim().is_empty()),
        })
        .collect();

    Zone::new(domain, None, records)
}

pub fn write_bind(path: &Path, zone: &Zone) -> Result<()> {
    if path.exists() {
        warn!("{} already exists, overwriting", path.display());
    }
    fs::write(path, zone.to_string())?;
    Ok(())
}
