use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::Result;
use crate::record::RemoteRecord;

/// Records keyed by their provider id, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(pub Vec<RemoteRecord>);

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in &self.0 {
            map.serialize_entry(&record.id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = Snapshot;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of record ids to DNS records")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Snapshot, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut records = Vec::new();
                while let Some(id) = map.next_key::<String>()? {
                    let record: RemoteRecord = map.next_value().map_err(|e| {
                        de::Error::custom(format!("record '{id}': {e}"))
                    })?;
                    if record.id != id {
                        warn!("snapshot key '{id}' differs from record id '{}'", record.id);
                    }
                    records.push(record);
                }
                Ok(Snapshot(records))
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content)
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if path.exists() {
        warn!("{} already exists, overwriting", path.display());
    }
    fs::write(path, serde_json::to_string_pretty(snapshot)?)?;
    Ok(())
}
