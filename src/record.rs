use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Record types the provider can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    MX,
    CNAME,
    ALIAS,
    TXT,
    NS,
    SRV,
    TLSA,
    CAA,
}

impl RecordType {
    pub const ALL: [RecordType; 10] = [
        RecordType::A,
        RecordType::AAAA,
        RecordType::MX,
        RecordType::CNAME,
        RecordType::ALIAS,
        RecordType::TXT,
        RecordType::NS,
        RecordType::SRV,
        RecordType::TLSA,
        RecordType::CAA,
    ];

    /// Only MX and SRV records carry a meaningful priority.
    pub fn has_priority(self) -> bool {
        matches!(self, RecordType::MX | RecordType::SRV)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::MX => "MX",
            RecordType::CNAME => "CNAME",
            RecordType::ALIAS => "ALIAS",
            RecordType::TXT => "TXT",
            RecordType::NS => "NS",
            RecordType::SRV => "SRV",
            RecordType::TLSA => "TLSA",
            RecordType::CAA => "CAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("unsupported record type: {s}")))
    }
}

/// Zone file record class. Only the Internet class is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordClass {
    #[default]
    IN,
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IN")
    }
}

impl FromStr for RecordClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("IN") {
            Ok(RecordClass::IN)
        } else {
            Err(Error::validation(format!("unsupported record class: {s}")))
        }
    }
}

/// One record line of a zone file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    pub name: String,
    pub ttl: u32,
    pub class: RecordClass,
    pub record_type: RecordType,
    pub data: String,
    pub prio: Option<u16>,
    pub comment: Option<String>,
}

/// A record as stored at the provider. `id` is the only stable handle for edits and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRemoteRecord")]
pub struct RemoteRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    pub prio: Option<u16>,
    pub notes: String,
}

/// Wire shape of a provider record.
///
/// The provider sends `ttl` and `prio` as strings and reports a priority of
/// `"0"` for every record, while snapshot files carry plain numbers and `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRemoteRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(deserialize_with = "lenient::ttl")]
    pub ttl: u32,
    #[serde(default, deserialize_with = "lenient::priority")]
    pub prio: Option<u16>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
}

impl TryFrom<RawRemoteRecord> for RemoteRecord {
    type Error = Error;

    fn try_from(raw: RawRemoteRecord) -> Result<Self, Self::Error> {
        let record_type: RecordType = raw.record_type.parse()?;
        Ok(RemoteRecord {
            id: raw.id,
            name: raw.name,
            record_type,
            content: raw.content,
            ttl: raw.ttl,
            prio: raw.prio.filter(|_| record_type.has_priority()),
            notes: raw.notes.unwrap_or_default(),
        })
    }
}

mod lenient {
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer};
    use std::fmt;

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer or a string holding one")
        }

        fn visit_u64<E>(self, value: u64) -> Result<u64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u64, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(|_| E::custom(format!("negative number: {value}")))
        }

        fn visit_str<E>(self, value: &str) -> Result<u64, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("'{value}' is not a number")))
        }
    }

    struct OptNumberVisitor;

    impl<'de> Visitor<'de> for OptNumberVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("null, an integer or a string holding one")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            NumberVisitor.visit_u64(value).map(Some)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            NumberVisitor.visit_i64(value).map(Some)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.trim().is_empty() {
                return Ok(None);
            }
            NumberVisitor.visit_str(value).map(Some)
        }
    }

    pub fn ttl<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = deserializer.deserialize_any(NumberVisitor)?;
        u32::try_from(value).map_err(|_| de::Error::custom(format!("number too large: {value}")))
    }

    pub fn priority<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match deserializer.deserialize_option(OptNumberVisitor)? {
            Some(value) => u16::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("priority too large: {value}"))),
            None => Ok(None),
        }
    }

    struct StringVisitor;

    impl<'de> Visitor<'de> for StringVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or an integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StringVisitor)
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bearing_types() {
        for t in RecordType::ALL {
            let expected = t == RecordType::MX || t == RecordType::SRV;
            assert_eq!(t.has_priority(), expected, "{t}");
        }
    }

    #[test]
    fn test_record_type_from_str() {
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::AAAA);
        assert_eq!("mx".parse::<RecordType>().unwrap(), RecordType::MX);
        assert!("SOA".parse::<RecordType>().is_err());
        assert!("".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_record_class_from_str() {
        assert_eq!("IN".parse::<RecordClass>().unwrap(), RecordClass::IN);
        assert_eq!("in".parse::<RecordClass>().unwrap(), RecordClass::IN);
        assert!("CH".parse::<RecordClass>().is_err());
    }

    #[test]
    fn test_remote_record_from_provider_json() {
        let json = r#"{
            "id": "106926659",
            "name": "www.example.com",
            "type": "A",
            "content": "1.1.1.1",
            "ttl": "600",
            "prio": "0",
            "notes": ""
        }"#;
        let record: RemoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "106926659");
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.ttl, 600);
        // the provider reports prio 0 for everything; only MX/SRV keep it
        assert_eq!(record.prio, None);
    }

    #[test]
    fn test_remote_record_keeps_mx_priority() {
        let json = r#"{"id": "1", "name": "example.com", "type": "MX",
            "content": "mx.example.com", "ttl": "3600", "prio": "10", "notes": null}"#;
        let record: RemoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.prio, Some(10));
        assert_eq!(record.notes, "");
    }

    #[test]
    fn test_remote_record_from_snapshot_json() {
        let json = r#"{"id": "7", "name": "example.com", "type": "TXT",
            "content": "v=spf1 -all", "ttl": 300, "prio": null, "notes": "spf"}"#;
        let record: RemoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.ttl, 300);
        assert_eq!(record.prio, None);
        assert_eq!(record.notes, "spf");
    }

    #[test]
    fn test_remote_record_unknown_type() {
        let json = r#"{"id": "7", "name": "example.com", "type": "HTTPS",
            "content": "1 .", "ttl": 300, "prio": null, "notes": ""}"#;
        let result: Result<RemoteRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_remote_record_serializes_snapshot_fields() {
        let record = RemoteRecord {
            id: "42".to_string(),
            name: "mail.example.com".to_string(),
            record_type: RecordType::MX,
            content: "mx.example.com".to_string(),
            ttl: 600,
            prio: Some(5),
            notes: String::new(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "MX");
        assert_eq!(value["ttl"], 600);
        assert_eq!(value["prio"], 5);
        assert!(value.get("record_type").is_none());
    }
}
