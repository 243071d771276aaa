use crate::constants::{MAX_TTL, MIN_TTL};
use crate::error::{Error, Result};
use crate::record::RecordType;

/// Checks a fully qualified domain name such as a zone's `$ORIGIN`.
pub fn validate_dns_name(name: &str) -> Result<()> {
    let Some(labels) = name.strip_suffix('.') else {
        return Err(Error::validation(format!(
            "Domain must be fully qualified: {name}"
        )));
    };
    if name.len() > 253 {
        return Err(Error::validation(format!(
            "DNS name too long (max 253 chars): {name}"
        )));
    }
    for label in labels.split('.') {
        if label.is_empty() {
            return Err(Error::validation(format!("DNS name has empty label: {name}")));
        }
        if label.len() > 63 {
            return Err(Error::validation(format!(
                "DNS label too long (max 63 chars): {label}"
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::validation(format!(
                "DNS label has invalid characters: {label}"
            )));
        }
    }
    Ok(())
}

/// Checks the values the provider would reject, before any request is sent.
pub fn validate_record(record_type: RecordType, ttl: u32, prio: Option<u16>) -> Result<()> {
    if !(MIN_TTL..=MAX_TTL).contains(&ttl) {
        return Err(Error::validation(format!(
            "ttl must be between {MIN_TTL} and {MAX_TTL}, got {ttl}"
        )));
    }
    if prio.is_some() && !record_type.has_priority() {
        return Err(Error::validation(format!(
            "priority can only be set for MX and SRV records, got {record_type}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dns_name_valid() {
        assert!(validate_dns_name("example.com.").is_ok());
        assert!(validate_dns_name("sub.example.com.").is_ok());
        assert!(validate_dns_name("host-name.example.com.").is_ok());
        assert!(validate_dns_name("_dmarc.example.com.").is_ok());
        assert!(validate_dns_name("123.example.com.").is_ok());
    }

    #[test]
    fn test_validate_dns_name_rejects_wildcard_origin() {
        assert!(validate_dns_name("*.example.com.").is_err());
    }

    #[test]
    fn test_validate_dns_name_missing_dot() {
        assert!(validate_dns_name("example.com").is_err());
        assert!(validate_dns_name(".").is_err());
    }

    #[test]
    fn test_validate_dns_name_too_long() {
        let long_name = "a".repeat(250) + ".com.";
        assert!(validate_dns_name(&long_name).is_err());
        let long_label = "a".repeat(64) + ".example.com.";
        assert!(validate_dns_name(&long_label).is_err());
    }

    #[test]
    fn test_validate_dns_name_bad_labels() {
        assert!(validate_dns_name("..example.com.").is_err());
        assert!(validate_dns_name("ex\"ample.com.").is_err());
        assert!(validate_dns_name("in valid.example.com.").is_err());
    }

    #[test]
    fn test_validate_record_ttl_range() {
        assert!(validate_record(RecordType::A, 300, None).is_ok());
        assert!(validate_record(RecordType::A, 86400, None).is_ok());
        assert!(validate_record(RecordType::A, 299, None).is_err());
        assert!(validate_record(RecordType::A, 86401, None).is_err());
    }

    #[test]
    fn test_validate_record_priority() {
        assert!(validate_record(RecordType::MX, 600, Some(10)).is_ok());
        assert!(validate_record(RecordType::SRV, 600, Some(0)).is_ok());
        assert!(validate_record(RecordType::MX, 600, None).is_ok());

        let err = validate_record(RecordType::TXT, 600, Some(10)).unwrap_err();
        assert!(err.to_string().contains("priority can only be set"));
    }
}
