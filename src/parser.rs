use std::fs;
use std::path::Path;

use tracing::warn;

use crate::constants::MAX_ZONE_TTL;
use crate::error::{Error, Result};
use crate::record::{RecordClass, RecordType, ZoneRecord};
use crate::transform::{bare_domain, fqdn};
use crate::validation::validate_dns_name;

/// An in-memory zone file: origin, optional `$TTL` and the records in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Always ends with a dot.
    pub origin: String,
    pub ttl: Option<u32>,
    pub records: Vec<ZoneRecord>,
}

impl Zone {
    pub fn new(origin: &str, ttl: Option<u32>, records: Vec<ZoneRecord>) -> Self {
        Zone {
            origin: fqdn(origin),
            ttl,
            records,
        }
    }

    /// The origin without its trailing dot, as the provider names domains.
    pub fn domain(&self) -> String {
        bare_domain(&self.origin)
    }
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    offset: usize,
    text: &'a str,
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token {
                    offset: s,
                    text: &line[s..i],
                });
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            offset: s,
            text: &line[s..],
        });
    }
    tokens
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn parse_ttl(token: &str, line: usize) -> Result<u32> {
    let ttl: u32 = token
        .parse()
        .map_err(|_| Error::format(line, format!("invalid TTL '{token}'")))?;
    if ttl > MAX_ZONE_TTL {
        return Err(Error::format(
            line,
            format!("TTL too large (max {MAX_ZONE_TTL}): {ttl}"),
        ));
    }
    Ok(ttl)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Splits the record data from a trailing comment.
///
/// Quoted data runs to the rightmost double quote on the line, so it may contain
/// quotes and semicolons itself. Unquoted data ends at the first semicolon.
fn split_payload(region: &str) -> (String, Option<String>) {
    if let Some(quoted) = region.strip_prefix('"') {
        match quoted.rfind('"') {
            Some(end) => {
                let rest = quoted[end + 1..].trim();
                let comment = rest.strip_prefix(';').unwrap_or(rest).trim();
                (quoted[..end].to_string(), non_empty(comment))
            }
            None => (quoted.trim_end().to_string(), None),
        }
    } else if let Some((data, comment)) = region.split_once(';') {
        (data.trim().to_string(), non_empty(comment.trim()))
    } else {
        (region.to_string(), None)
    }
}

/// Parses one record line. `Ok(None)` means the line is skipped.
///
/// Three column orders are accepted:
/// `name ttl class type [prio] data`, `name class ttl type [prio] data`
/// and `name class type [prio] data`, where the TTL is inherited.
fn parse_record_line(
    line: &str,
    tokens: &[Token<'_>],
    line_no: usize,
    origin: Option<&str>,
    inherited_ttl: Option<u32>,
) -> Result<Option<ZoneRecord>> {
    if tokens.len() < 3 {
        warn!("Ignoring incomplete record line {line_no}: {}", line.trim());
        return Ok(None);
    }

    let (ttl, class_token, type_index) = if is_numeric(tokens[1].text) {
        (Some(parse_ttl(tokens[1].text, line_no)?), tokens[2].text, 3)
    } else if is_numeric(tokens[2].text) {
        (Some(parse_ttl(tokens[2].text, line_no)?), tokens[1].text, 3)
    } else {
        (None, tokens[1].text, 2)
    };

    let Some(type_token) = tokens.get(type_index) else {
        warn!("Ignoring incomplete record line {line_no}: {}", line.trim());
        return Ok(None);
    };
    let Ok(record_type) = type_token.text.parse::<RecordType>() else {
        warn!("Ignoring unsupported record type on line {line_no}: {}", line.trim());
        return Ok(None);
    };
    let Ok(class) = class_token.parse::<RecordClass>() else {
        warn!("Ignoring unsupported record class on line {line_no}: {}", line.trim());
        return Ok(None);
    };

    let ttl = match ttl {
        Some(ttl) => ttl,
        None => inherited_ttl.ok_or_else(|| {
            Error::format(line_no, "record has no TTL and no $TTL or previous record to inherit from")
        })?,
    };

    let mut payload_index = type_index + 1;
    let prio = if record_type.has_priority() {
        let token = tokens.get(payload_index).ok_or_else(|| {
            Error::format(line_no, format!("{record_type} record is missing its priority"))
        })?;
        payload_index += 1;
        let prio = token.text.parse::<u16>().map_err(|_| {
            Error::format(line_no, format!("invalid priority '{}'", token.text))
        })?;
        Some(prio)
    } else {
        None
    };

    let region = tokens
        .get(payload_index)
        .map(|t| line[t.offset..].trim())
        .unwrap_or_default();
    if region.is_empty() {
        warn!("Ignoring record without data on line {line_no}: {}", line.trim());
        return Ok(None);
    }
    let (data, comment) = split_payload(region);

    let name = match tokens[0].text {
        "@" => origin
            .ok_or_else(|| Error::format(line_no, "'@' used before $ORIGIN"))?
            .to_string(),
        name => name.to_string(),
    };

    Ok(Some(ZoneRecord {
        name,
        ttl,
        class,
        record_type,
        data,
        prio,
        comment,
    }))
}

/// Parses zone file text.
///
/// Unsupported record types and classes are skipped with a warning. Malformed
/// TTLs or priorities, and a missing `$ORIGIN`, are errors.
pub fn parse_zone(raw: &str) -> Result<Zone> {
    let mut origin: Option<String> = None;
    let mut default_ttl: Option<u32> = None;
    let mut records: Vec<ZoneRecord> = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let tokens = tokenize(line);

        let Some(first) = tokens.first() else {
            continue;
        };
        if first.text.starts_with(';') {
            continue;
        }

        match first.text {
            "$ORIGIN" => {
                let domain = tokens
                    .get(1)
                    .ok_or_else(|| Error::format(line_no, "$ORIGIN without domain"))?;
                if origin.is_some() {
                    return Err(Error::format(line_no, "$ORIGIN declared more than once"));
                }
                let domain = fqdn(domain.text);
                validate_dns_name(&domain).map_err(|e| Error::format(line_no, e.to_string()))?;
                origin = Some(domain);
            }
            "$TTL" => {
                let ttl = tokens
                    .get(1)
                    .ok_or_else(|| Error::format(line_no, "$TTL without value"))?;
                default_ttl = Some(parse_ttl(ttl.text, line_no)?);
            }
            directive if directive.starts_with('$') => {
                warn!("Ignoring unsupported directive on line {line_no}: {directive}");
            }
            _ => {
                let inherited_ttl = records.last().map(|r| r.ttl).or(default_ttl);
                if let Some(record) =
                    parse_record_line(line, &tokens, line_no, origin.as_deref(), inherited_ttl)?
                {
                    records.push(record);
                }
            }
        }
    }

    let origin = origin.ok_or_else(|| Error::format(0, "no $ORIGIN directive found"))?;

    Ok(Zone {
        origin,
        ttl: default_ttl,
        records,
    })
}

pub fn read_zone(path: &Path) -> Result<Zone> {
    let content = fs::read_to_string(path)?;
    parse_zone(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ttl: u32, record_type: RecordType, data: &str) -> ZoneRecord {
        ZoneRecord {
            name: name.to_string(),
            ttl,
            class: RecordClass::IN,
            record_type,
            data: data.to_string(),
            prio: None,
            comment: None,
        }
    }

    // ==================== Directive Tests ====================

    #[test]
    fn test_parse_example_zone() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n$TTL 300\n@ IN A \"1.2.3.4\"\nmail IN MX 10 \"mx.ex.com.\"\n",
        )
        .unwrap();

        assert_eq!(zone.origin, "ex.com.");
        assert_eq!(zone.ttl, Some(300));
        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[0], record("ex.com.", 300, RecordType::A, "1.2.3.4"));
        assert_eq!(
            zone.records[1],
            ZoneRecord {
                prio: Some(10),
                ..record("mail", 300, RecordType::MX, "mx.ex.com.")
            }
        );
    }

    #[test]
    fn test_missing_origin_fails() {
        let result = parse_zone("$TTL 300\nwww 300 IN A 1.2.3.4\n");
        assert!(matches!(result, Err(Error::Format { .. })));

        let result = parse_zone("");
        assert!(result.is_err());
    }

    #[test]
    fn test_origin_normalized_with_trailing_dot() {
        let zone = parse_zone("$ORIGIN ex.com\n@ 600 IN A 1.2.3.4\n").unwrap();
        assert_eq!(zone.origin, "ex.com.");
        assert_eq!(zone.records[0].name, "ex.com.");
        assert_eq!(zone.domain(), "ex.com");
    }

    #[test]
    fn test_duplicate_origin_fails() {
        let result = parse_zone("$ORIGIN ex.com.\n$ORIGIN other.com.\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_at_before_origin_fails() {
        let result = parse_zone("@ 600 IN A 1.2.3.4\n$ORIGIN ex.com.\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("line 1"), "{err}");
    }

    #[test]
    fn test_at_only_replaced_as_whole_name() {
        let zone = parse_zone("$ORIGIN ex.com.\nfoo@bar 600 IN TXT x\n").unwrap();
        assert_eq!(zone.records[0].name, "foo@bar");
    }

    #[test]
    fn test_invalid_ttl_directive() {
        assert!(parse_zone("$ORIGIN ex.com.\n$TTL abc\n").is_err());
        assert!(parse_zone("$ORIGIN ex.com.\n$TTL\n").is_err());
        assert!(parse_zone("$ORIGIN ex.com.\n$TTL 4294967295\n").is_err());
    }

    #[test]
    fn test_unsupported_directive_skipped() {
        let zone = parse_zone("$ORIGIN ex.com.\n$INCLUDE other.zone\nwww 600 IN A 1.2.3.4\n")
            .unwrap();
        assert_eq!(zone.records.len(), 1);
    }

    // ==================== Column Scheme Tests ====================

    #[test]
    fn test_column_schemes_are_equivalent() {
        let scheme1 = parse_zone("$ORIGIN ex.com.\nwww 600 IN A 1.2.3.4\n").unwrap();
        let scheme2 = parse_zone("$ORIGIN ex.com.\nwww IN 600 A 1.2.3.4\n").unwrap();
        let scheme3 = parse_zone("$ORIGIN ex.com.\n$TTL 600\nwww IN A 1.2.3.4\n").unwrap();

        assert_eq!(scheme1.records, scheme2.records);
        assert_eq!(scheme2.records, scheme3.records);
    }

    #[test]
    fn test_column_schemes_with_priority() {
        let scheme1 = parse_zone("$ORIGIN ex.com.\n@ 600 IN MX 10 mx.ex.com.\n").unwrap();
        let scheme2 = parse_zone("$ORIGIN ex.com.\n@ IN 600 MX 10 mx.ex.com.\n").unwrap();
        let scheme3 = parse_zone("$ORIGIN ex.com.\n$TTL 600\n@ IN MX 10 mx.ex.com.\n").unwrap();

        assert_eq!(scheme1.records, scheme2.records);
        assert_eq!(scheme2.records, scheme3.records);
        assert_eq!(scheme1.records[0].prio, Some(10));
        assert_eq!(scheme1.records[0].data, "mx.ex.com.");
    }

    #[test]
    fn test_ttl_inherited_from_previous_record() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n$TTL 300\nwww 900 IN A 1.2.3.4\nftp IN A 1.2.3.5\n",
        )
        .unwrap();
        assert_eq!(zone.records[0].ttl, 900);
        assert_eq!(zone.records[1].ttl, 900);
    }

    #[test]
    fn test_ttl_without_default_or_previous_fails() {
        let result = parse_zone("$ORIGIN ex.com.\nwww IN A 1.2.3.4\n");
        assert!(matches!(result, Err(Error::Format { line: 2, .. })));
    }

    #[test]
    fn test_ttl_state_does_not_leak_between_parses() {
        parse_zone("$ORIGIN ex.com.\n$TTL 300\nwww IN A 1.2.3.4\n").unwrap();
        assert!(parse_zone("$ORIGIN ex.com.\nwww IN A 1.2.3.4\n").is_err());
    }

    #[test]
    fn test_invalid_record_ttl() {
        let result = parse_zone("$ORIGIN ex.com.\nwww 99999999999 IN A 1.2.3.4\n");
        assert!(result.is_err());
    }

    // ==================== Priority Tests ====================

    #[test]
    fn test_priority_only_for_mx_and_srv() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n$TTL 600\n\
             _sip._tcp IN SRV 10 5 5060 sip.ex.com.\n\
             www IN A 10\n\
             txt IN TXT 10 20\n",
        )
        .unwrap();

        assert_eq!(zone.records[0].prio, Some(10));
        assert_eq!(zone.records[0].data, "5 5060 sip.ex.com.");
        assert_eq!(zone.records[1].prio, None);
        assert_eq!(zone.records[1].data, "10");
        assert_eq!(zone.records[2].prio, None);
        assert_eq!(zone.records[2].data, "10 20");
    }

    #[test]
    fn test_invalid_priority_fails() {
        let result = parse_zone("$ORIGIN ex.com.\n@ 600 IN MX ten mx.ex.com.\n");
        assert!(matches!(result, Err(Error::Format { line: 2, .. })));

        let result = parse_zone("$ORIGIN ex.com.\n@ 600 IN MX\n");
        assert!(result.is_err());
    }

    // ==================== Unsupported Line Tests ====================

    #[test]
    fn test_unsupported_type_skipped() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n$TTL 600\n@ IN SOA ns1.ex.com. admin.ex.com. (1 2 3 4 5)\nwww IN A 1.2.3.4\n",
        )
        .unwrap();
        assert_eq!(zone.records.len(), 1);
        assert_eq!(zone.records[0].name, "www");
    }

    #[test]
    fn test_unsupported_class_skipped() {
        let zone = parse_zone("$ORIGIN ex.com.\nwww 600 CH A 1.2.3.4\nftp 600 IN A 1.2.3.5\n")
            .unwrap();
        assert_eq!(zone.records.len(), 1);
        assert_eq!(zone.records[0].name, "ftp");
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let zone = parse_zone(
            "; header comment\n$ORIGIN ex.com.\n\n   \n   ; indented comment\nwww 600 IN A 1.2.3.4\n",
        )
        .unwrap();
        assert_eq!(zone.records.len(), 1);
    }

    #[test]
    fn test_short_lines_skipped() {
        let zone = parse_zone("$ORIGIN ex.com.\n)\nwww 600\nftp 600 IN A\n").unwrap();
        assert!(zone.records.is_empty());
    }

    // ==================== Payload Tests ====================

    #[test]
    fn test_quoted_payload_with_comment() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n@ 600 IN TXT \"v=spf1 include:_spf.ex.com ~all\" ; spf policy\n",
        )
        .unwrap();
        assert_eq!(zone.records[0].data, "v=spf1 include:_spf.ex.com ~all");
        assert_eq!(zone.records[0].comment.as_deref(), Some("spf policy"));
    }

    #[test]
    fn test_quoted_payload_uses_rightmost_quote() {
        let zone = parse_zone(
            "$ORIGIN ex.com.\n@ 600 IN TXT \"say \"hi\"; ok\" ;note\n",
        )
        .unwrap();
        assert_eq!(zone.records[0].data, "say \"hi\"; ok");
        assert_eq!(zone.records[0].comment.as_deref(), Some("note"));
    }

    #[test]
    fn test_quoted_payload_without_comment() {
        let zone = parse_zone("$ORIGIN ex.com.\n@ 600 IN A \"1.2.3.4\"   \n").unwrap();
        assert_eq!(zone.records[0].data, "1.2.3.4");
        assert_eq!(zone.records[0].comment, None);
    }

    #[test]
    fn test_unquoted_payload_with_comment() {
        let zone = parse_zone("$ORIGIN ex.com.\nwww 600 IN A 1.2.3.4 ; web server\n").unwrap();
        assert_eq!(zone.records[0].data, "1.2.3.4");
        assert_eq!(zone.records[0].comment.as_deref(), Some("web server"));
    }

    #[test]
    fn test_unquoted_payload_keeps_inner_spacing() {
        let zone =
            parse_zone("$ORIGIN ex.com.\n@ 600 IN CAA 0  issue  letsencrypt.org\n").unwrap();
        assert_eq!(zone.records[0].data, "0  issue  letsencrypt.org");
    }

    #[test]
    fn test_empty_comment_is_none() {
        let zone = parse_zone("$ORIGIN ex.com.\nwww 600 IN A 1.2.3.4 ;\n").unwrap();
        assert_eq!(zone.records[0].comment, None);
    }

    #[test]
    fn test_lowercase_class_and_type() {
        let zone = parse_zone("$ORIGIN ex.com.\nwww 600 in cname web.ex.com.\n").unwrap();
        assert_eq!(zone.records[0].record_type, RecordType::CNAME);
    }

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("  www\t600  IN A");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["www", "600", "IN", "A"]);
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[1].offset, 6);
    }
}
