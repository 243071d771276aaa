use crate::record::RecordType;

/// Strips a trailing dot: `example.com.` -> `example.com`
pub fn bare_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Adds a trailing dot if missing: `example.com` -> `example.com.`
pub fn fqdn(domain: &str) -> String {
    let domain = domain.trim();
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}

/// Converts a record name into the provider's form: fully qualified, lower case, no trailing dot.
///
/// `@` and the empty name denote the domain itself. Names ending with a dot are absolute.
/// Names already ending in the domain are taken as absolute too, the way the provider
/// reports them; anything else is relative to `domain`.
pub fn canonical_name(name: &str, domain: &str) -> String {
    let domain = bare_domain(domain);
    let name = name.trim();

    if name.is_empty() || name == "@" {
        return domain;
    }

    if let Some(absolute) = name.strip_suffix('.') {
        return absolute.to_ascii_lowercase();
    }

    let name = name.to_ascii_lowercase();
    if name == domain || name.ends_with(&format!(".{domain}")) {
        name
    } else {
        format!("{name}.{domain}")
    }
}

/// The subdomain the provider expects on create and edit calls.
///
/// The apex becomes the empty string. Returns `None` for names outside of `domain`.
pub fn subdomain(name: &str, domain: &str) -> Option<String> {
    let domain = bare_domain(domain);
    let canonical = canonical_name(name, &domain);

    if canonical == domain {
        return Some(String::new());
    }

    canonical
        .strip_suffix(&format!(".{domain}"))
        .map(str::to_string)
}

/// Identity of a record slot when no provider id is shared: `(type, name, priority)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub record_type: RecordType,
    pub name: String,
    pub prio: Option<u16>,
}

impl MatchKey {
    pub fn new(record_type: RecordType, name: &str, prio: Option<u16>, domain: &str) -> Self {
        MatchKey {
            record_type,
            name: canonical_name(name, domain),
            prio: prio.filter(|_| record_type.has_priority()),
        }
    }
}
