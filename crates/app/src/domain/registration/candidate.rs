//! Candidate domain normalization and hostname checks.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Maximum length of a normalized candidate domain, port included.
pub const MAX_DOMAIN_LENGTH: usize = 253;

const MAX_LABEL_LENGTH: usize = 63;

/// Separator used in every signed payload. Never allowed inside a domain.
pub const PAYLOAD_SEPARATOR: char = '|';

/// A lowercase `host[:port]` derived from user input. Ports 80 and 443 are
/// dropped: the handshake reaches the host on both default ports, so they name
/// the same site as the bare host.
///
/// Construction only normalizes; whether the value is an acceptable domain is
/// decided by [`RegistrationRules`](super::rules::RegistrationRules).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateDomain(String);

impl CandidateDomain {
    /// Normalize raw input: strip a leading `http://` or `https://`, cut at the
    /// first `/`, trim, drop a default port and lowercase.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let without_scheme = strip_scheme(trimmed);
        let host = without_scheme
            .split_once('/')
            .map_or(without_scheme, |(host, _path)| host);

        Self(strip_default_port(host.trim()).to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison against a raw domain string.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Display for CandidateDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CandidateDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercased `host[:port]` of an inbound request's Host header.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    CandidateDomain::normalize(host).into_string()
}

fn strip_scheme(value: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = value.get(..scheme.len())
            && prefix.eq_ignore_ascii_case(scheme)
        {
            return value.get(scheme.len()..).unwrap_or_default();
        }
    }

    value
}

fn strip_default_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, "80" | "443")) => name,
        _ => host,
    }
}

/// Why a domain failed the hostname check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostnameProblem {
    Empty,
    TooLong,
    ForbiddenCharacter,
    BadLabel,
    BadPort,
}

impl HostnameProblem {
    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::Empty => "Domain is required",
            Self::TooLong => "Domain is too long",
            Self::ForbiddenCharacter => "Domain contains invalid characters",
            Self::BadLabel => "Domain is not a valid hostname",
            Self::BadPort => "Domain port must be between 1 and 65535",
        }
    }
}

/// Checks every candidate must pass, hostname validation or not.
pub(crate) fn check_basic(domain: &CandidateDomain) -> Result<(), HostnameProblem> {
    let value = domain.as_str();

    if value.is_empty() {
        return Err(HostnameProblem::Empty);
    }

    if value.len() > MAX_DOMAIN_LENGTH {
        return Err(HostnameProblem::TooLong);
    }

    if value
        .chars()
        .any(|c| c.is_whitespace() || c == PAYLOAD_SEPARATOR)
    {
        return Err(HostnameProblem::ForbiddenCharacter);
    }

    Ok(())
}

/// Strict `hostname[:port]` check.
pub(crate) fn check_hostname(domain: &CandidateDomain) -> Result<(), HostnameProblem> {
    check_basic(domain)?;

    let (host, port) = match domain.as_str().rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (domain.as_str(), None),
    };

    if let Some(port) = port {
        match port.parse::<u16>() {
            Ok(0) | Err(_) => return Err(HostnameProblem::BadPort),
            Ok(_) => {}
        }

        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(HostnameProblem::BadPort);
        }
    }

    if host.is_empty() {
        return Err(HostnameProblem::Empty);
    }

    if host.split('.').all(is_valid_label) {
        Ok(())
    } else {
        Err(HostnameProblem::BadLabel)
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
