//! Registration rule set.
//!
//! The same [`RegistrationRules`] run when a domain is submitted for
//! verification and again, authoritatively, before the provisioning
//! transaction.

use std::collections::{BTreeMap, btree_map};

use serde::Serialize;

use crate::domain::registration::{
    candidate::{self, CandidateDomain},
    data::RegistrationRequest,
};

pub const SITE_DOMAIN_FIELD: &str = "site_domain";
pub const DOMAIN_TOKEN_FIELD: &str = "domain_token";

const USERNAME_LENGTH: (usize, usize) = (3, 32);
const PASSWORD_LENGTH: (usize, usize) = (6, 64);
const REAL_NAME_MAX: usize = 50;
const MOBILE_LENGTH: (usize, usize) = (6, 20);
const EMAIL_MAX: usize = 254;
const SITE_NAME_MAX: usize = 100;

/// Field name to message map, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error.
    #[must_use]
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();

        errors.add(field, message);

        errors
    }

    /// Record an error. The first message for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn merge(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, &'static str, String> {
        self.0.iter()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = (&'a &'static str, &'a String);
    type IntoIter = btree_map::Iter<'a, &'static str, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationRules {
    pub validate_hostnames: bool,
}

impl RegistrationRules {
    #[must_use]
    pub fn new(validate_hostnames: bool) -> Self {
        Self { validate_hostnames }
    }

    /// Normalize and check a submitted domain's format.
    pub fn check_domain(&self, raw: &str) -> Result<CandidateDomain, ValidationErrors> {
        let domain = CandidateDomain::normalize(raw);

        self.domain_format(&domain)
            .map_err(|message| ValidationErrors::field(SITE_DOMAIN_FIELD, message))?;

        Ok(domain)
    }

    /// Check every registration field, collecting all failures.
    pub fn check_fields(
        &self,
        domain: &CandidateDomain,
        request: &RegistrationRequest,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(message) = self.domain_format(domain) {
            errors.add(SITE_DOMAIN_FIELD, message);
        }

        if let Err(message) = check_username(&request.username) {
            errors.add("username", message);
        }

        if let Err(message) = check_password(&request.password) {
            errors.add("password", message);
        }

        if let Err(message) = check_real_name(&request.real_name) {
            errors.add("real_name", message);
        }

        if let Err(message) = check_mobile(&request.mobile) {
            errors.add("mobile", message);
        }

        if let Some(email) = non_blank(request.email.as_deref())
            && let Err(message) = check_email(email)
        {
            errors.add("email", message);
        }

        if let Some(site_name) = non_blank(request.site_name.as_deref())
            && site_name.chars().count() > SITE_NAME_MAX
        {
            errors.add(
                "site_name",
                format!("Site name may be at most {SITE_NAME_MAX} characters"),
            );
        }

        errors.into_result()
    }

    fn domain_format(&self, domain: &CandidateDomain) -> Result<(), &'static str> {
        let checked = if self.validate_hostnames {
            candidate::check_hostname(domain)
        } else {
            candidate::check_basic(domain)
        };

        checked.map_err(candidate::HostnameProblem::message)
    }
}

impl Default for RegistrationRules {
    fn default() -> Self {
        Self::new(true)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn within(value: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&value.chars().count())
}

fn check_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    let starts_with_letter = username
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());

    if !within(username, USERNAME_LENGTH)
        || !starts_with_letter
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        let (min, max) = USERNAME_LENGTH;

        return Err(format!(
            "Username must be {min}-{max} letters, digits or underscores and start with a letter"
        ));
    }

    Ok(())
}

fn check_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if !within(password, PASSWORD_LENGTH) || password.chars().any(char::is_whitespace) {
        let (min, max) = PASSWORD_LENGTH;

        return Err(format!(
            "Password must be {min}-{max} characters without spaces"
        ));
    }

    Ok(())
}

fn check_real_name(real_name: &str) -> Result<(), String> {
    if real_name.trim().is_empty() {
        return Err("Real name is required".to_string());
    }

    if real_name.chars().count() > REAL_NAME_MAX {
        return Err(format!(
            "Real name may be at most {REAL_NAME_MAX} characters"
        ));
    }

    Ok(())
}

fn check_mobile(mobile: &str) -> Result<(), String> {
    if mobile.is_empty() {
        return Err("Mobile number is required".to_string());
    }

    let digits = mobile.strip_prefix('+').unwrap_or(mobile);

    if !within(mobile, MOBILE_LENGTH)
        || digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err("Mobile number is not valid".to_string());
    }

    Ok(())
}

fn check_email(email: &str) -> Result<(), String> {
    if email.len() > EMAIL_MAX {
        return Err(format!("Email may be at most {EMAIL_MAX} characters"));
    }

    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && !email.chars().any(char::is_whitespace)
            && domain
                .rsplit_once('.')
                .is_some_and(|(name, tld)| !name.is_empty() && tld.len() >= 2)
    });

    if well_formed {
        Ok(())
    } else {
        Err("Email is not valid".to_string())
    }
}
