//! Structures and functions related to configuring chain validation and revocation checking

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use log::error;
use serde::{Deserialize, Serialize};

use x509auth_macros::*;

use crate::util::cert_utilities::now_as_unix_secs;
use crate::util::error::*;

//-----------------------------------------------------------------------------------------------
// Enums used as setting values
//-----------------------------------------------------------------------------------------------
/// `RevocationCheckerKind` selects the [`RevocationChecker`](crate::RevocationChecker) built by
/// [`ChainValidator::from_settings`](crate::ChainValidator::from_settings).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum RevocationCheckerKind {
    /// Revocation status is not checked
    #[default]
    NoOp,
    /// CRLs are located using the CRLDistributionPoints extension of each certificate
    CrlDistributionPoints,
}

/// `UnavailableCrlPolicy` determines the outcome of a revocation check when a certificate names
/// distribution points but no CRL could be obtained from any of them.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnavailableCrlPolicy {
    /// Treat the certificate as not revoked (fail open)
    #[default]
    Allow,
    /// Fail the certificate with `RevocationStatusNotDetermined` (fail closed)
    Deny,
}

/// `ExpiredCrlPolicy` determines whether a CRL whose validity window does not include the time of
/// interest may be used to determine revocation status.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExpiredCrlPolicy {
    /// CRLs are used without regard for thisUpdate or nextUpdate
    #[default]
    Ignore,
    /// CRLs that are not yet valid or that are past nextUpdate are not used
    Deny,
    /// As Deny, but a CRL remains usable for the given number of seconds after nextUpdate
    Threshold(u64),
}

/// `AuthenticationSettings` is a typedef for a `BTreeMap` that maps string keys to a variant map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationSettings(pub BTreeMap<String, AuthenticationSettingsTypes>);

impl AuthenticationSettings {
    /// Creates a new empty [`AuthenticationSettings`]
    pub fn new() -> Self {
        Self::default()
    }
}

/// `AuthenticationSettingsTypes` is used to define a variant map with types associated with
/// validating presented certificate chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationSettingsTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u8 values
    U8(u8),
    /// Represents u64 values
    U64(u64),
    /// Represents String values
    String(String),
    /// Represents duration or a timeout
    Duration(Duration),
    /// Represents a choice of revocation checker
    RevocationCheckerKind(RevocationCheckerKind),
    /// Represents handling of unavailable CRLs
    UnavailableCrlPolicy(UnavailableCrlPolicy),
    /// Represents handling of stale CRLs
    ExpiredCrlPolicy(ExpiredCrlPolicy),
}

//-----------------------------------------------------------------------------------------------
// Setting names and defaults
//-----------------------------------------------------------------------------------------------
/// `PS_TRUSTED_ISSUER_DN_PATTERN` is used to retrieve the regular expression that the issuer name of at
/// least one certificate in a presented chain must match. The pattern must match the entire RFC 4514
/// rendering of the name. There is no default; a validator cannot be built without it.
pub static PS_TRUSTED_ISSUER_DN_PATTERN: &str = "psTrustedIssuerDnPattern";

/// `PS_SUBJECT_DN_PATTERN` is used to retrieve the regular expression the subject name of the client
/// certificate must match. By default, any subject is accepted.
pub static PS_SUBJECT_DN_PATTERN: &str = "psSubjectDnPattern";

/// Default value for `PS_SUBJECT_DN_PATTERN`
pub static PS_SUBJECT_DN_PATTERN_DEFAULT: &str = ".*";

/// `PS_MAX_PATH_LENGTH` is used to retrieve the largest pathLenConstraint a CA certificate in a
/// presented chain may assert. A value of 0 describes a CA that issues end entity certificates only.
pub static PS_MAX_PATH_LENGTH: &str = "psMaxPathLength";

/// Default value for `PS_MAX_PATH_LENGTH`
pub static PS_MAX_PATH_LENGTH_DEFAULT: u8 = 1;

/// `PS_MAX_PATH_LENGTH_ALLOW_UNSPECIFIED` is used to retrieve a flag that allows CA certificates
/// that do not assert a pathLenConstraint. By default, such certificates are rejected.
pub static PS_MAX_PATH_LENGTH_ALLOW_UNSPECIFIED: &str = "psMaxPathLengthAllowUnspecified";

/// `PS_CHECK_KEY_USAGE` is used to retrieve a flag that enables evaluation of the keyUsage
/// extension in the client certificate. By default, key usage is not checked.
pub static PS_CHECK_KEY_USAGE: &str = "psCheckKeyUsage";

/// `PS_REQUIRE_KEY_USAGE` is used to retrieve a flag that requires the client certificate to have a
/// keyUsage extension asserting digitalSignature, whether or not the extension is critical.
pub static PS_REQUIRE_KEY_USAGE: &str = "psRequireKeyUsage";

/// `PS_REVOCATION_CHECKER` is used to retrieve a [`RevocationCheckerKind`]. Defaults to NoOp.
pub static PS_REVOCATION_CHECKER: &str = "psRevocationChecker";

/// `PS_CRL_TIMEOUT` is used to retrieve the timeout applied to each CRL retrieval.
pub static PS_CRL_TIMEOUT: &str = "psCrlTimeout";

/// Default value for `PS_CRL_TIMEOUT`
pub static PS_CRL_TIMEOUT_DEFAULT: Duration = Duration::from_secs(60);

/// `PS_MAX_CRL_SIZE` is used to retrieve the largest CRL, in bytes, that will be retrieved.
pub static PS_MAX_CRL_SIZE: &str = "psMaxCrlSize";

/// Default value for `PS_MAX_CRL_SIZE`
pub static PS_MAX_CRL_SIZE_DEFAULT: u64 = 10 * 1024 * 1024;

/// `PS_UNAVAILABLE_CRL_POLICY` is used to retrieve an [`UnavailableCrlPolicy`]. Defaults to Allow.
pub static PS_UNAVAILABLE_CRL_POLICY: &str = "psUnavailableCrlPolicy";

/// `PS_EXPIRED_CRL_POLICY` is used to retrieve an [`ExpiredCrlPolicy`]. Defaults to Ignore.
pub static PS_EXPIRED_CRL_POLICY: &str = "psExpiredCrlPolicy";

/// `PS_TIME_OF_INTEREST` is used to retrieve the time, as seconds since Unix epoch, at which validity
/// windows are evaluated. Defaults to the current time when read. Zero disables validity checks.
pub static PS_TIME_OF_INTEREST: &str = "psTimeOfInterest";

//-----------------------------------------------------------------------------------------------
// Getters/setters for settings
//-----------------------------------------------------------------------------------------------
vs_gets_and_sets!(PS_TRUSTED_ISSUER_DN_PATTERN, String);
vs_gets_and_sets_with_default!(
    PS_SUBJECT_DN_PATTERN,
    String,
    PS_SUBJECT_DN_PATTERN_DEFAULT.to_string()
);
vs_gets_and_sets_with_default!(PS_MAX_PATH_LENGTH, u8, PS_MAX_PATH_LENGTH_DEFAULT);
vs_gets_and_sets_with_default!(PS_MAX_PATH_LENGTH_ALLOW_UNSPECIFIED, bool, false);
vs_gets_and_sets_with_default!(PS_CHECK_KEY_USAGE, bool, false);
vs_gets_and_sets_with_default!(PS_REQUIRE_KEY_USAGE, bool, false);
vs_gets_and_sets_with_default!(
    PS_REVOCATION_CHECKER,
    RevocationCheckerKind,
    RevocationCheckerKind::default()
);
vs_gets_and_sets_with_default!(PS_CRL_TIMEOUT, Duration, PS_CRL_TIMEOUT_DEFAULT);
vs_gets_and_sets_with_default!(PS_MAX_CRL_SIZE, u64, PS_MAX_CRL_SIZE_DEFAULT);
vs_gets_and_sets_with_default!(
    PS_UNAVAILABLE_CRL_POLICY,
    UnavailableCrlPolicy,
    UnavailableCrlPolicy::default()
);
vs_gets_and_sets_with_default!(
    PS_EXPIRED_CRL_POLICY,
    ExpiredCrlPolicy,
    ExpiredCrlPolicy::default()
);
vs_gets_and_sets_with_default!(PS_TIME_OF_INTEREST, u64, now_as_unix_secs());

impl AuthenticationSettings {
    /// `get_time_of_interest_if_set` returns the `PS_TIME_OF_INTEREST` value only when one has been
    /// configured. Long-lived validators use this to evaluate each request at the then current time.
    pub fn get_time_of_interest_if_set(&self) -> Option<u64> {
        match self.0.get(PS_TIME_OF_INTEREST) {
            Some(AuthenticationSettingsTypes::U64(toi)) => Some(*toi),
            _ => None,
        }
    }
}

/// `read_settings` reads a JSON-formatted [`AuthenticationSettings`] object from the file named by
/// `fname`. An empty settings object is returned when no file name is given.
pub fn read_settings(fname: Option<&str>) -> Result<AuthenticationSettings> {
    let fname = match fname {
        Some(f) => f,
        None => return Ok(AuthenticationSettings::new()),
    };

    let json = match std::fs::read(Path::new(fname)) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to read settings from {}: {}", fname, e);
            return Err(Error::StdIoError(e.kind()));
        }
    };
    match serde_json::from_slice(&json) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            error!("Failed to parse settings from {}: {}", fname, e);
            Err(Error::ParseError)
        }
    }
}
