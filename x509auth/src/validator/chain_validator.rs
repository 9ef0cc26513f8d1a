//! Trust decisions for presented certificate chains

use std::sync::Arc;

use const_oid::db::rfc5912::ID_CE_KEY_USAGE;
use log::{debug, error, warn};
use regex::Regex;
use x509_cert::ext::pkix::{KeyUsage, KeyUsages};

use crate::util::cert_utilities::{log_error_for_certificate, now_as_unix_secs, valid_at_time};
use crate::util::error::*;
use crate::{
    AuthenticationSettings, CrlRevocationChecker, InMemoryRevocationCache, NoOpRevocationChecker,
    PathLength, PresentedCertificate, RevocationCache, RevocationChecker, RevocationCheckerKind,
};

/// `TrustDecision` is the result of validating one presented chain. The chain is accepted when
/// every certificate passed its checks, some certificate was issued by a trusted issuer and a client
/// (end entity) certificate was found.
#[derive(Clone, Debug)]
#[readonly::make]
pub struct TrustDecision {
    /// True if every certificate in the chain passed its checks
    pub valid: bool,
    /// True if the issuer name of at least one valid certificate matched the trusted issuer pattern
    pub has_trusted_issuer: bool,
    /// The last valid certificate in the chain that is not a CA certificate
    pub client_certificate: Option<PresentedCertificate>,
}

impl TrustDecision {
    /// Returns true if the chain is accepted
    pub fn is_accepted(&self) -> bool {
        self.valid && self.has_trusted_issuer && self.client_certificate.is_some()
    }
}

/// `ChainValidator` evaluates presented chains against trusted issuer and subject patterns,
/// path length and key usage policy and a [`RevocationChecker`].
///
/// Patterns must match the entire RFC 4514 rendering of a name, i.e., `CN=Test CA` does not match
/// `CN=Test CA,O=Example`.
pub struct ChainValidator {
    trusted_issuer_pattern: Regex,
    subject_pattern: Regex,
    max_path_length: u8,
    allow_unspecified_path_length: bool,
    check_key_usage: bool,
    require_key_usage: bool,
    time_of_interest: Option<u64>,
    revocation_checker: Box<dyn RevocationChecker>,
}

fn compile_pattern(setting: &str, pattern: &str) -> Result<Regex> {
    match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(r) => Ok(r),
        Err(e) => {
            error!("Invalid regular expression for {}: {}", setting, e);
            Err(Error::PathValidation(PathValidationStatus::Misconfiguration))
        }
    }
}

fn does_name_match_pattern(name: &str, pattern: &Regex) -> bool {
    let result = pattern.is_match(name);
    debug!("{} matches {} == {}", pattern.as_str(), name, result);
    result
}

/// `key_usage_permits_client_authentication` evaluates a keyUsage value (None when the extension is
/// absent) for use in client authentication:
/// - absent: permitted unless `require_key_usage` is set
/// - critical or required: permitted only if digitalSignature is set
/// - otherwise: permitted
pub fn key_usage_permits_client_authentication(
    key_usage: Option<&KeyUsage>,
    critical: bool,
    require_key_usage: bool,
) -> bool {
    let ku = match key_usage {
        Some(ku) => ku,
        None => return !require_key_usage,
    };
    let digital_signature = ku.0.contains(KeyUsages::DigitalSignature);
    if critical || require_key_usage {
        debug!("KeyUsage extension is marked critical or required by configuration.");
        digital_signature
    } else {
        debug!(
            "KeyUsage digitalSignature={}. Not required by configuration.",
            digital_signature
        );
        true
    }
}

/// `check_key_usage` applies [`key_usage_permits_client_authentication`] to the keyUsage extension
/// of `cert`.
pub fn check_key_usage(cert: &PresentedCertificate, require_key_usage: bool) -> bool {
    if cert.key_usage().is_none() {
        warn!(
            "Key usage checking is enabled but no keyUsage extension was found in {}",
            cert
        );
    }
    key_usage_permits_client_authentication(
        cert.key_usage(),
        cert.is_critical(&ID_CE_KEY_USAGE),
        require_key_usage,
    )
}

impl ChainValidator {
    /// Creates a validator from the policy values in `settings` that uses the given revocation
    /// checker. Fails with `Misconfiguration` when `PS_TRUSTED_ISSUER_DN_PATTERN` is absent or
    /// either pattern is not a valid regular expression.
    pub fn new(
        settings: &AuthenticationSettings,
        revocation_checker: Box<dyn RevocationChecker>,
    ) -> Result<Self> {
        let trusted_issuer = match settings.get_trusted_issuer_dn_pattern() {
            Some(p) => p,
            None => {
                error!("No trusted issuer pattern is configured");
                return Err(Error::PathValidation(PathValidationStatus::Misconfiguration));
            }
        };
        Ok(ChainValidator {
            trusted_issuer_pattern: compile_pattern("trusted issuer", &trusted_issuer)?,
            subject_pattern: compile_pattern("subject", &settings.get_subject_dn_pattern())?,
            max_path_length: settings.get_max_path_length(),
            allow_unspecified_path_length: settings.get_max_path_length_allow_unspecified(),
            check_key_usage: settings.get_check_key_usage(),
            require_key_usage: settings.get_require_key_usage(),
            time_of_interest: settings.get_time_of_interest_if_set(),
            revocation_checker,
        })
    }

    /// Creates a validator with the revocation checker named by `PS_REVOCATION_CHECKER`. CRLs are
    /// cached in a new [`InMemoryRevocationCache`].
    pub fn from_settings(settings: &AuthenticationSettings) -> Result<Self> {
        Self::from_settings_with_cache(settings, Arc::new(InMemoryRevocationCache::new()))
    }

    /// As [`ChainValidator::from_settings`], with CRLs cached in `cache`.
    pub fn from_settings_with_cache(
        settings: &AuthenticationSettings,
        cache: Arc<dyn RevocationCache>,
    ) -> Result<Self> {
        let checker: Box<dyn RevocationChecker> = match settings.get_revocation_checker() {
            RevocationCheckerKind::NoOp => Box::new(NoOpRevocationChecker),
            RevocationCheckerKind::CrlDistributionPoints => {
                Box::new(CrlRevocationChecker::from_settings(settings, cache))
            }
        };
        Self::new(settings, checker)
    }

    /// `validate` evaluates a chain presented in root-first order, i.e., the certificate issued by a
    /// trust anchor first and the client certificate last. Every certificate is evaluated even after
    /// a failure so that the log shows all problems with the chain.
    pub fn validate<'a, I>(&self, chain: I) -> TrustDecision
    where
        I: IntoIterator<Item = &'a PresentedCertificate>,
    {
        let toi = self.time_of_interest.unwrap_or_else(now_as_unix_secs);

        let mut valid = true;
        let mut has_trusted_issuer = false;
        let mut client_certificate = None;
        for cert in chain {
            debug!("Evaluating {}", cert);
            match self.check_certificate(cert, toi) {
                Ok(path_length) => {
                    if !has_trusted_issuer {
                        has_trusted_issuer =
                            does_name_match_pattern(cert.issuer(), &self.trusted_issuer_pattern);
                    }
                    if PathLength::NotCa == path_length {
                        debug!("Found valid client certificate");
                        client_certificate = Some(cert.clone());
                    } else {
                        debug!("Found valid CA certificate");
                    }
                }
                Err(e) => {
                    warn!("Failed to validate {}: {}", cert, e);
                    valid = false;
                }
            }
        }

        TrustDecision {
            valid,
            has_trusted_issuer,
            client_certificate,
        }
    }

    fn check_certificate(&self, cert: &PresentedCertificate, toi: u64) -> Result<PathLength> {
        valid_at_time(cert, toi)?;
        self.revocation_checker.check(cert)?;

        let path_length = cert.path_length();
        match path_length {
            PathLength::NotCa => {
                if !does_name_match_pattern(cert.subject(), &self.subject_pattern) {
                    log_error_for_certificate(
                        cert,
                        format!(
                            "certificate subject does not match pattern {}",
                            self.subject_pattern.as_str()
                        )
                        .as_str(),
                    );
                    return Err(Error::PathValidation(PathValidationStatus::SubjectMismatch));
                }
                if self.check_key_usage && !check_key_usage(cert, self.require_key_usage) {
                    log_error_for_certificate(
                        cert,
                        "certificate keyUsage constraint forbids client authentication",
                    );
                    return Err(Error::PathValidation(PathValidationStatus::InvalidKeyUsage));
                }
            }
            PathLength::Unspecified => {
                if !self.allow_unspecified_path_length {
                    log_error_for_certificate(
                        cert,
                        "unlimited certificate path length not allowed by configuration",
                    );
                    return Err(Error::PathValidation(
                        PathValidationStatus::UnspecifiedPathLength,
                    ));
                }
            }
            PathLength::Ca(pl) => {
                if pl > self.max_path_length {
                    log_error_for_certificate(
                        cert,
                        format!(
                            "certificate path length {} exceeds maximum value {}",
                            pl, self.max_path_length
                        )
                        .as_str(),
                    );
                    return Err(Error::PathValidation(PathValidationStatus::InvalidPathLength));
                }
            }
        }
        Ok(path_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ku(flag: KeyUsages) -> KeyUsage {
        KeyUsage(flag.into())
    }

    #[test]
    fn absent_key_usage() {
        assert!(key_usage_permits_client_authentication(None, false, false));
        assert!(!key_usage_permits_client_authentication(None, false, true));
    }

    #[test]
    fn critical_or_required_key_usage_needs_digital_signature() {
        let ds = ku(KeyUsages::DigitalSignature);
        let ke = ku(KeyUsages::KeyEncipherment);
        assert!(key_usage_permits_client_authentication(Some(&ds), true, false));
        assert!(key_usage_permits_client_authentication(Some(&ds), false, true));
        assert!(!key_usage_permits_client_authentication(Some(&ke), true, false));
        assert!(!key_usage_permits_client_authentication(Some(&ke), false, true));
    }

    #[test]
    fn informational_key_usage_always_passes() {
        let ke = ku(KeyUsages::KeyEncipherment);
        assert!(key_usage_permits_client_authentication(Some(&ke), false, false));
    }

    #[test]
    fn patterns_match_whole_names() {
        let p = compile_pattern("test", "CN=Test CA").unwrap();
        assert!(does_name_match_pattern("CN=Test CA", &p));
        assert!(!does_name_match_pattern("CN=Test CA,O=Example", &p));
        assert!(!does_name_match_pattern("OU=x,CN=Test CA", &p));

        let p = compile_pattern("test", "CN=Test CA|CN=Other CA").unwrap();
        assert!(does_name_match_pattern("CN=Other CA", &p));
    }

    #[test]
    fn invalid_patterns_are_configuration_errors() {
        assert_eq!(
            Err(Error::PathValidation(PathValidationStatus::Misconfiguration)),
            compile_pattern("test", "CN=(unclosed").map(|_| ())
        );
    }

    #[test]
    fn missing_trusted_issuer_is_configuration_error() {
        let settings = AuthenticationSettings::new();
        assert_eq!(
            Some(Error::PathValidation(PathValidationStatus::Misconfiguration)),
            ChainValidator::new(&settings, Box::new(NoOpRevocationChecker)).err()
        );
    }
}
