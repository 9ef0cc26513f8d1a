//! Credentials presented by a client and the handler that turns them into an authentication result

use std::fmt;

use log::{debug, info};

use crate::util::error::*;
use crate::{parse_certificates, AuthenticationSettings, ChainValidator, PresentedCertificate};

/// `X509Credentials` holds the certificate chain presented by a client, in the order it was presented
/// (client certificate first), plus the client certificate selected by a successful authentication.
#[derive(Clone, Debug, Default)]
pub struct X509Credentials {
    certificates: Vec<PresentedCertificate>,
    certificate: Option<PresentedCertificate>,
}

impl X509Credentials {
    /// Creates credentials from a chain in presentation order, i.e., client certificate first
    pub fn new(certificates: Vec<PresentedCertificate>) -> Self {
        X509Credentials {
            certificates,
            certificate: None,
        }
    }

    /// Creates credentials from a buffer of concatenated PEM certificates in presentation order
    pub fn from_pem_chain(buffer: &[u8]) -> Result<Self> {
        Ok(Self::new(parse_certificates(buffer)?))
    }

    /// The presented chain in presentation order
    pub fn certificates(&self) -> &[PresentedCertificate] {
        &self.certificates
    }

    /// The presented chain reordered root first, as consumed by [`ChainValidator::validate`]
    pub fn root_first(&self) -> impl Iterator<Item = &PresentedCertificate> {
        self.certificates.iter().rev()
    }

    /// The client certificate identified by a successful authentication
    pub fn client_certificate(&self) -> Option<&PresentedCertificate> {
        self.certificate.as_ref()
    }
}

impl fmt::Display for X509Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.certificate.as_ref().or_else(|| self.certificates.first()) {
            Some(cert) => write!(f, "{}", cert),
            None => write!(f, "(no certificates)"),
        }
    }
}

/// `X509AuthenticationHandler` authenticates [`X509Credentials`] using a [`ChainValidator`].
pub struct X509AuthenticationHandler {
    validator: ChainValidator,
}

impl X509AuthenticationHandler {
    /// Creates a handler that uses the given validator
    pub fn new(validator: ChainValidator) -> Self {
        X509AuthenticationHandler { validator }
    }

    /// Creates a handler whose validator is built by [`ChainValidator::from_settings`]
    pub fn from_settings(settings: &AuthenticationSettings) -> Result<Self> {
        Ok(Self::new(ChainValidator::from_settings(settings)?))
    }

    /// Returns true if the credentials carry at least one certificate
    pub fn supports(&self, credentials: &X509Credentials) -> bool {
        !credentials.certificates.is_empty()
    }

    /// Validates the presented chain. On success, the client certificate is recorded in
    /// `credentials` and true is returned.
    pub fn authenticate(&self, credentials: &mut X509Credentials) -> bool {
        if !self.supports(credentials) {
            debug!("No certificates presented");
            return false;
        }

        let decision = self.validator.validate(credentials.root_first());
        debug!(
            "Chain valid: {}; trusted issuer found: {}; client certificate found: {}",
            decision.valid,
            decision.has_trusted_issuer,
            decision.client_certificate.is_some()
        );
        if decision.is_accepted() {
            credentials.certificate = decision.client_certificate.clone();
            info!("Successfully authenticated {}", credentials);
            true
        } else {
            info!("Failed to authenticate {}", credentials);
            false
        }
    }
}
