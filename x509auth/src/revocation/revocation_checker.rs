//! Interface used by the chain validator to determine revocation status

use log::debug;

use crate::util::error::*;
use crate::PresentedCertificate;

/// The `RevocationChecker` trait is the sole means by which
/// [`ChainValidator`](crate::ChainValidator) learns revocation status.
///
/// `check` returns `Err(Error::PathValidation(PathValidationStatus::CertificateRevoked))` for a
/// revoked certificate. Any other error fails the certificate as well; implementations that
/// tolerate unavailable revocation information return `Ok(())` in that case.
pub trait RevocationChecker: Send + Sync {
    /// Determines whether the given certificate may be used.
    fn check(&self, cert: &PresentedCertificate) -> Result<()>;
}

/// `NoOpRevocationChecker` accepts every certificate.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRevocationChecker;

impl RevocationChecker for NoOpRevocationChecker {
    fn check(&self, cert: &PresentedCertificate) -> Result<()> {
        debug!("Revocation checking is disabled; skipping {}", cert);
        Ok(())
    }
}
