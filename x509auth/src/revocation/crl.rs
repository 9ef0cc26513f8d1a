//! Parsed representation of a CRL retained for revocation status lookups (minus support for delta
//! CRLs, indirect CRLs and CRL signature verification)

use std::collections::BTreeMap;

use der::Decode;
use log::{debug, error, info};
use x509_cert::crl::CertificateList;

use crate::util::cert_utilities::name_to_string;
use crate::util::error::*;
use crate::ExpiredCrlPolicy;

/// `RevocationList` retains the issuer, validity window and revoked serial numbers from a CRL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevocationList {
    issuer: String,
    this_update: u64,
    next_update: Option<u64>,
    // serial number bytes -> revocation date as seconds since Unix epoch
    revoked: BTreeMap<Vec<u8>, u64>,
}

impl RevocationList {
    /// Parses a DER-encoded CRL or a CRL wrapped in an `X509 CRL` PEM block.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.starts_with(b"-----BEGIN") {
            let (label, der) = match pem_rfc7468::decode_vec(buffer) {
                Ok(decoded) => decoded,
                Err(e) => {
                    error!("Failed to decode PEM CRL: {}", e);
                    return Err(Error::ParseError);
                }
            };
            if label != "X509 CRL" {
                error!("Expected an X509 CRL PEM block but found {}", label);
                return Err(Error::ParseError);
            }
            return Self::from_der(&der);
        }
        Self::from_der(buffer)
    }

    /// Parses a DER-encoded CRL.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let crl = CertificateList::from_der(der)?;
        Ok(Self::from(&crl))
    }

    /// Issuer name rendered per RFC 4514
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// thisUpdate expressed as seconds since Unix epoch
    pub fn this_update(&self) -> u64 {
        self.this_update
    }

    /// nextUpdate expressed as seconds since Unix epoch, if present
    pub fn next_update(&self) -> Option<u64> {
        self.next_update
    }

    /// Number of entries on the CRL
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// Returns true if the CRL has no entries
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    /// Returns the revocation date, as seconds since Unix epoch, if the serial number is listed.
    pub fn revocation_date(&self, serial: &[u8]) -> Option<u64> {
        self.revoked.get(serial).copied()
    }

    /// Returns true if the serial number is listed.
    pub fn is_revoked(&self, serial: &[u8]) -> bool {
        self.revoked.contains_key(serial)
    }

    /// `check_freshness` evaluates the validity window of the CRL relative to a time of interest
    /// expressed as seconds since Unix epoch. A time of interest of zero disables the check.
    pub fn check_freshness(&self, toi: u64, policy: ExpiredCrlPolicy) -> Result<()> {
        let grace = match policy {
            ExpiredCrlPolicy::Ignore => return Ok(()),
            ExpiredCrlPolicy::Deny => 0,
            ExpiredCrlPolicy::Threshold(secs) => secs,
        };
        if 0 == toi {
            return Ok(());
        }

        if self.this_update > toi {
            info!(
                "Discarding CRL from {} as having this update time ({}) later than time of interest ({})",
                self.issuer, self.this_update, toi
            );
            return Err(Error::PathValidation(
                PathValidationStatus::StatusCheckReliedOnStaleCrl,
            ));
        }
        if let Some(nu) = self.next_update {
            if nu.saturating_add(grace) < toi {
                info!(
                    "Discarding CRL from {} as having next update time ({}) earlier than time of interest ({}) less {} seconds",
                    self.issuer, nu, toi, grace
                );
                return Err(Error::PathValidation(
                    PathValidationStatus::StatusCheckReliedOnStaleCrl,
                ));
            }
        }
        Ok(())
    }
}

impl From<&CertificateList> for RevocationList {
    fn from(crl: &CertificateList) -> Self {
        let tbs = &crl.tbs_cert_list;
        let issuer = name_to_string(&tbs.issuer);
        let mut revoked = BTreeMap::new();
        for rc in tbs.revoked_certificates.iter().flatten() {
            revoked.insert(
                rc.serial_number.as_bytes().to_vec(),
                rc.revocation_date.to_unix_duration().as_secs(),
            );
        }
        debug!("Parsed CRL from {} with {} entries", issuer, revoked.len());
        RevocationList {
            issuer,
            this_update: tbs.this_update.to_unix_duration().as_secs(),
            next_update: tbs.next_update.map(|nu| nu.to_unix_duration().as_secs()),
            revoked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(this_update: u64, next_update: Option<u64>) -> RevocationList {
        let mut revoked = BTreeMap::new();
        revoked.insert(vec![0x02], 1_000);
        RevocationList {
            issuer: "CN=Test CA".to_string(),
            this_update,
            next_update,
            revoked,
        }
    }

    #[test]
    fn lookups() {
        let crl = list(1_000, Some(2_000));
        assert!(crl.is_revoked(&[0x02]));
        assert!(!crl.is_revoked(&[0x03]));
        assert_eq!(Some(1_000), crl.revocation_date(&[0x02]));
        assert_eq!(1, crl.len());
        assert!(!crl.is_empty());
    }

    #[test]
    fn freshness_ignored_by_default() {
        let crl = list(1_000, Some(2_000));
        assert!(crl.check_freshness(5_000, ExpiredCrlPolicy::Ignore).is_ok());
        assert!(crl.check_freshness(500, ExpiredCrlPolicy::Ignore).is_ok());
    }

    #[test]
    fn freshness_enforced() {
        let stale = Err(Error::PathValidation(
            PathValidationStatus::StatusCheckReliedOnStaleCrl,
        ));
        let crl = list(1_000, Some(2_000));
        assert!(crl.check_freshness(1_500, ExpiredCrlPolicy::Deny).is_ok());
        assert!(crl.check_freshness(2_000, ExpiredCrlPolicy::Deny).is_ok());
        assert_eq!(stale, crl.check_freshness(2_001, ExpiredCrlPolicy::Deny));
        assert_eq!(stale, crl.check_freshness(999, ExpiredCrlPolicy::Deny));
        assert!(crl
            .check_freshness(2_500, ExpiredCrlPolicy::Threshold(600))
            .is_ok());
        assert_eq!(
            stale,
            crl.check_freshness(2_601, ExpiredCrlPolicy::Threshold(600))
        );
        assert!(crl.check_freshness(0, ExpiredCrlPolicy::Deny).is_ok());
    }

    #[test]
    fn missing_next_update_never_expires() {
        let crl = list(1_000, None);
        assert!(crl.check_freshness(u64::MAX, ExpiredCrlPolicy::Deny).is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            RevocationList::parse(&[0x30, 0x03, 0x02, 0x01]),
            Err(Error::Asn1Error(_))
        ));
        assert_eq!(
            Err(Error::ParseError),
            RevocationList::parse(b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n")
        );
    }
}
