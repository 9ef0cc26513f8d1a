//! Wrapper around a decoded certificate that exposes the fields consulted when making a trust
//! decision about a presented chain

use std::collections::BTreeSet;
use std::fmt;

use const_oid::db::rfc5912::{ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE};
use der::{asn1::ObjectIdentifier, Decode, Encode};
use log::error;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsage};
use x509_cert::ext::Extension;
use x509_cert::Certificate;

use crate::util::cert_utilities::{buffer_to_hex, name_to_string};
use crate::util::error::*;

/// Role of a certificate as asserted by its basicConstraints extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PathLength {
    /// basicConstraints is absent or has cA set to false, i.e., an end entity certificate
    NotCa,
    /// CA certificate with a pathLenConstraint
    Ca(u8),
    /// CA certificate without a pathLenConstraint, i.e., any number of intermediate CAs may follow
    Unspecified,
}

/// [`PresentedCertificate`] aggregates a binary, DER-encoded Certificate, the parsed Certificate and
/// the values from the basicConstraints and keyUsage extensions that drive chain validation.
///
/// Instances are immutable once constructed. A basicConstraints or keyUsage extension that cannot be
/// decoded prevents construction. The CRLDistributionPoints extension is decoded on demand by
/// [`DistributionPointReader`](crate::DistributionPointReader) implementations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PresentedCertificate {
    encoded_cert: Vec<u8>,
    decoded_cert: Certificate,
    subject: String,
    issuer: String,
    path_length: PathLength,
    key_usage: Option<KeyUsage>,
}

impl PresentedCertificate {
    fn new(encoded_cert: Vec<u8>, decoded_cert: Certificate) -> Result<Self> {
        let mut path_length = PathLength::NotCa;
        let mut key_usage = None;
        for ext in decoded_cert.tbs_certificate.extensions.iter().flatten() {
            if ext.extn_id == ID_CE_BASIC_CONSTRAINTS {
                let bc = BasicConstraints::from_der(ext.extn_value.as_bytes())?;
                path_length = match (bc.ca, bc.path_len_constraint) {
                    (false, _) => PathLength::NotCa,
                    (true, None) => PathLength::Unspecified,
                    (true, Some(pl)) => PathLength::Ca(pl),
                };
            } else if ext.extn_id == ID_CE_KEY_USAGE {
                key_usage = Some(KeyUsage::from_der(ext.extn_value.as_bytes())?);
            }
        }

        Ok(PresentedCertificate {
            subject: name_to_string(&decoded_cert.tbs_certificate.subject),
            issuer: name_to_string(&decoded_cert.tbs_certificate.issuer),
            encoded_cert,
            decoded_cert,
            path_length,
            key_usage,
        })
    }

    /// Binary, DER-encoded certificate
    pub fn encoded(&self) -> &[u8] {
        &self.encoded_cert
    }

    /// Decoded certificate
    pub fn certificate(&self) -> &Certificate {
        &self.decoded_cert
    }

    /// Subject name rendered per RFC 4514, i.e., `CN=alice,O=Example`
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer name rendered per RFC 4514
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// notBefore expressed as seconds since Unix epoch
    pub fn not_before(&self) -> u64 {
        self.decoded_cert
            .tbs_certificate
            .validity
            .not_before
            .to_unix_duration()
            .as_secs()
    }

    /// notAfter expressed as seconds since Unix epoch
    pub fn not_after(&self) -> u64 {
        self.decoded_cert
            .tbs_certificate
            .validity
            .not_after
            .to_unix_duration()
            .as_secs()
    }

    /// Role asserted by basicConstraints
    pub fn path_length(&self) -> PathLength {
        self.path_length
    }

    /// Key usage bits, or None when the certificate has no keyUsage extension
    pub fn key_usage(&self) -> Option<&KeyUsage> {
        self.key_usage.as_ref()
    }

    /// Serial number as the bytes of the encoded INTEGER
    pub fn serial_number(&self) -> &[u8] {
        self.decoded_cert.tbs_certificate.serial_number.as_bytes()
    }

    /// OIDs of all extensions marked critical
    pub fn critical_extensions(&self) -> BTreeSet<ObjectIdentifier> {
        self.decoded_cert
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .filter(|ext| ext.critical)
            .map(|ext| ext.extn_id)
            .collect()
    }

    /// Returns true if an extension with the given OID is present and marked critical
    pub fn is_critical(&self, oid: &ObjectIdentifier) -> bool {
        self.critical_extensions().contains(oid)
    }

    /// Returns the first extension with the given OID, if any
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.decoded_cert
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == *oid)
    }
}

impl TryFrom<&[u8]> for PresentedCertificate {
    type Error = Error;

    fn try_from(enc_cert: &[u8]) -> Result<Self> {
        let decoded_cert = match Certificate::from_der(enc_cert) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to parse certificate: {}", e);
                return Err(Error::Asn1Error(e));
            }
        };
        Self::new(enc_cert.to_vec(), decoded_cert)
    }
}

impl TryFrom<Certificate> for PresentedCertificate {
    type Error = Error;

    fn try_from(decoded_cert: Certificate) -> Result<Self> {
        let encoded_cert = decoded_cert.to_der()?;
        Self::new(encoded_cert, decoded_cert)
    }
}

impl fmt::Display for PresentedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, SerialNumber={}",
            self.subject,
            buffer_to_hex(self.serial_number())
        )
    }
}

/// Splits a buffer containing one or more PEM-encoded certificates into [`PresentedCertificate`]
/// objects in the order they appear. A buffer with no PEM encapsulation boundary is parsed as a
/// single DER-encoded certificate.
pub fn parse_certificates(buffer: &[u8]) -> Result<Vec<PresentedCertificate>> {
    const BEGIN: &[u8] = b"-----BEGIN ";

    // load_pem_chain requires a non-empty buffer, which a BEGIN boundary guarantees
    if !buffer.windows(BEGIN.len()).any(|w| w == BEGIN) {
        return Ok(vec![PresentedCertificate::try_from(buffer)?]);
    }

    let certs = match Certificate::load_pem_chain(buffer) {
        Ok(certs) => certs,
        Err(e) => {
            error!("Failed to parse PEM certificates: {}", e);
            return Err(Error::ParseError);
        }
    };
    certs.into_iter().map(PresentedCertificate::try_from).collect()
}
