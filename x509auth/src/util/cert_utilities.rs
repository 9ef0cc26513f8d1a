//! Utility functions used when evaluating certificates and CRLs

use std::time::{SystemTime, UNIX_EPOCH};

use log::error;
use x509_cert::name::Name;

use crate::util::error::*;
use crate::PresentedCertificate;

/// `name_to_string` returns an RFC 4514 string representation of a Name, i.e., most specific RDN first.
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

/// `buffer_to_hex` takes a byte array and returns a string featuring upper case ASCII hex characters
/// (without commas, spaces, or brackets).
pub fn buffer_to_hex(buffer: &[u8]) -> String {
    hex::encode_upper(buffer)
}

/// `now_as_unix_secs` returns the current time as seconds since Unix epoch, or 0 if the system
/// clock is set before the epoch.
pub fn now_as_unix_secs() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => 0,
    }
}

/// `log_error_for_certificate` emits an error message prefixed by the subject and serial number
/// of the given certificate.
pub fn log_error_for_certificate(cert: &PresentedCertificate, msg: &str) {
    error!("{}: {}", cert, msg);
}

/// `valid_at_time` checks the validity window of a certificate relative to a time of interest
/// expressed as seconds since Unix epoch. Zero disables the check.
pub fn valid_at_time(target: &PresentedCertificate, toi: u64) -> Result<()> {
    if 0 == toi {
        return Ok(());
    }

    if target.not_before() > toi {
        log_error_for_certificate(
            target,
            "certificate is not yet valid, i.e., not_before is after the configured time of interest",
        );
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotBeforeDate,
        ));
    }

    if target.not_after() < toi {
        log_error_for_certificate(
            target,
            format!(
                "certificate is expired relative to the configured time of interest: {}",
                target.certificate().tbs_certificate.validity.not_after
            )
            .as_str(),
        );
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotAfterDate,
        ));
    }
    Ok(())
}
