//! Error types

use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Reason a certificate failed evaluation while validating a presented chain
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum PathValidationStatus {
    /// InvalidNotBeforeDate occurs when a certificate contains a notBefore date that is after the
    /// time of interest used for the validation operation.
    InvalidNotBeforeDate,
    /// InvalidNotAfterDate occurs when a certificate contains a notAfter date that is before the
    /// time of interest used for the validation operation.
    InvalidNotAfterDate,
    /// InvalidPathLength occurs when a CA certificate asserts a pathLenConstraint greater than the
    /// configured maximum.
    InvalidPathLength,
    /// UnspecifiedPathLength occurs when a CA certificate has no pathLenConstraint and the
    /// configuration does not allow unlimited path lengths.
    UnspecifiedPathLength,
    /// SubjectMismatch occurs when the subject name of a client certificate does not match the
    /// configured subject pattern.
    SubjectMismatch,
    /// InvalidKeyUsage occurs when the key usage of a client certificate forbids client authentication.
    InvalidKeyUsage,
    /// CertificateRevoked occurs when a certificate serial number appears on a CRL obtained for it.
    CertificateRevoked,
    /// RevocationStatusNotDetermined occurs when no CRL could be obtained and the configuration
    /// denies certificates with unavailable revocation status.
    RevocationStatusNotDetermined,
    /// StatusCheckReliedOnStaleCrl occurs when the only CRL available is outside its validity window
    /// and the configuration denies stale CRLs.
    StatusCheckReliedOnStaleCrl,
    /// A configuration error was detected. See textual log output for more details.
    Misconfiguration,
}

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// PathValidationError encountered
    PathValidation(PathValidationStatus),
    /// A URI scheme was encountered that is not supported for CRL retrieval, i.e., ldap
    InvalidUriScheme,
    /// An artifact did not conform to length requirements
    LengthError,
    /// An artifact could not be parsed
    ParseError,
    /// A CRL was found to be incompatible with the certificate whose revocation status is sought.
    CrlIncompatible,
    /// A networking issue occurred.
    NetworkError,
    /// A network operation did not complete within the configured timeout.
    Timeout,
    /// Asn1Error is used to propagate error information from the der and x509-cert crates.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    StdIoError(std::io::ErrorKind),
}

impl Error {
    /// Returns true if the error indicates a certificate was found on a CRL.
    pub fn is_revoked(&self) -> bool {
        *self == Error::PathValidation(PathValidationStatus::CertificateRevoked)
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl fmt::Display for PathValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationStatus::InvalidNotBeforeDate => write!(f, "InvalidNotBeforeDate"),
            PathValidationStatus::InvalidNotAfterDate => write!(f, "InvalidNotAfterDate"),
            PathValidationStatus::InvalidPathLength => write!(f, "InvalidPathLength"),
            PathValidationStatus::UnspecifiedPathLength => write!(f, "UnspecifiedPathLength"),
            PathValidationStatus::SubjectMismatch => write!(f, "SubjectMismatch"),
            PathValidationStatus::InvalidKeyUsage => write!(f, "InvalidKeyUsage"),
            PathValidationStatus::CertificateRevoked => write!(f, "CertificateRevoked"),
            PathValidationStatus::RevocationStatusNotDetermined => {
                write!(f, "RevocationStatusNotDetermined")
            }
            PathValidationStatus::StatusCheckReliedOnStaleCrl => {
                write!(f, "StatusCheckReliedOnStaleCrl")
            }
            PathValidationStatus::Misconfiguration => write!(f, "Misconfiguration"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PathValidation(err) => write!(f, "PathValidationError: {}", err),
            Error::InvalidUriScheme => write!(f, "InvalidUriScheme"),
            Error::LengthError => write!(f, "LengthError"),
            Error::ParseError => write!(f, "ParseError"),
            Error::CrlIncompatible => write!(f, "CrlIncompatible"),
            Error::NetworkError => write!(f, "NetworkError"),
            Error::Timeout => write!(f, "Timeout"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::StdIoError(err) => write!(f, "StdError: {:?}", err),
        }
    }
}

impl std::error::Error for Error {}
