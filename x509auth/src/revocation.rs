//! Revocation status determination using CRLs named in the CRLDistributionPoints extension
//!
//! A [`ChainValidator`](crate::ChainValidator) consults a single [`RevocationChecker`] for each
//! certificate in a presented chain. [`CrlRevocationChecker`] extracts distribution point URLs from
//! the certificate, consults a [`RevocationCache`] and falls back to retrieving CRLs with a
//! [`CrlFetcher`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use x509auth::{
//!     AuthenticationSettings, ChainValidator, CrlRevocationChecker, InMemoryRevocationCache,
//!     UnavailableCrlPolicy, UriCrlFetcher, X509Credentials,
//! };
//!
//! let mut settings = AuthenticationSettings::new();
//! settings.set_trusted_issuer_dn_pattern("CN=Example CA,O=Example".to_string());
//!
//! let checker = CrlRevocationChecker::new(
//!     Arc::new(InMemoryRevocationCache::new()),
//!     Box::new(UriCrlFetcher::from_settings(&settings)),
//! )
//! .with_unavailable_crl_policy(UnavailableCrlPolicy::Deny);
//! let validator = ChainValidator::new(&settings, Box::new(checker)).unwrap();
//!
//! let pem = std::fs::read("client-chain.pem").unwrap();
//! let credentials = X509Credentials::from_pem_chain(&pem).unwrap();
//! let decision = validator.validate(credentials.root_first());
//! println!("accepted: {}", decision.is_accepted());
//! ```
//!
//! Revocation processing will be influenced by values included in the
//! [`AuthenticationSettings`](crate::AuthenticationSettings) object, including:
//!
//! - [`PS_REVOCATION_CHECKER`](crate::PS_REVOCATION_CHECKER)
//! - [`PS_CRL_TIMEOUT`](crate::PS_CRL_TIMEOUT)
//! - [`PS_MAX_CRL_SIZE`](crate::PS_MAX_CRL_SIZE)
//! - [`PS_UNAVAILABLE_CRL_POLICY`](crate::PS_UNAVAILABLE_CRL_POLICY)
//! - [`PS_EXPIRED_CRL_POLICY`](crate::PS_EXPIRED_CRL_POLICY)

pub mod cache;
pub mod crl;
pub mod crl_revocation_checker;
pub mod distribution_points;
pub mod fetch;
pub mod revocation_checker;

pub use crate::{
    revocation::cache::*, revocation::crl::*, revocation::crl_revocation_checker::*,
    revocation::distribution_points::*, revocation::fetch::*, revocation::revocation_checker::*,
};
