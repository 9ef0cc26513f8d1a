//! Revocation checking using CRLs located via the CRLDistributionPoints extension

use std::sync::Arc;

use log::{debug, error, info, warn};
use url::Url;

use crate::util::cert_utilities::{buffer_to_hex, now_as_unix_secs};
use crate::util::error::*;
use crate::{
    AuthenticationSettings, CrlFetcher, DistributionPointExtractor, ExpiredCrlPolicy,
    PresentedCertificate, RevocationCache, RevocationChecker, RevocationList, UnavailableCrlPolicy,
    UriCrlFetcher,
};

// Outcome of searching the cache and distribution points for a CRL
enum Resolution {
    Found(Arc<RevocationList>),
    Stale,
    Unavailable,
}

/// `CrlRevocationChecker` determines revocation status using the CRLs named in each certificate's
/// CRLDistributionPoints extension.
///
/// For each check, cached CRLs are consulted first, in distribution point order, and the first one
/// found is relied upon without any network access. A cached CRL from a different issuer leaves the
/// status undetermined; only a cached CRL rejected by the [`ExpiredCrlPolicy`] is passed over. When no
/// candidate is cached, distribution points are fetched in order until one yields a usable CRL, which
/// is cached under the URL it came from. A CRL is usable when its issuer matches the certificate's
/// issuer and, unless the [`ExpiredCrlPolicy`] is `Ignore`, its validity window covers the time of
/// interest.
///
/// By default, certificates whose revocation status cannot be determined are accepted. Use
/// [`UnavailableCrlPolicy::Deny`] to reject them instead.
pub struct CrlRevocationChecker {
    extractor: DistributionPointExtractor,
    cache: Arc<dyn RevocationCache>,
    fetcher: Box<dyn CrlFetcher>,
    unavailable_crl_policy: UnavailableCrlPolicy,
    expired_crl_policy: ExpiredCrlPolicy,
    time_of_interest: Option<u64>,
}

impl CrlRevocationChecker {
    /// Creates a checker with default policies and the x509-cert based distribution point reader.
    pub fn new(cache: Arc<dyn RevocationCache>, fetcher: Box<dyn CrlFetcher>) -> Self {
        CrlRevocationChecker {
            extractor: DistributionPointExtractor::default(),
            cache,
            fetcher,
            unavailable_crl_policy: UnavailableCrlPolicy::default(),
            expired_crl_policy: ExpiredCrlPolicy::default(),
            time_of_interest: None,
        }
    }

    /// Creates a checker that retrieves CRLs with a [`UriCrlFetcher`] and applies the CRL related
    /// values from `settings`.
    pub fn from_settings(settings: &AuthenticationSettings, cache: Arc<dyn RevocationCache>) -> Self {
        let mut checker = Self::new(cache, Box::new(UriCrlFetcher::from_settings(settings)))
            .with_unavailable_crl_policy(settings.get_unavailable_crl_policy())
            .with_expired_crl_policy(settings.get_expired_crl_policy());
        checker.time_of_interest = settings.get_time_of_interest_if_set();
        checker
    }

    /// Replaces the distribution point extractor
    pub fn with_extractor(mut self, extractor: DistributionPointExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the handling of certificates for which no CRL could be obtained
    pub fn with_unavailable_crl_policy(mut self, policy: UnavailableCrlPolicy) -> Self {
        self.unavailable_crl_policy = policy;
        self
    }

    /// Sets the handling of CRLs that are not yet valid or are past nextUpdate
    pub fn with_expired_crl_policy(mut self, policy: ExpiredCrlPolicy) -> Self {
        self.expired_crl_policy = policy;
        self
    }

    /// Evaluates CRL freshness at the given time instead of the current time
    pub fn with_time_of_interest(mut self, toi: u64) -> Self {
        self.time_of_interest = Some(toi);
        self
    }

    fn check_crl(&self, cert: &PresentedCertificate, crl: &RevocationList, toi: u64) -> Result<()> {
        if crl.issuer() != cert.issuer() {
            debug!(
                "CRL issued by {} does not cover {} issued by {}",
                crl.issuer(),
                cert,
                cert.issuer()
            );
            return Err(Error::CrlIncompatible);
        }
        crl.check_freshness(toi, self.expired_crl_policy)
    }

    fn resolve_crl(&self, cert: &PresentedCertificate, urls: &[Url], toi: u64) -> Resolution {
        let mut saw_stale = false;
        let mut note = |e: Error| {
            if Error::PathValidation(PathValidationStatus::StatusCheckReliedOnStaleCrl) == e {
                saw_stale = true;
            }
        };

        // the first cache hit ends the search unless it fails the freshness policy
        for url in urls {
            if let Some(crl) = self.cache.get(url.as_str()) {
                match self.check_crl(cert, &crl, toi) {
                    Ok(()) => {
                        debug!("Found CRL in cache for {} under {}", cert, url);
                        return Resolution::Found(crl);
                    }
                    Err(Error::CrlIncompatible) => {
                        warn!(
                            "CRL cached under {} cannot be used for {}; not fetching",
                            url, cert
                        );
                        return Resolution::Unavailable;
                    }
                    Err(e) => {
                        debug!("Ignoring CRL cached under {} for {}: {}", url, cert, e);
                        note(e);
                    }
                }
            }
        }

        for url in urls {
            info!("Attempting to fetch CRL at {}", url);
            match self.fetcher.fetch(url) {
                Ok(crl) => {
                    let crl = Arc::new(crl);
                    match self.check_crl(cert, &crl, toi) {
                        Ok(()) => {
                            info!("Success. Caching CRL fetched from {}", url);
                            self.cache.put(url.as_str(), Arc::clone(&crl));
                            return Resolution::Found(crl);
                        }
                        Err(e) => {
                            warn!("CRL fetched from {} cannot be used for {}: {}", url, cert, e);
                            note(e);
                        }
                    }
                }
                Err(e) => error!("Error fetching CRL at {}: {}", url, e),
            }
        }

        if saw_stale {
            Resolution::Stale
        } else {
            Resolution::Unavailable
        }
    }

    fn status_unavailable(&self, cert: &PresentedCertificate) -> Result<()> {
        match self.unavailable_crl_policy {
            UnavailableCrlPolicy::Allow => {
                warn!(
                    "Revocation status of {} could not be determined; allowed by configuration",
                    cert
                );
                Ok(())
            }
            UnavailableCrlPolicy::Deny => {
                error!(
                    "Revocation status of {} could not be determined; denied by configuration",
                    cert
                );
                Err(Error::PathValidation(
                    PathValidationStatus::RevocationStatusNotDetermined,
                ))
            }
        }
    }
}

impl RevocationChecker for CrlRevocationChecker {
    fn check(&self, cert: &PresentedCertificate) -> Result<()> {
        let urls = match self.extractor.extract(cert) {
            Ok(urls) => urls,
            Err(e) => {
                error!(
                    "Error reading CRLDistributionPoints extension field on {}: {}",
                    cert, e
                );
                return self.status_unavailable(cert);
            }
        };
        debug!(
            "Distribution points for {}: {:?}",
            cert,
            urls.iter().map(Url::as_str).collect::<Vec<&str>>()
        );
        if urls.is_empty() {
            info!(
                "No usable CRL distribution points for {}; revocation status not checked",
                cert
            );
            return Ok(());
        }

        let toi = self.time_of_interest.unwrap_or_else(now_as_unix_secs);
        match self.resolve_crl(cert, &urls, toi) {
            Resolution::Found(crl) => match crl.revocation_date(cert.serial_number()) {
                Some(revoked_at) => {
                    info!(
                        "Determined revocation status (revoked) using CRL from {} for {} (revoked at {})",
                        crl.issuer(),
                        cert,
                        revoked_at
                    );
                    Err(Error::PathValidation(
                        PathValidationStatus::CertificateRevoked,
                    ))
                }
                None => {
                    debug!(
                        "Determined revocation status (valid) using CRL from {} for serial number {}",
                        crl.issuer(),
                        buffer_to_hex(cert.serial_number())
                    );
                    Ok(())
                }
            },
            Resolution::Stale => {
                error!("Only stale CRLs are available for {}", cert);
                Err(Error::PathValidation(
                    PathValidationStatus::StatusCheckReliedOnStaleCrl,
                ))
            }
            Resolution::Unavailable => self.status_unavailable(cert),
        }
    }
}
