//! Retrieval of CRLs from distribution point URLs

use std::io::Read;
use std::time::Duration;

#[cfg(feature = "remote")]
use log::error;
use log::debug;
use url::Url;

use crate::util::error::*;
use crate::{AuthenticationSettings, RevocationList};

/// The `CrlFetcher` trait retrieves and parses the CRL at a URL. Each call makes exactly one
/// attempt; retry and fallback across distribution points are up to the caller.
pub trait CrlFetcher: Send + Sync {
    /// Retrieves and parses the CRL at `url`.
    fn fetch(&self, url: &Url) -> Result<RevocationList>;
}

/// `UriCrlFetcher` retrieves CRLs from `http` and `https` URLs (when the `remote` feature is enabled)
/// and from `file` URLs. Other schemes, i.e., `ldap`, yield [`Error::InvalidUriScheme`].
#[derive(Clone, Debug)]
pub struct UriCrlFetcher {
    #[cfg(feature = "remote")]
    client: Option<reqwest::blocking::Client>,
    max_crl_size: u64,
}

impl UriCrlFetcher {
    /// Creates a fetcher that abandons HTTP retrievals after `timeout` and rejects CRLs larger than
    /// `max_crl_size` bytes. The HTTP client is built once and its connection pool is shared by clones.
    #[cfg_attr(not(feature = "remote"), allow(unused_variables))]
    pub fn new(timeout: Duration, max_crl_size: u64) -> Self {
        #[cfg(feature = "remote")]
        let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(c) => Some(c),
            Err(e) => {
                error!("Failed to prepare HTTP client to retrieve CRLs: {}", e);
                None
            }
        };
        UriCrlFetcher {
            #[cfg(feature = "remote")]
            client,
            max_crl_size,
        }
    }

    /// Creates a fetcher using the `PS_CRL_TIMEOUT` and `PS_MAX_CRL_SIZE` settings.
    pub fn from_settings(settings: &AuthenticationSettings) -> Self {
        Self::new(settings.get_crl_timeout(), settings.get_max_crl_size())
    }

    fn read_limited(&self, reader: impl Read, url: &Url) -> Result<Vec<u8>> {
        let mut body = vec![];
        if let Err(e) = reader
            .take(self.max_crl_size.saturating_add(1))
            .read_to_end(&mut body)
        {
            debug!("Failed to read CRL bytes from {}: {}", url, e);
            return Err(match e.kind() {
                std::io::ErrorKind::TimedOut => Error::Timeout,
                _ => Error::NetworkError,
            });
        }
        if body.len() as u64 > self.max_crl_size {
            debug!(
                "CRL at {} exceeds maximum size of {} bytes",
                url, self.max_crl_size
            );
            return Err(Error::LengthError);
        }
        Ok(body)
    }

    #[cfg(feature = "remote")]
    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>> {
        let client = match &self.client {
            Some(c) => c,
            None => {
                debug!("No HTTP client available to fetch CRL from {}", url);
                return Err(Error::NetworkError);
            }
        };

        let response = match client.get(url.as_str()).send() {
            Ok(response) => response,
            Err(e) => {
                debug!("Failed to fetch CRL from {}: {}", url, e);
                return Err(if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::NetworkError
                });
            }
        };
        if !response.status().is_success() {
            debug!(
                "Failed to fetch CRL from {}: HTTP status {}",
                url,
                response.status()
            );
            return Err(Error::NetworkError);
        }
        if let Some(len) = response.content_length() {
            if len > self.max_crl_size {
                debug!(
                    "CRL at {} advertises {} bytes, more than the maximum of {}",
                    url, len, self.max_crl_size
                );
                return Err(Error::LengthError);
            }
        }
        self.read_limited(response, url)
    }

    #[cfg(not(feature = "remote"))]
    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(
            "Ignored {} presented for CRL retrieval; HTTP support is not enabled",
            url
        );
        Err(Error::InvalidUriScheme)
    }

    fn fetch_file(&self, url: &Url) -> Result<Vec<u8>> {
        let path = match url.to_file_path() {
            Ok(path) => path,
            Err(_) => {
                debug!("{} does not name a local file", url);
                return Err(Error::InvalidUriScheme);
            }
        };
        let file = std::fs::File::open(&path)?;
        self.read_limited(file, url)
    }
}

impl CrlFetcher for UriCrlFetcher {
    fn fetch(&self, url: &Url) -> Result<RevocationList> {
        let bytes = match url.scheme() {
            "http" | "https" => self.fetch_http(url)?,
            "file" => self.fetch_file(url)?,
            scheme => {
                debug!("Ignored {} URI presented for CRL retrieval", scheme);
                return Err(Error::InvalidUriScheme);
            }
        };
        RevocationList::parse(&bytes)
    }
}
