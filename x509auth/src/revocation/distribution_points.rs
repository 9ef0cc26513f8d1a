//! Extraction of CRL locations from the CRLDistributionPoints extension

use const_oid::db::rfc5912::ID_CE_CRL_DISTRIBUTION_POINTS;
use der::Decode;
use log::{debug, warn};
use url::Url;
use x509_cert::ext::pkix::{
    name::{DistributionPointName, GeneralName},
    CrlDistributionPoints,
};

use crate::util::cert_utilities::name_to_string;
use crate::util::error::*;
use crate::PresentedCertificate;

/// Location field of one distribution point, as produced by a [`DistributionPointReader`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DistributionPointLocation {
    /// Location expressed as a single string
    Uri(String),
    /// Location expressed as a list of general names, each rendered as a string
    Names(Vec<String>),
    /// Location that cannot be expressed as a URL, with a description for logging
    Unsupported(String),
}

/// The `DistributionPointReader` trait decodes the distribution point structure from a certificate.
/// Implementations return an empty list when the certificate has no CRLDistributionPoints
/// extension and an error when the extension cannot be decoded.
pub trait DistributionPointReader: Send + Sync {
    /// Returns the location field of each distribution point in declaration order.
    fn read(&self, cert: &PresentedCertificate) -> Result<Vec<DistributionPointLocation>>;
}

/// `X509DistributionPointReader` decodes the CRLDistributionPoints extension using x509-cert.
#[derive(Clone, Copy, Debug, Default)]
pub struct X509DistributionPointReader;

impl DistributionPointReader for X509DistributionPointReader {
    fn read(&self, cert: &PresentedCertificate) -> Result<Vec<DistributionPointLocation>> {
        let ext = match cert.extension(&ID_CE_CRL_DISTRIBUTION_POINTS) {
            Some(ext) => ext,
            None => return Ok(vec![]),
        };
        let crl_dps = CrlDistributionPoints::from_der(ext.extn_value.as_bytes())?;

        let mut retval = vec![];
        for crl_dp in &crl_dps.0 {
            let location = match &crl_dp.distribution_point {
                Some(DistributionPointName::FullName(gns)) => {
                    let mut names = vec![];
                    for gn in gns {
                        match general_name_to_string(gn) {
                            Some(name) => names.push(name),
                            None => warn!(
                                "Ignoring general name in distribution point of {}: {:?}",
                                cert, gn
                            ),
                        }
                    }
                    DistributionPointLocation::Names(names)
                }
                Some(DistributionPointName::NameRelativeToCRLIssuer(rdn)) => {
                    DistributionPointLocation::Unsupported(format!(
                        "nameRelativeToCRLIssuer ({})",
                        rdn
                    ))
                }
                None => DistributionPointLocation::Unsupported(
                    "distribution point without a name".to_string(),
                ),
            };
            retval.push(location);
        }
        Ok(retval)
    }
}

fn general_name_to_string(gn: &GeneralName) -> Option<String> {
    match gn {
        GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
        GeneralName::DnsName(dns) => Some(dns.to_string()),
        GeneralName::Rfc822Name(email) => Some(email.to_string()),
        GeneralName::DirectoryName(name) => Some(name_to_string(name)),
        _ => None,
    }
}

/// `normalize_distribution_point` parses a distribution point location into a URL. Each component
/// (scheme, authority, path and query) is percent-encoded as it is parsed, so a location such as
/// `http://example.com:8085/ca?action=crl&issuer=CN=CAS Test User CA` yields a URL with the spaces in
/// the query escaped. Any fragment is discarded. Locations without a scheme, locations that cannot
/// serve as a base (i.e., `mailto:`) and non-file locations without a host are rejected.
pub fn normalize_distribution_point(location: &str) -> Result<Url> {
    let mut url = match Url::parse(location) {
        Ok(url) => url,
        Err(e) => {
            debug!("Failed to parse {} as a URL: {}", location, e);
            return Err(Error::ParseError);
        }
    };
    if url.cannot_be_a_base() || (url.host_str().is_none() && url.scheme() != "file") {
        debug!("{} does not identify a retrievable resource", location);
        return Err(Error::ParseError);
    }
    url.set_fragment(None);
    Ok(url)
}

/// `DistributionPointExtractor` flattens the distribution points of a certificate into an ordered
/// list of candidate CRL URLs.
pub struct DistributionPointExtractor {
    reader: Box<dyn DistributionPointReader>,
}

impl Default for DistributionPointExtractor {
    fn default() -> Self {
        Self::new(Box::new(X509DistributionPointReader))
    }
}

impl DistributionPointExtractor {
    /// Creates an extractor that uses the given reader to decode the extension
    pub fn new(reader: Box<dyn DistributionPointReader>) -> Self {
        DistributionPointExtractor { reader }
    }

    /// `extract` returns candidate URLs in the order the distribution points and their names were
    /// declared, omitting duplicates. Unsupported locations and names that do not parse as URLs are
    /// logged and skipped. An error is returned only when the extension cannot be decoded.
    pub fn extract(&self, cert: &PresentedCertificate) -> Result<Vec<Url>> {
        let mut retval = vec![];
        for location in self.reader.read(cert)? {
            match location {
                DistributionPointLocation::Uri(uri) => add_url(&mut retval, &uri),
                DistributionPointLocation::Names(names) => {
                    for name in names {
                        add_url(&mut retval, &name);
                    }
                }
                DistributionPointLocation::Unsupported(desc) => warn!(
                    "{} not supported in distribution point of {}. URI or general names expected.",
                    desc, cert
                ),
            }
        }
        Ok(retval)
    }
}

fn add_url(urls: &mut Vec<Url>, location: &str) {
    match normalize_distribution_point(location) {
        Ok(url) => {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Err(_) => warn!("{} is not a valid distribution point URI.", location),
    }
}
