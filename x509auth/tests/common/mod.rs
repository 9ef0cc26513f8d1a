//! Builders for unsigned certificates and CRLs plus counting test doubles for the revocation
//! collaborators

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use const_oid::db::rfc5912::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_KEY_USAGE,
};
use const_oid::db::rfc8410::ID_ED_25519;
use der::asn1::{BitString, GeneralizedTime, Ia5String, OctetString};
use der::{Encode, EncodePem};
use flagset::FlagSet;
use url::Url;
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{BasicConstraints, CrlDistributionPoints, KeyUsage, KeyUsages};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

use x509auth::*;

/// Fixed time of interest used by tests (2023-11-14)
pub const NOW: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;

fn time(secs: u64) -> Time {
    Time::GeneralTime(GeneralizedTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}

fn alg() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: ID_ED_25519,
        parameters: None,
    }
}

fn extension(oid: const_oid::ObjectIdentifier, critical: bool, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value).unwrap(),
    }
}

#[derive(Clone)]
enum CrlDpSpec {
    Uris(Vec<String>),
    RelativeName,
    NoName,
}

/// `CertBuilder` assembles an unsigned certificate with the extensions the validator consults
#[derive(Clone)]
pub struct CertBuilder {
    subject: String,
    issuer: String,
    serial: Vec<u8>,
    not_before: u64,
    not_after: u64,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<(FlagSet<KeyUsages>, bool)>,
    distribution_points: Vec<CrlDpSpec>,
    malformed_crl_dp: bool,
}

impl CertBuilder {
    pub fn end_entity(subject: &str, issuer: &str) -> Self {
        CertBuilder {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            serial: vec![0x01],
            not_before: NOW - 30 * DAY,
            not_after: NOW + 30 * DAY,
            basic_constraints: None,
            key_usage: None,
            distribution_points: vec![],
            malformed_crl_dp: false,
        }
    }

    pub fn ca(subject: &str, issuer: &str, path_len_constraint: Option<u8>) -> Self {
        let mut builder = Self::end_entity(subject, issuer);
        builder.basic_constraints = Some(BasicConstraints {
            ca: true,
            path_len_constraint,
        });
        builder
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self
    }

    pub fn validity(mut self, not_before: u64, not_after: u64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn basic_constraints_not_ca(mut self) -> Self {
        self.basic_constraints = Some(BasicConstraints {
            ca: false,
            path_len_constraint: None,
        });
        self
    }

    pub fn key_usage(mut self, usages: impl Into<FlagSet<KeyUsages>>, critical: bool) -> Self {
        self.key_usage = Some((usages.into(), critical));
        self
    }

    /// Adds one distribution point whose fullName holds the given URIs
    pub fn crl_uris(mut self, uris: &[&str]) -> Self {
        self.distribution_points.push(CrlDpSpec::Uris(
            uris.iter().map(|u| u.to_string()).collect(),
        ));
        self
    }

    /// Adds one distribution point that uses nameRelativeToCRLIssuer
    pub fn crl_relative_name(mut self) -> Self {
        self.distribution_points.push(CrlDpSpec::RelativeName);
        self
    }

    /// Adds one distribution point with only a cRLIssuer
    pub fn crl_no_name(mut self) -> Self {
        self.distribution_points.push(CrlDpSpec::NoName);
        self
    }

    pub fn malformed_crl_dp(mut self) -> Self {
        self.malformed_crl_dp = true;
        self
    }

    pub fn certificate(&self) -> Certificate {
        let mut extensions = vec![];
        if let Some(bc) = &self.basic_constraints {
            extensions.push(extension(ID_CE_BASIC_CONSTRAINTS, true, bc.to_der().unwrap()));
        }
        if let Some((usages, critical)) = &self.key_usage {
            extensions.push(extension(
                ID_CE_KEY_USAGE,
                *critical,
                KeyUsage(*usages).to_der().unwrap(),
            ));
        }
        if self.malformed_crl_dp {
            extensions.push(extension(
                ID_CE_CRL_DISTRIBUTION_POINTS,
                false,
                vec![0x30, 0x05, 0xA0, 0x03],
            ));
        } else if !self.distribution_points.is_empty() {
            let issuer = Name::from_str(&self.issuer).unwrap();
            let dps = self
                .distribution_points
                .iter()
                .map(|spec| match spec {
                    CrlDpSpec::Uris(uris) => DistributionPoint {
                        distribution_point: Some(DistributionPointName::FullName(
                            uris.iter()
                                .map(|u| {
                                    GeneralName::UniformResourceIdentifier(
                                        Ia5String::new(u).unwrap(),
                                    )
                                })
                                .collect(),
                        )),
                        reasons: None,
                        crl_issuer: None,
                    },
                    CrlDpSpec::RelativeName => DistributionPoint {
                        distribution_point: Some(DistributionPointName::NameRelativeToCRLIssuer(
                            Name::from_str("CN=CRL1").unwrap().0[0].clone(),
                        )),
                        reasons: None,
                        crl_issuer: None,
                    },
                    CrlDpSpec::NoName => DistributionPoint {
                        distribution_point: None,
                        reasons: None,
                        crl_issuer: Some(vec![GeneralName::DirectoryName(issuer.clone())]),
                    },
                })
                .collect();
            extensions.push(extension(
                ID_CE_CRL_DISTRIBUTION_POINTS,
                false,
                CrlDistributionPoints(dps).to_der().unwrap(),
            ));
        }

        let tbs_certificate: TbsCertificate = TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial).unwrap(),
            signature: alg(),
            issuer: Name::from_str(&self.issuer).unwrap(),
            validity: Validity {
                not_before: time(self.not_before),
                not_after: time(self.not_after),
            },
            subject: Name::from_str(&self.subject).unwrap(),
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: alg(),
                subject_public_key: BitString::from_bytes(&[0x42; 32]).unwrap(),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        };
        Certificate {
            tbs_certificate,
            signature_algorithm: alg(),
            signature: BitString::from_bytes(&[0u8; 64]).unwrap(),
        }
    }

    pub fn der(&self) -> Vec<u8> {
        self.certificate().to_der().unwrap()
    }

    pub fn pem(&self) -> String {
        self.certificate()
            .to_pem(der::pem::LineEnding::LF)
            .unwrap()
    }

    pub fn build(&self) -> PresentedCertificate {
        PresentedCertificate::try_from(self.der().as_slice()).unwrap()
    }
}

/// Returns a DER-encoded, unsigned CRL
pub fn crl_der(issuer: &str, this_update: u64, next_update: Option<u64>, revoked: &[&[u8]]) -> Vec<u8> {
    let revoked_certificates: Vec<RevokedCert> = revoked
        .iter()
        .map(|serial| RevokedCert {
            serial_number: SerialNumber::new(serial).unwrap(),
            revocation_date: time(this_update - DAY),
            crl_entry_extensions: None,
        })
        .collect();
    let crl: CertificateList = CertificateList {
        tbs_cert_list: TbsCertList {
            version: Version::V2,
            signature: alg(),
            issuer: Name::from_str(issuer).unwrap(),
            this_update: time(this_update),
            next_update: next_update.map(time),
            revoked_certificates: if revoked_certificates.is_empty() {
                None
            } else {
                Some(revoked_certificates)
            },
            crl_extensions: None,
        },
        signature_algorithm: alg(),
        signature: BitString::from_bytes(&[0u8; 64]).unwrap(),
    };
    crl.to_der().unwrap()
}

/// Returns a parsed CRL valid from a day before [`NOW`] until a day after it
pub fn crl(issuer: &str, revoked: &[&[u8]]) -> RevocationList {
    RevocationList::from_der(&crl_der(issuer, NOW - DAY, Some(NOW + DAY), revoked)).unwrap()
}

/// `MockFetcher` returns canned results and records each URL it is asked for
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: BTreeMap<String, x509auth::Result<RevocationList>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, result: x509auth::Result<RevocationList>) -> Self {
        self.responses.insert(url.to_string(), result);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl CrlFetcher for MockFetcher {
    fn fetch(&self, url: &Url) -> x509auth::Result<RevocationList> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some(r) => r.clone(),
            None => Err(Error::NetworkError),
        }
    }
}

/// `CountingCache` wraps an [`InMemoryRevocationCache`] and counts reads and records writes
#[derive(Default)]
pub struct CountingCache {
    inner: InMemoryRevocationCache,
    pub gets: AtomicUsize,
    pub puts: Mutex<Vec<String>>,
}

impl CountingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, url: &str, crl: RevocationList) {
        self.inner.put(url, Arc::new(crl));
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_urls(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn cached(&self, url: &str) -> Option<Arc<RevocationList>> {
        self.inner.get(url)
    }
}

impl RevocationCache for CountingCache {
    fn get(&self, url: &str) -> Option<Arc<RevocationList>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(url)
    }

    fn put(&self, url: &str, crl: Arc<RevocationList>) {
        self.puts.lock().unwrap().push(url.to_string());
        self.inner.put(url, crl);
    }
}

/// Settings with the given trusted issuer pattern, evaluated at [`NOW`]
pub fn settings(trusted_issuer: &str) -> AuthenticationSettings {
    let mut settings = AuthenticationSettings::new();
    settings.set_trusted_issuer_dn_pattern(trusted_issuer.to_string());
    settings.set_time_of_interest(NOW);
    settings
}
