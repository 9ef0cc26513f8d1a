mod common;

use common::*;
use x509auth::*;

const CA: &str = "CN=CAS Test User CA,O=Example,C=US";

fn urls(cert: &PresentedCertificate) -> Vec<String> {
    DistributionPointExtractor::default()
        .extract(cert)
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect()
}

#[test]
fn no_extension() {
    let cert = CertBuilder::end_entity("CN=alice", CA).build();
    assert!(X509DistributionPointReader.read(&cert).unwrap().is_empty());
    assert!(urls(&cert).is_empty());
}

#[test]
fn declaration_order_is_preserved() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .crl_uris(&[
            "http://b.example.com/ca.crl",
            "http://a.example.com/ca.crl",
        ])
        .crl_uris(&["file:///var/lib/crls/ca.crl"])
        .build();

    assert_eq!(
        vec![
            DistributionPointLocation::Names(vec![
                "http://b.example.com/ca.crl".to_string(),
                "http://a.example.com/ca.crl".to_string()
            ]),
            DistributionPointLocation::Names(vec!["file:///var/lib/crls/ca.crl".to_string()]),
        ],
        X509DistributionPointReader.read(&cert).unwrap()
    );
    assert_eq!(
        vec![
            "http://b.example.com/ca.crl",
            "http://a.example.com/ca.crl",
            "file:///var/lib/crls/ca.crl"
        ],
        urls(&cert)
    );
}

#[test]
fn distinguished_name_query_is_escaped() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .crl_uris(&["http://localhost:8085/ca?action=crl&issuer=CN=CAS Test User CA"])
        .build();
    assert_eq!(
        vec!["http://localhost:8085/ca?action=crl&issuer=CN=CAS%20Test%20User%20CA"],
        urls(&cert)
    );
}

#[test]
fn invalid_names_are_dropped() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .crl_uris(&["CN=CAS Test User CA", "http://crl.example.com/ca.crl"])
        .crl_uris(&["://missing-scheme"])
        .build();
    assert_eq!(vec!["http://crl.example.com/ca.crl"], urls(&cert));
}

#[test]
fn duplicates_are_dropped() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .crl_uris(&["http://crl.example.com/ca.crl"])
        .crl_uris(&["http://crl.example.com/ca.crl#copy"])
        .build();
    assert_eq!(vec!["http://crl.example.com/ca.crl"], urls(&cert));
}

#[test]
fn unsupported_locations_are_skipped() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .crl_relative_name()
        .crl_no_name()
        .crl_uris(&["http://crl.example.com/ca.crl"])
        .build();

    let locations = X509DistributionPointReader.read(&cert).unwrap();
    assert_eq!(3, locations.len());
    assert!(matches!(
        locations[0],
        DistributionPointLocation::Unsupported(_)
    ));
    assert!(matches!(
        locations[1],
        DistributionPointLocation::Unsupported(_)
    ));
    assert_eq!(vec!["http://crl.example.com/ca.crl"], urls(&cert));
}

#[test]
fn malformed_extension_is_an_error() {
    let cert = CertBuilder::end_entity("CN=alice", CA)
        .malformed_crl_dp()
        .build();
    assert!(matches!(
        DistributionPointExtractor::default().extract(&cert),
        Err(Error::Asn1Error(_))
    ));
}
