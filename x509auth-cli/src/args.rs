//! Command line options for the x509auth utility

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Evaluates a client certificate chain and reports whether it would be accepted for authentication
#[derive(Parser, Debug, Serialize, Deserialize, Default)]
#[command(arg_required_else_help(true))]
#[clap(author, version, about, long_about = None)]
pub struct X509AuthArgs {
    /// Full path and filename of a file containing one or more PEM-encoded certificates (or a single
    /// binary DER-encoded certificate). Certificates are expected in the order a client presents
    /// them, i.e., client certificate first, unless --root-first is specified.
    #[clap(short, long, help_heading = "INPUT")]
    pub chain: String,

    /// Flag that indicates the certificates in the chain file are ordered root first, i.e., client
    /// certificate last.
    #[clap(long, help_heading = "INPUT")]
    pub root_first: bool,

    /// Full path and filename of JSON-formatted authentication settings.
    #[clap(short, long, help_heading = "CONFIGURATION")]
    pub settings: Option<String>,

    /// Regular expression that the issuer name of at least one certificate must match. Overrides
    /// the value from the settings file, if any.
    #[clap(short, long, help_heading = "CONFIGURATION")]
    pub trusted_issuer: Option<String>,

    /// Time to use for validity checks expressed as the number of seconds since Unix epoch
    /// (defaults to current system time). Overrides the value from the settings file, if any.
    #[clap(short = 'i', long, help_heading = "CONFIGURATION")]
    pub time_of_interest: Option<u64>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long, help_heading = "LOGGING")]
    pub logging_config: Option<String>,
}
