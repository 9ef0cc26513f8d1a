//! The x509auth utility evaluates a certificate chain as presented by a client during TLS client
//! authentication and reports whether the chain would be accepted.
//!
//! ```text
//! $ x509auth --chain client.pem --settings settings.json
//! Decision: accepted
//! Client certificate: CN=alice,O=Example,C=US, SerialNumber=21
//! ```
//!
//! The exit code is 0 when the chain is accepted, 1 when it is rejected and 2 when the settings or
//! chain cannot be read.

use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use x509auth::{read_settings, X509AuthenticationHandler, X509Credentials};

mod args;
use crate::args::X509AuthArgs;

fn configure_logging(args: &X509AuthArgs) {
    if let Some(logging_config) = &args.logging_config {
        match log4rs::init_file(logging_config, Default::default()) {
            Ok(()) => return,
            Err(e) => println!(
                "ERROR: failed to configure logging using {} with {:?}. Continuing with logging to stdout.",
                logging_config, e
            ),
        }
    }

    // if there's no config, prepare one using stdout
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    match Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
    {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                println!(
                    "ERROR: failed to configure logging for stdout with {:?}. Continuing without logging.",
                    e
                );
            }
        }
        Err(e) => {
            println!(
                "ERROR: failed to prepare default logging configuration with {:?}. Continuing without logging",
                e
            );
        }
    }
}

fn run(args: &X509AuthArgs) -> ExitCode {
    let mut settings = match read_settings(args.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            println!("ERROR: failed to read settings: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(trusted_issuer) = &args.trusted_issuer {
        settings.set_trusted_issuer_dn_pattern(trusted_issuer.clone());
    }
    if let Some(toi) = args.time_of_interest {
        settings.set_time_of_interest(toi);
    }

    let handler = match X509AuthenticationHandler::from_settings(&settings) {
        Ok(handler) => handler,
        Err(e) => {
            println!("ERROR: invalid configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let buffer = match std::fs::read(&args.chain) {
        Ok(buffer) => buffer,
        Err(e) => {
            println!("ERROR: failed to read {}: {}", args.chain, e);
            return ExitCode::from(2);
        }
    };
    let mut credentials = match X509Credentials::from_pem_chain(&buffer) {
        Ok(credentials) if args.root_first => {
            X509Credentials::new(credentials.root_first().cloned().collect())
        }
        Ok(credentials) => credentials,
        Err(e) => {
            error!("Failed to parse certificates from {}: {}", args.chain, e);
            println!("ERROR: failed to parse certificates from {}: {}", args.chain, e);
            return ExitCode::from(2);
        }
    };
    debug!(
        "Read {} certificates from {}",
        credentials.certificates().len(),
        args.chain
    );

    if handler.authenticate(&mut credentials) {
        println!("Decision: accepted");
        if let Some(client) = credentials.client_certificate() {
            println!("Client certificate: {}", client);
        }
        ExitCode::SUCCESS
    } else {
        println!("Decision: rejected");
        ExitCode::from(1)
    }
}

/// Point of entry for the x509auth utility.
fn main() -> ExitCode {
    let args = X509AuthArgs::parse();
    configure_logging(&args);

    debug!("x509auth start");
    let code = run(&args);
    debug!("x509auth end");
    code
}
