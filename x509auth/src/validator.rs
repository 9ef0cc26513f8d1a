//! Trust decisions for presented client certificate chains

pub mod authentication_settings;
pub mod chain_validator;
pub mod credentials;
pub mod presented_certificate;

pub use crate::{
    validator::authentication_settings::*, validator::chain_validator::*,
    validator::credentials::*, validator::presented_certificate::*,
};
