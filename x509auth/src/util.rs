//! Basic utility functionality supporting chain validation

pub mod cert_utilities;
pub mod error;

pub use crate::{util::cert_utilities::*, util::error::*};
