//! Validating layer
//!
//! Checks host values before dump and parses raw values on load, collecting
//! every violation into one [`ValidationError`].

mod errors;
mod validator;

pub use errors::{ValidationDetails, ValidationError};
pub use validator::{validate_record, Violations};

pub(crate) use validator::{host_matches, json_type_name, parse_scalar, ROOT_PATH};
