//! Row validation.
//!
//! A [`Validator`] is compiled from a schema into a flat list of typed
//! field rules and checks incoming payloads against it. Every failing
//! field is reported, not just the first.

mod rules;
mod validator;

pub use rules::{FieldError, FieldErrorKind, FieldRule};
pub use validator::{ValidationError, Validator};

pub(crate) use rules::json_kind;
