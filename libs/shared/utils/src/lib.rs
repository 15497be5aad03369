pub mod test_utils;
pub mod validation;

pub use validation::{digits_only, FieldValidator, ValidationReport};
