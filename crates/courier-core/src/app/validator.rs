//! Status validator.

use crate::domain::{CodeValue, ValidationError};

/// Compare an observed status against the expected one.
///
/// Both sides may be integers or numeric strings; they are coerced before
/// comparing.
pub fn validate(
    observed: impl Into<CodeValue>,
    expected: impl Into<CodeValue>,
) -> Result<(), ValidationError> {
    let observed = observed.into().resolve()?;
    let expected = expected.into().resolve()?;
    if observed != expected {
        return Err(ValidationError::UnexpectedStatus { expected, observed });
    }
    Ok(())
}
