//! Outcome conversion for handler return values.

use crate::error::BoxError;

/// Trait for converting a handler's output into a hand-off outcome.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<T, E>` → delegates to `T`, or boxes the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoOutcome`",
    label = "missing `IntoOutcome` implementation",
    note = "Handlers must return `()` or a `Result` whose error implements `std::error::Error`."
)]
pub trait IntoOutcome {
    /// Convert the output into success or a boxed failure.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_success() {
        assert!(().into_outcome().is_ok());
    }

    #[test]
    fn test_result_error_is_boxed() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("refused"));
        let err = result.into_outcome().unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }
}
