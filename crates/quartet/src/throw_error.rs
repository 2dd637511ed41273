//! Assertion adapter

use crate::error::AssertionError;

/// Turn a predicate into an assertion that hands its input back on success
/// and fails with `message` otherwise.
///
/// ```
/// use quartet::throw_error;
///
/// let positive = throw_error(|n: &i32| *n > 0, "must be positive");
/// assert_eq!(positive(3), Ok(3));
/// assert_eq!(positive(-1).unwrap_err().message, "must be positive");
/// ```
pub fn throw_error<T, P>(predicate: P, message: impl Into<String>) -> impl Fn(T) -> Result<T, AssertionError>
where
    P: Fn(&T) -> bool,
{
    let message = message.into();
    move |value| {
        if predicate(&value) {
            Ok(value)
        } else {
            Err(AssertionError {
                message: message.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_fixed() {
        let non_empty = throw_error(|s: &String| !s.is_empty(), "empty");
        assert_eq!(non_empty("x".to_string()), Ok("x".to_string()));
        assert_eq!(non_empty(String::new()).unwrap_err().to_string(), "empty");
        assert_eq!(non_empty(String::new()).unwrap_err().message, "empty");
    }
}
