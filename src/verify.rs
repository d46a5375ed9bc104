//! Verification helpers for user-provided collections
//!
//! Loading functions take lists of FOV and channel names that have to line
//! up with what is actually on disk. These helpers produce errors that name
//! both collections and show the offending values instead of a bare
//! mismatch.

use std::fmt::Display;

use crate::error::{FovkitError, Result};

/// How many offending values an error message will show
const MAX_REPORTED_VALUES: usize = 10;

/// Format offending values for an error message, one per line, capped at
/// [`MAX_REPORTED_VALUES`] entries
pub fn format_invalid_values<T: Display>(values: &[T]) -> String {
    let mut lines: Vec<String> = values
        .iter()
        .take(MAX_REPORTED_VALUES)
        .map(|value| format!(" - {value}"))
        .collect();
    if values.len() > MAX_REPORTED_VALUES {
        lines.push(format!(" ... and {} more", values.len() - MAX_REPORTED_VALUES));
    }
    lines.join("\n")
}

/// Check that every provided value appears in the allowed collection.
///
/// Both arguments are `(name, values)` pairs; the names end up in the error
/// message so the caller can tell which input was wrong.
pub fn verify_in_list<T: PartialEq + Display>(
    provided: (&str, &[T]),
    allowed: (&str, &[T]),
) -> Result<()> {
    let (provided_name, provided_values) = provided;
    let (allowed_name, allowed_values) = allowed;

    let invalid: Vec<&T> = provided_values
        .iter()
        .filter(|value| !allowed_values.contains(*value))
        .collect();

    if invalid.is_empty() {
        return Ok(());
    }

    Err(FovkitError::NotInList {
        provided_name: provided_name.to_string(),
        allowed_name: allowed_name.to_string(),
        invalid: format_invalid_values(&invalid),
    })
}

/// Check that two collections contain the same elements.
///
/// Without `enforce_order` this is a set comparison; duplicates are ignored
/// and the error reports the values missing from each side. With
/// `enforce_order` the sequences must be identical.
pub fn verify_same_elements<T: PartialEq + Display>(
    left: (&str, &[T]),
    right: (&str, &[T]),
    enforce_order: bool,
) -> Result<()> {
    let (left_name, left_values) = left;
    let (right_name, right_values) = right;

    if enforce_order {
        if left_values == right_values {
            return Ok(());
        }
        let render = |values: &[T]| {
            values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(FovkitError::ElementMismatch {
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            detail: format!(
                "expected identical ordering, got:\n{left_name}: [{}]\n{right_name}: [{}]",
                render(left_values),
                render(right_values)
            ),
        });
    }

    let missing_right = missing_from(left_values, right_values);
    let missing_left = missing_from(right_values, left_values);

    if missing_right.is_empty() && missing_left.is_empty() {
        return Ok(());
    }

    let mut detail = String::new();
    if !missing_right.is_empty() {
        detail.push_str(&format!(
            "values in {left_name} missing from {right_name}:\n{}",
            format_invalid_values(&missing_right)
        ));
    }
    if !missing_left.is_empty() {
        if !detail.is_empty() {
            detail.push('\n');
        }
        detail.push_str(&format!(
            "values in {right_name} missing from {left_name}:\n{}",
            format_invalid_values(&missing_left)
        ));
    }

    Err(FovkitError::ElementMismatch {
        left_name: left_name.to_string(),
        right_name: right_name.to_string(),
        detail,
    })
}

/// Deduplicated values of `from` that do not appear in `other`
fn missing_from<'a, T: PartialEq>(from: &'a [T], other: &[T]) -> Vec<&'a T> {
    let mut missing: Vec<&T> = Vec::new();
    for value in from {
        if !other.contains(value) && !missing.iter().any(|seen| *seen == value) {
            missing.push(value);
        }
    }
    missing
}

/// Downgrade a verification failure to a logged warning.
///
/// Returns whether the verification passed.
pub fn warn_on_mismatch(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("{err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_in_list() {
        // value not contained in the allowed values
        let err = verify_in_list(("one", &["hello"]), ("two", &["goodbye", "hello world"]));
        assert!(err.is_err());

        // not every element is equal to the single allowed value
        let err = verify_in_list(("one", &["goodbye", "goodbye", "hello"]), ("two", &["goodbye"]));
        assert!(err.is_err());

        // one list not completely contained in another
        let err = verify_in_list(("one", &["hello", "world"]), ("two", &["hello", "goodbye"]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("one"));
        assert!(message.contains("two"));
        assert!(message.contains("world"));

        // contained
        verify_in_list(("one", &["hello"]), ("two", &["hello", "world"])).unwrap();
    }

    #[test]
    fn test_verify_same_elements() {
        // different elements
        assert!(verify_same_elements(
            ("one", &["elem1", "elem2", "elem2"]),
            ("two", &["elem2", "elem2", "elem4"]),
            false,
        )
        .is_err());

        // same multiset, duplicates ignored
        verify_same_elements(
            ("one", &["elem1", "elem2", "elem2"]),
            ("two", &["elem2", "elem1"]),
            false,
        )
        .unwrap();

        // length mismatch under ordered checking
        assert!(verify_same_elements(("one", &["elem1"]), ("two", &["elem1", "elem2"]), true).is_err());

        // order mismatch under ordered checking
        assert!(verify_same_elements(
            ("one", &["elem1", "elem2"]),
            ("two", &["elem2", "elem1"]),
            true,
        )
        .is_err());

        // identical ordering passes
        verify_same_elements(("one", &["elem1", "elem2"]), ("two", &["elem1", "elem2"]), true)
            .unwrap();
    }

    #[test]
    fn test_warn_on_mismatch() {
        assert!(warn_on_mismatch(Ok(())));
        assert!(!warn_on_mismatch(verify_same_elements(
            ("one", &["elem1", "elem2"]),
            ("two", &["elem2", "elem1"]),
            true,
        )));
    }

    #[test]
    fn test_format_invalid_values() {
        let invalid: Vec<String> = (0..20).map(|index| format!("data_{index}")).collect();

        // exactly ten values are listed in full
        let first_ten = format_invalid_values(&invalid[..10]);
        for value in &invalid[..10] {
            assert!(first_ten.contains(value.as_str()));
        }

        // fewer than ten values are listed in full
        let first_three = format_invalid_values(&invalid[..3]);
        for value in &invalid[..3] {
            assert!(first_three.contains(value.as_str()));
        }

        // more than ten values are capped at ten
        let all = format_invalid_values(&invalid);
        for value in &invalid[..10] {
            assert!(all.contains(value.as_str()));
        }
        assert!(all.contains("10 more"));
        assert!(!all.contains("data_15"));
    }
}
