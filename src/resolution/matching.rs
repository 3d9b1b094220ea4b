//! Text comparison rules shared by the directory boundary and result processing.

/// Case-insensitive equality.
pub fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive prefix test.
pub fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Whether a directory value matches the user input.
///
/// Exact matching compares whole values; otherwise the value must start with
/// the input. Both ignore case. An empty input never matches.
pub fn matches_input(value: &str, input: &str, exact: bool) -> bool {
    if input.is_empty() {
        return false;
    }
    if exact {
        equals_ignore_case(value, input)
    } else {
        starts_with_ignore_case(value, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_input("AADGroup1", "aadgroup1", true));
        assert!(!matches_input("AADGroup10", "AADGroup1", true));
    }

    #[test]
    fn test_prefix_match() {
        assert!(matches_input("john.doe@contoso.com", "JOHN", false));
        assert!(!matches_input("mary@contoso.com", "john", false));
        assert!(!matches_input("john", "", false));
    }

    #[test]
    fn test_unicode_case() {
        assert!(equals_ignore_case("Jürgen", "JÜRGEN"));
        assert!(starts_with_ignore_case("Émile Zola", "émile"));
    }

    proptest! {
        #[test]
        fn prop_value_matches_itself(value in "[a-zA-Z0-9@._-]{1,24}") {
            prop_assert!(matches_input(&value, &value, true));
            prop_assert!(matches_input(&value, &value.to_uppercase(), false));
        }

        #[test]
        fn prop_exact_implies_prefix(value in "[a-z]{1,12}", input in "[a-z]{1,12}") {
            if matches_input(&value, &input, true) {
                prop_assert!(matches_input(&value, &input, false));
            }
        }
    }
}
