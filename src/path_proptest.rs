//! Property-based tests for naming functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::defaults::ENTITY_NAME_SEPARATORS;
    use crate::path::{rewrite_archive_prefix, to_directory_name};
    use proptest::prelude::*;

    // ============================================================================
    // to_directory_name property tests
    // ============================================================================

    proptest! {
        /// Property: no separator survives normalization
        #[test]
        fn to_directory_name_removes_all_separators(input in ".*") {
            let result = to_directory_name(&input);
            for sep in ENTITY_NAME_SEPARATORS {
                prop_assert!(
                    !result.contains(*sep),
                    "to_directory_name left separator {:?} in '{}' (input '{}')",
                    sep,
                    result,
                    input
                );
            }
        }

        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn to_directory_name_is_idempotent(input in ".*") {
            let once = to_directory_name(&input);
            let twice = to_directory_name(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: names without separators are unchanged
        #[test]
        fn to_directory_name_preserves_plain_names(input in "[a-zA-Z0-9().]*") {
            prop_assert_eq!(to_directory_name(&input), input);
        }

        /// Property: only separator characters are dropped, order is kept
        #[test]
        fn to_directory_name_keeps_other_chars_in_order(input in "[a-z _-]{0,30}") {
            let expected: String = input.chars().filter(|c| c.is_ascii_lowercase()).collect();
            prop_assert_eq!(to_directory_name(&input), expected);
        }
    }

    // ============================================================================
    // rewrite_archive_prefix property tests
    // ============================================================================

    proptest! {
        /// Property: automation entries always become script entries
        #[test]
        fn rewrite_archive_prefix_maps_automation(rest in "[a-zA-Z0-9_.-]{0,30}") {
            let name = format!("automation-{}", rest);
            prop_assert_eq!(rewrite_archive_prefix(&name), format!("script-{}", rest));
        }

        /// Property: other entries pass through unchanged
        #[test]
        fn rewrite_archive_prefix_passthrough(name in "(integration|playbook|layout)-[a-zA-Z0-9_.]{0,30}") {
            prop_assert_eq!(rewrite_archive_prefix(&name), name);
        }
    }
}
