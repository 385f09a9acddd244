//! Property-based tests for permission resolution and number formatting
//!
//! Resolution runs on every authorization check against ids read back from
//! the database, so it has to hold up for arbitrary input: anything that was
//! registered resolves, anything else is dropped, nothing panics.

use party_registry::PermissionRegistry;
use party_registry::sequence::{NumberFormat, OverflowPolicy};
use proptest::prelude::*;
use std::collections::BTreeSet;

// PROPERTY TEST STRATEGIES

/// Lower-case identifiers as used for group keys and member names
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,11}"
}

/// A group key with 1 to 6 distinct member names
fn group_strategy() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        identifier_strategy(),
        prop::collection::btree_set(identifier_strategy(), 1..=6),
    )
        .prop_map(|(key, members)| (key, members.into_iter().collect()))
}

/// Several groups with distinct keys
fn groups_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(group_strategy(), 1..=5).prop_map(|groups| {
        let mut seen = BTreeSet::new();
        groups
            .into_iter()
            .filter(|(key, _)| seen.insert(key.clone()))
            .collect()
    })
}

fn build(groups: &[(String, Vec<String>)]) -> PermissionRegistry {
    let mut builder = PermissionRegistry::builder();
    for (key, members) in groups {
        builder.register_group(key, members).unwrap();
    }
    builder.build()
}

// PROPERTY TESTS
proptest! {
    /// Property: every registered member resolves to itself
    #[test]
    fn prop_registered_members_resolve(groups in groups_strategy()) {
        let registry = build(&groups);

        for (key, members) in &groups {
            for member in members {
                let id = format!("{key}.{member}");
                let permission = registry.resolve(&id);
                prop_assert!(permission.is_some(), "{} did not resolve", id);
                prop_assert_eq!(permission.unwrap().id(), id);
            }
        }
    }

    /// Property: ids outside the registered groups never resolve
    #[test]
    fn prop_unregistered_ids_do_not_resolve(
        groups in groups_strategy(),
        key in identifier_strategy(),
        member in identifier_strategy(),
    ) {
        let registry = build(&groups);
        let known = groups
            .iter()
            .any(|(k, members)| *k == key && members.contains(&member));

        let id = format!("{key}.{member}");
        prop_assert_eq!(registry.resolve(&id).is_some(), known);
    }

    /// Property: arbitrary strings never panic the resolver
    #[test]
    fn prop_arbitrary_ids_are_safe(groups in groups_strategy(), id in ".*") {
        let registry = build(&groups);
        let _ = registry.resolve(&id);
    }

    /// Property: batch resolution is exactly the set of individual hits
    #[test]
    fn prop_resolve_many_matches_resolve(
        groups in groups_strategy(),
        ids in prop::collection::vec("[a-z_]{1,8}\\.[a-z_]{1,8}", 0..20),
    ) {
        let registry = build(&groups);

        let expected: BTreeSet<_> = ids.iter().filter_map(|id| registry.resolve(id)).collect();
        let resolved = registry.resolve_many(&ids);

        prop_assert_eq!(resolved, expected);
    }

    /// Property: rendered numbers keep the prefix and at least the configured width
    #[test]
    fn prop_rendered_number_embeds_value(
        prefix in "[A-Z0-9-]{1,10}",
        width in 1u32..=10,
        value in any::<u64>(),
    ) {
        let format = NumberFormat::new(width, OverflowPolicy::Widen);
        let number = format.render(&prefix, value);
        let digits = number.as_str().strip_prefix(prefix.as_str()).unwrap();

        prop_assert!(digits.len() >= width as usize);
        prop_assert_eq!(digits.parse::<u64>().unwrap(), value);
    }

    /// Property: under the reject policy, admitted values fit the width exactly
    #[test]
    fn prop_reject_policy_fits_width(width in 1u32..=19, value in any::<u64>()) {
        let format = NumberFormat::new(width, OverflowPolicy::Reject);
        if format.admits(value) {
            let number = format.render("", value);
            prop_assert_eq!(number.as_str().len(), width as usize);
        }
    }
}
