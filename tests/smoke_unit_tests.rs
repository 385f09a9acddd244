//! Smoke Screen Unit tests for the numbering and permission components
//!
//! These tests exercise the public API of each module in isolation from the
//! database scenarios. They are intended as smoke-screen and mostly cover
//! the happy path.

use party_registry::{
    AppMode, Config, PermissionGroup, PermissionRegistry, Purpose, RegistryError,
    ids::{new_bech32_id, new_user_id},
    sequence::{NumberFormat, OverflowPolicy, SequenceEntry},
};

// IDS MODULE TESTS
mod ids_tests {
    use super::*;

    /// Generated ids carry the human-readable prefix
    #[test]
    fn generates_bech32_with_hrp() {
        let encoded = new_user_id().unwrap();
        assert!(encoded.starts_with("user1"));
        assert!(encoded.len() > 10);
    }

    /// Consecutive ids differ
    #[test]
    fn generates_unique_ids() {
        let a = new_user_id().unwrap();
        let b = new_user_id().unwrap();
        assert_ne!(a, b);
    }

    /// Other kinds are available for non-user ids
    #[test]
    fn generates_ids_of_other_kinds() {
        let encoded = new_bech32_id("evt").unwrap();
        assert!(encoded.starts_with("evt1"));
    }
}

// SEQUENCE MODULE TESTS
mod sequence_tests {
    use super::*;

    /// Purposes render with their storage names
    #[test]
    fn purpose_names() {
        assert_eq!(Purpose::Article.to_string(), "article");
        assert_eq!(Purpose::Order.to_string(), "order");
        assert_eq!(Purpose::ALL.len(), 2);
    }

    /// A fresh entry starts counting at zero
    #[test]
    fn new_entry_starts_at_zero() {
        let entry = SequenceEntry::new("aec-05", Purpose::Article, "AEC-05-A");
        assert_eq!(entry.value, 0);
        assert_eq!(entry.prefix, "AEC-05-A");
    }

    /// Default format pads to five digits
    #[test]
    fn default_format_pads_to_five_digits() {
        let format = NumberFormat::default();
        assert_eq!(format.width(), 5);
        assert_eq!(format.render("AEC-05-B", 42).to_string(), "AEC-05-B00042");
        assert_eq!(format.render("AEC-05-B", 99_999).as_str(), "AEC-05-B99999");
    }

    /// Different values under the same prefix never render the same
    #[test]
    fn distinct_values_render_distinctly() {
        let format = NumberFormat::new(5, OverflowPolicy::Widen);
        let a = format.render("X", 12_345);
        let b = format.render("X", 123_450);
        assert_ne!(a, b);
    }
}

// REGISTRY MODULE TESTS
mod registry_tests {
    use super::*;

    /// Register, then resolve members of the tourney category group
    #[test]
    fn tourney_category_resolution() {
        let mut builder = PermissionRegistry::builder();
        builder
            .register_group("tourney_category", &["create", "update", "view"])
            .unwrap();
        let registry = builder.build();

        let view = registry.resolve("tourney_category.view").unwrap();
        assert_eq!(view.group(), "tourney_category");
        assert_eq!(view.name(), "view");

        assert!(registry.resolve("tourney_category.delete").is_none());
        assert!(registry.resolve("unknown_group.view").is_none());
    }

    /// Batch resolution keeps only what resolves
    #[test]
    fn batch_resolution_drops_unknowns() {
        let mut builder = PermissionRegistry::builder();
        builder
            .register_group("tourney_category", &["create", "update", "view"])
            .unwrap();
        let registry = builder.build();

        let resolved = registry.resolve_many(["tourney_category.view", "bogus.x"]);
        let ids: Vec<_> = resolved.iter().map(|p| p.id()).collect();
        assert_eq!(ids, ["tourney_category.view"]);
    }

    /// Duplicate resolution collapses to one entry
    #[test]
    fn batch_resolution_deduplicates() {
        let registry = PermissionRegistry::for_mode(AppMode::Admin).unwrap();
        let resolved = registry.resolve_many(vec![
            "seating.view".to_string(),
            "seating.view".to_string(),
            "seating.administrate".to_string(),
        ]);
        assert_eq!(resolved.len(), 2);
    }

    /// Registering a prebuilt group
    #[test]
    fn register_prebuilt_group() {
        let group = PermissionGroup::with_titles(
            "seating",
            &[("administrate", "Administrate seating"), ("view", "View seating administration")],
        )
        .unwrap();
        let mut builder = PermissionRegistry::builder();
        builder.register(group.clone()).unwrap();
        assert_eq!(
            builder.register(group).unwrap_err(),
            RegistryError::DuplicateGroup("seating".into())
        );
    }

    /// Groups are listed by key
    #[test]
    fn groups_are_ordered_by_key() {
        let registry = PermissionRegistry::for_mode(AppMode::Admin).unwrap();
        let keys: Vec<_> = registry.groups().map(|g| g.key().to_string()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(
            registry.group("tourney_category").unwrap().type_name(),
            "TourneyCategoryPermission"
        );
    }
}

// CONFIG MODULE TESTS
mod config_tests {
    use super::*;

    /// Numbering section maps onto the number format
    #[test]
    fn numbering_section_drives_format() {
        let config = Config::from_toml_str("[numbering]\nwidth = 7\noverflow = \"widen\"").unwrap();
        let format = config.numbering.number_format();
        assert_eq!(format.width(), 7);
        assert_eq!(format.max_value(), None);
        assert_eq!(format.render("P", 3).as_str(), "P0000003");
    }
}
