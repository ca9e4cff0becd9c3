//! Property tests for locator parsing and request validation.

use obf_common::{Error, RedactionRequest, SourceLocator};
use proptest::prelude::*;

proptest! {
    #[test]
    fn locator_parse_never_panics(input in ".{0,120}") {
        let _ = SourceLocator::parse(&input);
    }

    #[test]
    fn valid_locators_display_back_to_input(
        container in "[a-z0-9][a-z0-9.-]{1,20}[a-z0-9]",
        path in "[A-Za-z0-9_/.-]{0,30}[A-Za-z0-9_]",
    ) {
        let raw = format!("s3://{container}/{path}");
        let loc = SourceLocator::parse(&raw).unwrap();
        prop_assert_eq!(loc.container(), container.as_str());
        prop_assert_eq!(loc.to_string(), raw);
    }

    #[test]
    fn target_keeps_container_and_file_name(
        dir in "[a-z]{1,8}",
        stem in "[a-z]{1,8}",
        ext in prop::sample::select(vec!["csv", "json", "parquet"]),
    ) {
        let loc = SourceLocator::parse(&format!("s3://bucket/{dir}/{stem}.{ext}")).unwrap();
        let target = loc.sibling_under("obfuscated/");
        prop_assert_eq!(target.container(), "bucket");
        let expected_path = format!("obfuscated/{stem}.{ext}");
        prop_assert_eq!(target.path(), expected_path.as_str());
    }

    #[test]
    fn any_non_string_field_entry_is_rejected(bad in prop_oneof![
        Just("1".to_string()),
        Just("true".to_string()),
        Just("null".to_string()),
        Just("{}".to_string()),
        Just("[\"x\"]".to_string()),
    ]) {
        let body = format!(
            r#"{{"file_to_obfuscate": "s3://bucket/f.csv", "pii_fields": ["name", {bad}]}}"#
        );
        let is_type_error = matches!(
            RedactionRequest::from_json(&body),
            Err(Error::InvalidFieldType { .. })
        );
        prop_assert!(is_type_error);
    }
}
