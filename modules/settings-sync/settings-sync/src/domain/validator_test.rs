#[cfg(test)]
mod tests {
    use super::super::validator::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use settings_sync_sdk::{
        AccountPatch, CategoryPatch, DisplayPatch, NotificationPatch, PrivacyPatch, ProfilePatch,
        SyncFrequency, Theme,
    };

    #[test]
    fn test_valid_display_patch() {
        let patch = CategoryPatch::Display(DisplayPatch {
            theme: Some(Theme::Dark),
            language: Some("en-GB".to_owned()),
            ..DisplayPatch::default()
        });
        assert!(validate_patch(&patch).is_valid());
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let report = validate_patch(&CategoryPatch::Privacy(PrivacyPatch::default()));
        assert_eq!(report.errors, vec!["No fields to update".to_owned()]);
    }

    #[test]
    fn test_session_timeout_bounds() {
        for (minutes, ok) in [(2, false), (5, true), (1440, true), (1441, false)] {
            let report = validate_patch(&CategoryPatch::Privacy(PrivacyPatch {
                session_timeout_minutes: Some(minutes),
                ..PrivacyPatch::default()
            }));
            assert_eq!(report.is_valid(), ok, "timeout {minutes}");
        }

        let report = validate_patch(&CategoryPatch::Privacy(PrivacyPatch {
            session_timeout_minutes: Some(2),
            ..PrivacyPatch::default()
        }));
        assert_eq!(
            report.errors,
            vec!["Session timeout must be between 5 and 1440 minutes".to_owned()]
        );
    }

    #[test]
    fn test_profile_rules_collect_every_error() {
        let report = validate_patch(&CategoryPatch::Profile(ProfilePatch {
            first_name: Some("   ".to_owned()),
            last_name: Some("x".repeat(51)),
            phone: Some("call me".to_owned()),
            avatar_url: Some("ftp://example.com/me.png".to_owned()),
            ..ProfilePatch::default()
        }));

        assert_eq!(report.errors.len(), 4);
        assert!(report.errors.contains(&"First name is required".to_owned()));
        assert!(
            report
                .errors
                .contains(&"Last name must be at most 50 characters".to_owned())
        );
        assert!(
            report
                .errors
                .contains(&"Please enter a valid phone number".to_owned())
        );
    }

    #[test]
    fn test_phone_shapes() {
        for (phone, ok) in [
            ("+1 (555) 010-0199", true),
            ("020 7946 0000", true),
            ("", true),
            ("12345", false),
            ("+1 555 CALL NOW", false),
        ] {
            let report = validate_patch(&CategoryPatch::Profile(ProfilePatch {
                phone: Some(phone.to_owned()),
                ..ProfilePatch::default()
            }));
            assert_eq!(report.is_valid(), ok, "phone {phone:?}");
        }
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let report = validate_patch(&CategoryPatch::Notifications(NotificationPatch {
            low_balance_threshold: Some(Decimal::new(-1, 0)),
            ..NotificationPatch::default()
        }));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_auto_sync_with_manual_frequency_is_contradictory() {
        let report = validate_patch(&CategoryPatch::Accounts(AccountPatch {
            auto_sync: Some(true),
            sync_frequency: Some(SyncFrequency::Manual),
            ..AccountPatch::default()
        }));
        assert_eq!(
            report.errors,
            vec!["Automatic sync cannot use the manual sync frequency".to_owned()]
        );
    }

    #[test]
    fn test_raw_unknown_category() {
        let report = validate_raw("billing", &json!({ "plan": "pro" }));
        assert_eq!(
            report.errors,
            vec!["Unknown settings category 'billing'".to_owned()]
        );
    }

    #[test]
    fn test_raw_enum_membership() {
        let report = validate_raw("display", &json!({ "theme": "neon", "currency": "BTC" }));
        assert_eq!(report.errors.len(), 2);
        assert!(
            report
                .errors
                .contains(&"Invalid theme 'neon'. Expected one of: light, dark, system".to_owned())
        );
        assert!(report.errors.iter().any(|e| e.starts_with("Invalid currency 'BTC'")));
    }

    #[test]
    fn test_raw_unknown_field() {
        let report = validate_raw("privacy", &json!({ "session_timeout": 10 }));
        assert_eq!(
            report.errors,
            vec!["Unknown field 'session_timeout' for privacy settings".to_owned()]
        );
    }

    #[test]
    fn test_raw_wrong_type_is_reported() {
        let report = validate_raw("privacy", &json!({ "session_timeout_minutes": "ten" }));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Invalid privacy settings payload"));
    }

    #[test]
    fn test_raw_payload_runs_typed_rules() {
        let report = validate_raw("privacy", &json!({ "session_timeout_minutes": 2 }));
        assert_eq!(
            report.errors,
            vec!["Session timeout must be between 5 and 1440 minutes".to_owned()]
        );
    }

    #[test]
    fn test_parse_raw_patch_success() {
        let patch = parse_raw_patch("accounts", &json!({ "sync_frequency": "hourly" })).unwrap();
        assert_eq!(
            patch,
            CategoryPatch::Accounts(AccountPatch {
                sync_frequency: Some(SyncFrequency::Hourly),
                ..AccountPatch::default()
            })
        );
    }

    #[test]
    fn test_non_object_payload() {
        let report = validate_raw("display", &json!(["dark"]));
        assert_eq!(
            report.errors,
            vec!["Payload for display settings must be an object".to_owned()]
        );
    }

    #[test]
    fn test_password_change_rules() {
        assert!(validate_password_change("old-pass1", "n3w-secret", "n3w-secret").is_valid());

        let report = validate_password_change("", "short", "other");
        assert!(report.errors.contains(&"Current password is required".to_owned()));
        assert!(
            report
                .errors
                .contains(&"New password must be at least 8 characters".to_owned())
        );
        assert!(report.errors.contains(&"New passwords do not match".to_owned()));

        let report = validate_password_change("same-pass1", "same-pass1", "same-pass1");
        assert_eq!(
            report.errors,
            vec!["New password must be different from the current password".to_owned()]
        );
    }

    #[test]
    fn test_email_change_rules() {
        assert!(validate_email_change("ada@example.com").is_valid());
        assert!(!validate_email_change("ada@example").is_valid());
        assert_eq!(
            validate_email_change("  ").errors,
            vec!["Email is required".to_owned()]
        );
    }
}
