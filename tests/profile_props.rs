//! Property tests for profile validation.

use proptest::prelude::*;
use scheme_eligibility::{collect_profile, Category, IndianState, ProfileField, RawProfile};

/// Income written the ways people type it.
fn income_text(amount: u64, style: u8) -> String {
    match style % 4 {
        0 => amount.to_string(),
        1 => format!("₹{amount}"),
        2 => format!("Rs. {amount}"),
        _ => {
            let digits = amount.to_string();
            let mut grouped = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            grouped
        }
    }
}

proptest! {
    #[test]
    fn valid_profiles_are_always_accepted(
        age in 0u32..=120,
        income in 0u64..=1_000_000_000_000,
        style in any::<u8>(),
        category_idx in 0usize..Category::ALL.len(),
        state_idx in 0usize..IndianState::ALL.len(),
    ) {
        let category = Category::ALL[category_idx];
        let state = IndianState::ALL[state_idx];
        let raw = RawProfile::new(
            age.to_string(),
            income_text(income, style),
            category.label(),
            state.name(),
        );

        let profile = collect_profile(&raw).unwrap();
        prop_assert_eq!(profile.age, age);
        prop_assert_eq!(profile.annual_income, income);
        prop_assert_eq!(profile.category, category);
        prop_assert_eq!(profile.state, state);
    }

    #[test]
    fn every_invalid_field_is_reported_once(
        bad_age in any::<bool>(),
        bad_income in any::<bool>(),
        bad_category in any::<bool>(),
        bad_state in any::<bool>(),
        bad_gender in any::<bool>(),
        too_old in 121u32..10_000,
    ) {
        let raw = RawProfile {
            gender: Some(if bad_gender { "robot" } else { "female" }.to_string()),
            ..RawProfile::new(
                if bad_age { too_old.to_string() } else { "30".to_string() },
                if bad_income { "-500" } else { "50000" },
                if bad_category { "martian" } else { "st" },
                if bad_state { "Atlantis" } else { "Kerala" },
            )
        };

        let expected: Vec<ProfileField> = [
            (bad_age, ProfileField::Age),
            (bad_income, ProfileField::AnnualIncome),
            (bad_category, ProfileField::Category),
            (bad_state, ProfileField::State),
            (bad_gender, ProfileField::Gender),
        ]
        .into_iter()
        .filter_map(|(bad, field)| bad.then_some(field))
        .collect();

        match collect_profile(&raw) {
            Ok(_) => prop_assert!(expected.is_empty()),
            Err(e) => {
                prop_assert_eq!(e.errors.len(), expected.len());
                prop_assert_eq!(e.fields(), expected);
            }
        }
    }
}
