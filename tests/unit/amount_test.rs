// Property-based coverage of minor-unit conversions, including the
// intention endpoint's major-unit quirk.

use coursepay::core::amount::{cents_to_major_units, from_cents, to_cents};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

proptest! {
    #[test]
    fn round_trip_is_identity(cents in 0i64..10_000_000_000i64) {
        prop_assert_eq!(to_cents(from_cents(cents)).unwrap(), cents);
    }

    #[test]
    fn intention_conversion_composes_to_identity(cents in 0i64..10_000_000_000i64) {
        // dividing by 100 for the intention call and multiplying by 100 for
        // the card flow must cancel exactly on cent-denominated inputs
        prop_assert_eq!(to_cents(cents_to_major_units(cents)).unwrap(), cents);
    }

    #[test]
    fn from_cents_has_two_decimal_places(cents in 0i64..10_000_000_000i64) {
        prop_assert!(from_cents(cents).scale() <= 2);
    }

    #[test]
    fn to_cents_scales_by_hundred(units in 0i64..100_000_000i64) {
        let amount = Decimal::from(units);
        prop_assert_eq!(to_cents(amount).unwrap(), units * 100);
    }
}

#[test]
fn sub_cent_precision_is_rejected() {
    assert!(to_cents(dec!(10.001)).is_err());
    assert!(to_cents(dec!(0.005)).is_err());
}

#[test]
fn negative_amounts_are_rejected() {
    assert!(to_cents(dec!(-0.01)).is_err());
}

#[test]
fn exact_two_decimal_amounts_convert() {
    assert_eq!(to_cents(dec!(149.99)).unwrap(), 14999);
    assert_eq!(to_cents(dec!(0.01)).unwrap(), 1);
    assert_eq!(to_cents(dec!(0)).unwrap(), 0);
}

#[test]
fn major_units_match_display_amounts() {
    assert_eq!(cents_to_major_units(15000), dec!(150.00));
    assert_eq!(cents_to_major_units(1), dec!(0.01));
}
