//! Scenario: phone validation under both accepted shapes.

use drk_order::{validate_phone, PhoneError, PhoneRule};

#[test]
fn ten_digit_rule_accepts_and_trims() {
    assert_eq!(
        validate_phone(" 0912345678 ", PhoneRule::TenDigits).unwrap(),
        "0912345678"
    );
    assert_eq!(
        validate_phone("1234567890", PhoneRule::TenDigits).unwrap(),
        "1234567890"
    );
}

#[test]
fn empty_is_rejected_under_both_rules() {
    for rule in [PhoneRule::TenDigits, PhoneRule::MobilePrefix] {
        assert_eq!(validate_phone("   ", rule), Err(PhoneError::Empty));
    }
}

#[test]
fn wrong_length_or_non_digits_rejected() {
    for raw in ["091234567", "09123456789", "09-2345678", "０９１２３４５６７８"] {
        assert_eq!(
            validate_phone(raw, PhoneRule::TenDigits),
            Err(PhoneError::NotTenDigits),
            "{raw:?} must be rejected"
        );
    }
}

#[test]
fn mobile_rule_requires_09_prefix() {
    assert!(validate_phone("0912345678", PhoneRule::MobilePrefix).is_ok());
    assert_eq!(
        validate_phone("1234567890", PhoneRule::MobilePrefix),
        Err(PhoneError::NotMobile)
    );
    assert_eq!(
        validate_phone("09123", PhoneRule::MobilePrefix),
        Err(PhoneError::NotMobile)
    );
}

#[test]
fn error_messages_are_user_facing() {
    assert!(PhoneError::Empty.to_string().contains("不得為空"));
    assert!(PhoneError::NotTenDigits.to_string().contains("10 位數字"));
}
