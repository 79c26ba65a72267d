//! Customer phone validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which phone shape the login form accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneRule {
    /// Exactly 10 ASCII digits.
    #[default]
    TenDigits,
    /// "09" followed by exactly 8 ASCII digits.
    MobilePrefix,
}

/// Rejection reasons. The `Display` text is shown inline on the login form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("電話不得為空，請重新輸入。")]
    Empty,
    #[error("電話需為 10 位數字（例如：0912345678），請重新輸入。")]
    NotTenDigits,
    #[error("電話格式錯誤，需為 09 開頭共 10 位數字")]
    NotMobile,
}

/// Validate a submitted phone and return its trimmed form.
pub fn validate_phone(raw: &str, rule: PhoneRule) -> Result<String, PhoneError> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(PhoneError::Empty);
    }

    let ten_digits = phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit());

    match rule {
        PhoneRule::TenDigits if !ten_digits => Err(PhoneError::NotTenDigits),
        PhoneRule::MobilePrefix if !(ten_digits && phone.starts_with("09")) => {
            Err(PhoneError::NotMobile)
        }
        _ => Ok(phone.to_string()),
    }
}
