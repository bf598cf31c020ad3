//! Voucher domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a voucher's discount is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Flat amount off the stay.
    #[default]
    #[serde(alias = "flat", alias = "amount")]
    Fixed,
    Percentage,
}

/// A discount code scoped to one thirdparty account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub minimum_nights: u32,
    #[serde(default)]
    pub redemption_count: u32,
}

impl Voucher {
    /// Code normalised for case-insensitive comparison.
    pub fn normalized_code(&self) -> String {
        normalize_code(&self.code)
    }
}

/// Normalises a voucher code for case-insensitive matching.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Payload for creating a voucher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVoucher {
    pub thirdparty_account_id: i64,
    pub code: String,
    pub discount: i64,
    pub discount_type: DiscountType,
    pub minimum_nights: u32,
    pub redemption_count: u32,
    pub earliest_check_in_date: Option<NaiveDate>,
    pub latest_check_in_date: Option<NaiveDate>,
    pub stay_period: u32,
    pub expires_at: Option<NaiveDate>,
}

/// Listing filter for vouchers of one thirdparty account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherQuery {
    pub thirdparty_account_id: i64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" summer2024 "), "SUMMER2024");
    }

    #[test]
    fn test_discount_type_aliases() {
        let parsed: DiscountType = serde_json::from_str("\"flat\"").unwrap();
        assert_eq!(parsed, DiscountType::Fixed);
        let parsed: DiscountType = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }

    #[test]
    fn test_voucher_defaults() {
        let voucher: Voucher = serde_json::from_value(serde_json::json!({
            "id": 7,
            "code": "welcome"
        }))
        .unwrap();
        assert_eq!(voucher.discount_type, DiscountType::Fixed);
        assert_eq!(voucher.normalized_code(), "WELCOME");
    }
}
