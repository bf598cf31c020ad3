//! Loyalty card model as read from the CRM.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// `many2one` reference as returned by the CRM: `[id, display_name]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRef(pub i64, pub String);

/// A CRM-sourced points record convertible into a booking voucher.
///
/// The CRM encodes unset fields as `false`, hence the lenient decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyCard {
    pub id: i64,
    #[serde(default, deserialize_with = "false_as_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub points: Option<f64>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub partner_id: Option<PartnerRef>,
}

impl LoyaltyCard {
    /// The card code, if present and not blank.
    pub fn usable_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrFalse<T> {
    Value(T),
    Flag(#[allow(dead_code)] bool),
}

fn false_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OrFalse<T>>::deserialize(deserializer)? {
        Some(OrFalse::Value(value)) => Some(value),
        _ => None,
    })
}

/// Search parameters for a CRM `search_read` over loyalty cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoyaltyQuery {
    pub domain: Vec<serde_json::Value>,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl LoyaltyQuery {
    /// Every card, newest first, with the fields the voucher sync needs.
    pub fn all_cards() -> Self {
        Self {
            domain: Vec::new(),
            fields: ["id", "code", "points", "expiration_date", "partner_id"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            order: Some("id desc".to_string()),
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_with_false_fields() {
        let card: LoyaltyCard = serde_json::from_value(serde_json::json!({
            "id": 12,
            "code": false,
            "points": false,
            "expiration_date": false,
            "partner_id": false
        }))
        .unwrap();
        assert_eq!(card.id, 12);
        assert!(card.code.is_none());
        assert!(card.points.is_none());
        assert!(card.expiration_date.is_none());
        assert!(card.partner_id.is_none());
    }

    #[test]
    fn test_card_with_values() {
        let card: LoyaltyCard = serde_json::from_value(serde_json::json!({
            "id": 3,
            "code": "044c-1234",
            "points": 25.5,
            "expiration_date": "2025-06-30",
            "partner_id": [8, "Jane Roe"]
        }))
        .unwrap();
        assert_eq!(card.usable_code(), Some("044c-1234"));
        assert_eq!(card.points, Some(25.5));
        assert_eq!(
            card.expiration_date,
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
        assert_eq!(card.partner_id, Some(PartnerRef(8, "Jane Roe".into())));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let card: LoyaltyCard = serde_json::from_value(serde_json::json!({ "id": 1 })).unwrap();
        assert!(card.code.is_none());
    }

    #[test]
    fn test_blank_code_is_not_usable() {
        let card: LoyaltyCard =
            serde_json::from_value(serde_json::json!({ "id": 1, "code": "  " })).unwrap();
        assert_eq!(card.usable_code(), None);
    }

    #[test]
    fn test_all_cards_query() {
        let query = LoyaltyQuery::all_cards();
        assert!(query.domain.is_empty());
        assert_eq!(query.fields.len(), 5);
        assert_eq!(query.order.as_deref(), Some("id desc"));
    }
}
