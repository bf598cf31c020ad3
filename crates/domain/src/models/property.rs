//! Static per-property configuration.
//!
//! Property settings are supplied by the operator at startup and never change
//! while the process runs. [`PropertyCatalog`] resolves them by property id and
//! applies the documented fallbacks for unconfigured properties.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::voucher::{normalize_code, DiscountType};

/// Wall-clock time of day on a 24h clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl TimeOfDay {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60
    }
}

/// Check-in and check-out times for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTimeConfig {
    pub check_in: TimeOfDay,
    pub check_out: TimeOfDay,
}

impl PropertyTimeConfig {
    pub const DEFAULT_CHECK_IN: TimeOfDay = TimeOfDay::new(16, 0);
    pub const DEFAULT_CHECK_OUT: TimeOfDay = TimeOfDay::new(12, 0);
}

impl Default for PropertyTimeConfig {
    fn default() -> Self {
        Self {
            check_in: Self::DEFAULT_CHECK_IN,
            check_out: Self::DEFAULT_CHECK_OUT,
        }
    }
}

/// Parameters for turning loyalty points into a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyVoucherConfig {
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default = "default_minimum_nights")]
    pub minimum_nights: u32,
    #[serde(default = "default_redemption_count")]
    pub redemption_count: u32,
}

fn default_minimum_nights() -> u32 {
    1
}

fn default_redemption_count() -> u32 {
    1
}

impl Default for LoyaltyVoucherConfig {
    fn default() -> Self {
        Self {
            discount_type: DiscountType::Fixed,
            minimum_nights: default_minimum_nights(),
            redemption_count: default_redemption_count(),
        }
    }
}

/// Operator-supplied record for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySettings {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub times: Option<PropertyTimeConfig>,
    #[serde(default)]
    pub voucher_greenlist: Vec<String>,
    #[serde(default)]
    pub thirdparty_account_id: Option<i64>,
    #[serde(default)]
    pub loyalty_voucher: Option<LoyaltyVoucherConfig>,
}

impl PropertySettings {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: None,
            times: None,
            voucher_greenlist: Vec::new(),
            thirdparty_account_id: None,
            loyalty_voucher: None,
        }
    }
}

/// Read-only lookup over all configured properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    properties: Vec<PropertySettings>,
}

impl PropertyCatalog {
    pub fn new(properties: Vec<PropertySettings>) -> Self {
        Self { properties }
    }

    fn get(&self, property_id: i64) -> Option<&PropertySettings> {
        self.properties.iter().find(|p| p.id == property_id)
    }

    /// Check-in/out times, falling back to 16:00 / 12:00.
    pub fn property_times(&self, property_id: i64) -> PropertyTimeConfig {
        self.get(property_id)
            .and_then(|p| p.times)
            .unwrap_or_default()
    }

    /// Configured voucher greenlist (empty when unconfigured).
    pub fn voucher_greenlist(&self, property_id: i64) -> &[String] {
        self.get(property_id)
            .map(|p| p.voucher_greenlist.as_slice())
            .unwrap_or(&[])
    }

    /// Greenlist as a set of normalised (uppercase) codes.
    pub fn greenlist_set(&self, property_id: i64) -> HashSet<String> {
        self.voucher_greenlist(property_id)
            .iter()
            .map(|c| normalize_code(c))
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn thirdparty_account_id(&self, property_id: i64) -> Option<i64> {
        self.get(property_id).and_then(|p| p.thirdparty_account_id)
    }

    /// Loyalty conversion parameters, falling back to fixed / 1 night / 1 use.
    pub fn loyalty_voucher_config(&self, property_id: i64) -> LoyaltyVoucherConfig {
        self.get(property_id)
            .and_then(|p| p.loyalty_voucher)
            .unwrap_or_default()
    }

    /// All property ids in configuration order.
    pub fn property_ids(&self) -> Vec<i64> {
        self.properties.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PropertyCatalog {
        let mut configured = PropertySettings::new(1);
        configured.times = Some(PropertyTimeConfig {
            check_in: TimeOfDay::new(15, 30),
            check_out: TimeOfDay::new(10, 0),
        });
        configured.voucher_greenlist = vec!["summer2024".into(), " VIP ".into(), "".into()];
        configured.thirdparty_account_id = Some(900);
        configured.loyalty_voucher = Some(LoyaltyVoucherConfig {
            discount_type: DiscountType::Percentage,
            minimum_nights: 2,
            redemption_count: 3,
        });

        PropertyCatalog::new(vec![configured, PropertySettings::new(2)])
    }

    #[test]
    fn test_property_times_configured() {
        let times = catalog().property_times(1);
        assert_eq!(times.check_in, TimeOfDay::new(15, 30));
        assert_eq!(times.check_out, TimeOfDay::new(10, 0));
    }

    #[test]
    fn test_property_times_fallback() {
        let catalog = catalog();
        assert_eq!(catalog.property_times(2), PropertyTimeConfig::default());
        assert_eq!(catalog.property_times(404).check_in, TimeOfDay::new(16, 0));
        assert_eq!(catalog.property_times(404).check_out, TimeOfDay::new(12, 0));
    }

    #[test]
    fn test_greenlist_set_is_uppercase() {
        let set = catalog().greenlist_set(1);
        assert!(set.contains("SUMMER2024"));
        assert!(set.contains("VIP"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unknown_property_has_empty_greenlist() {
        assert!(catalog().voucher_greenlist(404).is_empty());
    }

    #[test]
    fn test_thirdparty_account_id() {
        let catalog = catalog();
        assert_eq!(catalog.thirdparty_account_id(1), Some(900));
        assert_eq!(catalog.thirdparty_account_id(2), None);
    }

    #[test]
    fn test_loyalty_voucher_config_fallback() {
        let catalog = catalog();
        assert_eq!(catalog.loyalty_voucher_config(1).minimum_nights, 2);
        assert_eq!(
            catalog.loyalty_voucher_config(2),
            LoyaltyVoucherConfig::default()
        );
    }

    #[test]
    fn test_property_ids_keep_order() {
        assert_eq!(catalog().property_ids(), vec![1, 2]);
    }

    #[test]
    fn test_time_of_day_validity() {
        assert!(TimeOfDay::new(23, 59).is_valid());
        assert!(!TimeOfDay::new(24, 0).is_valid());
        assert!(!TimeOfDay::new(10, 60).is_valid());
    }
}
