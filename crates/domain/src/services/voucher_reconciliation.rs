//! Voucher reconciliation jobs.
//!
//! Two idempotent maintenance passes over every configured property:
//! - cleanup: delete vouchers whose code is not on the property's greenlist
//! - loyalty sync: create one voucher per CRM loyalty card not yet present
//!
//! Each pass returns an explicit report; failures on single vouchers or
//! cards are counted and logged without stopping the pass.

use std::collections::HashSet;
use std::ops::Add;

use tracing::{info, warn};

use super::sources::{LoyaltySource, SourceError, VoucherSource};
use crate::models::voucher::normalize_code;
use crate::models::{LoyaltyCard, LoyaltyQuery, NewVoucher, PropertyCatalog, Voucher, VoucherQuery};
use shared::money::round_half_up;

/// Upper bound on vouchers listed per account.
pub const VOUCHER_FETCH_LIMIT: u32 = 1000;

/// Stay period applied to every voucher created from a loyalty card.
pub const LOYALTY_STAY_PERIOD: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Delete every voucher of a property whose greenlist is empty.
    ///
    /// Off by default: an empty greenlist then leaves the property untouched.
    pub purge_on_empty_greenlist: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub properties_processed: u32,
    pub properties_skipped: u32,
    pub vouchers_checked: u32,
    pub vouchers_kept: u32,
    pub vouchers_deleted: u32,
    pub errors: u32,
}

impl Add for CleanupReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            properties_processed: self.properties_processed + other.properties_processed,
            properties_skipped: self.properties_skipped + other.properties_skipped,
            vouchers_checked: self.vouchers_checked + other.vouchers_checked,
            vouchers_kept: self.vouchers_kept + other.vouchers_kept,
            vouchers_deleted: self.vouchers_deleted + other.vouchers_deleted,
            errors: self.errors + other.errors,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub properties_processed: u32,
    pub properties_skipped: u32,
    pub cards_checked: u32,
    pub cards_skipped: u32,
    pub vouchers_created: u32,
    pub errors: u32,
}

impl Add for SyncReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            properties_processed: self.properties_processed + other.properties_processed,
            properties_skipped: self.properties_skipped + other.properties_skipped,
            cards_checked: self.cards_checked + other.cards_checked,
            cards_skipped: self.cards_skipped + other.cards_skipped,
            vouchers_created: self.vouchers_created + other.vouchers_created,
            errors: self.errors + other.errors,
        }
    }
}

async fn list_vouchers(
    vouchers: &dyn VoucherSource,
    thirdparty_account_id: i64,
) -> Result<Vec<Voucher>, SourceError> {
    vouchers
        .get_vouchers(&VoucherQuery {
            thirdparty_account_id,
            page: 1,
            page_size: VOUCHER_FETCH_LIMIT,
        })
        .await
}

// ============================================================================
// Cleanup
// ============================================================================

async fn cleanup_property(
    catalog: &PropertyCatalog,
    vouchers: &dyn VoucherSource,
    options: &CleanupOptions,
    property_id: i64,
) -> CleanupReport {
    let skipped = CleanupReport {
        properties_skipped: 1,
        ..Default::default()
    };

    let Some(account_id) = catalog.thirdparty_account_id(property_id) else {
        info!(property_id, "No thirdparty account configured, skipping voucher cleanup");
        return skipped;
    };

    let greenlist = catalog.greenlist_set(property_id);
    if greenlist.is_empty() {
        if !options.purge_on_empty_greenlist {
            warn!(
                property_id,
                thirdparty_account_id = account_id,
                "Greenlist is empty and purging is disabled, skipping voucher cleanup"
            );
            return skipped;
        }
        warn!(
            property_id,
            thirdparty_account_id = account_id,
            "Greenlist is empty, ALL vouchers of this property will be deleted"
        );
    }

    let existing = match list_vouchers(vouchers, account_id).await {
        Ok(existing) => existing,
        Err(e) => {
            warn!(property_id, error = %e, "Failed to list vouchers");
            return CleanupReport {
                properties_processed: 1,
                errors: 1,
                ..Default::default()
            };
        }
    };

    let mut report = CleanupReport {
        properties_processed: 1,
        ..Default::default()
    };

    for voucher in existing {
        report.vouchers_checked += 1;
        if greenlist.contains(&voucher.normalized_code()) {
            report.vouchers_kept += 1;
            continue;
        }

        match vouchers.delete_voucher(account_id, voucher.id).await {
            Ok(()) => {
                info!(
                    property_id,
                    voucher_id = voucher.id,
                    code = %voucher.code,
                    "Deleted voucher not on greenlist"
                );
                report.vouchers_deleted += 1;
            }
            Err(e) => {
                warn!(
                    property_id,
                    voucher_id = voucher.id,
                    code = %voucher.code,
                    error = %e,
                    "Failed to delete voucher"
                );
                report.errors += 1;
            }
        }
    }

    report
}

/// Deletes every voucher whose code is not on its property's greenlist.
pub async fn cleanup_vouchers(
    catalog: &PropertyCatalog,
    vouchers: &dyn VoucherSource,
    options: &CleanupOptions,
) -> CleanupReport {
    if catalog.is_empty() {
        info!("No properties configured, nothing to clean up");
        return CleanupReport::default();
    }

    let mut report = CleanupReport::default();
    for property_id in catalog.property_ids() {
        report = report + cleanup_property(catalog, vouchers, options, property_id).await;
    }

    info!(
        processed = report.properties_processed,
        skipped = report.properties_skipped,
        checked = report.vouchers_checked,
        deleted = report.vouchers_deleted,
        errors = report.errors,
        "Voucher cleanup finished"
    );
    report
}

// ============================================================================
// Loyalty sync
// ============================================================================

enum CardDecision {
    Create(NewVoucher),
    Skip(&'static str),
}

fn decide(
    card: &LoyaltyCard,
    existing: &HashSet<String>,
    catalog: &PropertyCatalog,
    property_id: i64,
    account_id: i64,
) -> CardDecision {
    let Some(code) = card.usable_code() else {
        return CardDecision::Skip("card has no code");
    };
    let points = match card.points {
        Some(points) if points > 0.0 => points,
        _ => return CardDecision::Skip("card has no positive points balance"),
    };

    let code = normalize_code(code);
    if existing.contains(&code) {
        return CardDecision::Skip("voucher already exists");
    }

    let conversion = catalog.loyalty_voucher_config(property_id);
    CardDecision::Create(NewVoucher {
        thirdparty_account_id: account_id,
        code,
        discount: round_half_up(points),
        discount_type: conversion.discount_type,
        minimum_nights: conversion.minimum_nights,
        redemption_count: conversion.redemption_count,
        earliest_check_in_date: None,
        latest_check_in_date: None,
        stay_period: LOYALTY_STAY_PERIOD,
        expires_at: card.expiration_date,
    })
}

async fn sync_property(
    catalog: &PropertyCatalog,
    vouchers: &dyn VoucherSource,
    cards: &[LoyaltyCard],
    property_id: i64,
) -> SyncReport {
    let Some(account_id) = catalog.thirdparty_account_id(property_id) else {
        info!(property_id, "No thirdparty account configured, skipping loyalty sync");
        return SyncReport {
            properties_skipped: 1,
            ..Default::default()
        };
    };

    let mut existing: HashSet<String> = match list_vouchers(vouchers, account_id).await {
        Ok(list) => list.iter().map(Voucher::normalized_code).collect(),
        Err(e) => {
            warn!(property_id, error = %e, "Failed to list existing vouchers");
            return SyncReport {
                properties_processed: 1,
                errors: 1,
                ..Default::default()
            };
        }
    };

    let mut report = SyncReport {
        properties_processed: 1,
        ..Default::default()
    };

    for card in cards {
        report.cards_checked += 1;

        let new_voucher = match decide(card, &existing, catalog, property_id, account_id) {
            CardDecision::Create(v) => v,
            CardDecision::Skip(reason) => {
                tracing::debug!(property_id, card_id = card.id, reason, "Skipping loyalty card");
                report.cards_skipped += 1;
                continue;
            }
        };

        match vouchers.create_voucher(&new_voucher).await {
            Ok(voucher_id) => {
                info!(
                    property_id,
                    card_id = card.id,
                    voucher_id,
                    code = %new_voucher.code,
                    discount = new_voucher.discount,
                    "Created voucher from loyalty card"
                );
                existing.insert(new_voucher.code);
                report.vouchers_created += 1;
            }
            Err(e) => {
                warn!(
                    property_id,
                    card_id = card.id,
                    code = %new_voucher.code,
                    error = %e,
                    "Failed to create voucher from loyalty card"
                );
                report.errors += 1;
            }
        }
    }

    report
}

/// Creates a voucher for every loyalty card that has a code and a positive
/// balance, on every property with a thirdparty account.
///
/// Fails only when the loyalty cards themselves cannot be fetched.
pub async fn sync_loyalty_vouchers(
    catalog: &PropertyCatalog,
    loyalty: &dyn LoyaltySource,
    vouchers: &dyn VoucherSource,
) -> Result<SyncReport, SourceError> {
    if catalog.is_empty() {
        info!("No properties configured, nothing to sync");
        return Ok(SyncReport::default());
    }

    let cards = loyalty.get_loyalty_cards(&LoyaltyQuery::all_cards()).await?;
    if cards.is_empty() {
        info!("No loyalty cards found, nothing to sync");
        return Ok(SyncReport::default());
    }
    info!(cards = cards.len(), "Fetched loyalty cards");

    let mut report = SyncReport::default();
    for property_id in catalog.property_ids() {
        report = report + sync_property(catalog, vouchers, &cards, property_id).await;
    }

    info!(
        processed = report.properties_processed,
        skipped = report.properties_skipped,
        created = report.vouchers_created,
        cards_skipped = report.cards_skipped,
        errors = report.errors,
        "Loyalty voucher sync finished"
    );
    Ok(report)
}
