//! Creates booking vouchers from CRM loyalty cards.

use std::sync::Arc;

use domain::models::PropertyCatalog;
use domain::services::{sync_loyalty_vouchers, LoyaltySource, VoucherSource};

use super::scheduler::Job;
use crate::middleware::metrics::record_sync;

pub struct LoyaltySyncJob {
    catalog: Arc<PropertyCatalog>,
    loyalty: Arc<dyn LoyaltySource>,
    vouchers: Arc<dyn VoucherSource>,
}

impl LoyaltySyncJob {
    pub fn new(
        catalog: Arc<PropertyCatalog>,
        loyalty: Arc<dyn LoyaltySource>,
        vouchers: Arc<dyn VoucherSource>,
    ) -> Self {
        Self {
            catalog,
            loyalty,
            vouchers,
        }
    }
}

#[async_trait::async_trait]
impl Job for LoyaltySyncJob {
    fn name(&self) -> &'static str {
        "loyalty_sync"
    }

    async fn execute(&self) -> Result<(), String> {
        let report = sync_loyalty_vouchers(
            &self.catalog,
            self.loyalty.as_ref(),
            self.vouchers.as_ref(),
        )
        .await
        .map_err(|e| format!("Failed to fetch loyalty cards: {}", e))?;
        record_sync(&report);

        if report.errors > 0 {
            return Err(format!("{} voucher creations failed", report.errors));
        }
        Ok(())
    }
}
