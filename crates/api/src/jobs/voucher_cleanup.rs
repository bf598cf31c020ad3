//! Removes vouchers whose code is not on the owning property's greenlist.

use std::sync::Arc;

use domain::models::PropertyCatalog;
use domain::services::{cleanup_vouchers, CleanupOptions, VoucherSource};

use super::scheduler::Job;
use crate::middleware::metrics::record_cleanup;

pub struct VoucherCleanupJob {
    catalog: Arc<PropertyCatalog>,
    vouchers: Arc<dyn VoucherSource>,
    options: CleanupOptions,
}

impl VoucherCleanupJob {
    pub fn new(
        catalog: Arc<PropertyCatalog>,
        vouchers: Arc<dyn VoucherSource>,
        options: CleanupOptions,
    ) -> Self {
        Self {
            catalog,
            vouchers,
            options,
        }
    }
}

#[async_trait::async_trait]
impl Job for VoucherCleanupJob {
    fn name(&self) -> &'static str {
        "voucher_cleanup"
    }

    async fn execute(&self) -> Result<(), String> {
        let report = cleanup_vouchers(&self.catalog, self.vouchers.as_ref(), &self.options).await;
        record_cleanup(&report);

        if report.errors > 0 {
            return Err(format!("{} voucher operations failed", report.errors));
        }
        Ok(())
    }
}
