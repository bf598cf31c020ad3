//! Background jobs.

pub mod loyalty_sync;
pub mod scheduler;
pub mod voucher_cleanup;

pub use loyalty_sync::LoyaltySyncJob;
pub use scheduler::{Job, JobScheduler, Schedule};
pub use voucher_cleanup::VoucherCleanupJob;
