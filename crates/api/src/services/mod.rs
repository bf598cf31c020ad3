//! External service integrations.

pub mod hostex;
pub mod odoo;

pub use hostex::HostexClient;
pub use odoo::OdooClient;
