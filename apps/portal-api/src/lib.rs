//! SOW approval portal API.
//!
//! Thin HTTP layer over the [`sow_crm`] client stack: homeowners verify a
//! token + PIN, view their scope of work, and approve or reject it; the CRM
//! deal record is the source of truth throughout.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
