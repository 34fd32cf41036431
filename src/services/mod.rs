//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and calls to the data store and
//! payment service so route handlers can stay focused on request parsing,
//! patient identity, and status mapping.

pub mod booking;
pub mod diagnostics;
pub mod history;
pub mod profile;
pub mod rating;
pub mod session;
pub mod sweeper;
pub mod wizard;
