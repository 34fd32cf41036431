//! Payment: checkout session creation for the drop-in widget.
//!
//! DESIGN
//! ======
//! The provider credentials live in a hosted backend function; this service
//! only asks it for a session and hands the session to the browser widget.
//! Authorization itself happens between the widget and the provider, which
//! reports back a result code that the booking wizard interprets.

pub mod client;
pub mod types;

pub use types::{
    Amount, PaymentGateway, PaymentMethod, PaymentOutcome, PaymentSession, PaymentSessionRequest, ResultCode,
    SessionMetadata,
};
