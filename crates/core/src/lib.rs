//! Domain logic for the onboarding and authentication platform.
//!
//! Everything in this crate is pure: no I/O, no database, no clocks other
//! than timestamps passed in by callers. The api crate wires these types
//! to HTTP, and the db crate persists them.

pub mod credentials;
pub mod error;
pub mod otp;
pub mod recorder;
pub mod steps;
pub mod types;
pub mod wizard;

pub use error::CoreError;
