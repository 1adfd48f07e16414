//! Akin Apps
//!
//! Application plugins for the Akin ledger.
//!
//! - [`demo_session`]: N-party confirmation sessions

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod demo_session;

pub use demo_session::{DemoSession, APP_NAME as DEMO_SESSION, DemoSessionState, Session, SessionStatus};
