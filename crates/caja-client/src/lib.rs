//! Cash ledger for an event business: movements in two currencies, an
//! exchange-rate history and the aggregations behind the summary and
//! report views, persisted in a local SQLite file.

pub mod commands;
pub mod contracts;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod setup;
pub mod state;
mod store;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
