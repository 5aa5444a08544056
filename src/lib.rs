#![doc(test(attr(deny(warnings))))]

//! Finance Core records income and expense transactions and derives balances,
//! rollups, health scores, and projections from them.

pub mod config;
pub mod core;
pub mod errors;
pub mod exchange;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Core tracing initialized.");
    });
}
