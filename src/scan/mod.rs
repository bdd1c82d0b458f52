//! Search orchestration
//!
//! Fans one query out to every configured engine, resolves and classifies
//! what comes back, and fans the results in again. See [`Scanner`].

mod scanner;
mod settings;
mod worker;

pub use scanner::{QueryOutcome, ScanOutcome, Scanner};
pub use settings::ScanSettings;
pub use worker::{WorkerError, WorkerFailure};
