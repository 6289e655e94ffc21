//! Gate Pipeline Module
//!
//! Orchestrates a single quality gate run:
//!
//! 1. **Locate**: read the scanner descriptor, or find the task on the server
//! 2. **Wait**: poll a compute engine task until it finishes (bounded)
//! 3. **Fetch**: read the quality gate verdict
//! 4. **Report**: build and write the JUnit document and summary
//!
//! ## Usage
//!
//! ```ignore
//! use sonargate_rs::core::pipeline::GateRunner;
//!
//! let runner = GateRunner::new(config)?;
//! let outcome = runner.run().await?;
//! std::process::exit(outcome.exit_code(&runner.config().gate));
//! ```

mod outcome;
mod runner;
mod waiter;

pub use outcome::{GateDecision, GateOutcome};
pub use runner::{GateRunner, ProgressCallback, ResolvedTask};
pub use waiter::{TaskWaiter, MIN_POLL_INTERVAL};
