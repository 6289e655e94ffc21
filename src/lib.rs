//! # Sonargate-RS: Quality Gate Step for CI Pipelines
//!
//! Decides whether a code-quality analysis passed its quality gate on a
//! SonarQube-compatible server, and publishes the result as a JUnit report.
//!
//! - **Locate**: the scanner's task descriptor, an explicit task id, a branch or
//!   pull request, or the project's latest analysis
//! - **Wait**: bounded polling of the server-side analysis task
//! - **Fetch**: the quality gate verdict with all its conditions
//! - **Report**: JUnit XML plus summary counts for later pipeline steps
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CLI (sonargate)                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core            │  Client              │  I/O               │
//! │ • Config         │ • Transport (HTTP)   │ • Scan descriptor  │
//! │ • Model          │ • Auth negotiation   │ • JUnit report     │
//! │ • Pipeline       │ • Locator / status   │ • Summary          │
//! │ • Errors         │ • Verdict fetcher    │                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sonargate_rs::{GateConfig, GateRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = GateConfig::default();
//!     config.server.host = "https://sonar.example.com".to_string();
//!     config.server.token = Some("squ_...".to_string());
//!     config.project.key = "my-project".to_string();
//!
//!     let runner = GateRunner::new(config)?;
//!     let outcome = runner.run().await?;
//!     println!("Quality gate: {}", outcome.decision.label());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Configuration, domain model and orchestration
pub mod core {
    //! Configuration, domain types, errors and the gate pipeline.

    pub mod config;
    pub mod errors;
    pub mod model;
    pub mod pipeline;
}

// Web API access
pub mod client;

// Descriptor input and report output
pub mod io {
    //! Scanner descriptor parsing and report generation.

    pub mod descriptor;
    pub mod reports;
}

// Re-export primary types for convenience
pub use core::config::GateConfig;
pub use core::errors::{ErrorKind, Result, ResultExt, SonarGateError};
pub use core::model::{
    AnalysisTaskRef, QualityCondition, QualityVerdict, ScanTarget, TaskDetails, TaskStatus,
};
pub use core::pipeline::{GateDecision, GateOutcome, GateRunner};
pub use io::reports::{build_report, Report, SummaryRecord};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
