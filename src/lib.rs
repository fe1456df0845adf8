pub mod config;
pub mod probe;
pub mod runner;

pub use config::{RunConfig, Target};
pub use probe::{Probe, ProbeContext, ProbeError};
pub use runner::{ProbeReport, Summary, run_suite};
