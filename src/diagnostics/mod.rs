//! Diagnostics extraction: argument normalization, the runner boundary and
//! the compact rendering handed back to the model.

pub mod adapter;
pub mod normalize;
pub mod render;
pub mod report;
pub mod runner;

pub use adapter::{AdapterError, ToolAdapter, ToolOutput};
pub use normalize::{DEFAULT_SEVERITY, NormalizedQuery, Severity};
pub use runner::{
    DiagnosticKind, DotnetFormatRunner, Finding, RunRequest, Runner, RunnerError, RunnerResult,
};
