//! Technical Debt Agent: exposes `dotnet format` diagnostics to a language
//! model as tools and renders the findings as compact grouped text.

pub mod agent;
pub mod app;
pub mod cli;
pub mod constants;
pub mod diagnostics;
pub mod logging;
pub mod prompt;
pub mod tools;
