// Error things.
pub use miette::{Context, IntoDiagnostic};

// Aliases.

/// The standard result for this application.
pub type AppResult<T = ()> = miette::Result<T>;
