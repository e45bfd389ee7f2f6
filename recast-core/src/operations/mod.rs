//! High-level operations that correspond to CLI commands
//!
//! These modules contain the core business logic for each recast operation,
//! separated from CLI concerns like argument parsing and output formatting.

pub mod apply;
pub mod generate;
pub mod units;

// Re-export the main operation functions for easy access
pub use apply::apply_operation;
pub use generate::generate_operation;
pub use units::units_operation;
