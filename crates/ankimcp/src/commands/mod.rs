//! Command handlers for the ankimcp CLI.

mod check;
mod serve;

pub use check::check;
pub use serve::serve;
