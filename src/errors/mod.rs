//! Error type definitions for the playlist toolkit.
//!
//! Only two conditions are terminal for a run: a rules file that cannot be
//! loaded (the merge must not start with a half-built identity map) and a
//! failure to write an output artifact. Everything else (malformed input
//! lines, missing fields, unreachable logo probes) is resolved locally with
//! a fallback and never surfaces as an error.

pub mod types;

pub use types::AppError;
