//! Shared macros for the easyscan crates.
//!
//! - [`declare_error_type!`] builds a diagnostic enum over a set of error structs.
//! - The assertion macros in [`assertions`] are only available with the `assertion-macros`
//!   feature, which the other crates enable for their tests.

#[cfg(feature = "assertion-macros")]
pub mod assertions;
pub mod error;
