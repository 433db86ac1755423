//! NAU88C22 audio codec driver.
//!
//! # Feature gate
//!
//! This module is available when the `nau88c22` feature is enabled (on by default).

pub(crate) mod registers;
mod nau88c22;

pub use nau88c22::{CodecError, EqBand, EqCutoff, EqPath, EqWidth, Nau88c22};
