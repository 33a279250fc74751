//! Testing utilities for printer output
//!
//! Provides `CaptureTerminal` for capturing and asserting on what a printer writes.

mod capture;

pub use capture::{CaptureTerminal, TermOp};
