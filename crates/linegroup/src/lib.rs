#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod compose; // Steps, groups, arrays, dir/table/trace
pub mod config; // RenderSettings and SettingsPatch
pub mod console; // Console adapter trait
pub mod detection; // Human/agent context
pub mod error; // Error type and ErrorBoundary
pub mod format; // Line formatter and wrapping
pub mod glyph; // Glyphs and the tree-glyph resolver
pub mod group; // Group stack
pub mod logging; // log/tracing routing (TreeLogger, TreeLayer)
pub mod printer; // Print orchestrator
mod spinner; // Spinner engine
pub mod state; // Render state
pub mod style; // Color application
pub mod terminal; // Terminal I/O
pub mod testing; // Test utilities

pub use compose::GroupScope;
pub use config::{RenderSettings, SPINNERS, SettingsPatch};
pub use console::Console;
pub use detection::{DisplayContext, is_agent_context, should_enable_color};
pub use error::{Error, ErrorBoundary, Result};
pub use glyph::{Context, Glyph, GlyphRole};
pub use printer::{Plain, Printer, init_printer, printer};
pub use state::{LogKind, StateSnapshot, Transition};
pub use terminal::{StdTerminal, Terminal};
