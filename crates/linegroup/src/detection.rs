//! Display context detection
//!
//! Decides whether output is watched by a person (colors and animation) or
//! consumed by another program or a CI log (plain, no in-place redraws).

use console::Term;

/// Display context representing the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayContext {
    /// Agent context - plain output, pending lines printed once when final
    Agent,
    /// Human context - colored output with spinner animation
    #[default]
    Human,
}

impl DisplayContext {
    /// Create an agent (plain output) context
    #[must_use]
    pub fn new_agent() -> Self {
        Self::Agent
    }

    /// Create a human (decorated output) context
    #[must_use]
    pub fn new_human() -> Self {
        Self::Human
    }

    /// Auto-detect the display context from environment
    #[must_use]
    pub fn detect() -> Self {
        if should_enable_color() {
            Self::Human
        } else {
            Self::Agent
        }
    }

    #[must_use]
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }

    #[must_use]
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent)
    }
}

/// Determine if we're running in an agent context
#[must_use]
pub fn is_agent_context() -> bool {
    // Generic agent indicators
    std::env::var("CI").is_ok()
        || std::env::var("AGENT_MODE").is_ok()
        // Explicit disable
        || std::env::var("LINEGROUP_PLAIN").is_ok()
        || std::env::var("NO_COLOR").is_ok()
}

/// Determine if colors and animation should be enabled
#[must_use]
pub fn should_enable_color() -> bool {
    // Explicit enable always wins
    if std::env::var("LINEGROUP_FORCE_COLOR").is_ok() {
        return true;
    }

    if is_agent_context() {
        return false;
    }

    // Cursor movement only makes sense on a real terminal
    Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_context_new_agent() {
        let ctx = DisplayContext::new_agent();
        assert!(ctx.is_agent());
        assert!(!ctx.is_human());
    }

    #[test]
    fn test_display_context_new_human() {
        let ctx = DisplayContext::new_human();
        assert!(ctx.is_human());
        assert!(!ctx.is_agent());
    }

    #[test]
    fn test_display_context_default_is_human() {
        assert!(DisplayContext::default().is_human());
    }

    #[test]
    fn test_detect_matches_should_enable_color() {
        assert_eq!(DisplayContext::detect().is_human(), should_enable_color());
    }
}
