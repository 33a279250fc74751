//! Stack of open print groups.

use crate::state::RenderState;

/// State saved when a group opens and restored when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFrame {
    pub line_no: usize,
    pub prefix: String,
    pub depth: usize,
}

/// One frame per open group; its length always equals the nesting depth.
#[derive(Debug, Default)]
pub struct GroupStack {
    frames: Vec<GroupFrame>,
}

impl GroupStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Save the group counter, prefix and depth, then enter a new level.
    pub fn open(&mut self, state: &mut RenderState) {
        self.frames.push(GroupFrame {
            line_no: state.group_line_no,
            prefix: state.group_prefix.clone(),
            depth: state.depth,
        });
        state.group_line_no = 0;
        state.depth += 1;
    }

    /// Restore the most recently saved frame. Does nothing when no group is open.
    pub fn close(&mut self, state: &mut RenderState) {
        if let Some(frame) = self.frames.pop() {
            state.group_line_no = frame.line_no;
            state.group_prefix = frame.prefix;
            state.depth = frame.depth;
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost open group.
    pub fn top(&self) -> Option<&GroupFrame> {
        self.frames.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_resets_group_counter() {
        let mut state = RenderState::new();
        let mut stack = GroupStack::new();
        state.group_line_no = 4;

        stack.open(&mut state);
        assert_eq!(state.depth(), 1);
        assert_eq!(state.group_line_no(), 0);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top().map(|f| f.line_no), Some(4));
    }

    #[test]
    fn test_open_close_is_identity() {
        let mut state = RenderState::new();
        let mut stack = GroupStack::new();
        state.depth = 0;
        state.group_line_no = 0;
        state.group_prefix = "➤".to_string();

        stack.open(&mut state);
        state.group_prefix = "*".to_string();
        state.group_line_no = 3;
        stack.close(&mut state);

        assert_eq!(state.depth(), 0);
        assert_eq!(state.group_line_no(), 0);
        assert_eq!(state.group_prefix(), "➤");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_nested_round_trip() {
        let mut state = RenderState::new();
        let mut stack = GroupStack::new();

        stack.open(&mut state);
        state.group_line_no = 2;
        stack.open(&mut state);
        state.group_line_no = 5;
        assert_eq!(state.depth(), 2);

        stack.close(&mut state);
        assert_eq!(state.depth(), 1);
        assert_eq!(state.group_line_no(), 2);
        stack.close(&mut state);
        assert_eq!(state.depth(), 0);
        assert_eq!(stack.depth(), state.depth());
    }

    #[test]
    fn test_close_on_empty_stack_is_noop() {
        let mut state = RenderState::new();
        let mut stack = GroupStack::new();
        state.line_no = 9;
        state.group_line_no = 1;

        stack.close(&mut state);
        assert_eq!(state.line_no(), 9);
        assert_eq!(state.group_line_no(), 1);
        assert_eq!(state.depth(), 0);
    }
}
