//
// trace.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The trace state machine: turns a stream of tracepoint events into a
// decision about whether the current line warrants suspending. It knows
// nothing about breakpoints, sockets, or the runtime -- just call depth and
// the handful of step flags a command like `next`/`finish` arms.
//
// Step targets are modeled as `Option<u64>` rather than the sentinel
// "depth -1 means unarmed" the original debugger used: there is no depth
// that can't legitimately occur, so a sentinel value risks colliding with
// a real one, and `Option` says "unarmed" without borrowing a magic number.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// A C call/return; there is no source line here, do nothing.
    Skip,
    /// A step/next/pause flag was set; suspend unconditionally.
    Unconditional,
    /// Nothing forced a stop; consult the breakpoint store.
    CheckBreakpoint,
}

#[derive(Debug)]
pub struct TraceState {
    call_depth: u64,
    break_at_next_line: bool,
    stepover_target_depth: Option<u64>,
    stepout_target_depth: Option<u64>,
    stepout_break_at_next_line: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceState {
    pub fn new() -> Self {
        Self {
            call_depth: 0,
            break_at_next_line: false,
            stepover_target_depth: None,
            stepout_target_depth: None,
            stepout_break_at_next_line: false,
        }
    }

    pub fn call_depth(&self) -> u64 {
        self.call_depth
    }

    /// `step`: break at the very next line, at any depth.
    pub fn arm_step(&mut self) {
        self.break_at_next_line = true;
    }

    /// `next`: break at the next line that is at or above the current
    /// depth (i.e. don't stop inside a call made from this line).
    pub fn arm_next(&mut self) {
        self.stepover_target_depth = Some(self.call_depth);
    }

    /// `finish`: break once the current frame returns. A no-op at the
    /// outermost frame, since there is nothing to return out of.
    pub fn arm_finish(&mut self) -> bool {
        if self.call_depth > 1 {
            self.stepout_target_depth = Some(self.call_depth - 1);
            true
        } else {
            false
        }
    }

    /// `pause`: break at the next line, but only if not already stopped
    /// (issuing it while stopped would arm a flag nothing will ever clear).
    pub fn arm_pause(&mut self, is_stopped: bool) {
        if !is_stopped {
            self.break_at_next_line = true;
        }
    }

    pub fn on_call(&mut self, is_c_call: bool) -> LineAction {
        self.call_depth += 1;
        if is_c_call {
            LineAction::Skip
        } else {
            self.process_line()
        }
    }

    pub fn on_return(&mut self, is_c_return: bool) -> LineAction {
        let action = if is_c_return { LineAction::Skip } else { self.process_line() };
        self.call_depth = self.call_depth.saturating_sub(1);
        if self.stepout_target_depth == Some(self.call_depth) {
            self.clear_flags();
            self.stepout_break_at_next_line = true;
        }
        action
    }

    pub fn on_line(&mut self) -> LineAction {
        if self.call_depth == 0 {
            self.call_depth = 1;
        }
        self.process_line()
    }

    fn process_line(&mut self) -> LineAction {
        if self.should_break() {
            self.clear_flags();
            LineAction::Unconditional
        } else {
            LineAction::CheckBreakpoint
        }
    }

    fn should_break(&self) -> bool {
        self.break_at_next_line
            || self.stepover_target_depth.is_some_and(|d| d >= self.call_depth)
            || self.stepout_break_at_next_line
    }

    fn clear_flags(&mut self) {
        self.break_at_next_line = false;
        self.stepover_target_depth = None;
        self.stepout_target_depth = None;
        self.stepout_break_at_next_line = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_breaks_on_the_very_next_line() {
        let mut t = TraceState::new();
        t.on_line();
        t.arm_step();
        assert_eq!(t.on_line(), LineAction::Unconditional);
    }

    #[test]
    fn next_does_not_break_inside_a_deeper_call() {
        let mut t = TraceState::new();
        t.on_line();
        t.arm_next();
        assert_eq!(t.on_call(false), LineAction::CheckBreakpoint);
        assert_eq!(t.on_line(), LineAction::CheckBreakpoint);
        assert_eq!(t.on_return(false), LineAction::CheckBreakpoint);
        assert_eq!(t.on_line(), LineAction::Unconditional);
    }

    #[test]
    fn finish_breaks_when_the_frame_returns() {
        let mut t = TraceState::new();
        t.on_line();
        t.on_call(false);
        t.on_line();
        assert!(t.arm_finish());
        assert_eq!(t.on_return(false), LineAction::CheckBreakpoint);
        assert_eq!(t.on_line(), LineAction::Unconditional);
    }

    #[test]
    fn finish_at_outermost_frame_is_a_no_op() {
        let mut t = TraceState::new();
        t.on_line();
        assert!(!t.arm_finish());
    }

    #[test]
    fn c_calls_and_c_returns_never_trigger_a_break() {
        let mut t = TraceState::new();
        t.on_line();
        t.arm_step();
        assert_eq!(t.on_call(true), LineAction::Skip);
        assert_eq!(t.on_return(true), LineAction::Skip);
    }

    #[test]
    fn pause_is_ignored_while_already_stopped() {
        let mut t = TraceState::new();
        t.arm_pause(true);
        assert_eq!(t.on_line(), LineAction::CheckBreakpoint);
    }
}
