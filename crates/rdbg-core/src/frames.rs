//
// frames.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The captured call stack for the current suspension, plus which frame is
// "active" (the one `eval`/`var local` operate against, and the one
// `where`/`frame` report as current). Two frame kinds are dropped on
// capture: a frame with no source path at all (the top of a console/eval
// session) and the synthetic top-level frame some runtimes report with the
// literal name "<main>", neither of which is useful to show a user.

use crate::runtime::{BindingHandle, RawFrame, ValueHandle};

#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub binding: BindingHandle,
    pub self_value: ValueHandle,
    pub class_name: Option<String>,
}

#[derive(Default)]
pub struct FrameFacade {
    frames: Vec<Frame>,
    active: usize,
}

impl FrameFacade {
    pub fn capture(raw: Vec<RawFrame>) -> Self {
        let frames = raw
            .into_iter()
            .filter_map(|f| {
                let file = f.path?;
                if file == "<main>" {
                    return None;
                }
                Some(Frame {
                    name: f.name,
                    file,
                    line: f.line,
                    binding: f.binding,
                    self_value: f.self_value,
                    class_name: f.class_name,
                })
            })
            .collect();
        Self { frames, active: 0 }
    }

    pub fn list(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Sets the active frame, 0-based, clamped to the valid range.
    pub fn set_active(&mut self, index: usize) {
        if self.frames.is_empty() {
            self.active = 0;
            return;
        }
        self.active = index.min(self.frames.len() - 1);
    }

    /// Moves the active frame up (towards the caller) or down (towards the
    /// callee), clamped at either end.
    pub fn shift_active(&mut self, up: bool) {
        if self.frames.is_empty() {
            return;
        }
        if up {
            self.active = (self.active + 1).min(self.frames.len() - 1);
        } else {
            self.active = self.active.saturating_sub(1);
        }
    }

    pub fn active_frame(&self) -> Option<&Frame> {
        self.frames.get(self.active)
    }

    pub fn active_binding(&self) -> Option<BindingHandle> {
        self.active_frame().map(|f| f.binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, path: Option<&str>, line: u32) -> RawFrame {
        RawFrame {
            name: name.to_string(),
            path: path.map(str::to_string),
            line,
            binding: 1,
            self_value: 1,
            class_name: None,
        }
    }

    #[test]
    fn drops_frames_with_no_path_and_the_synthetic_main_frame() {
        let facade = FrameFacade::capture(vec![
            raw("block", None, 1),
            raw("<main>", Some("<main>"), 1),
            raw("run", Some("a.rb"), 5),
        ]);
        assert_eq!(facade.len(), 1);
        assert_eq!(facade.list()[0].file, "a.rb");
    }

    #[test]
    fn set_active_clamps_to_valid_range() {
        let mut facade = FrameFacade::capture(vec![raw("a", Some("a.rb"), 1), raw("b", Some("a.rb"), 2)]);
        facade.set_active(50);
        assert_eq!(facade.active(), 1);
    }

    #[test]
    fn shift_active_clamps_at_either_end() {
        let mut facade = FrameFacade::capture(vec![raw("a", Some("a.rb"), 1), raw("b", Some("a.rb"), 2)]);
        facade.shift_active(false);
        assert_eq!(facade.active(), 0);
        facade.shift_active(true);
        facade.shift_active(true);
        assert_eq!(facade.active(), 1);
    }
}
