//
// ui.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The console side of `DebuggerUi`. Unlike RDIP, there is no connect/
// disconnect lifecycle -- stdin is attached for the life of the process,
// so `is_connected` is always true and the engine always blocks on
// suspension. All output funnels through `ConsoleUi::print` so a
// breakpoint notification arriving mid-evaluation can't interleave with
// the repl thread's own prompt.

use std::sync::{Mutex, Weak};

use rdbg_core::{DebuggerUi, Engine};

pub struct ConsoleUi {
    engine: Mutex<Weak<Engine>>,
    out: Mutex<()>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self { engine: Mutex::new(Weak::new()), out: Mutex::new(()) }
    }

    pub(crate) fn engine(&self) -> Option<std::sync::Arc<Engine>> {
        self.engine.lock().unwrap().upgrade()
    }

    pub(crate) fn print(&self, message: &str) {
        let _guard = self.out.lock().unwrap();
        println!("{message}");
    }

    pub(crate) fn prompt(&self) {
        let _guard = self.out.lock().unwrap();
        let state = if self.engine().is_some_and(|e| e.is_stopped()) { "stopped" } else { "running" };
        print!("\nrdbg ({state}): ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl DebuggerUi for ConsoleUi {
    fn is_ide(&self) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn notify_breakpoint_hit(&self, file: &str, line: u32) {
        self.print(&format!("Breakpoint hit at {file}:{line}"));
        self.prompt();
    }

    fn notify_suspended(&self, file: &str, line: u32) {
        self.print(&format!("Stopped at {file}:{line}"));
        self.prompt();
    }

    fn attach(&self, engine: Weak<Engine>) {
        *self.engine.lock().unwrap() = engine;
    }
}
