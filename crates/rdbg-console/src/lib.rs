//
// lib.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The terminal REPL adapter: a second `DebuggerUi` implementation,
// reusing `rdbg_core::Engine` wholesale instead of duplicating its state
// machine for a stdin-driven client. Everything socket-shaped in
// `rdbg_rdip` has a stdin/stdout-shaped counterpart here instead.
//

pub mod command;
pub mod repl;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use rdbg_core::{DebuggerUi, Engine, ScriptRuntime};
use rdbg_util::ResultOrLog;

pub use ui::ConsoleUi;

/// Starts the console adapter: spawns the stdin-reading thread and hands
/// control to `Engine::start`, which -- since `ConsoleUi::is_connected`
/// is always true -- blocks this call until the user's first `c[ont]`.
/// Mirrors `rdbg_rdip::start`'s shape (spawn the UI's own thread first,
/// so it can pick up the engine reference via `attach` before the
/// initial handshake can ever be released).
pub fn start(runtime: Arc<dyn ScriptRuntime>, settings_path: Option<PathBuf>) -> Arc<Engine> {
    let ui = Arc::new(ConsoleUi::new());
    let repl_ui = ui.clone();
    rdbg_util::spawn!("rdbg-console-repl", move || repl::run(repl_ui)).or_log_error("spawning console repl thread");

    Engine::start(runtime, ui as Arc<dyn DebuggerUi>, settings_path, false)
}

/// The platform user-config path for the console's breakpoint settings
/// file. Falls back to the current directory if the platform has no
/// notion of one (unusual, but better than failing startup over it).
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("rdbg").join("breakpoints.xml")
}
