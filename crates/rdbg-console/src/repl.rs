//
// repl.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The console's own "network thread": reads stdin instead of a socket,
// parses with `command::parse`, and dispatches onto the engine the same
// way `rdbg_rdip::server::dispatch` does. Grounded directly on
// `ConsoleUI::ConsoleThreadFunc`/`EvaluateCommand`: a line-at-a-time
// loop, an explicit `h[elp]` command, and a prompt reprinted immediately
// after commands that don't need a scripting-thread round trip (original:
// `write_prompt` stays true for everything except eval/var).

use std::io::BufRead;
use std::sync::Arc;

use rdbg_core::{Engine, Variable, VariableKind};

use crate::command::{self, Command, HELP_TEXT};
use crate::ui::ConsoleUi;

const CODE_WINDOW_CONTEXT: usize = 5;

pub fn run(ui: Arc<ConsoleUi>) {
    ui.print("SketchUp-style Ruby API Command Line Debugger");
    ui.prompt();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { return };
        let Some(cmd) = command::parse(&line) else {
            ui.prompt();
            continue;
        };
        let Some(engine) = ui.engine() else { return };
        if dispatch(cmd, &engine, &ui) {
            ui.prompt();
        }
    }
}

/// Returns whether the repl thread should print the next prompt itself.
/// Commands dispatched onto the scripting thread (eval, var global/local)
/// print their own prompt from inside the response callback instead.
fn dispatch(cmd: Command, engine: &Arc<Engine>, ui: &Arc<ConsoleUi>) -> bool {
    match cmd {
        Command::AddBreakpoint { file, line } => {
            let index = engine.add_breakpoint(file.clone(), line, String::new(), false);
            ui.print(&format!("Added breakpoint:\n  {index} {file}:{line}"));
            true
        },
        Command::ListBreakpoints => {
            let bps = engine.list_breakpoints();
            if bps.is_empty() {
                ui.print("No breakpoints");
            } else {
                let mut text = String::from("Breakpoints:");
                for bp in bps {
                    text.push_str(&format!("\n  {} {}:{}", bp.index, bp.file, bp.line));
                }
                ui.print(&text);
            }
            true
        },
        Command::DeleteBreakpoint { index: Some(index) } => {
            if !engine.remove_breakpoint(index) {
                ui.print("Cannot remove breakpoint");
            }
            true
        },
        Command::DeleteBreakpoint { index: None } => {
            engine.remove_all_breakpoints();
            true
        },
        Command::Continue => {
            engine.do_continue();
            true
        },
        Command::Step => {
            engine.do_step();
            true
        },
        Command::Help => {
            ui.print(HELP_TEXT);
            true
        },
        Command::Where => {
            print_frames(engine, ui);
            true
        },
        Command::ShiftFrame { up } => {
            engine.shift_active_frame(up);
            print_frames(engine, ui);
            true
        },
        Command::List => {
            print_code_window(engine, ui);
            true
        },
        Command::VarGlobal => {
            let ui = ui.clone();
            engine.variables(VariableKind::Global, move |vars| print_variables_and_prompt(&ui, &vars));
            false
        },
        Command::VarLocal => {
            let ui = ui.clone();
            engine.variables(VariableKind::Local, move |vars| print_variables_and_prompt(&ui, &vars));
            false
        },
        Command::Eval { expr } => {
            let ui = ui.clone();
            engine.evaluate(expr, move |var: Variable| {
                ui.print(&var.value);
                ui.prompt();
            });
            false
        },
    }
}

fn print_frames(engine: &Arc<Engine>, ui: &ConsoleUi) {
    let frames = engine.frames();
    let active = engine.active_frame_index();
    let mut text = String::new();
    for (i, frame) in frames.iter().enumerate() {
        let prefix = if i == active { "--> " } else { "    " };
        text.push_str(&format!("{prefix}#{} {} at {}:{}\n", i + 1, frame.name, frame.file, frame.line));
    }
    ui.print(text.trim_end());
}

fn print_code_window(engine: &Arc<Engine>, ui: &ConsoleUi) {
    let Some((file, line)) = engine.last_break() else {
        ui.print("No current line");
        return;
    };
    let window = engine.code_window(&file, line as usize, CODE_WINDOW_CONTEXT, CODE_WINDOW_CONTEXT);
    let mut text = String::new();
    for (n, source_line) in window {
        let marker = if n == line as usize { "=>" } else { "  " };
        text.push_str(&format!("{marker} {n:4}  {source_line}\n"));
    }
    ui.print(text.trim_end());
}

fn print_variables_and_prompt(ui: &ConsoleUi, vars: &[Variable]) {
    if vars.is_empty() {
        ui.print("(none)");
    } else {
        let mut text = String::new();
        for var in vars {
            text.push_str(&format!("  {} => {}\n", var.name, var.value));
        }
        ui.print(text.trim_end());
    }
    ui.prompt();
}
