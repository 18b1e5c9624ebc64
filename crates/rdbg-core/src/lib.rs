//
// lib.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The debug control engine. Everything in here runs in-process, alongside
// the scripting runtime it is attached to; it has no notion of sockets or
// wire formats, those live in the protocol-adapter crates (rdbg-rdip,
// rdbg-console) that sit on top of `Engine`.
//

pub mod breakpoints;
pub mod bridge;
pub mod engine;
pub mod frames;
pub mod runtime;
pub mod settings;
pub mod source;
pub mod suspend;
pub mod trace;
pub mod ui;
pub mod variable;

pub use breakpoints::{Breakpoint, BreakpointStore};
pub use engine::Engine;
pub use runtime::{BindingHandle, EventKind, RawFrame, ScriptRuntime, TraceCallback, TraceEvent, ValueHandle};
pub use source::SourceTable;
pub use ui::DebuggerUi;
pub use variable::{Variable, VariableKind};
