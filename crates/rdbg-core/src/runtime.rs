//
// runtime.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The boundary between the engine and the scripting runtime it debugs.
// Everything on the other side of `ScriptRuntime` is out of scope here: the
// tracepoint mechanism, the object model, the binding/eval primitives. A
// runtime implementation is expected to install its own fault barrier
// around calls that can raise inside the scripted language (the historical
// precedent is `rb_protect`), since an `Err` crossing this trait is the only
// signal the engine gets that something went wrong.
//
// Values and bindings are passed around as opaque handles rather than boxed
// trait objects: the runtime owns the real representation (an object
// pointer, a GC-rooted id, whatever fits) and is free to map the handle back
// internally however it likes. `object_id` in the wire protocol is simply
// this handle, formatted in hex.

use std::fmt;

pub type ValueHandle = u64;
pub type BindingHandle = u64;

/// The tracepoint event classes the engine subscribes to. `CCall`/`CReturn`
/// are delivered so the engine can keep call depth accurate, but never
/// trigger line processing themselves (there is no source line to stop on
/// inside native code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Line,
    Call,
    CCall,
    BCall,
    ClassOpen,
    Return,
    CReturn,
    BReturn,
    End,
}

#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub kind: EventKind,
    pub path: Option<String>,
    pub line: u32,
}

pub type TraceCallback = Box<dyn Fn(TraceEvent) + Send + Sync>;

/// A single stack frame as the runtime reports it, before the frame facade
/// filters and renumbers it. `path` is `None` when the runtime can't
/// attribute the frame to a source file (the top frame of a console/eval
/// session, typically).
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub name: String,
    pub path: Option<String>,
    pub line: u32,
    pub binding: BindingHandle,
    pub self_value: ValueHandle,
    pub class_name: Option<String>,
}

/// The scripting runtime the engine is attached to.
///
/// Implementations must only be driven from the single scripting thread:
/// the engine never calls these methods from its own network/IO threads
/// directly, only from inside a tracepoint callback or a job handed to
/// [`crate::suspend::SuspensionHandshake::wait`].
pub trait ScriptRuntime: Send + Sync {
    /// Installs `callback` to be invoked for every subscribed event class.
    /// The runtime must invoke it synchronously and on the thread that owns
    /// the interpreter, blocking that thread for as long as the callback
    /// takes to return (the engine relies on this to suspend execution).
    fn install_tracepoints(&self, callback: TraceCallback);

    /// Removes the tracepoint installed by `install_tracepoints`, if any.
    fn remove_tracepoints(&self);

    /// Walks the current call stack, innermost frame first.
    fn stack_frames(&self) -> Vec<RawFrame>;

    /// The binding a freshly-started session should evaluate top-level
    /// expressions in, when no frame is active.
    fn toplevel_binding(&self) -> BindingHandle;

    /// Evaluates `expr` in `binding`. `Err` carries a value handle to
    /// whatever the runtime raised, so it can be displayed the same way any
    /// other value is.
    fn eval(&self, expr: &str, binding: BindingHandle) -> Result<ValueHandle, ValueHandle>;

    /// Evaluates `expr`, which is expected to yield a list of variable
    /// names (this is how `global_variables`/`local_variables` are asked
    /// for). Each name is resolved to a plain string directly, since a
    /// caller never needs anything but the name itself.
    fn eval_names(&self, expr: &str, binding: BindingHandle) -> Result<Vec<String>, ValueHandle>;

    fn instance_variable_names(&self, value: ValueHandle) -> Vec<String>;
    fn instance_variable(&self, value: ValueHandle, name: &str) -> ValueHandle;

    fn is_nil(&self, value: ValueHandle) -> bool;
    fn is_true(&self, value: ValueHandle) -> bool;
    fn is_false(&self, value: ValueHandle) -> bool;

    /// The runtime's own stringification of `value` (its `to_s`
    /// equivalent), with no special-casing of nil/true/false -- the value
    /// bridge in [`crate::bridge`] layers that on top.
    fn raw_to_string(&self, value: ValueHandle) -> String;
    fn class_name(&self, value: ValueHandle) -> String;
    fn ivar_count(&self, value: ValueHandle) -> usize;

    /// All currently loaded source files, as (path, lines). Used to seed
    /// the source table when the engine is responsible for maintaining one
    /// itself (see [`crate::source::SourceTable`]).
    fn loaded_sources(&self) -> Vec<(String, Vec<String>)>;
}

impl fmt::Debug for dyn ScriptRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn ScriptRuntime")
    }
}
