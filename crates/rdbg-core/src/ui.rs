//
// ui.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The engine's view of whatever sits on top of it (RDIP over a socket, a
// console on stdio). The engine only ever needs to know three things about
// its UI: whether there's a live client to notify at all, how to notify it,
// and whether it's the kind of client that already knows full source
// paths (an IDE) or needs the engine's help resolving them (a console).

use std::sync::Weak;

use crate::engine::Engine;

pub trait DebuggerUi: Send + Sync {
    /// Whether this UI represents a client that sends fully-qualified
    /// paths and manages its own persistence (true for a network protocol
    /// client like RDIP). When false, the engine mirrors loaded sources
    /// for path resolution and persists breakpoints to disk itself.
    fn is_ide(&self) -> bool;

    /// Whether a client is currently attached. While false, the engine
    /// never blocks the scripting thread: tracepoints fire for free.
    fn is_connected(&self) -> bool;

    /// A breakpoint was hit and is active (enabled, condition satisfied).
    /// Must not block; the engine suspends separately after calling this.
    fn notify_breakpoint_hit(&self, file: &str, line: u32);

    /// A step/next/finish/pause flag caused an unconditional suspension.
    fn notify_suspended(&self, file: &str, line: u32);

    /// Called once by [`Engine::start`], immediately after the engine is
    /// constructed and before its initial wait-for-client handshake (if
    /// any). A UI that dispatches commands from its own thread back into
    /// the engine (RDIP's network thread, the console's stdin thread)
    /// needs this handle before that initial wait can ever be released --
    /// `Engine::start` itself may not return until a client connects.
    /// UIs that never call back into the engine on their own (none, so
    /// far) can leave this as a no-op.
    fn attach(&self, _engine: Weak<Engine>) {}
}
