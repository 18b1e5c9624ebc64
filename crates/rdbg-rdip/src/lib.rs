//
// lib.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The RDIP (ruby-debug-ide) wire protocol adapter: a TCP server that
// accepts one client at a time, speaks the line-delimited command/response
// grammar in `command`/`xml`, and drives an `rdbg_core::Engine` from its
// own network thread.
//

pub mod command;
pub mod server;
pub mod xml;

pub use server::{start, RdipUi};
