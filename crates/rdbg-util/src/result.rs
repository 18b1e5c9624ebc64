//
// result.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//

/// Extension trait for swallowing an error after logging it.
///
/// Several corners of the debug engine are specified to never propagate a
/// failure to their caller (settings I/O, socket writes after the peer has
/// gone away): this makes that intent explicit at the call site instead of
/// `let _ = ...` or a bare `.ok()`, which reads as "I don't care" rather
/// than "this is allowed to fail, and here's what we do about it".
pub trait ResultOrLog<T> {
    fn or_log_error(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultOrLog<T> for Result<T, E> {
    fn or_log_error(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            },
        }
    }
}
