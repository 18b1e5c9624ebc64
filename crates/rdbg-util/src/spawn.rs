//
// spawn.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//

/// Spawns a named OS thread, logging (rather than panicking on) a failure
/// to spawn. Naming background threads makes them identifiable in a
/// debugger or `ps -T`, which matters here more than in most programs: this
/// whole crate exists to be attached to by a debugger.
#[macro_export]
macro_rules! spawn {
    ($name:expr, $f:expr) => {{
        std::thread::Builder::new()
            .name(String::from($name))
            .spawn($f)
    }};
}
