//
// demo.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// A tiny synthetic "script" that drives `ScriptedRuntime` the way a real
// interpreter would drive the engine's tracepoints, so that whichever
// adapter `main` started has something live to attach to. It has no
// purpose beyond exercising the engine end to end; it is not part of
// what the engine itself specifies.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rdbg_core::EventKind;
use rdbg_testkit::ScriptedRuntime;

const SOURCE_PATH: &str = "demo.rb";
const SOURCE: &[&str] = &[
    "def greet(name)",          // 1
    "  message = \"hello, \" + name", // 2
    "  puts message",           // 3
    "end",                      // 4
    "",                         // 5
    "count = 0",                // 6
    "loop do",                  // 7
    "  count += 1",             // 8
    "  greet(\"world #{count}\")", // 9
    "end",                      // 10
];

const TOPLEVEL_BINDING: u64 = 1;
const GREET_BINDING: u64 = 2;

pub fn spawn(runtime: Arc<ScriptedRuntime>) -> JoinHandle<()> {
    runtime.add_source(SOURCE_PATH, SOURCE.iter().map(|s| s.to_string()).collect());

    thread::Builder::new()
        .name("rdbg-host-demo-script".to_string())
        .spawn(move || run(runtime))
        .expect("spawn demo script thread")
}

fn run(runtime: Arc<ScriptedRuntime>) {
    let mut count = 0i64;
    loop {
        count += 1;
        let count_value = runtime.int(count);
        runtime.set_local(TOPLEVEL_BINDING, "count", count_value);
        runtime.set_frames(vec![ScriptedRuntime::frame("<toplevel>", SOURCE_PATH, 8, TOPLEVEL_BINDING, 1, None)]);
        runtime.fire(EventKind::Line, Some(SOURCE_PATH), 8);

        runtime.set_frames(vec![
            ScriptedRuntime::frame("greet", SOURCE_PATH, 9, GREET_BINDING, 1, None),
            ScriptedRuntime::frame("<toplevel>", SOURCE_PATH, 9, TOPLEVEL_BINDING, 1, None),
        ]);
        runtime.fire(EventKind::Call, Some(SOURCE_PATH), 9);

        let name = runtime.str_value(format!("world {count}"));
        runtime.set_local(GREET_BINDING, "name", name);
        runtime.fire(EventKind::Line, Some(SOURCE_PATH), 2);

        let message = runtime.str_value(format!("hello, world {count}"));
        runtime.set_local(GREET_BINDING, "message", message);
        runtime.fire(EventKind::Line, Some(SOURCE_PATH), 3);

        runtime.set_frames(vec![ScriptedRuntime::frame("<toplevel>", SOURCE_PATH, 9, TOPLEVEL_BINDING, 1, None)]);
        runtime.fire(EventKind::Return, Some(SOURCE_PATH), 9);

        thread::sleep(Duration::from_secs(1));
    }
}
