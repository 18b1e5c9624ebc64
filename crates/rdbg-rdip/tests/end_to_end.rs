//
// end_to_end.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// Drives the RDIP adapter over a real loopback socket, exercising the
// scenarios end to end: add/list/delete, a conditional breakpoint, and
// eval while running vs. stopped. The
// scripting side is `rdbg_testkit::ScriptedRuntime`, fired from a
// dedicated thread the way a real interpreter would drive tracepoints
// from its own thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rdbg_core::EventKind;
use rdbg_rdip::server;
use rdbg_testkit::{RdipClient, ScriptedRuntime};

fn connect(runtime: Arc<ScriptedRuntime>) -> (Arc<rdbg_core::Engine>, RdipClient) {
    let (engine, port) = server::start_on("127.0.0.1:0", runtime, None, false).expect("bind rdip server");
    // Give the acceptor thread a moment to reach `listener.accept()`.
    thread::sleep(Duration::from_millis(20));
    let client = RdipClient::connect(port).expect("connect rdip client");
    // Likewise, give the server time to notice the new connection before
    // the test starts sending commands.
    thread::sleep(Duration::from_millis(20));
    (engine, client)
}

#[test]
fn add_list_delete_breakpoint() {
    let runtime = ScriptedRuntime::new();
    let (_engine, mut client) = connect(runtime);

    assert_eq!(client.roundtrip("b sketch.rb:42").unwrap(), r#"<breakpointAdded no="1" location="sketch.rb:42"/>"#);
    assert_eq!(client.roundtrip("info break").unwrap(), r#"<breakpoints><breakpoint n="1" file="sketch.rb" line="42"/></breakpoints>"#);
    assert_eq!(client.roundtrip("del 1").unwrap(), r#"<breakpointDeleted no="1"/>"#);
    assert_eq!(client.roundtrip("info break").unwrap(), "<breakpoints></breakpoints>");
}

#[test]
fn unknown_index_mutations_are_silently_refused() {
    let runtime = ScriptedRuntime::new();
    let (_engine, mut client) = connect(runtime);

    client.send("del 99").unwrap();
    client.send("cond 99 x > 0").unwrap();
    // Neither produced a response; a subsequent, valid command's response
    // is the very next line, not something queued behind silent failures.
    assert_eq!(client.roundtrip("b a.rb:1").unwrap(), r#"<breakpointAdded no="1" location="a.rb:1"/>"#);
}

#[test]
fn eval_differs_between_running_and_stopped() {
    let runtime = ScriptedRuntime::new();
    let (engine, mut client) = connect(runtime.clone());

    assert_eq!(client.roundtrip("p x").unwrap(), r#"<eval expression="x" value="Expression cannot be evaluated"/>"#);

    let x = runtime.int(5);
    runtime.set_local(1, "x", x);
    runtime.set_frames(vec![ScriptedRuntime::frame("run", "a.rb", 10, 1, 0, None)]);

    let firing_runtime = runtime.clone();
    let firer = thread::spawn(move || firing_runtime.fire(EventKind::Line, Some("a.rb"), 10));
    // `step` was never armed, so this LINE event won't suspend on its
    // own; force it with an explicit breakpoint instead.
    thread::sleep(Duration::from_millis(20));
    client.send("b a.rb:10").unwrap();
    let added = client.recv_line().unwrap();
    assert!(added.starts_with(r#"<breakpointAdded"#));

    let firing_runtime = runtime.clone();
    let firer = thread::spawn(move || firing_runtime.fire(EventKind::Line, Some("a.rb"), 10));
    let suspended = client.recv_line().unwrap();
    assert_eq!(suspended, r#"<breakpoint file="a.rb" line="10" threadId="1"/>"#);
    assert!(engine.is_stopped());

    assert_eq!(client.roundtrip("p x").unwrap(), r#"<eval expression="x" value="5"/>"#);

    client.send("cont").unwrap();
    firer.join().unwrap();
    assert!(!engine.is_stopped());
}

#[test]
fn conditional_breakpoint_only_suspends_when_condition_holds() {
    let runtime = ScriptedRuntime::new();
    let (engine, mut client) = connect(runtime.clone());

    assert_eq!(client.roundtrip("b a.rb:5 if x > 0").unwrap(), r#"<breakpointAdded no="1" location="a.rb:5"/>"#);

    let neg = runtime.int(-1);
    runtime.set_local(1, "x", neg);
    runtime.set_frames(vec![ScriptedRuntime::frame("run", "a.rb", 5, 1, 0, None)]);
    runtime.fire(EventKind::Line, Some("a.rb"), 5);
    assert!(!engine.is_stopped(), "condition false, engine must not suspend");

    let pos = runtime.int(1);
    runtime.set_local(1, "x", pos);
    runtime.set_frames(vec![ScriptedRuntime::frame("run", "a.rb", 5, 1, 0, None)]);

    let firing_runtime = runtime.clone();
    let firer = thread::spawn(move || firing_runtime.fire(EventKind::Line, Some("a.rb"), 5));
    assert_eq!(client.recv_line().unwrap(), r#"<breakpoint file="a.rb" line="5" threadId="1"/>"#);
    assert!(engine.is_stopped());

    client.send("cont").unwrap();
    firer.join().unwrap();
}

#[test]
fn disconnect_clears_breakpoints_for_the_next_client() {
    let runtime = ScriptedRuntime::new();
    let (engine, mut client) = connect(runtime.clone());

    client.roundtrip("b a.rb:1").unwrap();
    drop(client);

    // Give the acceptor's disconnect handling a moment to run.
    thread::sleep(Duration::from_millis(50));
    assert!(engine.list_breakpoints().is_empty());
}
