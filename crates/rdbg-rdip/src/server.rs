//
// server.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The network thread: one TCP acceptor, at most one connected client. It
// owns the socket, the read buffer, and the work it enqueues onto the
// scripting thread; it must never call into the scripting runtime
// directly, only through `Engine`.
//
// Reconnects are expected: disconnecting clears breakpoints and releases
// a parked scripting thread, but the `Engine` itself -- and its
// tracepoint installation -- lives for the lifetime of the process, not
// the connection. `RdipUi::attach` is what lets a freshly accepted
// connection find the engine that was (possibly) constructed, and already
// blocking on its initial handshake, before any client ever connected.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use rdbg_core::{DebuggerUi, Engine, ScriptRuntime, Variable, VariableKind};
use rdbg_util::ResultOrLog;

use crate::command::{self, Command};
use crate::xml;

/// The RDIP side of `DebuggerUi`: a connected-or-not flag, the live
/// socket (if any), and a weak back-reference to the engine it drives.
/// `rdbg_core::Engine` owns this behind an `Arc<dyn DebuggerUi>`; this
/// struct owns nothing of the engine's in return.
pub struct RdipUi {
    engine: Mutex<Weak<Engine>>,
    stream: Mutex<Option<TcpStream>>,
    connected: AtomicBool,
    disconnect_requested: AtomicBool,
}

impl RdipUi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(Weak::new()),
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
            disconnect_requested: AtomicBool::new(false),
        })
    }

    fn engine(&self) -> Option<Arc<Engine>> {
        self.engine.lock().unwrap().upgrade()
    }

    fn set_stream(&self, stream: Option<TcpStream>) {
        self.connected.store(stream.is_some(), Ordering::SeqCst);
        *self.stream.lock().unwrap() = stream;
    }

    fn request_disconnect(&self) {
        self.disconnect_requested.store(true, Ordering::SeqCst);
    }

    fn take_disconnect_requested(&self) -> bool {
        self.disconnect_requested.swap(false, Ordering::SeqCst)
    }

    /// Writes one response line, CRLF-terminated.
    /// A write failure just drops the connection's notion that anyone is
    /// still listening; the read loop discovers the same thing on its
    /// next read and drives the actual disconnect cleanup.
    fn write_line(&self, body: String) {
        let mut guard = self.stream.lock().unwrap();
        let Some(stream) = guard.as_mut() else { return };
        let wrote = write!(stream, "{body}\r\n").and_then(|_| stream.flush());
        if wrote.is_err() {
            *guard = None;
            self.connected.store(false, Ordering::SeqCst);
        }
    }
}

impl DebuggerUi for RdipUi {
    fn is_ide(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn notify_breakpoint_hit(&self, file: &str, line: u32) {
        self.write_line(format!(r#"<breakpoint file="{}" line="{}" threadId="1"/>"#, xml::escape_attr(file), line));
    }

    fn notify_suspended(&self, file: &str, line: u32) {
        self.write_line(format!(r#"<suspended file="{}" line="{}" threadId="1" frames="1"/>"#, xml::escape_attr(file), line));
    }

    fn attach(&self, engine: Weak<Engine>) {
        *self.engine.lock().unwrap() = engine;
    }
}

/// Starts the RDIP adapter: installs the engine's tracepoints (possibly
/// blocking this call if `wait` is set and no client has connected yet)
/// and spawns the TCP acceptor on its own thread. Returns the engine so a
/// host can also drive it directly (the demo binary uses this to report
/// state), mirroring how `rdbg_console::start` is shaped.
pub fn start(
    port: u16,
    runtime: Arc<dyn ScriptRuntime>,
    settings_path: Option<PathBuf>,
    wait: bool,
) -> std::io::Result<Arc<Engine>> {
    let ui = RdipUi::new();
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    log::info!("rdip: listening on {:?}", listener.local_addr().unwrap_or(([0, 0, 0, 0], port).into()));

    let acceptor_ui = ui.clone();
    rdbg_util::spawn!("rdbg-rdip-acceptor", move || accept_loop(listener, acceptor_ui))
        .or_log_error("spawning rdip acceptor thread");

    Ok(Engine::start(runtime, ui as Arc<dyn DebuggerUi>, settings_path, wait))
}

/// As [`start`], but binds an already-resolved address (used by tests that
/// want an ephemeral port).
pub fn start_on(
    addr: impl ToSocketAddrs,
    runtime: Arc<dyn ScriptRuntime>,
    settings_path: Option<PathBuf>,
    wait: bool,
) -> std::io::Result<(Arc<Engine>, u16)> {
    let ui = RdipUi::new();
    let listener = TcpListener::bind(addr)?;
    let port = listener.local_addr()?.port();

    let acceptor_ui = ui.clone();
    rdbg_util::spawn!("rdbg-rdip-acceptor", move || accept_loop(listener, acceptor_ui))
        .or_log_error("spawning rdip acceptor thread");

    Ok((Engine::start(runtime, ui as Arc<dyn DebuggerUi>, settings_path, wait), port))
}

fn accept_loop(listener: TcpListener, ui: Arc<RdipUi>) {
    loop {
        let (stream, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(err) => {
                log::error!("rdip: accept failed: {err}");
                continue;
            },
        };
        log::info!("rdip: client connected ({peer})");

        match stream.try_clone() {
            Ok(clone) => ui.set_stream(Some(clone)),
            Err(err) => {
                log::error!("rdip: failed to clone accepted socket: {err}");
                continue;
            },
        }

        handle_connection(stream, &ui);

        ui.set_stream(None);
        if let Some(engine) = ui.engine() {
            engine.on_disconnect();
        }
        log::info!("rdip: client disconnected ({peer})");
    }
}

fn handle_connection(stream: TcpStream, ui: &Arc<RdipUi>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {},
            Err(err) => {
                log::error!("rdip: read error: {err}");
                return;
            },
        }

        let chunk = String::from_utf8_lossy(&buf).into_owned();
        for line in command::split_commands(&chunk) {
            log::trace!("rdip: received {line:?}");
            match command::parse(&line) {
                Some(cmd) => dispatch(cmd, ui),
                None => log::warn!("rdip: unrecognized command {line:?}"),
            }
            if ui.take_disconnect_requested() {
                return;
            }
        }
    }
}

fn dispatch(cmd: Command, ui: &Arc<RdipUi>) {
    let Some(engine) = ui.engine() else { return };

    match cmd {
        Command::AddBreakpoint { file, line, condition } => {
            let file = file.replace('\\', "/");
            let index = engine.add_breakpoint(file.clone(), line, condition.unwrap_or_default(), true);
            ui.write_line(format!(r#"<breakpointAdded no="{index}" location="{}:{line}"/>"#, xml::escape_attr(&file)));
        },
        Command::ListBreakpoints => {
            let mut body = String::from("<breakpoints>");
            for bp in engine.list_breakpoints() {
                body.push_str(&format!(r#"<breakpoint n="{}" file="{}" line="{}"/>"#, bp.index, xml::escape_attr(&bp.file), bp.line));
            }
            body.push_str("</breakpoints>");
            ui.write_line(body);
        },
        Command::SetCondition { index, condition } => {
            if engine.set_condition(index, condition.unwrap_or_default()) {
                ui.write_line(format!(r#"<conditionSet bp_id="{index}"/>"#));
            }
        },
        Command::DeleteBreakpoint { index: Some(index) } => {
            if engine.remove_breakpoint(index) {
                ui.write_line(format!(r#"<breakpointDeleted no="{index}"/>"#));
            }
        },
        Command::DeleteBreakpoint { index: None } => engine.remove_all_breakpoints(),
        Command::EnableBreakpoints { enable, indices } => {
            for index in indices {
                if engine.enable_breakpoint(index, enable) {
                    let tag = if enable { "breakpointEnabled" } else { "breakpointDisabled" };
                    ui.write_line(format!(r#"<{tag} bp_id="{index}"/>"#));
                }
            }
        },
        Command::Continue | Command::Start => engine.do_continue(),
        Command::Step => engine.do_step(),
        Command::Next => engine.do_next(),
        Command::Finish => engine.do_finish(),
        Command::Pause => engine.do_pause(),
        Command::Quit => ui.request_disconnect(),
        Command::Frame { index } => {
            // Wire indices are 1-based-inner; the engine's facade is
            // 0-based-inner.
            if let Some(index) = index {
                engine.set_active_frame((index as usize).saturating_sub(1));
            }
        },
        Command::ThreadList => ui.write_line(r#"<threads><thread id="1" status="run"/></threads>"#.to_string()),
        Command::Where => {
            let frames = engine.frames();
            let active = engine.active_frame_index();
            let mut body = String::from("<frames>");
            for (i, frame) in frames.iter().enumerate() {
                let current = if i == active { r#" current="yes""# } else { "" };
                body.push_str(&format!(
                    r#"<frame no="{}" file="{}" line="{}"{}/>"#,
                    i + 1,
                    xml::escape_attr(&frame.file),
                    frame.line,
                    current
                ));
            }
            body.push_str("</frames>");
            ui.write_line(body);
        },
        Command::Eval { expr } => {
            let ui = ui.clone();
            let expr_for_response = expr.clone();
            engine.evaluate(expr, move |var| {
                ui.write_line(format!(
                    r#"<eval expression="{}" value="{}"/>"#,
                    xml::escape_attr(&expr_for_response),
                    xml::escape_attr(&var.value)
                ));
            });
        },
        Command::VarInspect { expr } => {
            if !engine.is_stopped() {
                ui.write_line(render_variables("watch", &[]));
                return;
            }
            let ui = ui.clone();
            engine.evaluate(expr, move |var| ui.write_line(render_variables("watch", std::slice::from_ref(&var))));
        },
        Command::VarGlobal => {
            let ui = ui.clone();
            engine.variables(VariableKind::Global, move |vars| ui.write_line(render_variables("global", &vars)));
        },
        Command::VarLocal => {
            let ui = ui.clone();
            engine.variables(VariableKind::Local, move |vars| ui.write_line(render_variables("local", &vars)));
        },
        Command::VarInstance { object_id } => {
            let ui = ui.clone();
            engine.variables(VariableKind::Instance(object_id), move |vars| ui.write_line(render_variables("instance", &vars)));
        },
    }
}

fn render_variables(kind: &str, vars: &[Variable]) -> String {
    let mut body = format!(r#"<variables kind="{kind}">"#);
    for var in vars {
        body.push_str(&format!(
            r#"<variable name="{}" kind="{kind}" value="{}" type="{}" objectId="0x{:x}" hasChildren="{}"/>"#,
            xml::escape_attr(&var.name),
            xml::escape_attr(&var.value),
            xml::escape_attr(&var.type_name),
            var.object_id,
            var.has_children
        ));
    }
    body.push_str("</variables>");
    body
}
