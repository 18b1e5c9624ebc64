//
// engine.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// Ties the other modules together into the one thing a protocol adapter
// actually talks to. `Engine` is always held behind an `Arc`: tracepoint
// callbacks and queued evaluation jobs both need to call back into it from
// a thread that didn't construct it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, info};
use rdbg_util::ResultOrLog;

use crate::breakpoints::{Breakpoint, BreakpointStore};
use crate::bridge;
use crate::frames::{Frame, FrameFacade};
use crate::runtime::{EventKind, ScriptRuntime, TraceEvent};
use crate::settings;
use crate::source::SourceTable;
use crate::suspend::SuspensionHandshake;
use crate::trace::{LineAction, TraceState};
use crate::ui::DebuggerUi;
use crate::variable::{Variable, VariableKind};

struct SuspensionState {
    is_stopped: AtomicBool,
    last_break: Mutex<Option<(String, u32)>>,
    frames: Mutex<FrameFacade>,
}

impl SuspensionState {
    fn new() -> Self {
        Self { is_stopped: AtomicBool::new(false), last_break: Mutex::new(None), frames: Mutex::new(FrameFacade::default()) }
    }
}

pub struct Engine {
    runtime: Arc<dyn ScriptRuntime>,
    ui: Arc<dyn DebuggerUi>,
    breakpoints: Mutex<BreakpointStore>,
    sources: Mutex<SourceTable>,
    trace: Mutex<TraceState>,
    suspension: SuspensionState,
    handshake: SuspensionHandshake,
    mirror_sources: bool,
    persist_enabled: bool,
    settings_path: Option<PathBuf>,
}

impl Engine {
    /// Builds the engine and installs its tracepoint callback. `settings_path`
    /// is only consulted (for both initial load and subsequent saves) when
    /// `ui.is_ide()` is false.
    pub fn start(runtime: Arc<dyn ScriptRuntime>, ui: Arc<dyn DebuggerUi>, settings_path: Option<PathBuf>, wait_for_client: bool) -> Arc<Engine> {
        let is_ide = ui.is_ide();
        let mut breakpoints = BreakpointStore::new();
        if !is_ide {
            if let Some(path) = &settings_path {
                if let Some((resolved, unresolved, next_index)) = settings::load_from_file(path) {
                    info!("loaded {} saved breakpoint(s) from {}", resolved.len() + unresolved.len(), path.display());
                    breakpoints.load(resolved, unresolved, next_index);
                }
            }
        }

        let engine = Arc::new(Engine {
            runtime: runtime.clone(),
            ui: ui.clone(),
            breakpoints: Mutex::new(breakpoints),
            sources: Mutex::new(SourceTable::new()),
            trace: Mutex::new(TraceState::new()),
            suspension: SuspensionState::new(),
            handshake: SuspensionHandshake::new(),
            mirror_sources: !is_ide,
            persist_enabled: !is_ide,
            settings_path,
        });

        let weak: Weak<Engine> = Arc::downgrade(&engine);
        ui.attach(weak.clone());

        runtime.install_tracepoints(Box::new(move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.on_trace_event(event);
            }
        }));

        engine.suspension.is_stopped.store(true, Ordering::SeqCst);
        if wait_for_client || ui.is_connected() {
            engine.handshake.wait();
        }
        engine.suspension.is_stopped.store(false, Ordering::SeqCst);

        engine
    }

    pub fn is_stopped(&self) -> bool {
        self.suspension.is_stopped.load(Ordering::SeqCst)
    }

    // -- Tracepoint callback -------------------------------------------------

    fn on_trace_event(&self, event: TraceEvent) {
        self.clear_transient();

        let action = {
            let mut trace = self.trace.lock().unwrap();
            match event.kind {
                EventKind::Call | EventKind::BCall | EventKind::ClassOpen => trace.on_call(false),
                EventKind::CCall => trace.on_call(true),
                EventKind::Return | EventKind::BReturn | EventKind::End => trace.on_return(false),
                EventKind::CReturn => trace.on_return(true),
                EventKind::Line => trace.on_line(),
            }
        };

        let Some(path) = event.path else { return };
        match action {
            LineAction::Skip => {},
            LineAction::Unconditional => self.suspend_unconditional(&path, event.line),
            LineAction::CheckBreakpoint => self.maybe_break_at(&path, event.line),
        }
    }

    fn clear_transient(&self) {
        self.suspension.is_stopped.store(false, Ordering::SeqCst);
        *self.suspension.frames.lock().unwrap() = FrameFacade::default();
    }

    fn maybe_break_at(&self, path: &str, line: u32) {
        let bp = {
            let mut breakpoints = self.breakpoints.lock().unwrap();
            if breakpoints.has_unresolved() {
                if self.mirror_sources {
                    let mut sources = self.sources.lock().unwrap();
                    sources.refresh(self.runtime.loaded_sources());
                }
                let sources = self.sources.lock().unwrap();
                let newly_resolved = breakpoints.resolve_all(&sources);
                drop(sources);
                if newly_resolved {
                    self.persist(&breakpoints);
                }
            }
            breakpoints.lookup(path, line)
        };
        if let Some(bp) = bp {
            self.suspend_conditional(bp);
        }
    }

    fn suspend_unconditional(&self, file: &str, line: u32) {
        self.capture_frames();
        *self.suspension.last_break.lock().unwrap() = Some((file.to_string(), line));
        self.suspension.is_stopped.store(true, Ordering::SeqCst);
        if self.ui.is_connected() {
            debug!("suspended at {file}:{line}");
            self.ui.notify_suspended(file, line);
            self.handshake.wait();
        }
        self.clear_transient();
    }

    fn suspend_conditional(&self, bp: Breakpoint) {
        self.capture_frames();
        if self.is_breakpoint_active(&bp) {
            *self.suspension.last_break.lock().unwrap() = Some((bp.file.clone(), bp.line));
            self.suspension.is_stopped.store(true, Ordering::SeqCst);
            if self.ui.is_connected() {
                debug!("breakpoint {} hit at {}:{}", bp.index, bp.file, bp.line);
                self.ui.notify_breakpoint_hit(&bp.file, bp.line);
                self.handshake.wait();
            }
        }
        self.clear_transient();
    }

    fn is_breakpoint_active(&self, bp: &Breakpoint) -> bool {
        if !bp.enabled {
            return false;
        }
        if bp.condition.is_empty() {
            return true;
        }
        let Some(binding) = self.suspension.frames.lock().unwrap().active_binding() else { return false };
        matches!(self.runtime.eval(&bp.condition, binding), Ok(v) if self.runtime.is_true(v))
    }

    fn capture_frames(&self) {
        let raw = self.runtime.stack_frames();
        *self.suspension.frames.lock().unwrap() = FrameFacade::capture(raw);
    }

    // -- Control commands -----------------------------------------------------

    pub fn do_step(&self) {
        self.trace.lock().unwrap().arm_step();
        self.handshake.release();
    }

    pub fn do_next(&self) {
        self.trace.lock().unwrap().arm_next();
        self.handshake.release();
    }

    pub fn do_finish(&self) {
        self.trace.lock().unwrap().arm_finish();
        self.handshake.release();
    }

    pub fn do_pause(&self) {
        self.trace.lock().unwrap().arm_pause(self.is_stopped());
    }

    pub fn do_continue(&self) {
        self.handshake.release();
    }

    /// Called when the controlling client disconnects: breakpoints are
    /// dropped (a reconnecting client starts clean) and any parked
    /// scripting thread is released so execution resumes.
    pub fn on_disconnect(&self) {
        {
            let mut breakpoints = self.breakpoints.lock().unwrap();
            breakpoints.remove_all();
            self.persist(&breakpoints);
        }
        self.handshake.release();
    }

    // -- Breakpoints ------------------------------------------------------------

    pub fn add_breakpoint(&self, file: String, line: u32, condition: String, assume_resolved: bool) -> u32 {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        let mut bp = Breakpoint::new(file, line);
        bp.condition = condition;
        let sources = self.sources.lock().unwrap();
        let index = breakpoints.add(bp, assume_resolved || !self.mirror_sources, &sources);
        drop(sources);
        self.persist(&breakpoints);
        index
    }

    pub fn list_breakpoints(&self) -> Vec<Breakpoint> {
        self.breakpoints.lock().unwrap().list()
    }

    pub fn remove_breakpoint(&self, index: u32) -> bool {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        let removed = breakpoints.remove(index);
        if removed {
            self.persist(&breakpoints);
        }
        removed
    }

    pub fn remove_all_breakpoints(&self) {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        breakpoints.remove_all();
        self.persist(&breakpoints);
    }

    pub fn enable_breakpoint(&self, index: u32, enabled: bool) -> bool {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        let ok = breakpoints.enable(index, enabled);
        if ok {
            self.persist(&breakpoints);
        }
        ok
    }

    pub fn set_condition(&self, index: u32, condition: String) -> bool {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        let ok = breakpoints.set_condition(index, condition);
        if ok {
            self.persist(&breakpoints);
        }
        ok
    }

    fn persist(&self, breakpoints: &BreakpointStore) {
        if !self.persist_enabled {
            return;
        }
        let Some(path) = &self.settings_path else { return };
        settings::save_to_file(path, &breakpoints.list_resolved(), &breakpoints.list_unresolved(), breakpoints.next_index())
            .or_log_error("writing breakpoint settings");
    }

    // -- Frames -----------------------------------------------------------------

    pub fn frames(&self) -> Vec<Frame> {
        self.suspension.frames.lock().unwrap().list().to_vec()
    }

    pub fn active_frame_index(&self) -> usize {
        self.suspension.frames.lock().unwrap().active()
    }

    pub fn set_active_frame(&self, index: usize) {
        self.suspension.frames.lock().unwrap().set_active(index);
    }

    pub fn shift_active_frame(&self, up: bool) {
        if self.is_stopped() {
            self.suspension.frames.lock().unwrap().shift_active(up);
        }
    }

    pub fn last_break(&self) -> Option<(String, u32)> {
        self.suspension.last_break.lock().unwrap().clone()
    }

    pub fn code_window(&self, file: &str, center: usize, before: usize, after: usize) -> Vec<(usize, String)> {
        self.sources.lock().unwrap().code_window(file, center, before, after)
    }

    // -- Evaluation (queued onto the scripting thread) --------------------------

    pub fn evaluate(self: &Arc<Self>, expr: String, respond: impl FnOnce(Variable) + Send + 'static) {
        if !self.is_stopped() {
            respond(Variable::not_evaluable(expr));
            return;
        }
        let engine = self.clone();
        self.handshake.enqueue(Box::new(move || respond(engine.evaluate_now(&expr))));
    }

    fn evaluate_now(&self, expr: &str) -> Variable {
        match self.suspension.frames.lock().unwrap().active_binding() {
            None => Variable::not_evaluable(expr.to_string()),
            Some(binding) => bridge::evaluate(&*self.runtime, expr, binding),
        }
    }

    pub fn variables(self: &Arc<Self>, kind: VariableKind, respond: impl FnOnce(Vec<Variable>) + Send + 'static) {
        if !self.is_stopped() {
            respond(Vec::new());
            return;
        }
        let engine = self.clone();
        self.handshake.enqueue(Box::new(move || respond(engine.variables_now(kind))));
    }

    fn variables_now(&self, kind: VariableKind) -> Vec<Variable> {
        match kind {
            VariableKind::Global => {
                let binding = self.runtime.toplevel_binding();
                bridge::list_variables(&*self.runtime, "global_variables", binding)
            },
            VariableKind::Local => {
                let binding = self
                    .suspension
                    .frames
                    .lock()
                    .unwrap()
                    .active_binding()
                    .unwrap_or_else(|| self.runtime.toplevel_binding());
                bridge::list_variables(&*self.runtime, "local_variables", binding)
            },
            VariableKind::Instance(object_id) => bridge::instance_variables(&*self.runtime, object_id),
        }
    }
}
