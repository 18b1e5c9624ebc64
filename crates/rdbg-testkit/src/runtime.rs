//
// runtime.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// A scripting-runtime stand-in for exercising `rdbg_core::Engine` without a
// real interpreter attached. Tests build up a cast of values and a call
// stack by hand, then `fire()` tracepoint events in whatever order a real
// run of the (imaginary) script would have produced; `Engine` can't tell
// the difference from a real `ScriptRuntime`.
//
// `eval`/`eval_names` understand just enough of a C-like expression
// language to exercise conditional breakpoints and variable listing:
// literals (`nil`, `true`, `false`, integers, double-quoted strings),
// bare identifier lookup in the current binding's locals then globals, and
// the six comparison operators. That covers every expression the
// end-to-end scenarios and testable properties below need; it is not a
// general-purpose interpreter, and isn't meant to become one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;

use rdbg_core::{BindingHandle, EventKind, RawFrame, ScriptRuntime, TraceCallback, TraceEvent, ValueHandle};

#[derive(Debug, Clone, PartialEq)]
enum ScriptValue {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Object { class: String, ivars: HashMap<String, ValueHandle> },
}

pub struct ScriptedRuntime {
    callback: Mutex<Option<TraceCallback>>,
    frames: Mutex<Vec<RawFrame>>,
    values: Mutex<HashMap<ValueHandle, ScriptValue>>,
    next_value: Mutex<ValueHandle>,
    locals: Mutex<HashMap<BindingHandle, HashMap<String, ValueHandle>>>,
    globals: Mutex<HashMap<String, ValueHandle>>,
    sources: Mutex<HashMap<String, Vec<String>>>,
    nil_handle: ValueHandle,
}

impl ScriptedRuntime {
    pub fn new() -> Arc<Self> {
        let mut values = HashMap::new();
        values.insert(1, ScriptValue::Nil);
        Arc::new(Self {
            callback: Mutex::new(None),
            frames: Mutex::new(Vec::new()),
            values: Mutex::new(values),
            next_value: Mutex::new(2),
            locals: Mutex::new(HashMap::new()),
            globals: Mutex::new(HashMap::new()),
            sources: Mutex::new(HashMap::new()),
            nil_handle: 1,
        })
    }

    pub fn nil(&self) -> ValueHandle {
        self.nil_handle
    }

    pub fn int(&self, n: i64) -> ValueHandle {
        self.intern(ScriptValue::Int(n))
    }

    pub fn str_value(&self, s: impl Into<String>) -> ValueHandle {
        self.intern(ScriptValue::Str(s.into()))
    }

    pub fn bool_value(&self, b: bool) -> ValueHandle {
        self.intern(ScriptValue::Bool(b))
    }

    pub fn object(&self, class: impl Into<String>, ivars: impl IntoIterator<Item = (String, ValueHandle)>) -> ValueHandle {
        self.intern(ScriptValue::Object { class: class.into(), ivars: ivars.into_iter().collect() })
    }

    /// Builds a `RawFrame` the way a real stack walk would hand one back.
    pub fn frame(name: &str, file: &str, line: u32, binding: BindingHandle, self_value: ValueHandle, class_name: Option<&str>) -> RawFrame {
        RawFrame { name: name.to_string(), path: Some(file.to_string()), line, binding, self_value, class_name: class_name.map(str::to_string) }
    }

    pub fn set_frames(&self, frames: Vec<RawFrame>) {
        *self.frames.lock().unwrap() = frames;
    }

    pub fn set_local(&self, binding: BindingHandle, name: &str, value: ValueHandle) {
        self.locals.lock().unwrap().entry(binding).or_default().insert(name.to_string(), value);
    }

    pub fn set_global(&self, name: &str, value: ValueHandle) {
        self.globals.lock().unwrap().insert(name.to_string(), value);
    }

    pub fn add_source(&self, path: impl Into<String>, lines: Vec<String>) {
        self.sources.lock().unwrap().insert(path.into(), lines);
    }

    /// Invokes the installed tracepoint callback synchronously, exactly as
    /// the contract in `rdbg_core::ScriptRuntime::install_tracepoints`
    /// requires a real runtime to. The caller (almost always a thread
    /// standing in for "the scripting thread") blocks for as long as the
    /// engine takes to process the event -- including, if it decides to
    /// suspend, for as long as the test takes to release it.
    pub fn fire(&self, kind: EventKind, path: Option<&str>, line: u32) {
        let guard = self.callback.lock().unwrap();
        if let Some(callback) = guard.as_ref() {
            callback(TraceEvent { kind, path: path.map(str::to_string), line });
        }
    }

    fn intern(&self, value: ScriptValue) -> ValueHandle {
        let mut next = self.next_value.lock().unwrap();
        let handle = *next;
        *next += 1;
        self.values.lock().unwrap().insert(handle, value);
        handle
    }

    fn resolve_atom(&self, token: &str, binding: BindingHandle) -> Result<ValueHandle, ValueHandle> {
        let token = token.trim();
        match token {
            "nil" => Ok(self.nil_handle),
            "true" => Ok(self.intern(ScriptValue::Bool(true))),
            "false" => Ok(self.intern(ScriptValue::Bool(false))),
            _ => {
                if let Ok(n) = token.parse::<i64>() {
                    return Ok(self.intern(ScriptValue::Int(n)));
                }
                if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
                    return Ok(self.intern(ScriptValue::Str(token[1..token.len() - 1].to_string())));
                }
                if let Some(value) = self.locals.lock().unwrap().get(&binding).and_then(|vars| vars.get(token)).copied() {
                    return Ok(value);
                }
                if let Some(value) = self.globals.lock().unwrap().get(token).copied() {
                    return Ok(value);
                }
                Err(self.intern(ScriptValue::Str(format!("NameError: undefined local variable or method `{token}'"))))
            },
        }
    }

    fn compare(&self, lhs: ValueHandle, rhs: ValueHandle, op: &str) -> Result<bool, ValueHandle> {
        let (l, r) = {
            let values = self.values.lock().unwrap();
            (values.get(&lhs).cloned(), values.get(&rhs).cloned())
        };
        match op {
            "==" => Ok(l == r),
            "!=" => Ok(l != r),
            _ => match (l, r) {
                (Some(ScriptValue::Int(a)), Some(ScriptValue::Int(b))) => Ok(match op {
                    ">" => a > b,
                    "<" => a < b,
                    ">=" => a >= b,
                    "<=" => a <= b,
                    _ => unreachable!("comparison_re only captures the six known operators"),
                }),
                _ => Err(self.intern(ScriptValue::Str("ArgumentError: comparison of incompatible types failed".to_string()))),
            },
        }
    }
}

fn comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s*(==|!=|>=|<=|>|<)\s*(.+)$").unwrap())
}

impl ScriptRuntime for ScriptedRuntime {
    fn install_tracepoints(&self, callback: TraceCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn remove_tracepoints(&self) {
        *self.callback.lock().unwrap() = None;
    }

    fn stack_frames(&self) -> Vec<RawFrame> {
        self.frames.lock().unwrap().clone()
    }

    fn toplevel_binding(&self) -> BindingHandle {
        0
    }

    fn eval(&self, expr: &str, binding: BindingHandle) -> Result<ValueHandle, ValueHandle> {
        let expr = expr.trim();
        if let Some(caps) = comparison_re().captures(expr) {
            let lhs = self.resolve_atom(&caps[1], binding)?;
            let rhs = self.resolve_atom(&caps[3], binding)?;
            let result = self.compare(lhs, rhs, &caps[2])?;
            return Ok(self.intern(ScriptValue::Bool(result)));
        }
        self.resolve_atom(expr, binding)
    }

    fn eval_names(&self, expr: &str, binding: BindingHandle) -> Result<Vec<String>, ValueHandle> {
        match expr.trim() {
            "global_variables" => Ok(self.globals.lock().unwrap().keys().cloned().collect()),
            "local_variables" => Ok(self.locals.lock().unwrap().get(&binding).map(|vars| vars.keys().cloned().collect()).unwrap_or_default()),
            other => Err(self.intern(ScriptValue::Str(format!("NameError: undefined method `{other}'")))),
        }
    }

    fn instance_variable_names(&self, value: ValueHandle) -> Vec<String> {
        match self.values.lock().unwrap().get(&value) {
            Some(ScriptValue::Object { ivars, .. }) => ivars.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn instance_variable(&self, value: ValueHandle, name: &str) -> ValueHandle {
        match self.values.lock().unwrap().get(&value) {
            Some(ScriptValue::Object { ivars, .. }) => ivars.get(name).copied().unwrap_or(self.nil_handle),
            _ => self.nil_handle,
        }
    }

    fn is_nil(&self, value: ValueHandle) -> bool {
        matches!(self.values.lock().unwrap().get(&value), Some(ScriptValue::Nil))
    }

    fn is_true(&self, value: ValueHandle) -> bool {
        matches!(self.values.lock().unwrap().get(&value), Some(ScriptValue::Bool(true)))
    }

    fn is_false(&self, value: ValueHandle) -> bool {
        matches!(self.values.lock().unwrap().get(&value), Some(ScriptValue::Bool(false)))
    }

    fn raw_to_string(&self, value: ValueHandle) -> String {
        match self.values.lock().unwrap().get(&value) {
            Some(ScriptValue::Nil) => "nil".to_string(),
            Some(ScriptValue::Bool(b)) => b.to_string(),
            Some(ScriptValue::Int(n)) => n.to_string(),
            Some(ScriptValue::Str(s)) => s.clone(),
            Some(ScriptValue::Object { class, .. }) => format!("#<{class}>"),
            None => String::new(),
        }
    }

    fn class_name(&self, value: ValueHandle) -> String {
        match self.values.lock().unwrap().get(&value) {
            Some(ScriptValue::Nil) => "NilClass".to_string(),
            Some(ScriptValue::Bool(true)) => "TrueClass".to_string(),
            Some(ScriptValue::Bool(false)) => "FalseClass".to_string(),
            Some(ScriptValue::Int(_)) => "Integer".to_string(),
            Some(ScriptValue::Str(_)) => "String".to_string(),
            Some(ScriptValue::Object { class, .. }) => class.clone(),
            None => "Object".to_string(),
        }
    }

    fn ivar_count(&self, value: ValueHandle) -> usize {
        match self.values.lock().unwrap().get(&value) {
            Some(ScriptValue::Object { ivars, .. }) => ivars.len(),
            _ => 0,
        }
    }

    fn loaded_sources(&self) -> Vec<(String, Vec<String>)> {
        self.sources.lock().unwrap().iter().map(|(path, lines)| (path.clone(), lines.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_evaluates_against_a_bound_local() {
        let rt = ScriptedRuntime::new();
        let x = rt.int(5);
        rt.set_local(1, "x", x);
        assert!(matches!(rt.eval("x > 0", 1), Ok(v) if rt.is_true(v)));
        assert!(matches!(rt.eval("x > 10", 1), Ok(v) if rt.is_false(v)));
    }

    #[test]
    fn undefined_identifier_is_an_error_value() {
        let rt = ScriptedRuntime::new();
        let err = rt.eval("nonsense", 0).unwrap_err();
        assert!(rt.raw_to_string(err).contains("NameError"));
    }

    #[test]
    fn fire_invokes_the_installed_callback() {
        let rt = ScriptedRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        rt.install_tracepoints(Box::new(move |event| seen2.lock().unwrap().push((event.kind, event.line))));
        rt.fire(EventKind::Line, Some("a.rb"), 3);
        assert_eq!(seen.lock().unwrap().as_slice(), &[(EventKind::Line, 3)]);
    }
}
