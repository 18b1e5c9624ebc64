//
// bridge.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The value bridge: turns raw runtime values into `Variable`s a protocol
// adapter can serialize, special-casing the handful of values that don't
// read well through a runtime's own stringification (nil and the two
// booleans). String values need no re-tagging on our side of the trait --
// a `ScriptRuntime` implementation hands back a `String`, which is UTF-8 by
// construction -- so there is no separate encoding step here.

use regex::Regex;
use std::sync::OnceLock;

use crate::runtime::{BindingHandle, ScriptRuntime, ValueHandle};
use crate::variable::Variable;

fn excluded_global_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$(KCODE|-K|=|IGNORECASE|FILENAME)$").unwrap())
}

pub fn display(runtime: &dyn ScriptRuntime, value: ValueHandle) -> String {
    if runtime.is_nil(value) {
        "nil".to_string()
    } else if runtime.is_true(value) {
        "true".to_string()
    } else if runtime.is_false(value) {
        "false".to_string()
    } else {
        runtime.raw_to_string(value)
    }
}

pub fn make_variable(runtime: &dyn ScriptRuntime, name: String, value: ValueHandle) -> Variable {
    Variable {
        value: display(runtime, value),
        type_name: runtime.class_name(value),
        has_children: runtime.ivar_count(value) > 0,
        object_id: value,
        name,
    }
}

/// Evaluates `expr` in `binding` and wraps the result (or the error raised
/// while evaluating it) as a `Variable` named after the expression itself.
pub fn evaluate(runtime: &dyn ScriptRuntime, expr: &str, binding: BindingHandle) -> Variable {
    match runtime.eval(expr, binding) {
        Ok(value) => make_variable(runtime, expr.to_string(), value),
        Err(error_value) => make_variable(runtime, expr.to_string(), error_value),
    }
}

/// Evaluates `expr` (expected to yield a list of variable names, e.g.
/// `global_variables`) and resolves each name to a `Variable`, dropping
/// names the runtime considers noise (empty names, the fixed exclusion
/// list of magic globals) and any name that fails to re-evaluate.
pub fn list_variables(runtime: &dyn ScriptRuntime, expr: &str, binding: BindingHandle) -> Vec<Variable> {
    let names = match runtime.eval_names(expr, binding) {
        Ok(names) => names,
        Err(_) => return Vec::new(),
    };
    names
        .into_iter()
        .filter(|name| !name.is_empty() && !excluded_global_re().is_match(name))
        .filter_map(|name| runtime.eval(&name, binding).ok().map(|value| make_variable(runtime, name, value)))
        .collect()
}

pub fn instance_variables(runtime: &dyn ScriptRuntime, object_id: ValueHandle) -> Vec<Variable> {
    runtime
        .instance_variable_names(object_id)
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(|name| {
            let value = runtime.instance_variable(object_id, &name);
            make_variable(runtime, name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A minimal in-memory runtime used only to exercise the bridge's
    /// formatting logic in isolation from the engine.
    struct FakeRuntime {
        values: RefCell<HashMap<ValueHandle, FakeValue>>,
        next_id: RefCell<ValueHandle>,
    }

    #[derive(Clone)]
    enum FakeValue {
        Nil,
        Bool(bool),
        Str(String),
    }

    impl FakeRuntime {
        fn new() -> Self {
            Self { values: RefCell::new(HashMap::new()), next_id: RefCell::new(1) }
        }

        fn intern(&self, v: FakeValue) -> ValueHandle {
            let mut id = self.next_id.borrow_mut();
            let handle = *id;
            *id += 1;
            self.values.borrow_mut().insert(handle, v);
            handle
        }
    }

    impl ScriptRuntime for FakeRuntime {
        fn install_tracepoints(&self, _callback: crate::runtime::TraceCallback) {}
        fn remove_tracepoints(&self) {}
        fn stack_frames(&self) -> Vec<crate::runtime::RawFrame> {
            Vec::new()
        }
        fn toplevel_binding(&self) -> BindingHandle {
            0
        }
        fn eval(&self, expr: &str, _binding: BindingHandle) -> Result<ValueHandle, ValueHandle> {
            Ok(self.intern(FakeValue::Str(expr.to_string())))
        }
        fn eval_names(&self, _expr: &str, _binding: BindingHandle) -> Result<Vec<String>, ValueHandle> {
            Ok(vec!["$KCODE".to_string(), "x".to_string(), String::new()])
        }
        fn instance_variable_names(&self, _value: ValueHandle) -> Vec<String> {
            Vec::new()
        }
        fn instance_variable(&self, _value: ValueHandle, _name: &str) -> ValueHandle {
            0
        }
        fn is_nil(&self, value: ValueHandle) -> bool {
            matches!(self.values.borrow().get(&value), Some(FakeValue::Nil))
        }
        fn is_true(&self, value: ValueHandle) -> bool {
            matches!(self.values.borrow().get(&value), Some(FakeValue::Bool(true)))
        }
        fn is_false(&self, value: ValueHandle) -> bool {
            matches!(self.values.borrow().get(&value), Some(FakeValue::Bool(false)))
        }
        fn raw_to_string(&self, value: ValueHandle) -> String {
            match self.values.borrow().get(&value) {
                Some(FakeValue::Str(s)) => s.clone(),
                _ => String::new(),
            }
        }
        fn class_name(&self, _value: ValueHandle) -> String {
            "String".to_string()
        }
        fn ivar_count(&self, _value: ValueHandle) -> usize {
            0
        }
        fn loaded_sources(&self) -> Vec<(String, Vec<String>)> {
            Vec::new()
        }
    }

    #[test]
    fn nil_and_booleans_render_as_literals() {
        let rt = FakeRuntime::new();
        let nil = rt.intern(FakeValue::Nil);
        let t = rt.intern(FakeValue::Bool(true));
        let f = rt.intern(FakeValue::Bool(false));
        assert_eq!(display(&rt, nil), "nil");
        assert_eq!(display(&rt, t), "true");
        assert_eq!(display(&rt, f), "false");
    }

    #[test]
    fn list_variables_drops_excluded_globals_and_empty_names() {
        let rt = FakeRuntime::new();
        let vars = list_variables(&rt, "global_variables", 0);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "x");
    }
}
