//
// command.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The console's own grammar: narrower than RDIP's (no conditions, no
// enable/disable, a single implicit thread) but with a couple of
// commands RDIP clients never need because they read source from disk
// themselves -- `list` and the `up`/`down` frame cursor.
//
// Anything that matches none of the fixed forms is treated as an
// expression to evaluate, exactly as the original console did: a
// debugger prompt's whole point is that typing an expression is the
// common case, not a command needing its own verb.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddBreakpoint { file: String, line: u32 },
    ListBreakpoints,
    DeleteBreakpoint { index: Option<u32> },
    Continue,
    Step,
    Help,
    Where,
    ShiftFrame { up: bool },
    List,
    VarGlobal,
    VarLocal,
    Eval { expr: String },
}

macro_rules! regexes {
    ($($name:ident = $pattern:literal;)*) => {
        $(
            fn $name() -> &'static Regex {
                static RE: OnceLock<Regex> = OnceLock::new();
                RE.get_or_init(|| Regex::new($pattern).expect("static regex"))
            }
        )*
    };
}

regexes! {
    add_breakpoint_re    = r"(?i)^b(?:reak)?\s+(.+):(\d+)$";
    list_breakpoints_re  = r"(?i)^b(?:reak)?$";
    delete_breakpoint_re = r"(?i)^del(?:ete)?(?:\s+(\d+))?$";
    continue_re          = r"(?i)^c(?:ont)?$";
    step_re              = r"(?i)^s(?:tep)?$";
    help_re              = r"(?i)^h(?:elp)?$";
    where_re             = r"(?i)^(?:w(?:here)?|f(?:rame)?)$";
    up_re                = r"(?i)^up$";
    down_re              = r"(?i)^down$";
    list_re              = r"(?i)^l(?:ist)?$";
    eval_re              = r"(?i)^p\s+(.+)$";
    var_global_re        = r"(?i)^v(?:ar)?\s+g(?:lobal)?$";
    var_local_re         = r"(?i)^v(?:ar)?\s+l(?:ocal)?$";
}

/// Parses one line of console input. Blank input parses to `None`;
/// everything else parses to *something*, since an unrecognized line is
/// an expression, not an error.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = add_breakpoint_re().captures(line) {
        return Some(Command::AddBreakpoint { file: caps[1].trim().to_string(), line: caps[2].parse().ok()? });
    }
    if list_breakpoints_re().is_match(line) {
        return Some(Command::ListBreakpoints);
    }
    if let Some(caps) = delete_breakpoint_re().captures(line) {
        return Some(Command::DeleteBreakpoint { index: caps.get(1).and_then(|m| m.as_str().parse().ok()) });
    }
    if continue_re().is_match(line) {
        return Some(Command::Continue);
    }
    if step_re().is_match(line) {
        return Some(Command::Step);
    }
    if help_re().is_match(line) {
        return Some(Command::Help);
    }
    if up_re().is_match(line) {
        return Some(Command::ShiftFrame { up: true });
    }
    if down_re().is_match(line) {
        return Some(Command::ShiftFrame { up: false });
    }
    if where_re().is_match(line) {
        return Some(Command::Where);
    }
    if list_re().is_match(line) {
        return Some(Command::List);
    }
    if var_global_re().is_match(line) {
        return Some(Command::VarGlobal);
    }
    if var_local_re().is_match(line) {
        return Some(Command::VarLocal);
    }
    if let Some(caps) = eval_re().captures(line) {
        return Some(Command::Eval { expr: caps[1].trim().to_string() });
    }

    Some(Command::Eval { expr: line.to_string() })
}

pub const HELP_TEXT: &str = "\
Debugger help
Commands
  b[reak] file:line          set breakpoint at a position
  b[reak]                    list breakpoints
  del[ete] [n]               delete a breakpoint, or all if n is omitted
  c[ont]                     run until program ends or hits a breakpoint
  s[tep]                     step (into methods) one line
  w[here] / f[rame]          display frames
  up                         move to higher (older) frame
  down                       move to lower (newer) frame
  l[ist]                     list source around the current line
  v[ar] g[lobal]             show global variables
  v[ar] l[ocal]              show local variables
  p expression               evaluate expression and print its value
  h[elp]                     print this help
  <everything else>          evaluate
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_breakpoint_add_and_list() {
        assert_eq!(parse("b foo.rb:12"), Some(Command::AddBreakpoint { file: "foo.rb".into(), line: 12 }));
        assert_eq!(parse("break"), Some(Command::ListBreakpoints));
    }

    #[test]
    fn parses_frame_shift_commands() {
        assert_eq!(parse("up"), Some(Command::ShiftFrame { up: true }));
        assert_eq!(parse("down"), Some(Command::ShiftFrame { up: false }));
    }

    #[test]
    fn unmatched_input_is_an_expression() {
        assert_eq!(parse("1 + 1"), Some(Command::Eval { expr: "1 + 1".into() }));
        assert_eq!(parse(""), None);
    }

    #[test]
    fn delete_without_index_removes_all() {
        assert_eq!(parse("del"), Some(Command::DeleteBreakpoint { index: None }));
        assert_eq!(parse("delete 3"), Some(Command::DeleteBreakpoint { index: Some(3) }));
    }
}
