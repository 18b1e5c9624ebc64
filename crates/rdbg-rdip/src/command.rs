//
// command.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The RDIP command grammar. One line of client input can carry several
// commands separated by `;`, `\r` or `\n`; the caller is expected to split
// on that before calling `parse`. Matching is case-insensitive, mirroring
// the original tool's willingness to accept `B`, `b`, `break` or `Break`
// interchangeably.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddBreakpoint { file: String, line: u32, condition: Option<String> },
    ListBreakpoints,
    SetCondition { index: u32, condition: Option<String> },
    DeleteBreakpoint { index: Option<u32> },
    EnableBreakpoints { enable: bool, indices: Vec<u32> },
    Continue,
    Finish,
    Next,
    Pause,
    Quit,
    Start,
    Step,
    Frame { index: Option<u32> },
    ThreadList,
    Where,
    Eval { expr: String },
    VarInspect { expr: String },
    VarGlobal,
    VarInstance { object_id: u64 },
    VarLocal,
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
    add_breakpoint_re   = r"(?i)^b(?:reak)?\s+(.+?):(\d+)(?:\s+if\s+(.+))?$";
    list_breakpoints_re = r"(?i)^(?:info\s*)?b(?:reak)?$";
    condition_re        = r"(?i)^cond(?:ition)?\s+(\d+)(?:\s+(.+))?$";
    delete_breakpoint_re = r"(?i)^del(?:ete)?(?:\s+(\d+))?$";
    enable_breakpoint_re = r"(?i)^(en|dis)(?:able)?\s+breakpoints((?:\s+\d+)+)$";
    continue_re          = r"(?i)^c(?:ont(?:inue)?)?$";
    finish_re            = r"(?i)^fin(?:ish)?$";
    next_re              = r"(?i)^n(?:ext)?$";
    pause_re             = r"(?i)^(?:pause|interrupt)$";
    quit_re              = r"(?i)^(?:q(?:uit)?|exit)$";
    start_re             = r"(?i)^start$";
    step_re              = r"(?i)^s(?:tep)?$";
    frame_re             = r"(?i)^f(?:rame)?(?:\s+(\d+))?$";
    thread_list_re       = r"(?i)^th(?:read)?\s*list$";
    where_re             = r"(?i)^(?:w(?:here)?|bt|backtrace)$";
    eval_re              = r"(?i)^(?:p|e(?:val)?)\s+(.+)$";
    var_inspect_re       = r"(?i)^v(?:ar)?\s+inspect\s+(.+)$";
    var_global_re        = r"(?i)^v(?:ar)?\s+g(?:lobal)?$";
    var_instance_re      = r"(?i)^v(?:ar)?\s+i(?:nstance)?\s+(?:0x)?([0-9A-Fa-f]+)$";
    var_local_re         = r"(?i)^v(?:ar)?\s+l(?:ocal)?$";
}

/// Parses a single (already trimmed, already split on `[;\r\n]+`) command
/// line. Returns `None` for blank input or anything unrecognized.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = add_breakpoint_re().captures(line) {
        return Some(Command::AddBreakpoint {
            file: caps[1].trim().to_string(),
            line: caps[2].parse().ok()?,
            condition: caps.get(3).map(|m| m.as_str().trim().to_string()),
        });
    }
    if list_breakpoints_re().is_match(line) {
        return Some(Command::ListBreakpoints);
    }
    if let Some(caps) = condition_re().captures(line) {
        return Some(Command::SetCondition {
            index: caps[1].parse().ok()?,
            condition: caps.get(2).map(|m| m.as_str().trim().to_string()),
        });
    }
    if let Some(caps) = delete_breakpoint_re().captures(line) {
        return Some(Command::DeleteBreakpoint { index: caps.get(1).and_then(|m| m.as_str().parse().ok()) });
    }
    if let Some(caps) = enable_breakpoint_re().captures(line) {
        let indices = caps[2].split_whitespace().filter_map(|s| s.parse().ok()).collect();
        return Some(Command::EnableBreakpoints { enable: caps[1].eq_ignore_ascii_case("en"), indices });
    }
    if continue_re().is_match(line) {
        return Some(Command::Continue);
    }
    if finish_re().is_match(line) {
        return Some(Command::Finish);
    }
    if next_re().is_match(line) {
        return Some(Command::Next);
    }
    if pause_re().is_match(line) {
        return Some(Command::Pause);
    }
    if quit_re().is_match(line) {
        return Some(Command::Quit);
    }
    if start_re().is_match(line) {
        return Some(Command::Start);
    }
    if step_re().is_match(line) {
        return Some(Command::Step);
    }
    if let Some(caps) = frame_re().captures(line) {
        return Some(Command::Frame { index: caps.get(1).and_then(|m| m.as_str().parse().ok()) });
    }
    if thread_list_re().is_match(line) {
        return Some(Command::ThreadList);
    }
    if where_re().is_match(line) {
        return Some(Command::Where);
    }
    if let Some(caps) = var_instance_re().captures(line) {
        return Some(Command::VarInstance { object_id: u64::from_str_radix(&caps[1], 16).ok()? });
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

    None
}

/// Splits a raw chunk of socket input into individual command lines.
pub fn split_commands(chunk: &str) -> Vec<String> {
    static SEP: OnceLock<Regex> = OnceLock::new();
    let sep = SEP.get_or_init(|| Regex::new(r"[;\r\n]+").unwrap());
    sep.split(chunk).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_breakpoint_with_and_without_condition() {
        assert_eq!(
            parse("b foo.rb:12"),
            Some(Command::AddBreakpoint { file: "foo.rb".into(), line: 12, condition: None })
        );
        assert_eq!(
            parse("break /a/foo.rb:12 if x > 1"),
            Some(Command::AddBreakpoint { file: "/a/foo.rb".into(), line: 12, condition: Some("x > 1".into()) })
        );
    }

    #[test]
    fn command_matching_is_case_insensitive() {
        assert_eq!(parse("CONT"), Some(Command::Continue));
        assert_eq!(parse("Cont"), Some(Command::Continue));
    }

    #[test]
    fn parses_enable_disable_with_multiple_indices() {
        assert_eq!(
            parse("dis breakpoints 1 2 3"),
            Some(Command::EnableBreakpoints { enable: false, indices: vec![1, 2, 3] })
        );
    }

    #[test]
    fn var_instance_is_tried_before_the_bare_var_forms() {
        assert_eq!(parse("v inst 0x1234"), Some(Command::VarInstance { object_id: 0x1234 }));
        assert_eq!(parse("v global"), Some(Command::VarGlobal));
        assert_eq!(parse("v local"), Some(Command::VarLocal));
    }

    #[test]
    fn unknown_commands_return_none() {
        assert_eq!(parse("wat"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn split_commands_handles_multiple_separators() {
        assert_eq!(split_commands("b a.rb:1;cont\r\nstep"), vec!["b a.rb:1", "cont", "step"]);
    }
}
