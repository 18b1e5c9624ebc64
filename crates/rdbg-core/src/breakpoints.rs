//
// breakpoints.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The breakpoint store. Breakpoints are keyed primarily by (line, file)
// for lookup from the trace state machine, which only ever knows "we're
// at this file, this line" and needs an answer in O(log n); the index is
// a secondary key used only by the protocol layer (`cond 3`, `del 3`, ...)
// and by the settings file, so a linear scan to find it is fine.
//
// A breakpoint set against a file the runtime hasn't loaded yet (or a bare
// basename typed at a console) starts out unresolved. Resolution is
// case-insensitive substring matching against the source table, same as
// the original tool: "foo.rb" resolves against "/long/path/to/foo.rb".

use std::collections::BTreeMap;

use crate::source::SourceTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub index: u32,
    pub file: String,
    pub line: u32,
    pub enabled: bool,
    pub condition: String,
}

impl Breakpoint {
    pub fn new(file: String, line: u32) -> Self {
        Self { index: 0, file, line, enabled: true, condition: String::new() }
    }
}

#[derive(Default)]
pub struct BreakpointStore {
    resolved: BTreeMap<u32, BTreeMap<String, Breakpoint>>,
    unresolved: Vec<Breakpoint>,
    next_index: u32,
}

impl BreakpointStore {
    pub fn new() -> Self {
        Self { resolved: BTreeMap::new(), unresolved: Vec::new(), next_index: 1 }
    }

    /// Adds `bp`, or merges it into an existing breakpoint at the same
    /// (file, line). `assume_resolved` lets a caller that already knows the
    /// file path is exact (an IDE client, which always sends full paths)
    /// skip the substring-match attempt. Returns the breakpoint's index.
    pub fn add(&mut self, mut bp: Breakpoint, assume_resolved: bool, sources: &SourceTable) -> u32 {
        if let Some(existing) = self.find_mut(&bp.file, bp.line) {
            existing.enabled = bp.enabled;
            existing.condition = bp.condition.clone();
            return existing.index;
        }

        bp.index = self.next_index;
        self.next_index += 1;

        let resolved = assume_resolved || resolve(&mut bp, sources);
        if resolved {
            self.resolved.entry(bp.line).or_default().insert(bp.file.clone(), bp.clone());
        } else {
            self.unresolved.push(bp.clone());
        }
        bp.index
    }

    fn find_mut(&mut self, file: &str, line: u32) -> Option<&mut Breakpoint> {
        if let Some(bp) = self.resolved.get_mut(&line).and_then(|by_file| by_file.get_mut(file)) {
            return Some(bp);
        }
        self.unresolved.iter_mut().find(|bp| bp.file == file && bp.line == line)
    }

    pub fn remove(&mut self, index: u32) -> bool {
        let before_unresolved = self.unresolved.len();
        self.unresolved.retain(|bp| bp.index != index);
        if self.unresolved.len() != before_unresolved {
            return true;
        }
        for by_file in self.resolved.values_mut() {
            if let Some(file) = by_file.iter().find(|(_, bp)| bp.index == index).map(|(f, _)| f.clone()) {
                by_file.remove(&file);
                return true;
            }
        }
        false
    }

    pub fn remove_all(&mut self) {
        self.resolved.clear();
        self.unresolved.clear();
    }

    pub fn enable(&mut self, index: u32, enabled: bool) -> bool {
        self.with_breakpoint_mut(index, |bp| bp.enabled = enabled)
    }

    pub fn set_condition(&mut self, index: u32, condition: String) -> bool {
        self.with_breakpoint_mut(index, |bp| bp.condition = condition)
    }

    fn with_breakpoint_mut(&mut self, index: u32, f: impl FnOnce(&mut Breakpoint)) -> bool {
        if let Some(bp) = self.unresolved.iter_mut().find(|bp| bp.index == index) {
            f(bp);
            return true;
        }
        for by_file in self.resolved.values_mut() {
            if let Some(bp) = by_file.values_mut().find(|bp| bp.index == index) {
                f(bp);
                return true;
            }
        }
        false
    }

    /// All breakpoints, resolved and unresolved, sorted ascending by index.
    pub fn list(&self) -> Vec<Breakpoint> {
        let mut all: Vec<Breakpoint> = self.resolved.values().flat_map(|m| m.values().cloned()).collect();
        all.extend(self.unresolved.iter().cloned());
        all.sort_by_key(|bp| bp.index);
        all
    }

    pub fn list_resolved(&self) -> Vec<Breakpoint> {
        self.resolved.values().flat_map(|m| m.values().cloned()).collect()
    }

    pub fn list_unresolved(&self) -> Vec<Breakpoint> {
        self.unresolved.clone()
    }

    pub fn lookup(&self, file: &str, line: u32) -> Option<Breakpoint> {
        self.resolved.get(&line)?.get(file).cloned()
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Attempts to resolve every unresolved breakpoint against `sources`.
    /// Returns whether anything newly resolved (a caller uses this to
    /// decide whether a settings write is warranted).
    pub fn resolve_all(&mut self, sources: &SourceTable) -> bool {
        let mut newly_resolved = Vec::new();
        self.unresolved.retain_mut(|bp| {
            if resolve(bp, sources) {
                newly_resolved.push(bp.clone());
                false
            } else {
                true
            }
        });
        let any = !newly_resolved.is_empty();
        for bp in newly_resolved {
            self.resolved.entry(bp.line).or_default().insert(bp.file.clone(), bp);
        }
        any
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Restores state from a settings load. `next_index` is persisted
    /// explicitly rather than re-derived from the loaded breakpoints, so
    /// that deleting every breakpoint and adding new ones before the next
    /// save still produces indices the user hasn't seen reused.
    pub fn load(&mut self, resolved: Vec<Breakpoint>, unresolved: Vec<Breakpoint>, next_index: u32) {
        self.resolved.clear();
        self.unresolved.clear();
        let max_loaded = resolved.iter().chain(unresolved.iter()).map(|bp| bp.index).max().unwrap_or(0);
        for bp in resolved {
            self.resolved.entry(bp.line).or_default().insert(bp.file.clone(), bp);
        }
        self.unresolved = unresolved;
        self.next_index = next_index.max(max_loaded + 1).max(1);
    }
}

fn resolve(bp: &mut Breakpoint, sources: &SourceTable) -> bool {
    let needle = bp.file.to_lowercase();
    for (path, lines) in sources.iter() {
        if path.to_lowercase().contains(&needle) && lines.len() as u32 >= bp.line {
            bp.file = path.clone();
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources_with(file: &str, line_count: usize) -> SourceTable {
        let mut sources = SourceTable::new();
        sources.insert(file.to_string(), vec![String::new(); line_count]);
        sources
    }

    #[test]
    fn add_assigns_increasing_indices() {
        let mut store = BreakpointStore::new();
        let sources = SourceTable::new();
        let a = store.add(Breakpoint::new("a.rb".into(), 1), true, &sources);
        let b = store.add(Breakpoint::new("b.rb".into(), 2), true, &sources);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn add_on_same_location_merges_instead_of_duplicating() {
        let mut store = BreakpointStore::new();
        let sources = SourceTable::new();
        let first = store.add(Breakpoint::new("a.rb".into(), 10), true, &sources);
        let mut second = Breakpoint::new("a.rb".into(), 10);
        second.condition = "x > 1".into();
        let merged = store.add(second, true, &sources);
        assert_eq!(first, merged);
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].condition, "x > 1");
    }

    #[test]
    fn unresolved_breakpoint_resolves_by_substring_once_source_seen() {
        let mut store = BreakpointStore::new();
        let empty = SourceTable::new();
        store.add(Breakpoint::new("foo.rb".into(), 5), false, &empty);
        assert!(store.has_unresolved());

        let seen = sources_with("/project/lib/foo.rb", 10);
        assert!(store.resolve_all(&seen));
        assert!(!store.has_unresolved());
        assert_eq!(store.lookup("/project/lib/foo.rb", 5).unwrap().file, "/project/lib/foo.rb");
    }

    #[test]
    fn resolution_is_idempotent_once_matched() {
        let mut store = BreakpointStore::new();
        let seen = sources_with("/project/lib/foo.rb", 10);
        store.add(Breakpoint::new("foo.rb".into(), 5), false, &seen);
        assert!(!store.has_unresolved());
        assert!(!store.resolve_all(&seen));
    }

    #[test]
    fn remove_all_clears_both_collections() {
        let mut store = BreakpointStore::new();
        let sources = SourceTable::new();
        store.add(Breakpoint::new("a.rb".into(), 1), true, &sources);
        store.add(Breakpoint::new("unresolved.rb".into(), 2), false, &sources);
        store.remove_all();
        assert!(store.list().is_empty());
        assert!(!store.has_unresolved());
    }

    #[test]
    fn load_advances_next_index_past_max_loaded() {
        let mut store = BreakpointStore::new();
        let mut bp = Breakpoint::new("a.rb".into(), 1);
        bp.index = 7;
        store.load(vec![bp], vec![], 3);
        assert_eq!(store.next_index(), 8);
    }
}
