//
// source.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The source table: a mirror of the files the runtime has loaded, kept so
// the engine can resolve bare filenames to full paths and serve the `list`
// command's code window without calling back into the runtime for every
// request. Only populated for clients that need it -- an IDE client sends
// breakpoints against full paths it already knows, so the engine skips
// mirroring for it entirely (see `Engine::mirror_sources`).

use std::collections::HashMap;

#[derive(Default)]
pub struct SourceTable {
    files: HashMap<String, Vec<String>>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self { files: HashMap::new() }
    }

    pub fn insert(&mut self, path: String, lines: Vec<String>) {
        self.files.entry(path).or_insert(lines);
    }

    /// Merges in everything the runtime currently has loaded. Existing
    /// entries are left alone: a file's line count shouldn't change out
    /// from under an already-resolved breakpoint.
    pub fn refresh(&mut self, loaded: Vec<(String, Vec<String>)>) {
        for (path, lines) in loaded {
            self.insert(path, lines);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.files.iter()
    }

    pub fn line_count(&self, path: &str) -> Option<usize> {
        self.files.get(path).map(Vec::len)
    }

    pub fn lines(&self, path: &str) -> Option<&[String]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// A window of `(line_number, text)` pairs, 1-based, centered on
    /// `center` with `before`/`after` lines of context on either side.
    /// Clamped to the file's actual extent.
    pub fn code_window(&self, path: &str, center: usize, before: usize, after: usize) -> Vec<(usize, String)> {
        let Some(lines) = self.lines(path) else { return Vec::new() };
        let start = center.saturating_sub(before).max(1);
        let end = (center + after).min(lines.len());
        (start..=end).filter_map(|n| lines.get(n - 1).map(|text| (n, text.clone()))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_does_not_overwrite_existing_entries() {
        let mut table = SourceTable::new();
        table.insert("a.rb".into(), vec!["one".into()]);
        table.refresh(vec![("a.rb".into(), vec!["one".into(), "two".into()])]);
        assert_eq!(table.line_count("a.rb"), Some(1));
    }

    #[test]
    fn code_window_clamps_to_file_bounds() {
        let mut table = SourceTable::new();
        table.insert("a.rb".into(), vec!["1".into(), "2".into(), "3".into()]);
        let window = table.code_window("a.rb", 1, 5, 5);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0], (1, "1".into()));
    }
}
