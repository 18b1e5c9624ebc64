//
// settings.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// Breakpoint persistence for non-IDE clients (the console UI). The format
// is a small hand-written XML tree, the same shape the original tool's
// property-tree-backed settings file used: a `<resolved>`/`<unresolved>`
// section of `<breakpoint>` elements plus a `<next_index>`. Load failures
// of any kind (missing file, malformed XML, permission error) are swallowed
// and treated as "no saved breakpoints" -- a corrupt settings file should
// never prevent the debugger from starting.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::breakpoints::Breakpoint;

pub fn save_to_string(resolved: &[Breakpoint], unresolved: &[Breakpoint], next_index: u32) -> anyhow::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("breakpoints")))?;

    write_section(&mut writer, "resolved", resolved)?;
    write_section(&mut writer, "unresolved", unresolved)?;

    writer.write_event(Event::Start(BytesStart::new("next_index")))?;
    writer.write_event(Event::Text(BytesText::new(&next_index.to_string())))?;
    writer.write_event(Event::End(quick_xml::events::BytesEnd::new("next_index")))?;

    writer.write_event(Event::End(quick_xml::events::BytesEnd::new("breakpoints")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_section(writer: &mut Writer<Vec<u8>>, name: &str, bps: &[Breakpoint]) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for bp in bps {
        writer.write_event(Event::Start(BytesStart::new("breakpoint")))?;
        write_field(writer, "index", &bp.index.to_string())?;
        write_field(writer, "file", &bp.file)?;
        write_field(writer, "line", &bp.line.to_string())?;
        write_field(writer, "enabled", if bp.enabled { "true" } else { "false" })?;
        write_field(writer, "condition", &bp.condition)?;
        writer.write_event(Event::End(quick_xml::events::BytesEnd::new("breakpoint")))?;
    }
    writer.write_event(Event::End(quick_xml::events::BytesEnd::new(name)))?;
    Ok(())
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(quick_xml::events::BytesEnd::new(name)))?;
    Ok(())
}

pub fn save_to_file(path: &Path, resolved: &[Breakpoint], unresolved: &[Breakpoint], next_index: u32) -> anyhow::Result<()> {
    let xml = save_to_string(resolved, unresolved, next_index)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, xml)?;
    Ok(())
}

/// Returns `(resolved, unresolved, next_index)`, or `None` on any failure.
pub fn load_from_file(path: &Path) -> Option<(Vec<Breakpoint>, Vec<Breakpoint>, u32)> {
    let xml = fs::read_to_string(path).ok()?;
    load_from_str(&xml)
}

pub fn load_from_str(xml: &str) -> Option<(Vec<Breakpoint>, Vec<Breakpoint>, u32)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    let mut next_index = 1u32;

    let mut section: Option<String> = None;
    let mut current: Option<Breakpoint> = None;
    let mut field: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).ok()? {
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                match name.as_str() {
                    "resolved" | "unresolved" => section = Some(name),
                    "breakpoint" => current = Some(Breakpoint::new(String::new(), 0)),
                    "next_index" => field = Some(name),
                    other if current.is_some() => field = Some(other.to_string()),
                    _ => {},
                }
            },
            Event::Text(text) => {
                let value = text.unescape().ok()?.into_owned();
                if let Some(name) = &field {
                    match name.as_str() {
                        "next_index" => next_index = value.parse().unwrap_or(1),
                        "index" => current.as_mut()?.index = value.parse().unwrap_or(0),
                        "file" => current.as_mut()?.file = value,
                        "line" => current.as_mut()?.line = value.parse().unwrap_or(0),
                        "enabled" => current.as_mut()?.enabled = value == "true",
                        "condition" => current.as_mut()?.condition = value,
                        _ => {},
                    }
                }
            },
            Event::End(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                if name == "breakpoint" {
                    if let Some(bp) = current.take() {
                        match section.as_deref() {
                            Some("resolved") => resolved.push(bp),
                            Some("unresolved") => unresolved.push(bp),
                            _ => {},
                        }
                    }
                }
                field = None;
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Some((resolved, unresolved, next_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_xml() {
        let mut resolved_bp = Breakpoint::new("/a/b.rb".into(), 12);
        resolved_bp.index = 3;
        resolved_bp.condition = "x > 1 && y < \"z\"".into();
        let mut unresolved_bp = Breakpoint::new("c.rb".into(), 4);
        unresolved_bp.index = 5;
        unresolved_bp.enabled = false;

        let xml = save_to_string(&[resolved_bp.clone()], &[unresolved_bp.clone()], 6).unwrap();
        let (resolved, unresolved, next_index) = load_from_str(&xml).unwrap();

        assert_eq!(resolved, vec![resolved_bp]);
        assert_eq!(unresolved, vec![unresolved_bp]);
        assert_eq!(next_index, 6);
    }

    #[test]
    fn load_from_file_swallows_missing_file() {
        assert!(load_from_file(Path::new("/nonexistent/settings.xml")).is_none());
    }

    #[test]
    fn load_from_str_swallows_garbage() {
        assert!(load_from_str("not xml at all <<<").is_none());
    }

    #[test]
    fn save_to_file_then_load_from_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("breakpoints.xml");

        let mut bp = Breakpoint::new("/a/b.rb".into(), 7);
        bp.index = 2;
        save_to_file(&path, &[bp.clone()], &[], 3).unwrap();

        let (resolved, unresolved, next_index) = load_from_file(&path).unwrap();
        assert_eq!(resolved, vec![bp]);
        assert!(unresolved.is_empty());
        assert_eq!(next_index, 3);
    }
}
