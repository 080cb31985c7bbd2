//! Slide deck (`.pptx`) text.
//!
//! Slides are visited in presentation order and, within a slide, top-level
//! shapes in document order. Shape texts are concatenated with nothing in
//! between, so the last line of one shape runs into the first line of the next.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|error| error.to_string())?;

    let mut text = String::new();
    for path in slide_paths(&mut archive)? {
        let xml = read_part(&mut archive, &path)?;
        text.push_str(&slide_text(&xml).map_err(|reason| format!("{path}: {reason}"))?);
    }
    Ok(text)
}

fn slide_paths(archive: &mut Archive<'_>) -> Result<Vec<String>, String> {
    if let Some(ordered) = presentation_order(archive) {
        return Ok(ordered);
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            Some((number.parse().ok()?, name.to_string()))
        })
        .collect();
    if numbered.is_empty() {
        return Err("no slides found".to_string());
    }

    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// Slide parts listed by `p:sldIdLst`, or `None` when the package does not say.
fn presentation_order(archive: &mut Archive<'_>) -> Option<Vec<String>> {
    let presentation = read_part(archive, PRESENTATION_PART).ok()?;
    let relationships = read_part(archive, PRESENTATION_RELS_PART).ok()?;

    let targets = relationship_targets(&relationships).ok()?;
    let ids = slide_relationship_ids(&presentation).ok()?;

    let paths: Vec<String> = ids
        .iter()
        .filter_map(|id| targets.get(id))
        .map(|target| resolve_target(target))
        .collect();
    (!paths.is_empty()).then_some(paths)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<String, String> {
    let mut part = archive
        .by_name(name)
        .map_err(|error| format!("{name}: {error}"))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|error| format!("{name}: {error}"))?;
    Ok(xml)
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event().map_err(|error| error.to_string())? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attribute(&element, b"Id"), attribute(&element, b"Target"))
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

fn slide_relationship_ids(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event().map_err(|error| error.to_string())? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"sldId" =>
            {
                if let Some(id) = attribute(&element, b"r:id") {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Text of one slide's top-level shapes. Paragraphs inside a shape are joined
/// with `\n`, line breaks become `\n`.
fn slide_text(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    // Depth of the shape currently being read and whether it has a paragraph yet.
    let mut shape: Option<(usize, bool)> = None;

    loop {
        match reader.read_event().map_err(|error| error.to_string())? {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                if shape.is_none()
                    && name == b"sp"
                    && path.last().map(Vec::as_slice) == Some(b"spTree".as_slice())
                {
                    shape = Some((path.len(), false));
                } else if name == b"p" && in_text_body(&path) {
                    start_paragraph(&mut shape, &mut text);
                }
                path.push(name);
            }
            Event::Empty(element) => {
                if shape.is_some() {
                    match element.local_name().as_ref() {
                        b"p" if in_text_body(&path) => start_paragraph(&mut shape, &mut text),
                        b"br" if in_paragraph(&path) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::End(_) => {
                path.pop();
                if matches!(shape, Some((depth, _)) if depth == path.len()) {
                    shape = None;
                }
            }
            Event::Text(content) if shape.is_some() && in_run_text(&path) => {
                text.push_str(&content.decode().map_err(|error| error.to_string())?);
            }
            Event::CData(content) if shape.is_some() && in_run_text(&path) => {
                text.push_str(&String::from_utf8_lossy(&content));
            }
            Event::GeneralRef(reference) if shape.is_some() && in_run_text(&path) => {
                if let Some(ch) = reference
                    .resolve_char_ref()
                    .map_err(|error| error.to_string())?
                {
                    text.push(ch);
                } else {
                    let name = reference.decode().map_err(|error| error.to_string())?;
                    match resolve_predefined_entity(&name) {
                        Some(resolved) => text.push_str(resolved),
                        None => return Err(format!("unknown entity &{name};")),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

fn start_paragraph(shape: &mut Option<(usize, bool)>, text: &mut String) {
    if let Some((_, seen_paragraph)) = shape {
        if *seen_paragraph {
            text.push('\n');
        }
        *seen_paragraph = true;
    }
}

fn in_text_body(path: &[Vec<u8>]) -> bool {
    path.last().map(Vec::as_slice) == Some(b"txBody".as_slice())
}

fn in_paragraph(path: &[Vec<u8>]) -> bool {
    path.last().map(Vec::as_slice) == Some(b"p".as_slice())
}

fn in_run_text(path: &[Vec<u8>]) -> bool {
    path.last().map(Vec::as_slice) == Some(b"t".as_slice())
}
