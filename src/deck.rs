//! One-slide `.pptx` decks for the notes-to-slides feature.
//!
//! The package carries the smallest part set presentation software accepts: a
//! master, one layout, a theme and a single title-and-body slide.

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const NOTES_DECK_TITLE: &str = "AI Notes";
pub const NOTES_DECK_FILE: &str = "notes.pptx";

const NS: &str = concat!(
    "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
    "xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\""
);
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const CONTENT_TYPES: &str = concat!(
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>",
    "<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>",
    "<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>",
    "<Override PartName=\"/ppt/slides/slide1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
    "<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>",
    "</Types>"
);

const EMPTY_TREE: &str = concat!(
    "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
    "<p:grpSpPr/>"
);

const CLR_MAP: &str = concat!(
    "<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" ",
    "accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" ",
    "accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>"
);

const SOLID_FILL: &str = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to build slide deck: {0}")]
    Package(#[from] ZipError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds a deck whose only slide has `title` and one body paragraph per line
/// of `body`.
pub fn notes_deck(title: &str, body: &str) -> Result<Vec<u8>, ZipError> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        (
            "_rels/.rels",
            relationships(&[("officeDocument", "ppt/presentation.xml")]),
        ),
        ("ppt/presentation.xml", presentation()),
        (
            "ppt/_rels/presentation.xml.rels",
            relationships(&[
                ("slideMaster", "slideMasters/slideMaster1.xml"),
                ("slide", "slides/slide1.xml"),
                ("theme", "theme/theme1.xml"),
            ]),
        ),
        ("ppt/slideMasters/slideMaster1.xml", slide_master()),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            relationships(&[
                ("slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("theme", "../theme/theme1.xml"),
            ]),
        ),
        ("ppt/slideLayouts/slideLayout1.xml", slide_layout()),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            relationships(&[("slideMaster", "../slideMasters/slideMaster1.xml")]),
        ),
        ("ppt/slides/slide1.xml", slide(title, body)),
        (
            "ppt/slides/_rels/slide1.xml.rels",
            relationships(&[("slideLayout", "../slideLayouts/slideLayout1.xml")]),
        ),
        ("ppt/theme/theme1.xml", theme()),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, xml) in parts {
        writer.start_file(name, FileOptions::default())?;
        writer.write_all(XML_DECL.as_bytes())?;
        writer.write_all(xml.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Writes [`notes_deck`] to `path`, replacing any existing file.
pub fn write_notes_deck(path: &Path, title: &str, body: &str) -> Result<(), DeckError> {
    let bytes = notes_deck(title, body)?;
    fs::write(path, bytes).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "notes deck written");
    Ok(())
}

fn relationships(targets: &[(&str, &str)]) -> String {
    let entries: String = targets
        .iter()
        .enumerate()
        .map(|(index, (kind, target))| {
            format!(
                "<Relationship Id=\"rId{}\" Type=\"{REL}/{kind}\" Target=\"{target}\"/>",
                index + 1
            )
        })
        .collect();
    format!(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{entries}</Relationships>"
    )
}

fn presentation() -> String {
    format!(
        concat!(
            "<p:presentation {}>",
            "<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>",
            "<p:sldIdLst><p:sldId id=\"256\" r:id=\"rId2\"/></p:sldIdLst>",
            "<p:sldSz cx=\"9144000\" cy=\"6858000\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/>",
            "</p:presentation>"
        ),
        NS
    )
}

fn slide_master() -> String {
    format!(
        concat!(
            "<p:sldMaster {}><p:cSld><p:spTree>{}</p:spTree></p:cSld>{}",
            "<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>",
            "</p:sldMaster>"
        ),
        NS, EMPTY_TREE, CLR_MAP
    )
}

fn slide_layout() -> String {
    format!(
        concat!(
            "<p:sldLayout {} type=\"obj\"><p:cSld name=\"Title and Content\">",
            "<p:spTree>{}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        NS, EMPTY_TREE
    )
}

fn slide(title: &str, body: &str) -> String {
    let title_shape = shape(
        2,
        "Title 1",
        "<p:ph type=\"title\"/>",
        (457_200, 274_638, 8_229_600, 1_143_000),
        &paragraph(title),
    );
    let body_paragraphs: String = body.lines().map(paragraph).collect();
    let body_shape = shape(
        3,
        "Content Placeholder 2",
        "<p:ph idx=\"1\"/>",
        (457_200, 1_600_200, 8_229_600, 4_525_963),
        &body_paragraphs,
    );
    format!(
        "<p:sld {NS}><p:cSld><p:spTree>{EMPTY_TREE}{title_shape}{body_shape}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
    )
}

fn shape(
    id: u32,
    name: &str,
    placeholder: &str,
    (x, y, cx, cy): (u32, u32, u32, u32),
    paragraphs: &str,
) -> String {
    format!(
        concat!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/>",
            "<p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr>{placeholder}</p:nvPr></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm></p:spPr>",
            "<p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"
        ),
        id = id,
        name = name,
        placeholder = placeholder,
        x = x,
        y = y,
        cx = cx,
        cy = cy,
        paragraphs = paragraphs
    )
}

/// An empty line becomes an empty paragraph. Control characters XML cannot
/// carry are dropped.
fn paragraph(line: &str) -> String {
    let clean: String = line
        .chars()
        .filter(|ch| *ch == '\t' || !ch.is_control())
        .collect();
    if clean.is_empty() {
        return "<a:p/>".to_string();
    }
    format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(clean.as_str()))
}

fn theme() -> String {
    let color = |slot: &str, rgb: &str| format!("<a:{slot}><a:srgbClr val=\"{rgb}\"/></a:{slot}>");
    let colors: String = [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ]
    .iter()
    .map(|(slot, rgb)| color(slot, rgb))
    .collect();
    let font = "<a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/>";
    let fills = SOLID_FILL.repeat(3);
    let lines = format!("<a:ln w=\"9525\">{SOLID_FILL}</a:ln>").repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);

    format!(
        concat!(
            "<a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Study Buddy\">",
            "<a:themeElements><a:clrScheme name=\"Study Buddy\">",
            "<a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1>",
            "<a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1>{colors}</a:clrScheme>",
            "<a:fontScheme name=\"Study Buddy\"><a:majorFont>{font}</a:majorFont>",
            "<a:minorFont>{font}</a:minorFont></a:fontScheme>",
            "<a:fmtScheme name=\"Study Buddy\"><a:fillStyleLst>{fills}</a:fillStyleLst>",
            "<a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst>",
            "<a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme>",
            "</a:themeElements></a:theme>"
        ),
        colors = colors,
        font = font,
        fills = fills,
        lines = lines,
        effects = effects
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::slides;

    #[test]
    fn deck_reads_back_as_title_then_body_lines() {
        let bytes = notes_deck(NOTES_DECK_TITLE, "Cells & tissues\n\n<b>Osmosis</b>\n")
            .expect("deck should build");

        assert_eq!(
            slides::extract_text(&bytes).expect("deck should be readable"),
            "AI NotesCells & tissues\n\n<b>Osmosis</b>"
        );
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(paragraph("a\u{0}b\tc"), "<a:p><a:r><a:t>ab\tc</a:t></a:r></a:p>");
        assert_eq!(paragraph("\u{7}"), "<a:p/>");
    }

    #[test]
    fn write_fails_with_the_target_path() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("missing").join(NOTES_DECK_FILE);

        match write_notes_deck(&path, NOTES_DECK_TITLE, "body") {
            Err(DeckError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected an io error, got {other:?}"),
        }
    }
}
