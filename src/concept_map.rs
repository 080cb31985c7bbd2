//! Concept map: a topic with four subtopic branches, drawn as standalone SVG.

use std::f64::consts::PI;
use std::fmt::Write as _;

use markdown::{mdast, to_mdast, ParseOptions};
use unicode_width::UnicodeWidthStr;

pub const BRANCH_COUNT: usize = 4;

const CANVAS: f64 = 600.0;
const RADIUS: f64 = 200.0;
const NODE_HEIGHT: f64 = 44.0;
const CHAR_WIDTH: f64 = 9.0;
const NODE_PADDING: f64 = 24.0;
const NODE_FILL: &str = "skyblue";
const EDGE_STROKE: &str = "purple";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptMap {
    pub root: String,
    pub branches: Vec<String>,
}

impl ConceptMap {
    /// The first four non-empty answer lines become branches, list markers and
    /// inline markdown stripped. Missing branches are `Subtopic N`.
    #[must_use]
    pub fn from_answer(topic: &str, answer: &str) -> Self {
        let mut branches: Vec<String> = answer
            .lines()
            .map(branch_label)
            .filter(|label| !label.is_empty())
            .take(BRANCH_COUNT)
            .collect();

        for n in branches.len() + 1..=BRANCH_COUNT {
            branches.push(format!("Subtopic {n}"));
        }

        Self {
            root: topic.trim().to_string(),
            branches,
        }
    }

    /// Radial layout: root in the centre, branches evenly around it.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let center = CANVAS / 2.0;
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}" font-family="sans-serif" font-size="14">"#,
            size = CANVAS
        );

        let positions: Vec<(f64, f64)> = (0..self.branches.len())
            .map(|index| {
                let angle = -PI / 2.0 + 2.0 * PI * index as f64 / self.branches.len() as f64;
                (center + RADIUS * angle.cos(), center + RADIUS * angle.sin())
            })
            .collect();

        for (x, y) in &positions {
            let _ = writeln!(
                svg,
                r#"  <line x1="{center:.1}" y1="{center:.1}" x2="{x:.1}" y2="{y:.1}" stroke="{EDGE_STROKE}" stroke-width="2"/>"#
            );
        }

        write_node(&mut svg, center, center, &self.root);
        for ((x, y), label) in positions.iter().zip(&self.branches) {
            write_node(&mut svg, *x, *y, label);
        }

        svg.push_str("</svg>\n");
        svg
    }
}

fn write_node(svg: &mut String, x: f64, y: f64, label: &str) {
    let width = UnicodeWidthStr::width(label) as f64 * CHAR_WIDTH + NODE_PADDING;
    let _ = writeln!(
        svg,
        r#"  <rect x="{:.1}" y="{:.1}" width="{width:.1}" height="{NODE_HEIGHT:.1}" rx="22" fill="{NODE_FILL}"/>"#,
        x - width / 2.0,
        y - NODE_HEIGHT / 2.0,
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{x:.1}" y="{y:.1}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        escape_xml(label)
    );
}

fn branch_label(line: &str) -> String {
    let line = strip_list_marker(line.trim());
    match to_mdast(line, &ParseOptions::gfm()) {
        Ok(node) => {
            let mut text = String::new();
            collect_text(&node, &mut text);
            text.trim().to_string()
        }
        Err(_) => line.to_string(),
    }
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
        .or_else(|| line.strip_prefix("• "))
    {
        return rest.trim_start();
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }

    line.trim_start_matches('#').trim_start()
}

fn collect_text(node: &mdast::Node, out: &mut String) {
    match node {
        mdast::Node::Text(text) => out.push_str(&text.value),
        mdast::Node::InlineCode(code) => out.push_str(&code.value),
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_text(child, out);
                }
            }
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_four_lines_become_branches() {
        let map = ConceptMap::from_answer(
            " Photosynthesis ",
            "1. **Light reactions**\n\n- Calvin cycle\n* Chlorophyll\nStomata\nExtra line\n",
        );

        assert_eq!(map.root, "Photosynthesis");
        assert_eq!(
            map.branches,
            vec!["Light reactions", "Calvin cycle", "Chlorophyll", "Stomata"]
        );
    }

    #[test]
    fn short_answers_are_padded_with_placeholders() {
        let map = ConceptMap::from_answer("Cells", "Nucleus\n");

        assert_eq!(map.branches, vec!["Nucleus", "Subtopic 2", "Subtopic 3", "Subtopic 4"]);
        assert_eq!(
            ConceptMap::from_answer("Cells", "").branches,
            vec!["Subtopic 1", "Subtopic 2", "Subtopic 3", "Subtopic 4"]
        );
    }

    #[test]
    fn svg_draws_root_branches_and_edges() {
        let map = ConceptMap::from_answer("Acids & <Bases>", "pH\nIndicators\nSalts\nBuffers");

        let svg = map.to_svg();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<line ").count(), 4);
        assert_eq!(svg.matches("<rect ").count(), 5);
        assert!(svg.contains("Acids &amp; &lt;Bases&gt;"));
        assert!(svg.contains(">Buffers</text>"));
    }
}
