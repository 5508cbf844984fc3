use anyhow::{Context, Result};
use chrono::Local;
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;
use tracing::info;

// A4 in points, with the text block inset from the top-left corner.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: f32 = 50.0;
const LEADING: f32 = 14.0;

/// Renders a captured HTML fragment to a PDF file on disk.
pub trait PdfRenderer: Send + Sync {
    fn render_html(&self, html: &str, dest: &Path) -> Result<()>;
}

pub struct LopdfRenderer;

impl PdfRenderer for LopdfRenderer {
    fn render_html(&self, html: &str, dest: &Path) -> Result<()> {
        let mut lines = vec![
            format!("Sales results - {}", Local::now().format("%Y-%m-%d")),
            String::new(),
        ];
        lines.extend(html_to_lines(html));

        let mut doc = build_document(&lines);

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        doc.save(dest)
            .with_context(|| format!("Failed to write PDF to {}", dest.display()))?;
        info!(
            "Wrote {} line(s) of results to {}",
            lines.len(),
            dest.display()
        );
        Ok(())
    }
}

/// One page, Helvetica, one text line per extracted HTML line. Lines past
/// the bottom margin are dropped; the sales summary is a short table.
fn build_document(lines: &[String]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let max_lines = ((PAGE_HEIGHT as f32 - 2.0 * MARGIN) / LEADING) as usize;
    let mut content = format!(
        "BT\n/F1 11 Tf\n{LEADING} TL\n{MARGIN} {} Td\n",
        PAGE_HEIGHT as f32 - MARGIN
    );
    for line in lines.iter().take(max_lines) {
        content.push_str(&format!("({}) Tj\nT*\n", escape_pdf_text(line)));
    }
    content.push_str("ET");

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

// Backslash first, then the delimiters.
fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Strips an HTML fragment down to trimmed text lines. Closing block tags
/// and `<br>` become line breaks; the handful of entities the intranet
/// emits are decoded.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if is_block_tag(&tag) {
                    text.push('\n');
                } else {
                    // Inline boundaries still separate words.
                    text.push(' ');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => text.push(ch),
        }
    }

    decode_entities(&text)
        .lines()
        .map(normalize_ws)
        .filter(|line| !line.is_empty())
        .collect()
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(
        name.as_str(),
        "br" | "p" | "div" | "table" | "tr" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4"
    )
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_into_lines() {
        let html = "<table><tr><td>Jane Doe</td><td>200</td></tr>\
                    <tr><td>John &amp; Co</td><td>250</td></tr></table>";
        let lines = html_to_lines(html);
        assert_eq!(lines, vec!["Jane Doe 200", "John & Co 250"]);
    }

    #[test]
    fn decodes_entities_and_breaks() {
        let lines = html_to_lines("a&nbsp;&lt;b&gt;<br>c");
        assert_eq!(lines, vec!["a <b>", "c"]);
    }

    #[test]
    fn escapes_content_stream_delimiters() {
        assert_eq!(escape_pdf_text("(50\\50)"), "\\(50\\\\50\\)");
    }

    #[test]
    fn writes_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out/results.pdf");
        LopdfRenderer
            .render_html("<div>Jane Doe</div>", &dest)
            .unwrap();
        let bytes = std::fs::read(&dest).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
