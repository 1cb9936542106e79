//! Paginated PDF rendition of the text transcript.

use std::path::Path;

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

// A4 portrait, in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 11;

/// Transcript lines that fit on one page.
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Writes `text` to `path` as a monospaced PDF, one page per
/// [`LINES_PER_PAGE`] lines.
pub fn write_pdf(text: &str, path: &Path) -> Result<()> {
    let mut doc = build_document(text)?;
    doc.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn build_document(text: &str) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let lines = text.lines().collect::<Vec<_>>();
    let mut kids = Vec::new();
    for chunk in paginate(&lines) {
        let content = page_content(chunk)
            .encode()
            .context("failed to encode PDF page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Splits lines into pages. An empty transcript still yields one blank page.
pub fn paginate<'a>(lines: &'a [&'a str]) -> Vec<&'a [&'a str]> {
    if lines.is_empty() {
        return vec![lines];
    }
    lines.chunks(LINES_PER_PAGE).collect()
}

fn page_content(lines: &[&str]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new(
            "Td",
            vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
        ),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Encodes a line for the standard Courier font. Status marks become ASCII
/// and anything outside Latin-1 becomes `?`.
fn win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|ch| match ch {
            '✓' => b'+',
            '✗' => b'x',
            ch if (ch as u32) < 0x100 => ch as u32 as u8,
            _ => b'?',
        })
        .collect()
}
