//! One-page PDF rendering of a recipe.
//!
//! Produces a plain PDF 1.4 document using the standard Helvetica fonts:
//! the recipe name as a 16pt title, then the `Ingredients:` and
//! `Instructions:` headings with their text at 12pt. Text that runs past
//! the bottom margin is dropped.

use std::fmt::Write;

use recipebox_core::RecipeFields;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const TITLE_SIZE: u32 = 16;
const BODY_SIZE: u32 = 12;
/// Characters per line before wrapping at 12pt Helvetica on a Letter page.
const WRAP_COLUMNS: usize = 85;

enum Line {
    Title(String),
    Heading(&'static str),
    Body(String),
    Gap,
}

impl Line {
    const fn advance(&self) -> u32 {
        match self {
            Self::Title(_) => TITLE_SIZE + 8,
            Self::Heading(_) | Self::Body(_) => BODY_SIZE + 4,
            Self::Gap => BODY_SIZE,
        }
    }
}

/// Render a recipe as a complete PDF document.
pub fn render_recipe(recipe: &RecipeFields) -> Vec<u8> {
    let mut lines = vec![Line::Title(recipe.name.clone()), Line::Gap];
    lines.push(Line::Heading("Ingredients:"));
    lines.extend(wrap_block(&recipe.ingredients).map(Line::Body));
    lines.push(Line::Gap);
    lines.push(Line::Heading("Instructions:"));
    lines.extend(wrap_block(&recipe.instructions).map(Line::Body));

    let content = content_stream(&lines);
    assemble(&content)
}

fn wrap_block(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines().flat_map(|line| wrap_line(line, WRAP_COLUMNS))
}

fn wrap_line(line: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    out.push(current);
    out
}

fn content_stream(lines: &[Line]) -> Vec<u8> {
    let mut stream = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        let (font, size, text) = match line {
            Line::Title(text) => ("F2", TITLE_SIZE, text.as_str()),
            Line::Heading(text) => ("F2", BODY_SIZE, *text),
            Line::Body(text) => ("F1", BODY_SIZE, text.as_str()),
            Line::Gap => {
                y = y.saturating_sub(line.advance());
                continue;
            }
        };
        if y < MARGIN {
            break;
        }
        stream.extend_from_slice(format!("BT /{font} {size} Tf {MARGIN} {y} Td (").as_bytes());
        stream.extend(escape_text(text));
        stream.extend_from_slice(b") Tj ET\n");
        y = y.saturating_sub(line.advance());
    }
    stream
}

/// Escape a string for a PDF literal, encoding it as Latin-1. Characters
/// outside Latin-1 become `?`; control characters become spaces.
fn escape_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.extend_from_slice(b"\\\\"),
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            c if c.is_control() => out.push(b' '),
            c => out.push(u8::try_from(u32::from(c)).unwrap_or(b'?')),
        }
    }
    out
}

fn assemble(content: &[u8]) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len() + 1);

    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!("{} 0 obj\n<< /Length {} >>\nstream\n", objects.len() + 1, content.len()).as_bytes(),
    );
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        let _ = write!(xref, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        offsets.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

/// Download file name for a recipe: `<name>.pdf` with quotes, path
/// separators and control characters replaced.
pub fn file_name(recipe_name: &str) -> String {
    let cleaned: String = recipe_name
        .trim()
        .chars()
        .map(|c| match c {
            '"' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if cleaned.is_empty() { "recipe" } else { cleaned.as_str() };
    format!("{stem}.pdf")
}

/// `Content-Disposition` value with an ASCII fallback name and an
/// RFC 5987 UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
