//! A small PDF writer for briefings.
//!
//! Markdown is not interpreted. Emphasis and heading markers are stripped,
//! the text is re-encoded to a single-byte encoding and laid out with the
//! standard Helvetica fonts, so no font needs to be embedded.

use std::io::{self, Write};

use crate::error::ExportError;

/// Title printed at the top of every page.
pub const HEADER_TITLE: &str = "Deep Research Briefing";

// A4 in points, origin at the bottom-left corner.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 28.35;

const HEADER_SIZE: f32 = 12.0;
const HEADER_BASELINE: f32 = PAGE_HEIGHT - MARGIN - HEADER_SIZE;
const HEADER_RULE: f32 = HEADER_BASELINE - 8.0;

const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 15.0;
const BODY_TOP: f32 = HEADER_RULE - 22.0;
const BODY_BOTTOM: f32 = 56.69;
const BODY_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const FOOTER_SIZE: f32 = 8.0;
const FOOTER_BASELINE: f32 = 42.52;

const PLACEHOLDER: u8 = b'?';

// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

// Helvetica advance widths for the WinAnsi upper half, 0xA0..=0xFF.
#[rustfmt::skip]
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Removes every `*` and `#`.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '*' | '#')).collect()
}

/// Encodes `text` to Latin-1.
///
/// Typographic punctuation is folded to its ASCII look-alike, anything else
/// outside the repertoire (emoji, non-Latin scripts, control characters)
/// becomes `?`. Line feeds are kept, carriage returns dropped and tabs
/// expanded to four spaces.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => bytes.push(b'\n'),
            '\r' => {}
            '\t' => bytes.extend_from_slice(b"    "),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => bytes.push(b'\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => bytes.push(b'"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' | '\u{2022}' => {
                bytes.push(b'-')
            }
            '\u{2026}' => bytes.extend_from_slice(b"..."),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => {
                bytes.push(b' ')
            }
            // C0 and C1 controls have no glyph.
            '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}' => bytes.push(PLACEHOLDER),
            c => match u8::try_from(u32::from(c)) {
                Ok(b) => bytes.push(b),
                Err(_) => bytes.push(PLACEHOLDER),
            },
        }
    }
    bytes
}

/// Lays out `text` and returns the PDF document.
pub fn render_pdf(text: &str) -> Result<Vec<u8>, ExportError> {
    let encoded = encode_latin1(&sanitize(text));
    let pages = paginate(wrap(&encoded, BODY_SIZE, BODY_WIDTH));
    trace!("laid out briefing in {} page(s)", pages.len());
    write_document(&pages).map_err(ExportError::Pdf)
}

#[inline]
fn glyph_width(b: u8) -> u16 {
    match b {
        0x20..=0x7E => HELVETICA_WIDTHS[usize::from(b - 0x20)],
        0xA0..=0xFF => HELVETICA_LATIN1_WIDTHS[usize::from(b - 0xA0)],
        _ => 0,
    }
}

#[inline]
fn text_width(bytes: &[u8], size: f32) -> f32 {
    let units: u32 = bytes.iter().map(|&b| u32::from(glyph_width(b))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap, one entry per output line. Blank paragraphs are kept
/// as empty lines and words wider than a line are broken anywhere.
fn wrap(text: &[u8], size: f32, max_width: f32) -> Vec<Vec<u8>> {
    let space_width = text_width(b" ", size);
    let mut lines = Vec::new();
    for paragraph in text.split(|&b| b == b'\n') {
        let mut line = Vec::new();
        let mut line_width = 0.0;
        for word in paragraph.split(|&b| b == b' ') {
            let word_width = text_width(word, size);
            let sep_width = if line.is_empty() { 0.0 } else { space_width };
            if line_width + sep_width + word_width <= max_width {
                if !line.is_empty() {
                    line.push(b' ');
                }
                line.extend_from_slice(word);
                line_width += sep_width + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let mut rest = word;
            while text_width(rest, size) > max_width {
                let split = fitting_prefix(rest, size, max_width);
                lines.push(rest[..split].to_vec());
                rest = &rest[split..];
            }
            line.extend_from_slice(rest);
            line_width = text_width(rest, size);
        }
        lines.push(line);
    }
    lines
}

/// Length of the longest prefix of `word` that fits, but at least 1.
fn fitting_prefix(word: &[u8], size: f32, max_width: f32) -> usize {
    let mut width = 0.0;
    for (idx, &b) in word.iter().enumerate() {
        width += f32::from(glyph_width(b)) * size / 1000.0;
        if width > max_width {
            return idx.max(1);
        }
    }
    word.len()
}

fn paginate(lines: Vec<Vec<u8>>) -> Vec<Vec<Vec<u8>>> {
    let per_page = ((BODY_TOP - BODY_BOTTOM) / LINE_HEIGHT) as usize + 1;
    let mut pages: Vec<Vec<Vec<u8>>> =
        lines.chunks(per_page).map(<[_]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

#[derive(Default)]
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn object(&mut self, body: &[u8]) -> io::Result<()> {
        self.offsets.push(self.buf.len());
        writeln!(self.buf, "{} 0 obj", self.offsets.len())?;
        self.buf.write_all(body)?;
        self.buf.write_all(b"\nendobj\n")
    }

    fn stream_object(&mut self, content: &[u8]) -> io::Result<()> {
        let mut body = format!("<< /Length {} >>\nstream\n", content.len())
            .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\nendstream");
        self.object(&body)
    }

    fn finish(mut self) -> io::Result<Vec<u8>> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        write!(self.buf, "xref\n0 {size}\n0000000000 65535 f \n")?;
        for offset in &self.offsets {
            write!(self.buf, "{offset:010} 00000 n \n")?;
        }
        write!(
            self.buf,
            "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n\
             {xref_offset}\n%%EOF\n"
        )?;
        Ok(self.buf)
    }
}

// Object layout: 1 catalog, 2 page tree, 3..=5 fonts, then a page object
// followed by its content stream for every page.
const FIRST_PAGE_ID: usize = 6;

fn write_document(pages: &[Vec<Vec<u8>>]) -> io::Result<Vec<u8>> {
    let mut doc = PdfWriter::default();
    doc.buf.write_all(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n")?;

    doc.object(b"<< /Type /Catalog /Pages 2 0 R >>")?;
    let kids = (0..pages.len())
        .map(|idx| format!("{} 0 R", FIRST_PAGE_ID + 2 * idx))
        .collect::<Vec<_>>()
        .join(" ");
    doc.object(
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len())
            .as_bytes(),
    )?;
    for font in ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique"] {
        doc.object(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{font} \
                 /Encoding /WinAnsiEncoding >>"
            )
            .as_bytes(),
        )?;
    }

    for (idx, lines) in pages.iter().enumerate() {
        let contents_id = FIRST_PAGE_ID + 2 * idx + 1;
        doc.object(
            format!(
                "<< /Type /Page /Parent 2 0 R \
                 /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >> >> \
                 /Contents {contents_id} 0 R >>"
            )
            .as_bytes(),
        )?;
        doc.stream_object(&page_content(lines, idx + 1)?)?;
    }

    doc.finish()
}

fn page_content(lines: &[Vec<u8>], page_no: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();

    let header = HEADER_TITLE.as_bytes();
    let x = (PAGE_WIDTH - text_width(header, HEADER_SIZE)) / 2.0;
    write_text(&mut out, "F2", HEADER_SIZE, x, HEADER_BASELINE, header)?;
    writeln!(
        out,
        "0.5 w {MARGIN:.2} {HEADER_RULE:.2} m {:.2} {HEADER_RULE:.2} l S",
        PAGE_WIDTH - MARGIN
    )?;

    let mut y = BODY_TOP;
    for line in lines {
        if !line.is_empty() {
            write_text(&mut out, "F1", BODY_SIZE, MARGIN, y, line)?;
        }
        y -= LINE_HEIGHT;
    }

    let footer = format!("Page {page_no}");
    let x = (PAGE_WIDTH - text_width(footer.as_bytes(), FOOTER_SIZE)) / 2.0;
    write_text(
        &mut out,
        "F3",
        FOOTER_SIZE,
        x,
        FOOTER_BASELINE,
        footer.as_bytes(),
    )?;
    Ok(out)
}

fn write_text(
    out: &mut Vec<u8>,
    font: &str,
    size: f32,
    x: f32,
    y: f32,
    text: &[u8],
) -> io::Result<()> {
    write!(out, "BT /{font} {size:.1} Tf {x:.2} {y:.2} Td (")?;
    for &b in text {
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.write_all(b") Tj ET\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count()
    }

    #[test]
    fn test_sanitize() {
        let sanitized = sanitize("## 1. **Executive** Summary\n* item #1");
        assert_eq!(sanitized, " 1. Executive Summary\n item 1");
    }

    #[test]
    fn test_encode_latin1() {
        assert_eq!(encode_latin1("café"), b"caf\xE9");
        assert_eq!(encode_latin1("🚀 漢字"), b"? ??");
        assert_eq!(
            encode_latin1("\u{201C}quoted\u{201D} \u{2014} it\u{2019}s\u{2026}"),
            b"\"quoted\" - it's..."
        );
        assert_eq!(encode_latin1("a\r\n\tb\u{85}"), b"a\n    b?");
    }

    #[test]
    fn test_wrap() {
        let lines = wrap(b"aaa bbb ccc", 10.0, text_width(b"aaa bbb", 10.0));
        assert_eq!(lines, vec![b"aaa bbb".to_vec(), b"ccc".to_vec()]);

        let lines = wrap(b"first\n\nthird", 10.0, 500.0);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_empty());

        let long = vec![b'm'; 200];
        let lines = wrap(&long, BODY_SIZE, BODY_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, BODY_SIZE) <= BODY_WIDTH);
        }
        assert_eq!(lines.iter().map(Vec::len).sum::<usize>(), 200);
    }

    #[test]
    fn test_wrap_accented_capitals() {
        assert_eq!(glyph_width(0xC6), 1000);
        assert_eq!(glyph_width(0xD6), 778);
        assert_eq!(glyph_width(0xE6), 889);

        let text = encode_latin1(&format!(
            "{} {}",
            "\u{C6}".repeat(200),
            "\u{D6}\u{C7}\u{C5} ".repeat(60)
        ));
        let lines = wrap(&text, BODY_SIZE, BODY_WIDTH);
        assert!(lines.len() > 4);
        for line in &lines {
            assert!(text_width(line, BODY_SIZE) <= BODY_WIDTH);
        }
        // 48 glyphs of 11pt at 1000 units fill 528pt of the 538.58pt body.
        assert_eq!(lines[0].len(), 48);
    }

    #[test]
    fn test_markers_are_stripped() {
        let pdf = render_pdf("# Heading\n\n**Bold** and *italic* #tag").unwrap();
        assert_eq!(count(&pdf, b"*"), 0);
        assert_eq!(count(&pdf, b"#"), 0);
        assert_eq!(count(&pdf, b"(Bold and italic tag)"), 1);
    }

    #[test]
    fn test_unrepresentable_characters() {
        let pdf = render_pdf("Rocket 🚀 in 東京, naïve").unwrap();
        assert_eq!(count(&pdf, b"(Rocket ? in ??, na\xEFve)"), 1);
    }

    #[test]
    fn test_escaping() {
        let pdf = render_pdf("f(x) = a\\b").unwrap();
        assert_eq!(count(&pdf, b"(f\\(x\\) = a\\\\b)"), 1);
    }

    #[test]
    fn test_pages_have_header_and_footer() {
        let text = (0..150)
            .map(|i| format!("Line number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pdf = render_pdf(&text).unwrap();

        let pages = count(&pdf, b"/Type /Page ");
        assert!(pages >= 3);
        assert_eq!(count(&pdf, b"(Deep Research Briefing)"), pages);
        for page_no in 1..=pages {
            let footer = format!("(Page {page_no})");
            assert_eq!(count(&pdf, footer.as_bytes()), 1);
        }
        assert_eq!(count(&pdf, format!("/Count {pages}").as_bytes()), 1);
    }

    #[test]
    fn test_document_structure() {
        let pdf = render_pdf("").unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count(&pdf, b"(Page 1)"), 1);

        // The cross-reference table must point at the objects.
        let pos = pdf
            .windows(10)
            .rposition(|window| window == b"startxref\n")
            .unwrap();
        let offset: usize = str::from_utf8(&pdf[pos + 10..])
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        let xref = str::from_utf8(&pdf[offset..]).unwrap();
        assert!(xref.starts_with("xref\n0 8\n"));
        let first_offset: usize =
            xref.lines().nth(3).unwrap()[..10].parse().unwrap();
        assert!(pdf[first_offset..].starts_with(b"1 0 obj\n"));
    }
}
