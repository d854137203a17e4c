//! Single-page PDF report of feedback records.
//!
//! The page is A4 portrait with a header (optional JPEG logo, title, generation
//! time, active search) followed by one table. Rows that do not fit on the page
//! are left out and counted in a note under the table.

use crate::db::Feedback;
use chrono::{NaiveDateTime, Utc};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;

const TITLE_FONT_SIZE: f32 = 16.0;
const META_FONT_SIZE: f32 = 9.0;
const HEADER_FONT_SIZE: f32 = 10.0;
const FONT_SIZE: f32 = 8.5;
const LINE_H: f32 = 10.5;
const CELL_PAD: f32 = 4.0;
const LOGO_H: f32 = 40.0;
const FOOTNOTE_H: f32 = 16.0;
/// Tallest a single row may grow, in text lines.
const MAX_ROW_LINES: usize = 12;
/// Appended to a cell whose text was cut short.
const ELLIPSIS: &str = "...";

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.55;

pub const HEADERS: [&str; 5] = ["ID", "Name", "Email", "Message", "Date"];

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");
const LOGO: Name<'static> = Name(b"Im1");

/// Column widths for a table `printable` points wide: ID 6%, Name 16%,
/// Email 24%, and the rest split 65/35 between Message and Date.
pub fn column_widths(printable: f32) -> [f32; 5] {
    let id = printable * 0.06;
    let name = printable * 0.16;
    let email = printable * 0.24;
    let rest = printable - id - name - email;
    [id, name, email, rest * 0.65, rest * 0.35]
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    logo_path: Option<PathBuf>,
}

impl ReportRenderer {
    pub fn new(logo_path: Option<PathBuf>) -> Self {
        Self { logo_path }
    }

    pub fn render(&self, rows: &[Feedback], search: Option<&str>) -> Vec<u8> {
        self.render_at(rows, search, Utc::now().naive_utc())
    }

    pub fn render_at(
        &self,
        rows: &[Feedback],
        search: Option<&str>,
        generated_at: NaiveDateTime,
    ) -> Vec<u8> {
        let logo = self.load_logo();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let page_id = Ref::new(3);
        let content_id = Ref::new(4);
        let font_id = Ref::new(5);
        let bold_id = Ref::new(6);
        let logo_id = Ref::new(7);

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id).kids([page_id]).count(1);
        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(bold_id)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        if let Some(logo) = &logo {
            let mut image = pdf.image_xobject(logo_id, &logo.data);
            image.filter(Filter::DctDecode);
            image.width(i32::from(logo.info.width));
            image.height(i32::from(logo.info.height));
            match logo.info.components {
                1 => image.color_space().device_gray(),
                4 => image.color_space().device_cmyk(),
                _ => image.color_space().device_rgb(),
            }
            image.bits_per_component(8);
        }

        {
            let mut page = pdf.page(page_id);
            page.parent(pages_id)
                .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
                .contents(content_id);
            let mut resources = page.resources();
            resources.fonts().pair(REGULAR, font_id).pair(BOLD, bold_id);
            if logo.is_some() {
                resources.x_objects().pair(LOGO, logo_id);
            }
        }

        let mut content = Content::new();
        let table_top = draw_header(&mut content, logo.as_ref(), rows.len(), search, generated_at);
        let drawn = draw_table(&mut content, table_top, rows);
        if drawn < rows.len() {
            debug!(drawn, total = rows.len(), "report truncated to one page");
        }

        pdf.stream(content_id, &content.finish());
        pdf.finish()
    }

    /// Logo problems never fail the report: the header is drawn without it.
    fn load_logo(&self) -> Option<Logo> {
        let path = self.logo_path.as_ref()?;
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "logo not available; rendering without it");
                return None;
            }
        };
        match jpeg_info(&data) {
            Some(info) => Some(Logo { data, info }),
            None => {
                warn!(path = %path.display(), "logo is not a JPEG image; rendering without it");
                None
            }
        }
    }
}

struct Logo {
    data: Vec<u8>,
    info: JpegInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

/// Read the frame size and colour components from the first SOF marker.
pub fn jpeg_info(data: &[u8]) -> Option<JpegInfo> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // markers without a length field
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            // scan data or end of image before any frame header
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let len = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
        if len < 2 {
            return None;
        }

        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let seg = data.get(i + 4..i + 2 + len)?;
            if seg.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([seg[1], seg[2]]);
            let width = u16::from_be_bytes([seg[3], seg[4]]);
            if width == 0 || height == 0 {
                return None;
            }
            return Some(JpegInfo {
                width,
                height,
                components: seg[5],
            });
        }

        i += 2 + len;
    }
    None
}

/// Draws logo, title and metadata. Returns the y of the table's top edge.
fn draw_header(
    content: &mut Content,
    logo: Option<&Logo>,
    row_count: usize,
    search: Option<&str>,
    generated_at: NaiveDateTime,
) -> f32 {
    let top = PAGE_H - MARGIN;
    let mut text_x = MARGIN;

    if let Some(logo) = logo {
        let w = LOGO_H * f32::from(logo.info.width) / f32::from(logo.info.height);
        content.save_state();
        content.transform([w, 0.0, 0.0, LOGO_H, MARGIN, top - LOGO_H]);
        content.x_object(LOGO);
        content.restore_state();
        text_x += w + 12.0;
    }

    draw_text(content, BOLD, TITLE_FONT_SIZE, text_x, top - 16.0, "Feedback Report");
    let meta = format!(
        "Generated {} UTC  |  {} record(s)",
        generated_at.format("%Y-%m-%d %H:%M"),
        row_count
    );
    draw_text(content, REGULAR, META_FONT_SIZE, text_x, top - 29.0, &meta);
    if let Some(term) = search {
        let filter = format!("Search: \"{term}\"");
        draw_text(content, REGULAR, META_FONT_SIZE, text_x, top - 40.0, &filter);
    }

    top - LOGO_H - 16.0
}

/// Draws the header row and as many records as fit above the bottom margin.
/// Returns how many records were drawn.
fn draw_table(content: &mut Content, top: f32, rows: &[Feedback]) -> usize {
    let widths = column_widths(PAGE_W - 2.0 * MARGIN);
    let table_w: f32 = widths.iter().sum();

    let header_cells: Vec<Vec<String>> = HEADERS.iter().map(|h| vec![h.to_string()]).collect();
    let header_h = LINE_H + 2.0 * CELL_PAD;

    content.save_state();
    content.set_fill_rgb(0.85, 0.87, 0.90);
    content.rect(MARGIN, top - header_h, table_w, header_h);
    content.fill_nonzero();
    content.restore_state();
    draw_row(content, top, header_h, &widths, &header_cells, BOLD, HEADER_FONT_SIZE);

    let mut y = top - header_h;
    let mut drawn = 0;

    for (i, row) in rows.iter().enumerate() {
        let room = ((y - MARGIN - FOOTNOTE_H - 2.0 * CELL_PAD) / LINE_H).floor();
        if room < 1.0 {
            break;
        }
        let max_lines = (room as usize).min(MAX_ROW_LINES);

        let cells: Vec<Vec<String>> = row_cells(row, &widths)
            .into_iter()
            .zip(widths)
            .map(|(lines, w)| clip_lines(lines, max_lines, cell_columns(w, FONT_SIZE)))
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let row_h = lines as f32 * LINE_H + 2.0 * CELL_PAD;

        if i % 2 == 0 {
            content.save_state();
            content.set_fill_rgb(0.96, 0.96, 0.96);
            content.rect(MARGIN, y - row_h, table_w, row_h);
            content.fill_nonzero();
            content.restore_state();
        }
        draw_row(content, y, row_h, &widths, &cells, REGULAR, FONT_SIZE);

        y -= row_h;
        drawn += 1;
    }

    if rows.is_empty() {
        draw_text(content, REGULAR, FONT_SIZE, MARGIN + CELL_PAD, y - 14.0, "No feedback records.");
    } else if drawn < rows.len() {
        let note = format!(
            "{} more records not shown; narrow the search to include them.",
            rows.len() - drawn
        );
        draw_text(content, REGULAR, FONT_SIZE, MARGIN + CELL_PAD, y - 12.0, &note);
    }

    drawn
}

fn row_cells(row: &Feedback, widths: &[f32; 5]) -> Vec<Vec<String>> {
    let values = [
        row.id.to_string(),
        row.name.clone(),
        row.email.clone(),
        row.message.replace('\r', ""),
        row.created_at.format("%Y-%m-%d %H:%M").to_string(),
    ];
    values
        .iter()
        .zip(widths)
        .map(|(value, w)| wrap_cell(value, *w, FONT_SIZE))
        .collect()
}

/// Glyphs that fit on one line of a `width`-point cell.
fn cell_columns(width: f32, font_size: f32) -> usize {
    let usable = (width - 2.0 * CELL_PAD).max(font_size);
    ((usable / (font_size * AVG_GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Wrap `text` to the number of glyphs that fit in a `width`-point cell.
pub fn wrap_cell(text: &str, width: f32, font_size: f32) -> Vec<String> {
    textwrap::wrap(text, cell_columns(width, font_size))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Keep at most `max_lines` wrapped lines. A cut cell ends in an ellipsis that
/// still fits in `cols` glyphs.
pub fn clip_lines(mut lines: Vec<String>, max_lines: usize, cols: usize) -> Vec<String> {
    if lines.len() <= max_lines || max_lines == 0 {
        lines.truncate(max_lines);
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let keep = cols.saturating_sub(ELLIPSIS.len());
        let mut clipped: String = last.chars().take(keep).collect();
        clipped.truncate(clipped.trim_end().len());
        clipped.push_str(ELLIPSIS);
        *last = clipped;
    }
    lines
}

fn draw_row(
    content: &mut Content,
    top: f32,
    row_h: f32,
    widths: &[f32; 5],
    cells: &[Vec<String>],
    font: Name<'_>,
    font_size: f32,
) {
    let mut x = MARGIN;
    for (lines, w) in cells.iter().zip(widths) {
        for (n, line) in lines.iter().enumerate() {
            let baseline = top - CELL_PAD - font_size - n as f32 * LINE_H;
            draw_text(content, font, font_size, x + CELL_PAD, baseline, line);
        }
        draw_cell_borders(content, x, top - row_h, *w, row_h);
        x += w;
    }
}

fn draw_text(content: &mut Content, font: Name<'_>, size: f32, x: f32, y: f32, text: &str) {
    let encoded = win_ansi(text);
    content.begin_text();
    content.set_font(font, size);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(&encoded));
    content.end_text();
}

fn draw_cell_borders(content: &mut Content, x: f32, y: f32, w: f32, h: f32) {
    content.save_state();
    content.set_stroke_rgb(0.65, 0.65, 0.65);
    content.rect(x, y, w, h);
    content.stroke();
    content.restore_state();
}

/// Encode for the built-in fonts' WinAnsi encoding; anything else becomes `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(id: i64, message: &str) -> Feedback {
        Feedback {
            id,
            name: format!("Visitor {id}"),
            email: format!("visitor{id}@example.com"),
            message: message.to_string(),
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .expect("valid timestamp"),
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 2)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn page_objects(pdf: &[u8]) -> usize {
        count(pdf, b"/Type /Page") - count(pdf, b"/Type /Pages")
    }

    #[test]
    fn columns_fill_the_printable_width() {
        let widths = column_widths(495.0);
        let sum: f32 = widths.iter().sum();
        assert!((sum - 495.0).abs() < 0.01);
        assert!((widths[3] / widths[4] - 65.0 / 35.0).abs() < 0.01);
        assert!((widths[0] - 29.7).abs() < 0.01);
    }

    #[test]
    fn long_messages_wrap_inside_the_cell() {
        let text = "word ".repeat(80);
        let lines = wrap_cell(&text, 100.0, FONT_SIZE);
        assert!(lines.len() > 1);
        let cols = ((100.0 - 2.0 * CELL_PAD) / (FONT_SIZE * AVG_GLYPH_WIDTH)).floor() as usize;
        assert!(lines.iter().all(|l| l.chars().count() <= cols));
    }

    #[test]
    fn renders_single_page_pdf_with_table() {
        let rows = vec![sample(2, "Second"), sample(1, "First")];
        let pdf = ReportRenderer::new(None).render_at(&rows, Some("Visitor"), generated_at());

        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(page_objects(&pdf), 1);
        assert_eq!(count(&pdf, b"(Feedback Report)"), 1);
        assert_eq!(count(&pdf, b"(Message)"), 1);
        assert_eq!(count(&pdf, b"(visitor2@example.com)"), 1);
        assert_eq!(count(&pdf, b"(Search: \"Visitor\")"), 1);
    }

    #[test]
    fn oversized_message_is_clipped_not_dropped() {
        let rows = vec![
            sample(3, &"lorem ipsum ".repeat(250)),
            sample(2, "short"),
            sample(1, "also short"),
        ];
        let pdf = ReportRenderer::new(None).render_at(&rows, None, generated_at());

        assert_eq!(page_objects(&pdf), 1);
        for email in [
            &b"(visitor3@example.com)"[..],
            b"(visitor2@example.com)",
            b"(visitor1@example.com)",
        ] {
            assert_eq!(count(&pdf, email), 1);
        }
        assert_eq!(count(&pdf, b"...)"), 1);
        assert_eq!(count(&pdf, b"more records not shown"), 0);
    }

    #[test]
    fn clipping_marks_the_cut() {
        let lines: Vec<String> = ["aaaa bbbb", "cccc dddd", "eeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(clip_lines(lines.clone(), 5, 9), lines);
        assert_eq!(clip_lines(lines.clone(), 2, 9), vec!["aaaa bbbb", "cccc d..."]);
        assert_eq!(clip_lines(lines, 1, 6), vec!["aaa..."]);
    }

    #[test]
    fn missing_logo_is_ignored() {
        let renderer = ReportRenderer::new(Some(PathBuf::from("/nonexistent/logo.jpg")));
        let pdf = renderer.render_at(&[sample(1, "Hi")], None, generated_at());
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(count(&pdf, b"/DCTDecode"), 0);
    }

    #[test]
    fn overflow_stays_on_one_page() {
        let rows: Vec<Feedback> = (1..=200).map(|id| sample(id, "Hello there")).collect();
        let pdf = ReportRenderer::new(None).render_at(&rows, None, generated_at());
        assert_eq!(page_objects(&pdf), 1);
        assert_eq!(count(&pdf, b"more records not shown"), 1);
    }

    #[test]
    fn jpeg_frame_header_is_parsed() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 with a two-byte payload
        jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
        // SOF0: precision 8, height 32, width 64, 3 components
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03]);
        jpeg.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);

        assert_eq!(
            jpeg_info(&jpeg),
            Some(JpegInfo {
                width: 64,
                height: 32,
                components: 3
            })
        );
        assert_eq!(jpeg_info(b"\x89PNG\r\n\x1a\n"), None);
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(win_ansi("Café – ok"), b"Caf\xE9 \x96 ok".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }
}
