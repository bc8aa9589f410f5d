//! Box-drawn table rendering for terminal output.

use unicode_width::UnicodeWidthStr;

use tabletalk_core::frame::{TabularFrame, Value};

const NULL_TEXT: &str = "NULL";

/// Render `frame` as a bordered table followed by a row count.
pub fn render_frame(frame: &TabularFrame) -> String {
    if frame.column_count() == 0 {
        return "No rows.".to_string();
    }

    let headers = frame.column_names();
    let cells: Vec<Vec<String>> = frame
        .rows()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    let right_align: Vec<bool> = frame.columns().iter().map(|c| c.kind().is_numeric()).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let mut out = String::new();
    out.push_str(&border(&widths, '┌', '┬', '┐'));
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    out.push_str(&line(&header_cells, &widths, &vec![false; widths.len()]));
    out.push_str(&border(&widths, '├', '┼', '┤'));
    for row in &cells {
        out.push_str(&line(row, &widths, &right_align));
    }
    out.push_str(&border(&widths, '└', '┴', '┘'));

    match frame.row_count() {
        0 => out.push_str("No rows."),
        1 => out.push_str("(1 row)"),
        n => out.push_str(&format!("({} rows)", n)),
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_TEXT.to_string(),
        other => other.to_string().replace('\n', " "),
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
}

fn line(cells: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let mut out = String::from("│");
    for ((cell, width), right) in cells.iter().zip(widths).zip(right_align) {
        let pad = " ".repeat(width.saturating_sub(cell.width()));
        if *right {
            out.push_str(&format!(" {}{} │", pad, cell));
        } else {
            out.push_str(&format!(" {}{} │", cell, pad));
        }
    }
    out.push('\n');
    out
}
