//! Plain-text table rendering for terminal reports.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders `rows` under `headers`, padding every column to its widest cell.
/// Columns listed as [`Align::Right`] are right-justified (numbers).
pub fn render_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths, align));
    let _ = writeln!(
        output,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat((*w).max(3)))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in rows {
        let cells = row.iter().map(|c| c.as_str()).collect::<Vec<_>>();
        let _ = writeln!(output, "{}", format_line(&cells, &widths, align));
    }
    output
}

fn format_line(cells: &[&str], widths: &[usize], align: &[Align]) -> String {
    let mut out = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        let width = *width;
        match align.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => {
                let _ = write!(out, "{cell:<width$}");
            }
            Align::Right => {
                let _ = write!(out, "{cell:>width$}");
            }
        }
    }
    out.trim_end().to_string()
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) {
    print!("{}", render_table(headers, rows, align));
}
