//! Text and JSON rendering for list commands.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns separated by at least one space. The last column is
/// not padded.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    for row in std::iter::once(&header_row).chain(rows.iter()) {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate().take(columns) {
            if i + 1 < columns {
                line.push_str(&format!("{:<width$} ", cell, width = widths[i]));
            } else {
                line.push_str(cell);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_aligned() {
        let rows = vec![
            vec!["web01".to_string(), "3".to_string(), "running".to_string()],
            vec!["db".to_string(), "12".to_string(), "stop".to_string()],
        ];
        let table = render_table(&["NAME", "ID", "STATE"], &rows);

        assert_eq!(
            table,
            "NAME  ID STATE\nweb01 3  running\ndb    12 stop\n"
        );
    }

    #[test]
    fn test_empty_trailing_cells_do_not_leave_spaces() {
        let rows = vec![vec!["web01".to_string(), String::new()]];
        let table = render_table(&["NAME", "VNC PORT"], &rows);
        assert_eq!(table, "NAME  VNC PORT\nweb01\n");
    }

    #[test]
    fn test_header_only() {
        assert_eq!(render_table(&["NAME"], &[]), "NAME\n");
    }
}
