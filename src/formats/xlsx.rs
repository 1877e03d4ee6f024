//! XLSX: every sheet rendered as CSV, sheets separated by a blank line.

use super::corrupt;
use crate::error::DocTextError;
use crate::output::DocumentFormat;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;

pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, DocTextError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| corrupt(DocumentFormat::Xlsx, file_name, e))?;

    let mut blocks = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| corrupt(DocumentFormat::Xlsx, file_name, format!("sheet '{sheet}': {e}")))?;
        let rows: Vec<String> = range
            .rows()
            .map(|row| row.iter().map(csv_field).collect::<Vec<_>>().join(","))
            .collect();
        let csv = rows.join("\n");
        if !csv.trim_matches([',', '\n']).is_empty() {
            blocks.push(csv);
        }
    }
    Ok(blocks.join("\n\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string().to_uppercase(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(cell: &Data) -> String {
    let text = cell_text(cell);
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_quoted_when_needed() {
        assert_eq!(csv_field(&Data::String("서울, 부산".into())), "\"서울, 부산\"");
        assert_eq!(csv_field(&Data::String("그는 \"네\"라고".into())), "\"그는 \"\"네\"\"라고\"");
        assert_eq!(csv_field(&Data::String("평범".into())), "평범");
    }

    #[test]
    fn numbers_render_like_spreadsheets() {
        assert_eq!(cell_text(&Data::Float(10.0)), "10");
        assert_eq!(cell_text(&Data::Float(3.5)), "3.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = extract_text(b"definitely not a workbook", "book.xlsx").unwrap_err();
        assert!(matches!(err, DocTextError::CorruptDocument { .. }), "got: {err}");
    }
}
