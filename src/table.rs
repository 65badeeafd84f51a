//! Delimited text output: a header line plus one line per record.
//!
//! Values containing a comma, double quote or line break are quoted with
//! inner quotes doubled; everything else is written verbatim. Lines are
//! joined with `\n` and the last line is not terminated.

use crate::error::{ExportError, Result};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

/// Something that can be laid out as a table row
pub trait Tabular {
    /// Cell value for a column; `None` serializes as an empty field
    fn cell(&self, column: &str) -> Option<String>;
}

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

/// Written lines without the terminator after the last one
fn finish(wtr: Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| ExportError::Parse(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Quote a field when it needs it
pub fn escape_field(value: &str) -> Result<String> {
    // A lone empty field would be written as `""`
    if value.is_empty() {
        return Ok(String::new());
    }
    let mut wtr = writer();
    wtr.write_record([value])?;
    finish(wtr)
}

/// Serialize records under the given ordered columns
pub fn serialize<T: Tabular>(records: &[T], columns: &[&str]) -> Result<String> {
    let mut wtr = writer();
    wtr.write_record(columns)?;
    for record in records {
        wtr.write_record(
            columns
                .iter()
                .map(|column| record.cell(column).unwrap_or_default()),
        )?;
    }
    finish(wtr)
}

/// Read serialized text back into rows of fields, header row included
pub fn parse_table(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    struct Row(HashMap<&'static str, String>);

    impl Tabular for Row {
        fn cell(&self, column: &str) -> Option<String> {
            self.0.get(column).cloned()
        }
    }

    fn row(pairs: &[(&'static str, &str)]) -> Row {
        Row(pairs.iter().map(|(k, v)| (*k, v.to_string())).collect())
    }

    #[test]
    fn test_escape_field() -> Result<()> {
        assert_eq!(escape_field("plain")?, "plain");
        assert_eq!(escape_field(r#"He said, "hi""#)?, r#""He said, ""hi""""#);
        assert_eq!(escape_field("two\nlines")?, "\"two\nlines\"");
        assert_eq!(escape_field("cr\rhere")?, "\"cr\rhere\"");
        assert_eq!(escape_field("it's #1; ok")?, "it's #1; ok");
        assert_eq!(escape_field("")?, "");
        Ok(())
    }

    #[test]
    fn test_serialize_joins_without_trailing_newline() -> Result<()> {
        let rows = vec![
            row(&[("title", "Robots, arms"), ("year", "2020")]),
            row(&[("title", "Lasers")]),
        ];
        let text = serialize(&rows, &["title", "year"])?;
        assert_eq!(text, "title,year\n\"Robots, arms\",2020\nLasers,");
        Ok(())
    }

    #[test]
    fn test_serialize_keeps_trailing_line_break_inside_value() -> Result<()> {
        let rows = vec![row(&[("title", "ends with\n")])];
        let text = serialize(&rows, &["title"])?;
        assert_eq!(text, "title\n\"ends with\n\"");
        Ok(())
    }

    #[test]
    fn test_serialize_header_only() -> Result<()> {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(serialize(&rows, &["a", "b"])?, "a,b");
        Ok(())
    }

    #[test]
    fn test_round_trip_quoted_value() -> Result<()> {
        let rows = vec![row(&[("title", r#"He said, "hi""#), ("year", "")])];
        let text = serialize(&rows, &["title", "year"])?;
        let parsed = parse_table(&text)?;
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], vec![r#"He said, "hi""#.to_string(), String::new()]);
        Ok(())
    }

    proptest! {
        #[test]
        fn escaped_fields_read_back_unchanged(value in "[a-z ,\"\n]{0,30}") {
            let rows = vec![row(&[("v", value.as_str()), ("w", "x")])];
            let parsed = serialize(&rows, &["v", "w"]).and_then(|text| parse_table(&text)).expect("parse");
            prop_assert_eq!(&parsed[1][0], &value);
        }
    }
}
