//! Parsing and validation of the on-disk trace contract.
//!
//! The grammar is deliberately rigid: a fixed header line, then
//! `<op>,<caller>,<ptr>,<size>` rows with no quoting or escaping (fields
//! cannot contain commas by construction). Anything else is a defect in
//! the writer, so the parser here rejects rather than repairs.

use std::fs;
use std::path::Path;

use memtrace_core::{Caller, HEADER, Op};

/// One parsed data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    pub op: Op,
    pub caller: Caller,
    pub addr: usize,
    pub size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("trace file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing or malformed header: {0:?}")]
    Header(String),
    #[error("row {line}: expected 4 comma-separated fields, got {got}")]
    FieldCount { line: usize, got: usize },
    #[error("row {line}: bad {field} field {value:?}")]
    Field {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Parse a complete trace: the header line, then zero or more data rows.
pub fn parse_trace(text: &str) -> Result<Vec<TraceRow>, ParseError> {
    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header == HEADER.trim_end() => {}
        other => return Err(ParseError::Header(other.unwrap_or("").to_owned())),
    }

    lines
        .enumerate()
        // Line numbers are 1-based and count the header.
        .map(|(i, line)| parse_row(i + 2, line))
        .collect()
}

/// Read and parse a trace file.
pub fn read_trace(path: &Path) -> Result<Vec<TraceRow>, ParseError> {
    parse_trace(&fs::read_to_string(path)?)
}

fn parse_row(line: usize, text: &str) -> Result<TraceRow, ParseError> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != 4 {
        return Err(ParseError::FieldCount {
            line,
            got: fields.len(),
        });
    }

    let bad = |field, value: &str| ParseError::Field {
        line,
        field,
        value: value.to_owned(),
    };

    let op = single_char(fields[0])
        .and_then(Op::from_symbol)
        .ok_or_else(|| bad("op", fields[0]))?;
    let caller = single_char(fields[1])
        .and_then(Caller::from_symbol)
        .ok_or_else(|| bad("caller", fields[1]))?;
    let addr = fields[2]
        .strip_prefix("0x")
        .and_then(|hex| usize::from_str_radix(hex, 16).ok())
        .ok_or_else(|| bad("ptr", fields[2]))?;
    let size = fields[3]
        .parse::<usize>()
        .map_err(|_| bad("size", fields[3]))?;

    Ok(TraceRow {
        op,
        caller,
        addr,
        size,
    })
}

fn single_char(field: &str) -> Option<char> {
    let mut chars = field.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_after_header() {
        let rows = parse_trace("op,caller,ptr,size\n+,m,0x1000,100\n-,f,0x1000,112\n").unwrap();
        assert_eq!(
            rows,
            vec![
                TraceRow {
                    op: Op::Allocate,
                    caller: Caller::Malloc,
                    addr: 0x1000,
                    size: 100,
                },
                TraceRow {
                    op: Op::Release,
                    caller: Caller::Free,
                    addr: 0x1000,
                    size: 112,
                },
            ]
        );
    }

    #[test]
    fn header_only_trace_is_empty() {
        assert!(parse_trace("op,caller,ptr,size\n").unwrap().is_empty());
    }

    #[test]
    fn null_pointer_parses_to_zero() {
        let rows = parse_trace("op,caller,ptr,size\n-,f,0x0,0\n").unwrap();
        assert_eq!(rows[0].addr, 0);
    }

    #[test]
    fn full_width_size_parses() {
        let text = format!("op,caller,ptr,size\n+,c,0x10,{}\n", usize::MAX);
        assert_eq!(parse_trace(&text).unwrap()[0].size, usize::MAX);
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(
            parse_trace("+,m,0x1000,100\n"),
            Err(ParseError::Header(_))
        ));
        assert!(matches!(parse_trace(""), Err(ParseError::Header(_))));
    }

    #[test]
    fn truncated_row_is_rejected() {
        let err = parse_trace("op,caller,ptr,size\n+,m,0x1000\n").unwrap_err();
        assert!(matches!(err, ParseError::FieldCount { line: 2, got: 3 }));
    }

    #[test]
    fn bad_fields_are_rejected() {
        for row in ["x,m,0x10,1", "+,z,0x10,1", "+,m,10,1", "+,m,0x10,-4"] {
            let text = format!("op,caller,ptr,size\n{row}\n");
            assert!(
                matches!(parse_trace(&text), Err(ParseError::Field { .. })),
                "row {row:?} should be rejected",
            );
        }
    }
}
