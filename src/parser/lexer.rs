//! Line lexer for Apex debug logs.
//!
//! Event lines look like:
//! `12:00:00.0 (1000000)|METHOD_ENTRY|[3]|01p000000000001|Foo.bar()`
//!
//! The parenthesised value is elapsed nanoseconds since the transaction
//! started. Lines that do not have this shape (the log header, wrapped
//! debug output, long queries) are continuation lines.

use super::events::EventKind;

/// One lexed event line
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// 1-based line number in the source text
    pub line: usize,

    /// Elapsed nanoseconds
    pub nanos: u64,

    pub event: EventKind,

    /// Fields after the event name
    pub fields: Vec<String>,
}

impl LogLine {
    /// Last field, usually the name or message the event is about
    pub fn last_field(&self) -> Option<&str> {
        self.fields.last().map(String::as_str)
    }

    /// Fields from `start` onward joined back with the separator
    ///
    /// Debug messages may themselves contain `|`.
    pub fn joined_from(&self, start: usize) -> Option<String> {
        if start >= self.fields.len() {
            None
        } else {
            Some(self.fields[start..].join("|"))
        }
    }

    /// Value of a `Key:Value` field, e.g. `Rows:2`
    pub fn keyed_field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| {
            field
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(':'))
        })
    }
}

/// Lex a single line
///
/// **Public** - building block for `lex`
///
/// # Returns
/// `None` for continuation lines
pub fn lex_line(line_no: usize, text: &str) -> Option<LogLine> {
    let text = text.trim_end_matches('\r');
    let mut parts = text.split('|');

    let head = parts.next()?;
    let event = parts.next()?;
    let nanos = parse_nanos(head)?;

    Some(LogLine {
        line: line_no,
        nanos,
        event: event.parse::<EventKind>().unwrap_or_else(|never| match never {}),
        fields: parts.map(str::to_string).collect(),
    })
}

/// Lex a whole log, folding continuation lines into the preceding event
///
/// **Public** - main entry point for the lexer
pub fn lex(text: &str) -> Vec<LogLine> {
    let mut lines: Vec<LogLine> = Vec::new();
    // Blank lines seen since the last text, kept only if more text follows
    let mut blanks = 0;

    for (index, raw) in text.lines().enumerate() {
        if let Some(line) = lex_line(index + 1, raw) {
            lines.push(line);
            blanks = 0;
            continue;
        }

        // Header and blank lines before the first event carry no data
        let Some(previous) = lines.last_mut() else {
            continue;
        };
        let raw = raw.trim_end_matches('\r');
        if raw.is_empty() {
            blanks += 1;
            continue;
        }
        let gap = "\n".repeat(blanks);
        blanks = 0;
        match previous.fields.last_mut() {
            Some(last) => {
                last.push_str(&gap);
                last.push('\n');
                last.push_str(raw);
            }
            None => previous.fields.push(gap + raw),
        }
    }

    lines
}

/// Extract the nanosecond counter from `HH:MM:SS.s (nanos)`
///
/// **Private** - internal utility
fn parse_nanos(head: &str) -> Option<u64> {
    let open = head.rfind('(')?;
    let close = head[open..].find(')')? + open;
    head[open + 1..close].trim().parse().ok()
}
