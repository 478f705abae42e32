//! Main parser for Apex debug logs.
//!
//! Resolves entry/exit markers into nested frames with a stack:
//! entry markers push, exit markers pop the matching frame. SOQL,
//! exceptions and debug output are attributed to the innermost open frame.

use super::events::{EventKind, FrameKind};
use super::lexer::{lex, LogLine};
use super::schema::{IssueKind, NodeType, StructuralIssue};
use crate::utils::config::{IMPLICIT_ROOT_LABEL, TRIGGER_EVENT_SEPARATOR, TRIGGER_MARKER_PREFIX};
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// Parser configuration
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Fail on the first structural issue instead of recording it
    pub strict: bool,

    /// Track SYSTEM_METHOD_ENTRY/EXIT as frames
    pub include_system_methods: bool,

    /// Append USER_DEBUG messages to frame details
    pub capture_debug: bool,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_system_methods(mut self, include: bool) -> Self {
        self.include_system_methods = include;
        self
    }

    pub fn with_debug_output(mut self, capture: bool) -> Self {
        self.capture_debug = capture;
        self
    }
}

/// A resolved frame (one future graph node)
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub kind: FrameKind,

    /// Raw name: signature, code unit name or `Op Type` for DML
    pub name: String,

    pub node_type: NodeType,
    pub label: String,

    /// Line of the entry marker
    pub line: usize,

    pub entry_ns: u64,
    pub exit_ns: u64,

    /// Number of frames open when this one was entered
    pub depth: usize,

    /// Index of the enclosing frame in `ParsedLog::events`
    pub parent: Option<usize>,

    /// Open frames with the same signature when this one was entered
    pub recursion: usize,

    /// Queries executed directly inside this frame
    pub soql_count: u64,
    pub soql_rows: u64,
    pub last_query: Option<String>,

    pub errored: bool,

    /// False when the exit marker was never seen
    pub closed: bool,

    pub details: Vec<String>,
}

impl LogEvent {
    /// Signature used for recursion detection
    pub fn signature(&self) -> (FrameKind, &str) {
        (self.kind, self.name.as_str())
    }

    /// Elapsed time between entry and exit
    pub fn duration_ns(&self) -> u64 {
        self.exit_ns.saturating_sub(self.entry_ns)
    }
}

/// Parsed log data (internal representation)
#[derive(Debug, Clone)]
pub struct ParsedLog {
    /// Frames in entry order
    pub events: Vec<LogEvent>,
    pub first_ns: u64,
    pub last_ns: u64,
    pub issues: Vec<StructuralIssue>,
}

impl ParsedLog {
    /// Nanoseconds between the first and last event line
    pub fn total_ns(&self) -> u64 {
        self.last_ns.saturating_sub(self.first_ns)
    }
}

/// Parse raw log text
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `text` - Full contents of a debug log
/// * `config` - Parser configuration
///
/// # Returns
/// Resolved frames ready for graph building
///
/// # Errors
/// * `ParseError::EmptyLog` - No event lines found
/// * `ParseError::Structure` - Nesting problem in strict mode
pub fn parse_log(text: &str, config: &ParserConfig) -> Result<ParsedLog, ParseError> {
    let lines = lex(text);
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Err(ParseError::EmptyLog);
    };
    let (first_ns, last_ns) = (first.nanos, last.nanos);

    debug!("Lexed {} event lines", lines.len());

    let mut resolver = Resolver::new(config);
    for line in &lines {
        resolver.apply(line)?;
    }
    resolver.finish(last_ns)?;

    debug!(
        "Resolved {} frames with {} structural issue(s)",
        resolver.events.len(),
        resolver.issues.len()
    );

    Ok(ParsedLog {
        events: resolver.events,
        first_ns,
        last_ns,
        issues: resolver.issues,
    })
}

/// Read and parse a log file
///
/// **Public** - convenience wrapper over `parse_log`
pub fn parse_log_file(
    path: impl AsRef<Path>,
    config: &ParserConfig,
) -> Result<ParsedLog, ParseError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    debug!(
        "Read {} bytes from {}",
        text.len(),
        path.as_ref().display()
    );
    parse_log(&text, config)
}

/// Classify a frame and derive its display label
///
/// **Public** - shared with tests and the graph builder
pub fn classify(kind: FrameKind, name: &str) -> (NodeType, String) {
    match kind {
        FrameKind::Dml => (NodeType::Dml, format!("DML:{}", name).trim_end_matches(':').to_string()),
        FrameKind::CodeUnit => match name.split_once(TRIGGER_EVENT_SEPARATOR) {
            Some((trigger, event)) => {
                let node_type = match event.trim() {
                    "BeforeUpdate" => NodeType::BeforeUpdate,
                    "AfterUpdate" => NodeType::AfterUpdate,
                    _ => NodeType::Trigger,
                };
                (node_type, format!("{} On {}", trigger.trim(), event.trim()))
            }
            None => (NodeType::Function, function_label(name)),
        },
        FrameKind::Method | FrameKind::Constructor | FrameKind::SystemMethod => {
            (NodeType::Function, function_label(name))
        }
    }
}

/// `Function:<name without parameter list>`
///
/// **Private** - internal helper for classify
fn function_label(name: &str) -> String {
    let short = name.split('(').next().unwrap_or(name).trim();
    format!("Function:{}", short)
}

/// Stack-based nesting resolver
///
/// **Private** - internal state for parse_log
struct Resolver<'a> {
    config: &'a ParserConfig,
    events: Vec<LogEvent>,
    stack: Vec<usize>,
    issues: Vec<StructuralIssue>,
    implicit_root: Option<usize>,
    /// Open frame count per signature
    active: HashMap<(FrameKind, String), usize>,
    /// Frame that owns the query currently executing
    pending_query: Option<usize>,
}

impl<'a> Resolver<'a> {
    fn new(config: &'a ParserConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            stack: Vec::new(),
            issues: Vec::new(),
            implicit_root: None,
            active: HashMap::new(),
            pending_query: None,
        }
    }

    fn apply(&mut self, line: &LogLine) -> Result<(), ParseError> {
        if let Some(kind) = line.event.opens_frame() {
            if kind == FrameKind::SystemMethod && !self.config.include_system_methods {
                return Ok(());
            }
            self.open(line, kind);
            return Ok(());
        }

        if let Some(kind) = line.event.closes_frame() {
            if kind == FrameKind::SystemMethod && !self.config.include_system_methods {
                return Ok(());
            }
            return self.close(line, kind);
        }

        match &line.event {
            EventKind::SoqlExecuteBegin => {
                let owner = self.current_or_implicit(line);
                let event = &mut self.events[owner];
                event.soql_count += 1;
                event.last_query = line.last_field().map(|q| q.trim().to_string());
                self.pending_query = Some(owner);
            }
            EventKind::SoqlExecuteEnd => {
                let owner = match self.pending_query.take() {
                    Some(owner) => owner,
                    None => self.current_or_implicit(line),
                };
                let rows = line
                    .keyed_field("Rows")
                    .and_then(|r| r.trim().parse::<u64>().ok())
                    .unwrap_or(0);
                self.events[owner].soql_rows += rows;
            }
            EventKind::ExceptionThrown => {
                let message = line.joined_from(1).unwrap_or_default();
                let owner = self.current_or_implicit(line);
                let event = &mut self.events[owner];
                event.errored = true;
                event.details.push(format!("Exception: {}", message.trim()));
            }
            EventKind::FatalError => {
                let message = line.joined_from(0).unwrap_or_default();
                let owner = self.current_or_implicit(line);
                self.events[owner]
                    .details
                    .push(format!("Fatal error: {}", message.trim()));
                // An uncaught exception unwinds every active frame
                for &index in &self.stack {
                    self.events[index].errored = true;
                }
                self.events[owner].errored = true;
            }
            EventKind::UserDebug if self.config.capture_debug => {
                if let Some(message) = line.joined_from(2) {
                    let owner = self.current_or_implicit(line);
                    self.events[owner].details.push(message.trim().to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn open(&mut self, line: &LogLine, kind: FrameKind) {
        let name = entry_name(line, kind);
        let (node_type, label) = classify(kind, &name);

        let mut details = Vec::new();
        if kind == FrameKind::Dml {
            if let Some(rows) = line.keyed_field("Rows") {
                details.push(format!("Rows:{}", rows.trim()));
            }
        }

        let open_count = self.active.entry((kind, name.clone())).or_insert(0);
        let recursion = *open_count;
        *open_count += 1;

        let index = self.events.len();
        self.events.push(LogEvent {
            kind,
            name,
            node_type,
            label,
            line: line.line,
            entry_ns: line.nanos,
            exit_ns: line.nanos,
            depth: self.stack.len(),
            parent: self.stack.last().copied(),
            recursion,
            soql_count: 0,
            soql_rows: 0,
            last_query: None,
            errored: false,
            closed: false,
            details,
        });
        self.stack.push(index);
    }

    fn close(&mut self, line: &LogLine, kind: FrameKind) -> Result<(), ParseError> {
        let name = exit_name(line, kind);

        let position = self
            .stack
            .iter()
            .rposition(|&index| exit_matches(&self.events[index], kind, name.as_deref()));

        let Some(position) = position else {
            return self.report(
                line.line,
                IssueKind::UnmatchedExit,
                format!(
                    "{:?} exit '{}' has no matching open frame",
                    kind,
                    name.as_deref().unwrap_or("")
                ),
            );
        };

        while self.stack.len() > position + 1 {
            if let Some(index) = self.pop_frame() {
                self.events[index].exit_ns = line.nanos;
                let message = format!(
                    "'{}' was still open when '{}' exited",
                    self.events[index].label,
                    name.as_deref().unwrap_or("")
                );
                let entry_line = self.events[index].line;
                self.report(entry_line, IssueKind::UnclosedFrame, message)?;
            }
        }

        if let Some(index) = self.pop_frame() {
            let event = &mut self.events[index];
            event.exit_ns = line.nanos;
            event.closed = true;
        }

        Ok(())
    }

    fn finish(&mut self, last_ns: u64) -> Result<(), ParseError> {
        while let Some(index) = self.pop_frame() {
            self.events[index].exit_ns = last_ns;
            let message = format!(
                "'{}' was never exited before the log ended",
                self.events[index].label
            );
            let entry_line = self.events[index].line;
            self.report(entry_line, IssueKind::UnclosedFrame, message)?;
        }
        Ok(())
    }

    /// Pop the innermost frame and release its signature
    fn pop_frame(&mut self) -> Option<usize> {
        let index = self.stack.pop()?;
        let event = &self.events[index];
        let key = (event.kind, event.name.clone());
        if let Some(count) = self.active.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.active.remove(&key);
            }
        }
        Some(index)
    }

    /// Innermost open frame, or the implicit root for statements outside any frame
    fn current_or_implicit(&mut self, line: &LogLine) -> usize {
        if let Some(&index) = self.stack.last() {
            return index;
        }

        let index = match self.implicit_root {
            Some(index) => index,
            None => {
                let index = self.events.len();
                self.events.push(LogEvent {
                    kind: FrameKind::CodeUnit,
                    name: IMPLICIT_ROOT_LABEL.to_string(),
                    node_type: NodeType::Function,
                    label: IMPLICIT_ROOT_LABEL.to_string(),
                    line: line.line,
                    entry_ns: line.nanos,
                    exit_ns: line.nanos,
                    depth: 0,
                    parent: None,
                    recursion: 0,
                    soql_count: 0,
                    soql_rows: 0,
                    last_query: None,
                    errored: false,
                    closed: true,
                    details: Vec::new(),
                });
                self.implicit_root = Some(index);
                debug!("Created implicit root at line {}", line.line);
                index
            }
        };

        let event = &mut self.events[index];
        event.exit_ns = event.exit_ns.max(line.nanos);
        index
    }

    fn report(&mut self, line: usize, kind: IssueKind, message: String) -> Result<(), ParseError> {
        if self.config.strict {
            return Err(ParseError::Structure { line, message });
        }
        warn!("Line {}: {}", line, message);
        self.issues.push(StructuralIssue {
            line,
            kind,
            message,
        });
        Ok(())
    }
}

/// Name recorded for an entry marker
///
/// **Private** - internal extraction logic
fn entry_name(line: &LogLine, kind: FrameKind) -> String {
    match kind {
        FrameKind::Dml => {
            let op = line.keyed_field("Op").unwrap_or("").trim();
            let object = line.keyed_field("Type").unwrap_or("").trim();
            format!("{} {}", op, object).trim().to_string()
        }
        FrameKind::CodeUnit => code_unit_name(line).unwrap_or_default(),
        _ => line.last_field().unwrap_or("").trim().to_string(),
    }
}

/// Name carried by an exit marker (DML exits carry none)
///
/// **Private** - internal extraction logic
fn exit_name(line: &LogLine, kind: FrameKind) -> Option<String> {
    match kind {
        FrameKind::Dml => None,
        FrameKind::CodeUnit => code_unit_name(line),
        _ => line
            .last_field()
            .map(|f| f.trim().to_string())
            .filter(|f| !is_line_reference(f)),
    }
}

/// Last field that is not the trigger marker or a `[line]` reference
///
/// **Private** - internal extraction logic
fn code_unit_name(line: &LogLine) -> Option<String> {
    line.fields
        .iter()
        .rev()
        .map(|f| f.trim())
        .find(|f| !f.is_empty() && !f.starts_with(TRIGGER_MARKER_PREFIX) && !is_line_reference(f))
        .map(str::to_string)
}

/// `[12]` or `[EXTERNAL]`
///
/// **Private** - internal utility
fn is_line_reference(field: &str) -> bool {
    field.starts_with('[') && field.ends_with(']')
}

/// Whether an exit closes `frame`
///
/// **Private** - internal matching rule
fn exit_matches(frame: &LogEvent, kind: FrameKind, name: Option<&str>) -> bool {
    if frame.kind != kind {
        return false;
    }
    match name {
        None | Some("") => true,
        Some(name) => {
            frame.name == name || frame.name.starts_with(name) || name.starts_with(frame.name.as_str())
        }
    }
}
