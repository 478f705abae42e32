//! Event kinds recognised in Apex debug logs.
//!
//! Each event line carries an upper-case event name in its second field,
//! e.g. `METHOD_ENTRY` or `SOQL_EXECUTE_END`.

/// Type of log event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ExecutionStarted,
    ExecutionFinished,
    CodeUnitStarted,
    CodeUnitFinished,
    MethodEntry,
    MethodExit,
    ConstructorEntry,
    ConstructorExit,
    SystemMethodEntry,
    SystemMethodExit,
    SoqlExecuteBegin,
    SoqlExecuteEnd,
    DmlBegin,
    DmlEnd,
    ExceptionThrown,
    FatalError,
    UserDebug,
    Other(String),
}

impl std::str::FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "EXECUTION_STARTED" => Self::ExecutionStarted,
            "EXECUTION_FINISHED" => Self::ExecutionFinished,
            "CODE_UNIT_STARTED" => Self::CodeUnitStarted,
            "CODE_UNIT_FINISHED" => Self::CodeUnitFinished,
            "METHOD_ENTRY" => Self::MethodEntry,
            "METHOD_EXIT" => Self::MethodExit,
            "CONSTRUCTOR_ENTRY" => Self::ConstructorEntry,
            "CONSTRUCTOR_EXIT" => Self::ConstructorExit,
            "SYSTEM_METHOD_ENTRY" => Self::SystemMethodEntry,
            "SYSTEM_METHOD_EXIT" => Self::SystemMethodExit,
            "SOQL_EXECUTE_BEGIN" => Self::SoqlExecuteBegin,
            "SOQL_EXECUTE_END" => Self::SoqlExecuteEnd,
            "DML_BEGIN" => Self::DmlBegin,
            "DML_END" => Self::DmlEnd,
            "EXCEPTION_THROWN" => Self::ExceptionThrown,
            "FATAL_ERROR" => Self::FatalError,
            "USER_DEBUG" => Self::UserDebug,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Kind of frame an entry/exit pair opens on the nesting stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    CodeUnit,
    Method,
    Constructor,
    SystemMethod,
    Dml,
}

impl EventKind {
    /// Frame opened by this event, if it is an entry marker
    pub fn opens_frame(&self) -> Option<FrameKind> {
        match self {
            Self::CodeUnitStarted => Some(FrameKind::CodeUnit),
            Self::MethodEntry => Some(FrameKind::Method),
            Self::ConstructorEntry => Some(FrameKind::Constructor),
            Self::SystemMethodEntry => Some(FrameKind::SystemMethod),
            Self::DmlBegin => Some(FrameKind::Dml),
            _ => None,
        }
    }

    /// Frame closed by this event, if it is an exit marker
    pub fn closes_frame(&self) -> Option<FrameKind> {
        match self {
            Self::CodeUnitFinished => Some(FrameKind::CodeUnit),
            Self::MethodExit => Some(FrameKind::Method),
            Self::ConstructorExit => Some(FrameKind::Constructor),
            Self::SystemMethodExit => Some(FrameKind::SystemMethod),
            Self::DmlEnd => Some(FrameKind::Dml),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("METHOD_ENTRY".parse::<EventKind>().unwrap(), EventKind::MethodEntry);
        assert_eq!(
            "SOQL_EXECUTE_END".parse::<EventKind>().unwrap(),
            EventKind::SoqlExecuteEnd
        );
        assert_eq!(
            "HEAP_ALLOCATE".parse::<EventKind>().unwrap(),
            EventKind::Other("HEAP_ALLOCATE".to_string())
        );
    }

    #[test]
    fn test_entry_exit_pairs() {
        let pairs = [
            (EventKind::CodeUnitStarted, EventKind::CodeUnitFinished),
            (EventKind::MethodEntry, EventKind::MethodExit),
            (EventKind::ConstructorEntry, EventKind::ConstructorExit),
            (EventKind::SystemMethodEntry, EventKind::SystemMethodExit),
            (EventKind::DmlBegin, EventKind::DmlEnd),
        ];

        for (entry, exit) in pairs {
            assert!(entry.opens_frame().is_some());
            assert_eq!(entry.opens_frame(), exit.closes_frame());
            assert!(entry.closes_frame().is_none());
        }
        assert!(EventKind::SoqlExecuteBegin.opens_frame().is_none());
    }
}
