//! Call event and source location types.
//!
//! These are the wire-facing types shared between the event source, the
//! tree builder, and the capture file format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source file and line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path as reported by the runtime
    pub file: String,

    /// 1-based line number
    pub line: u32,
}

impl SourceLocation {
    /// Create a new location
    ///
    /// **Public** - constructor
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One notification from the call event source.
///
/// Events arrive in strict execution order and nest properly: every
/// `Return` closes the most recent unmatched `Call`. The method name is
/// only known at return time, which is why it lives on the `Return` arm.
///
/// Capture format: `{"event": "call", "file": "a.rb", "line": 1}` /
/// `{"event": "return", "file": "a.rb", "line": 10, "method": "outer"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CallEvent {
    /// Function entry
    Call { file: String, line: u32 },

    /// Function exit
    Return {
        file: String,
        line: u32,
        method: String,
    },
}

impl CallEvent {
    /// Convenience constructor for a call event
    pub fn call(file: impl Into<String>, line: u32) -> Self {
        Self::Call {
            file: file.into(),
            line,
        }
    }

    /// Convenience constructor for a return event
    pub fn ret(file: impl Into<String>, line: u32, method: impl Into<String>) -> Self {
        Self::Return {
            file: file.into(),
            line,
            method: method.into(),
        }
    }

    /// Location the event was raised at
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::Call { file, line } | Self::Return { file, line, .. } => {
                SourceLocation::new(file.clone(), *line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = CallEvent::ret("a.rb", 10, "outer");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "return");
        assert_eq!(json["file"], "a.rb");
        assert_eq!(json["line"], 10);
        assert_eq!(json["method"], "outer");
    }

    #[test]
    fn test_event_roundtrip_call() {
        let raw = r#"{"event":"call","file":"a.rb","line":1}"#;
        let event: CallEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, CallEvent::call("a.rb", 1));
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("lib/app.rb", 42);
        assert_eq!(loc.to_string(), "lib/app.rb:42");
    }
}
