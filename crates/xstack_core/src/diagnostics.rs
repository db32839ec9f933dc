//! Non-fatal findings collected during a run.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A lifecycle the family does not implement; the declaration was dropped.
    UnsupportedLifecycle,
    /// An `x-` section no registered family owns.
    UnknownSection,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnsupportedLifecycle => write!(f, "unsupported-lifecycle"),
            DiagnosticKind::UnknownSection => write!(f, "unknown-section"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub family: String,
    /// Resource the finding is about, when it concerns a single declaration.
    pub name: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[{}] {}.{} - {}", self.kind, self.family, name, self.message),
            None => write!(f, "[{}] {} - {}", self.kind, self.family, self.message),
        }
    }
}

/// Diagnostics sink owned by the run context.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it through `tracing`.
    pub fn warn(
        &mut self,
        kind: DiagnosticKind,
        family: impl Into<String>,
        name: Option<&str>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            family: family.into(),
            name: name.map(str::to_string),
            message: message.into(),
        };
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
