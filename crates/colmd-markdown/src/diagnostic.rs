//! Conversion diagnostics.
//!
//! Conversion never fails. Anything suspicious in the input is recorded as a
//! [`Diagnostic`] on the result and mirrored to `tracing`.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Recognized directive with a malformed payload.
    DirectivePayload,
    /// `parent`/`insert` pair that names no registered column.
    UnresolvedReference,
    /// Active region that no longer resolves to a column.
    StaleRegion,
    /// Region close without an open region, or a region left open.
    UnbalancedRegion,
    /// Container id declared more than once.
    DuplicateContainer,
}

impl DiagnosticKind {
    /// Default severity for this kind.
    pub fn severity(self) -> Severity {
        match self {
            Self::UnbalancedRegion => Severity::Info,
            Self::DirectivePayload
            | Self::UnresolvedReference
            | Self::StaleRegion
            | Self::DuplicateContainer => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectivePayload => "directive-payload",
            Self::UnresolvedReference => "unresolved-reference",
            Self::StaleRegion => "stale-region",
            Self::UnbalancedRegion => "unbalanced-region",
            Self::DuplicateContainer => "duplicate-container",
        }
    }
}

/// A single recorded problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Offending directive text or registry key.
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.severity.as_str(),
            self.kind.as_str(),
            self.message
        )?;
        if !self.context.is_empty() {
            write!(f, " ({})", self.context.trim())?;
        }
        Ok(())
    }
}

/// Diagnostic sink owned by one conversion.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a diagnostic and emit it through `tracing`.
    pub(crate) fn push(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        context: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            severity: kind.severity(),
            kind,
            message: message.into(),
            context: context.into(),
        };
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(
                kind = diagnostic.kind.as_str(),
                context = %diagnostic.context,
                "{}",
                diagnostic.message
            ),
            Severity::Info => tracing::info!(
                kind = diagnostic.kind.as_str(),
                context = %diagnostic.context,
                "{}",
                diagnostic.message
            ),
        }
        self.items.push(diagnostic);
    }

    pub(crate) fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    #[cfg(test)]
    pub(crate) fn kinds(&self) -> Vec<DiagnosticKind> {
        self.items.iter().map(|d| d.kind).collect()
    }
}
