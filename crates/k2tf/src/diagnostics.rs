use core::fmt;

use thisisplural::Plural;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A field had no declared wire name; its raw name was used.
    MissingWireName,
    /// A wrapper scalar without a dedicated conversion was written as text.
    UnhandledScalar,
    /// An attribute or block is absent from the target schema and was left out.
    Excluded,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingWireName | Self::UnhandledScalar => Severity::Note,
            Self::Excluded => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Schema path the diagnostic refers to.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Soft findings of one translation. Every entry is also emitted as a
/// `tracing` event when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Plural)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            severity: kind.severity(),
            kind,
            path: path.into(),
            message: message.into(),
        };
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Note => tracing::info!(path = %diagnostic.path, "{}", diagnostic.message),
        }
        self.0.push(diagnostic);
    }

    pub fn excluded(&mut self, path: &str) {
        self.record(
            DiagnosticKind::Excluded,
            path,
            "excluded attribute - not in target schema",
        );
    }

    /// Number of schema exclusions.
    pub fn warning_count(&self) -> usize {
        self.0
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exclusions_are_warnings() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record(DiagnosticKind::MissingWireName, "kubernetes_pod.spec", "no wire name");
        diagnostics.record(DiagnosticKind::UnhandledScalar, "kubernetes_pod.spec.x", "opaque");
        diagnostics.excluded("kubernetes_pod.spec.unknown");

        assert_eq!(diagnostics.0.len(), 3);
        assert_eq!(diagnostics.warning_count(), 1);
        let excluded: Vec<_> = diagnostics.of_kind(DiagnosticKind::Excluded).collect();
        assert_eq!(excluded[0].path, "kubernetes_pod.spec.unknown");
        assert_eq!(
            excluded[0].to_string(),
            "kubernetes_pod.spec.unknown: excluded attribute - not in target schema"
        );
    }
}
