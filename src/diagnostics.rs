/// Severity of a non-fatal condition surfaced during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
}

/// A single non-fatal finding collected while assembling a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: Option<u32>,
    pub message: String,
}

/// Collects diagnostics produced over the course of an assembly run.
///
/// Every diagnostic is also emitted as a `tracing` event so a host
/// application can route it to whatever log sink it prefers; this type
/// only owns the list that gets handed back to the caller.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics(Vec::new())
    }

    pub fn warn(&mut self, line: Option<u32>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(line = ?line, "{}", message);
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            line,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
