use std::fmt;

use crate::span::Span;

/// A compiler diagnostic (error or warning) tagged with the stage that raised it.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Pipeline stage a diagnostic originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Semantic,
    Lowering,
    Emission,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Semantic => "semantic",
            Stage::Lowering => "lowering",
            Stage::Emission => "emission",
        }
    }
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            stage: Stage::Semantic,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            stage: Stage::Semantic,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn in_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        // Clamp so a stale span never points past the end of the source.
        let len = source.len();
        let start = (self.span.start as usize).min(len);
        let end = (self.span.end as usize).clamp(start, len);

        let mut report = Report::build(kind, filename, start)
            .with_message(format!("[{}] {}", self.stage.as_str(), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if let Err(e) = report.finish().eprint((filename, Source::from(source))) {
            eprintln!("{} (could not render: {})", self, e);
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", level, self.stage.as_str(), self.message)?;
        if !self.span.is_dummy() {
            write!(f, " (at {})", self.span)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {}", help)?;
        }
        Ok(())
    }
}

/// Render a list of diagnostics. Without source text, falls back to plain lines.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: Option<&str>) {
    for diag in diagnostics {
        match source {
            Some(src) => diag.render(filename, src),
            None => eprintln!("{}: {}", filename, diag),
        }
    }
}
