// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use codespan_reporting::diagnostic::{Diagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::Buffer;

/// Severity of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    fn severity(self) -> Severity {
        match self {
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
        }
    }
}

/// Collects source files and renders span-labelled diagnostics for them.
pub struct DiagnosticHandler {
    files: SimpleFiles<String, String>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticHandler {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Registers a source file and returns its id for later spans.
    pub fn add_file(&mut self, name: String, source: String) -> usize {
        self.files.add(name, source)
    }

    /// Emits a message that has no source location.
    pub fn emit_general_message(&mut self, message: &str, level: Level) {
        let diagnostic: Diagnostic<usize> =
            Diagnostic::new(level.severity()).with_message(message.to_string());
        self.emit(&diagnostic, level);
    }

    /// Emits a message labelled with a byte range in a registered file.
    pub fn emit_diagnostic_span(
        &mut self,
        message: &str,
        fileid: usize,
        start: usize,
        end: usize,
        level: Level,
    ) {
        let label = Label::new(LabelStyle::Primary, fileid, start..end);
        let diagnostic = Diagnostic::new(level.severity())
            .with_message(message.to_string())
            .with_labels(vec![label]);
        self.emit(&diagnostic, level);
    }

    fn emit(&mut self, diagnostic: &Diagnostic<usize>, level: Level) {
        match level {
            Level::Error => self.error_count += 1,
            Level::Warning => self.warning_count += 1,
        }
        let mut buffer = Buffer::no_color();
        let config = term::Config::default();
        // rendering failures only lose the pretty form of the message
        if term::emit(&mut buffer, &config, &self.files, diagnostic).is_ok() {
            eprint!("{}", String::from_utf8_lossy(buffer.as_slice()));
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }
}

impl Default for DiagnosticHandler {
    fn default() -> Self {
        Self::new()
    }
}
