use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

/// Source information for where a diagnostic came from
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub file_path: PathBuf,
    pub content: String,
}

/// A diagnostic message that can be either a warning or an error
#[derive(Debug, Clone)]
pub enum Diagnostic {
    Warning(Warning),
    Error(ValidationError),
}

/// Warning messages that don't prevent an automation file from loading
#[derive(Debug, Clone)]
pub enum Warning {
    EmptyFile { file_path: PathBuf },
}

/// A condition config that failed validation.
///
/// `field_path` names the offending key (empty for whole-config errors). `span` and `source` are
/// filled in when the config was read from a file.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
    pub span: Option<Range<usize>>,
    pub source: Option<SourceInfo>,
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            message: message.into(),
            span: None,
            source: None,
        }
    }

    /// Attach the location of the config this error was found in.
    pub fn located(mut self, span: Range<usize>, source: SourceInfo) -> Self {
        self.span = Some(span);
        self.source = Some(source);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field_path, self.message)
        }
    }
}

impl Diagnostic {
    /// Returns true if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Error(_))
    }

    /// Returns true if this diagnostic is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self, Diagnostic::Warning(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_diagnostics(std::slice::from_ref(self)))
    }
}

/// Format all diagnostics for display using Ariadne
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    use std::io::Write;

    use ariadne::Color;
    use ariadne::Label;
    use ariadne::Report;
    use ariadne::ReportKind;
    use ariadne::Source;

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::Warning(Warning::EmptyFile { file_path }) => {
                writeln!(
                    &mut output,
                    "\x1b[33mWarning\x1b[0m: Empty automation file"
                )
                .ok();
                writeln!(&mut output, "  ┌─ {}:1:1", file_path.display()).ok();
                writeln!(&mut output, "  │").ok();
                writeln!(
                    &mut output,
                    "  = '{}' contains no conditions",
                    file_path.display()
                )
                .ok();
                writeln!(&mut output).ok();
            }
            Diagnostic::Error(error) => {
                if let (Some(span), Some(source_info)) = (&error.span, &error.source) {
                    let file_id = source_info.file_path.to_string_lossy().to_string();
                    let report = Report::build(ReportKind::Error, (file_id.clone(), span.clone()))
                        .with_message(headline(error))
                        .with_label(
                            Label::new((file_id.clone(), span.clone()))
                                .with_message(&error.message)
                                .with_color(Color::Red),
                        )
                        .finish();

                    let source = Source::from(source_info.content.clone());
                    report.write((file_id, source), &mut output).ok();
                } else {
                    // ariadne needs a source to render against
                    let file_path = error
                        .source
                        .as_ref()
                        .map(|s| s.file_path.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());

                    writeln!(&mut output, "\x1b[31mError\x1b[0m: {}", headline(error)).ok();
                    writeln!(&mut output, "  ┌─ {}:1:1", file_path).ok();
                    writeln!(&mut output, "  │").ok();
                    writeln!(&mut output, "  = {}", error.message).ok();
                    writeln!(&mut output).ok();
                }
            }
        }
    }

    String::from_utf8_lossy(&output).to_string()
}

fn headline(error: &ValidationError) -> String {
    if error.field_path.is_empty() {
        "Invalid condition".to_string()
    } else {
        format!("Invalid condition in '{}'", error.field_path)
    }
}
