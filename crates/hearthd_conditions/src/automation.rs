//! Automation files.
//!
//! An automation file lists device conditions as `[[condition]]` tables:
//!
//! ```toml
//! [[condition]]
//! condition = "device"
//! device_id = "climate_sensor"
//! domain = "sensor"
//! entity_id = "sensor.living_room_temperature"
//! type = "is_temperature"
//! above = 18
//! ```
//!
//! Checking a file validates every condition, compiles the valid ones through the host and
//! evaluates them against a state snapshot. Invalid conditions become diagnostics pointing at the
//! offending table.

use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::device_automation;
use crate::device_automation::DeviceAutomationError;
use crate::device_automation::schema::CONF_ENTITY_ID;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::SourceInfo;
use crate::diagnostics::ValidationError;
use crate::diagnostics::Warning;
use crate::engine::State;
use crate::host::Host;

#[derive(Debug, Deserialize)]
struct RawAutomationFile {
    #[serde(default)]
    condition: Vec<toml::Spanned<toml::Value>>,
}

/// A parsed automation file. Conditions are kept raw until checked.
#[derive(Debug)]
pub struct AutomationFile {
    source: SourceInfo,
    conditions: Vec<(Range<usize>, Value)>,
}

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("Failed to read automation file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse automation file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to convert condition to JSON: {0}")]
    JsonConversion(#[from] serde_json::Error),
}

/// Result of evaluating one valid condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Position of the condition in the file, starting at 0
    pub index: usize,
    pub entity_id: String,
    pub passed: bool,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

impl AutomationFile {
    /// Load an automation file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutomationError::Io(path.to_path_buf(), e))?;
        Self::parse(path.to_path_buf(), content)
    }

    /// Parse automation file contents; `file_path` is only used for reporting.
    pub fn parse(file_path: PathBuf, content: String) -> Result<Self, AutomationError> {
        let raw: RawAutomationFile =
            toml::from_str(&content).map_err(|e| AutomationError::Parse(file_path.clone(), e))?;

        let conditions = raw
            .condition
            .into_iter()
            .map(|spanned| {
                let span = spanned.span();
                let value = serde_json::to_value(spanned.get_ref())?;
                Ok((span, value))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        debug!(
            "Parsed {} condition(s) from {}",
            conditions.len(),
            file_path.display()
        );

        Ok(Self {
            source: SourceInfo { file_path, content },
            conditions,
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Validate, compile and evaluate every condition in the file.
    pub fn check(&self, host: &dyn Host, state: &State) -> CheckReport {
        let mut report = CheckReport::default();

        if self.is_empty() {
            report.diagnostics.push(Diagnostic::Warning(Warning::EmptyFile {
                file_path: self.source.file_path.clone(),
            }));
            return report;
        }

        for (index, (span, config)) in self.conditions.iter().enumerate() {
            match device_automation::condition_from_config(host, config) {
                Ok(check) => {
                    let entity_id = config
                        .get(CONF_ENTITY_ID)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let passed = check(state);
                    info!("Condition #{} on {}: passed={}", index, entity_id, passed);
                    report.outcomes.push(CheckOutcome {
                        index,
                        entity_id,
                        passed,
                    });
                }
                Err(DeviceAutomationError::Schema(errors)) => {
                    report
                        .diagnostics
                        .extend(errors.into_iter().map(|e| self.locate(e, span)));
                }
                Err(e) => {
                    let error = ValidationError::new("", e.to_string());
                    report.diagnostics.push(self.locate(error, span));
                }
            }
        }

        report
    }

    fn locate(&self, error: ValidationError, span: &Range<usize>) -> Diagnostic {
        Diagnostic::Error(error.located(span.clone(), self.source.clone()))
    }
}
