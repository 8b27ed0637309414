use crate::diagnostics::ValidationError;
use crate::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum DeviceAutomationError {
    /// The config cannot be used for this device automation.
    #[error("Invalid device automation config: {0}")]
    InvalidConfig(String),

    /// The config does not match the platform's schema.
    #[error("Invalid device automation config: {}", join_errors(.0))]
    Schema(Vec<ValidationError>),

    #[error(transparent)]
    Host(#[from] HostError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
