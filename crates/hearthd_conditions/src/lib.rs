pub mod automation;
pub mod condition;
pub mod config;
pub mod device_automation;
pub mod diagnostics;
pub mod engine;
pub mod host;
pub mod sensor;

pub use automation::AutomationFile;
pub use config::Config;
pub use config::LogLevel;
pub use diagnostics::Diagnostic;
pub use diagnostics::format_diagnostics;
pub use engine::Engine;
pub use engine::State;
pub use host::Host;
