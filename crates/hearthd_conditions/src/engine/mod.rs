pub mod device;
#[allow(clippy::module_inception)]
mod engine;
pub mod entity;
pub mod state;

pub use device::Device;
pub use engine::Engine;
pub use entity::RegistryEntry;
pub use state::SensorState;
pub use state::State;
