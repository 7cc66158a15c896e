//! Asset models for the microgrid dispatch.

/// Synthetic site base-load profile generator.
pub mod baseload;
/// Stationary battery storage model.
pub mod battery;
/// Backup generator bank.
pub mod generator;
/// Grid connection with import and export limits.
pub mod grid;
/// Solar photovoltaic generation model.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use baseload::BaseLoad;
pub use battery::Battery;
pub use generator::GeneratorBank;
pub use grid::{GridConnection, GridDispatch};
pub use solar::{PvPlant, SolarPv};
pub use types::Device;
pub use types::DeviceContext;
