// Adapters layer: concrete implementations for external systems.

pub mod gateway;
pub mod notion;
