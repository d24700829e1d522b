// Domain layer: packaging model, raw persisted records and ports (interfaces).
// Only std, chrono, serde and thiserror are used here.

pub mod error;
pub mod model;
pub mod packaging;
pub mod ports;
