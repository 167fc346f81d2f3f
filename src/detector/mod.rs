//! Detector and medium properties consumed by the propagation code.

pub mod properties;

pub use properties::{
    ConfigError, ConfigIssue, DetectorProperties, LarProperties, LarPropertiesConfig,
    SternheimerConfig,
};
