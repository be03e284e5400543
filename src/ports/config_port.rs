//! Configuration access port trait.
//!
//! Missing keys fall back to the supplied default. A key that is present but
//! cannot be read as the requested type is an error, never a silent default.

use crate::domain::error::EngineError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, EngineError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, EngineError>;
}
