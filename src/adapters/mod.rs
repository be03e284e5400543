//! Concrete adapter implementations for ports.

pub mod console_renderer;
pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod markdown_report_adapter;
pub mod sample_adapter;
