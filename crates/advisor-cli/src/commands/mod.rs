//! CLI 명령어 구현 모듈.

pub mod analyze;
pub mod forecast;
pub mod load;
pub mod optimize;
pub mod output;
pub mod sip;

pub use load::{load_series, symbol_from_path};
pub use output::OutputFormat;
