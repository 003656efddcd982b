//! Common utilities and types shared across minidoc

pub mod config;
pub mod error;
pub mod utils;

pub use config::ClientConfig;
pub use error::{Error, ErrorCategory, Result, TransportError};
pub use utils::{encode_query_value, normalize_url};
