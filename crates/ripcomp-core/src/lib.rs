//! ripcomp-core: Configuration, errors, logging, and session mode state for ripcomp.

pub mod build_info;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod mode;
pub mod paths;

pub use config::{BackendKind, Config, SearchCasing};
pub use error::{Error, Result};
pub use mode::ModeState;
