//! Logger setup.
//!
//! Lapis itself only talks to the `log` facade. Binaries and tests that want
//! output call `init_logging` once; it installs `env_logger`.

mod init;

pub use init::{LoggingConfig, init_logging};
