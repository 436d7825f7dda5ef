//! End-to-end runs.
//!
//! This module combines the [`crate::convert`], [`crate::normalize`], [`crate::outline`], and [`crate::job`] mods into
//! a single workflow. It's useful for building functionality like the CLI's, but running it within-process.
//!
//! ## Example
//!
//! ```
//! # use md2notion::run;
//!
//! // First, let's define a mocked I/O. Replace this with whatever you need.
//! #[derive(Default)]
//! struct MockIo {
//!     stdout: Vec<u8>,
//! }
//!
//! impl run::OsFacade for MockIo {
//!     fn read_stdin(&self) -> std::io::Result<String> {
//!         Ok("# Notes\n\nhello".to_string())
//!     }
//!
//!     fn read_file(&self, path: &str) -> std::io::Result<String> {
//!         Err(std::io::Error::new(std::io::ErrorKind::NotFound, path))
//!     }
//!
//!     fn stdout(&mut self) -> impl std::io::Write {
//!         &mut self.stdout
//!     }
//!
//!     fn write_error(&mut self, err: run::Error) {
//!         eprintln!("{err}")
//!     }
//! }
//!
//! // Now, use it:
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! // Define our "CLI" options. Use the defaults, but ask for the heading outline.
//! let mut cli_options = run::RunOptions::default();
//! cli_options.output = run::OutputFormat::Outline;
//!
//! let mut os_facade = MockIo::default();
//! let ok = run::run(&cli_options, &mut os_facade);
//! let outline: serde_json::Value = serde_json::from_slice(&os_facade.stdout)?;
//!
//! assert!(ok);
//! assert_eq!(outline["rootNodes"][0]["heading"]["type"], "heading_1");
//! assert_eq!(outline["rootNodes"][0]["children"][0]["type"], "paragraph");
//! #
//! #     Ok(())
//! # }
//! ```
mod cli;
mod run_main;

pub use cli::*;
pub use run_main::*;
