//! Convert Markdown into Notion blocks, and publish them.
//!
//! The pipeline, front to back:
//!
//! 1. [`convert`] parses Markdown into [`blocks::Block`]s. Delimited math is hidden from the parser so formulas come
//!    through verbatim, and unbalanced code fences are closed first.
//! 2. [`normalize`] splits anything over the remote store's size limits: 2000 characters per text span, 100 spans per
//!    block.
//! 3. [`publish`] sends blocks to a [`publish::BlockStore`] in chunks of at most 100, bisecting any rejected chunk
//!    down to the individual blocks that caused it. In collapsible-outline mode, [`outline`] first arranges the
//!    blocks into a heading tree, and each heading is published as a toggle holding its section.
//! 4. [`job`] wraps all that into a single validated unit of work per page, and [`run`] into a CLI-like workflow.
//!
//! The remote store is abstract: this crate makes no network calls itself. Supply your own [`publish::BlockStore`]
//! (any `FnMut(&str, &[Block]) -> Result<Value, TransportError>` works), or use [`publish::DryRunStore`] to see the
//! requests a publish would make.
//!
//! ```
//! use md2notion::convert::{convert_markdown, ConvertOptions};
//! use md2notion::publish::{BatchPublisher, DryRunStore};
//!
//! let blocks = convert_markdown("# Hello\n\nThe formula $a_1 * b_2$ stays intact.", &ConvertOptions::default())?;
//! assert_eq!(blocks.len(), 2);
//!
//! let mut store = DryRunStore::default();
//! let report = BatchPublisher::new(&mut store).publish("some-page", blocks)?;
//! assert_eq!(report.added_count, 2);
//! assert_eq!(report.chunk_count, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod blocks;
pub mod convert;
pub mod job;
pub mod normalize;
pub mod outline;
pub mod publish;
pub mod run;
