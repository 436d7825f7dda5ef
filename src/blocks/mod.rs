//! The output model: typed remote blocks and their rich text.
//!
//! [`Block`] is a closed enum with one variant per remote block type, so every consumer has to handle every type.
//! Both it and [`RichText`] serialize directly into the JSON shape the remote store accepts.
mod block;
mod rich_text;

pub use block::*;
pub use rich_text::*;

#[cfg(test)]
mod blocks_test_utils;
#[cfg(test)]
pub(crate) use blocks_test_utils::*;
