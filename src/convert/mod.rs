//! Markdown to blocks.
//!
//! [`convert_markdown`] is the whole pipeline: hide math spans, close any unterminated code fences, parse, and map
//! the syntax tree onto [`Block`]s. The pieces are public too, for callers that want to drive them separately.
mod fences;
mod inlines;
mod math;
mod transform;

pub use fences::*;
pub use math::*;
pub use transform::{language_alias, BlockTransformer};

use crate::blocks::Block;
use derive_builder::Builder;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Conversion options. These mirror the host's options bag, so they deserialize from its camelCase keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Builder, Deserialize)]
#[builder(default)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Hide delimited math spans from the markdown parser. Defaults to `true`.
    pub preserve_math: bool,

    /// The inline math delimiter. Defaults to `$`.
    #[builder(setter(into))]
    pub math_delimiter: String,

    /// Also recognize `$$...$$`, `\[...\]` and `\(...\)`, and emit formulas as equations rather than source text.
    /// Only takes effect with `preserve_math`.
    pub support_latex: bool,

    /// Publish as a collapsible outline, with each heading's content nested under it.
    pub toggle_headings: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_math: true,
            math_delimiter: "$".to_string(),
            support_latex: false,
            toggle_headings: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConvertError {
    /// The markdown parser rejected the input.
    Parse(String),
    /// The math delimiter couldn't be turned into a pattern.
    MathPattern(String),
}

impl std::error::Error for ConvertError {}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Parse(err) => write!(f, "markdown parse error: {err}"),
            ConvertError::MathPattern(err) => write!(f, "invalid math delimiter: {err}"),
        }
    }
}

/// Converts a markdown document into a flat list of blocks.
///
/// The blocks aren't normalized yet; see [`crate::normalize`].
///
/// # Examples
///
/// ```
/// use md2notion::convert::{convert_markdown, ConvertOptions};
///
/// let blocks = convert_markdown("# Main\nHello", &ConvertOptions::default()).unwrap();
/// let types: Vec<_> = blocks.iter().map(|b| b.type_name()).collect();
/// assert_eq!(types, ["heading_1", "paragraph"]);
/// ```
pub fn convert_markdown(markdown: &str, options: &ConvertOptions) -> Result<Vec<Block>, ConvertError> {
    let (hidden, placeholders) = if options.preserve_math {
        MathPlaceholders::hide(markdown, &options.math_delimiter, options.support_latex)
            .map_err(|e| ConvertError::MathPattern(format!("{e}")))?
    } else {
        (markdown.to_string(), MathPlaceholders::none())
    };
    if !placeholders.is_empty() {
        tracing::debug!(count = placeholders.len(), "hid math spans");
    }
    let balanced = balance_fences(&hidden);
    let root = markdown::to_mdast(&balanced, &markdown::ParseOptions::gfm())
        .map_err(|e| ConvertError::Parse(format!("{e}")))?;

    let support_latex = options.preserve_math && options.support_latex;
    let transformer = BlockTransformer::new(&placeholders, support_latex).with_definitions_from(&root);
    Ok(transformer.transform(&root))
}
