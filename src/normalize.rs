//! Splitting blocks that exceed the remote store's per-field limits.
use crate::blocks::{Block, CodeBody, RichText};

/// Maximum characters in one rich text span.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Maximum rich text spans in one block.
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

/// Normalized blocks, plus a human-readable note for every split.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub blocks: Vec<Block>,
    pub warnings: Vec<String>,
}

/// Rewrites oversized blocks into compliant ones.
///
/// - A code block whose single span is over [`MAX_TEXT_LENGTH`] becomes several code blocks, same language.
/// - Otherwise, any span over [`MAX_TEXT_LENGTH`] is split in place into several spans with the same formatting.
/// - Then, a block with more than [`MAX_RICH_TEXT_ITEMS`] spans becomes several blocks of the same type.
///
/// Nested children are normalized too. When a block with children is split, the children stay on the last piece.
/// Lengths are counted in chars. Equation spans are never split.
///
/// Every block this returns is within the limits, so normalizing again is a no-op.
///
/// # Examples
///
/// ```
/// use md2notion::blocks::*;
/// use md2notion::normalize::normalize;
///
/// let code = Block::Code(CodeBody {
///     rich_text: vec![RichText::plain("x".repeat(5000))],
///     language: "plain text".to_string(),
/// });
/// let normalized = normalize(vec![code]);
/// assert_eq!(normalized.blocks.len(), 3);
/// assert_eq!(normalized.warnings, ["Split code block with 5000 characters into 3 blocks"]);
/// ```
pub fn normalize(blocks: Vec<Block>) -> Normalized {
    let mut result = Normalized::default();
    result.blocks = normalize_all(blocks, &mut result.warnings);
    result
}

fn normalize_all(blocks: Vec<Block>, warnings: &mut Vec<String>) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let children = block.children_mut().map(std::mem::take).unwrap_or_default();
        let mut pieces = split_block(block, warnings);
        if !children.is_empty() {
            let children = normalize_all(children, warnings);
            if let Some(slot) = pieces.last_mut().and_then(Block::children_mut) {
                *slot = children;
            }
        }
        out.extend(pieces);
    }
    out
}

fn split_block(mut block: Block, warnings: &mut Vec<String>) -> Vec<Block> {
    if let Block::Code(code) = &block {
        if let Some(pieces) = split_code(code, warnings) {
            return pieces;
        }
    }

    let type_name = block.type_name();
    let Some(rich_text) = block.rich_text_mut() else {
        return vec![block];
    };
    if rich_text.iter().any(is_long_text) {
        let spans = std::mem::take(rich_text);
        *rich_text = spans.into_iter().flat_map(split_span).collect();
        warn(warnings, format!("Split long text content in {type_name} block"));
    }
    if rich_text.len() <= MAX_RICH_TEXT_ITEMS {
        return vec![block];
    }

    let spans = std::mem::take(rich_text);
    let count = spans.len();
    let pieces = count.div_ceil(MAX_RICH_TEXT_ITEMS);
    warn(
        warnings,
        format!("Split {type_name} block with {count} rich_text elements into {pieces} blocks"),
    );
    spans
        .chunks(MAX_RICH_TEXT_ITEMS)
        .map(|chunk| {
            let mut piece = block.clone();
            if let Some(slot) = piece.rich_text_mut() {
                *slot = chunk.to_vec();
            }
            piece
        })
        .collect()
}

fn split_code(code: &CodeBody, warnings: &mut Vec<String>) -> Option<Vec<Block>> {
    let [only] = code.rich_text.as_slice() else {
        return None;
    };
    let text = only.text_content()?;
    let len = text.chars().count();
    if len <= MAX_TEXT_LENGTH {
        return None;
    }
    let pieces = split_chars(text, MAX_TEXT_LENGTH);
    warn(
        warnings,
        format!("Split code block with {len} characters into {} blocks", pieces.len()),
    );
    Some(
        pieces
            .into_iter()
            .map(|piece| {
                Block::Code(CodeBody {
                    rich_text: vec![only.with_content(piece)],
                    language: code.language.clone(),
                })
            })
            .collect(),
    )
}

fn is_long_text(span: &RichText) -> bool {
    span.text_content()
        .is_some_and(|text| text.chars().count() > MAX_TEXT_LENGTH)
}

fn split_span(span: RichText) -> Vec<RichText> {
    match span.text_content() {
        Some(text) if text.chars().count() > MAX_TEXT_LENGTH => split_chars(text, MAX_TEXT_LENGTH)
            .into_iter()
            .map(|piece| span.with_content(piece))
            .collect(),
        _ => vec![span],
    }
}

fn split_chars(text: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        if count == max {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn warn(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}
