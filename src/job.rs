//! One markdown document, one target page: validation, conversion and publishing as a single unit of work.
use crate::convert::{convert_markdown, ConvertError, ConvertOptions};
use crate::normalize::normalize;
use crate::outline::ToggleStructure;
use crate::publish::{publish_outline, BatchPublisher, BlockStore, PublishError, PublishReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A validated page id: 32 hex digits, with or without the dashes of the UUID form.
///
/// The id keeps the form it was given in (minus surrounding whitespace).
///
/// ```
/// use md2notion::job::PageId;
///
/// assert!(PageId::parse("0123456789abcdef0123456789ABCDEF").is_ok());
/// assert!(PageId::parse("01234567-89ab-cdef-0123-456789abcdef").is_ok());
/// assert!(PageId::parse("not-a-page").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyPageId);
        }
        let hex: String = trimmed.chars().filter(|&ch| ch != '-').collect();
        if hex.len() != 32 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(InputError::InvalidPageId(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The supported operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// Append the converted blocks to the end of a page.
    AppendToPage,
}

impl FromStr for Operation {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appendToPage" => Ok(Operation::AppendToPage),
            other => Err(InputError::UnknownOperation(other.to_string())),
        }
    }
}

/// One unit of input, as the host supplies it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default = "default_operation")]
    pub operation: String,
    pub page_id: String,
    pub markdown: String,
    #[serde(default)]
    pub options: ConvertOptions,
}

fn default_operation() -> String {
    "appendToPage".to_string()
}

impl Item {
    pub fn new(page_id: impl Into<String>, markdown: impl Into<String>, options: ConvertOptions) -> Self {
        Self {
            operation: default_operation(),
            page_id: page_id.into(),
            markdown: markdown.into(),
            options,
        }
    }
}

/// The outcome of one item.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemResult {
    Published(PublishedItem),
    Failed(FailedItem),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedItem {
    pub success: bool,
    pub page_id: String,
    pub added_count: usize,
    pub chunk_count: usize,
    /// Blocks the document converted into, before normalization.
    pub total_blocks_produced: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub raw_responses: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FailedItem {
    pub success: bool,
    pub error: String,
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemResult::Published(_))
    }
}

/// Bad input. These are never retried.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputError {
    EmptyPageId,
    InvalidPageId(String),
    EmptyMarkdown,
    UnknownOperation(String),
}

impl std::error::Error for InputError {}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::EmptyPageId => f.write_str("Page ID is required and cannot be empty."),
            InputError::InvalidPageId(_) => f.write_str(
                "Invalid Page ID format. Expected a UUID (32 or 36 characters). You can find the Page ID in the Notion page URL.",
            ),
            InputError::EmptyMarkdown => f.write_str("Markdown content is required and cannot be empty."),
            InputError::UnknownOperation(op) => write!(f, "The operation {op:?} is not supported"),
        }
    }
}

/// Why one item failed.
#[derive(Debug)]
pub enum ItemError {
    Input(InputError),
    Convert(ConvertError),
    Publish(PublishError),
}

impl std::error::Error for ItemError {}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemError::Input(err) => write!(f, "{err}"),
            ItemError::Convert(err) => write!(f, "{err}"),
            ItemError::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl From<InputError> for ItemError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<ConvertError> for ItemError {
    fn from(value: ConvertError) -> Self {
        Self::Convert(value)
    }
}

impl From<PublishError> for ItemError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}

/// The item at `index` failed, and the run stopped there.
#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub error: ItemError,
}

impl std::error::Error for ItemFailure {}

impl Display for ItemFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "item {}: {}", self.index, self.error)
    }
}

/// Validates, converts and publishes one item.
///
/// With `toggle_headings`, the document is published as a collapsible outline (see [`publish_outline`]); otherwise
/// as a flat list of blocks under the page.
pub fn process_item<S: BlockStore>(item: &Item, store: &mut S) -> Result<PublishedItem, ItemError> {
    let Operation::AppendToPage = item.operation.parse()?;
    let page_id = PageId::parse(&item.page_id)?;
    if item.markdown.trim().is_empty() {
        return Err(InputError::EmptyMarkdown.into());
    }

    let blocks = convert_markdown(&item.markdown, &item.options)?;
    let total_blocks_produced = blocks.len();
    tracing::debug!(page_id = page_id.as_str(), blocks = total_blocks_produced, "converted markdown");

    let report = if item.options.toggle_headings {
        let normalized = normalize(blocks);
        let mut report = PublishReport {
            warnings: normalized.warnings,
            ..PublishReport::default()
        };
        report.absorb(publish_outline(
            store,
            page_id.as_str(),
            ToggleStructure::build(normalized.blocks),
        )?);
        report
    } else {
        BatchPublisher::new(store).publish(page_id.as_str(), blocks)?
    };

    Ok(PublishedItem {
        success: true,
        page_id: page_id.to_string(),
        added_count: report.added_count,
        chunk_count: report.chunk_count,
        total_blocks_produced,
        warnings: report.warnings,
        raw_responses: report.raw_responses,
    })
}

/// Processes items in order.
///
/// With `continue_on_fail`, an item's failure is recorded in its result and the run goes on. Without it, the first
/// failure stops the run.
pub fn process_items<S: BlockStore>(
    items: &[Item],
    store: &mut S,
    continue_on_fail: bool,
) -> Result<Vec<ItemResult>, ItemFailure> {
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match process_item(item, store) {
            Ok(published) => results.push(ItemResult::Published(published)),
            Err(error) if continue_on_fail => {
                tracing::warn!(index, %error, "item failed; continuing");
                results.push(ItemResult::Failed(FailedItem {
                    success: false,
                    error: error.to_string(),
                }));
            }
            Err(error) => return Err(ItemFailure { index, error }),
        }
    }
    Ok(results)
}
