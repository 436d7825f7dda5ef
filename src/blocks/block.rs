use crate::blocks::RichText;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// One unit of remote document content.
///
/// Each variant maps to exactly one remote block type. The wire shape nests the body under a key named after the
/// type:
///
/// ```json
/// {"object": "block", "type": "paragraph", "paragraph": {"rich_text": [...]}}
/// ```
///
/// # Examples
///
/// ```
/// use md2notion::blocks::*;
///
/// let block = Block::Paragraph(TextBody::new(vec![RichText::plain("Hello")]));
/// let json = serde_json::to_value(&block).unwrap();
/// assert_eq!(json["type"], "paragraph");
/// assert_eq!(json["paragraph"]["rich_text"][0]["text"]["content"], "Hello");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    Heading(HeadingLevel, HeadingBody),
    Paragraph(TextBody),
    BulletedListItem(TextBody),
    NumberedListItem(TextBody),
    Code(CodeBody),
    Quote(TextBody),
    Divider,
    Bookmark(BookmarkBody),
    Table(TableBody),
    TableRow(TableRowBody),
    Toggle(TextBody),
    Equation(EquationBody),
}

/// Heading levels the remote store supports. Deeper markdown headings clamp to [`HeadingLevel::H3`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Clamps a markdown heading depth (1-6) into a supported level.
    pub fn from_depth(depth: u8) -> Self {
        match depth {
            0 | 1 => Self::H1,
            2 => Self::H2,
            _ => Self::H3,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }
}

/// Serializes as the bare number, `1` to `3`.
impl Serialize for HeadingLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Body for paragraphs, list items, quotes and toggles.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TextBody {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl TextBody {
    pub fn new(rich_text: Vec<RichText>) -> Self {
        Self {
            rich_text,
            children: Vec::new(),
        }
    }

    pub fn with_children(rich_text: Vec<RichText>, children: Vec<Block>) -> Self {
        Self { rich_text, children }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct HeadingBody {
    pub rich_text: Vec<RichText>,
    /// Set for collapsible-outline publishing, where the heading's content becomes its children.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_toggleable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CodeBody {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BookmarkBody {
    pub url: String,
}

/// A table. Its rows are [`Block::TableRow`]s carried as children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TableBody {
    pub table_width: usize,
    pub has_column_header: bool,
    pub has_row_header: bool,
    pub children: Vec<Block>,
}

/// A table row: one `Vec<RichText>` per cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TableRowBody {
    pub cells: Vec<Vec<RichText>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EquationBody {
    pub expression: String,
}

#[derive(Serialize)]
struct EmptyBody {}

impl Block {
    pub fn heading(level: HeadingLevel, rich_text: Vec<RichText>) -> Self {
        Self::Heading(
            level,
            HeadingBody {
                rich_text,
                is_toggleable: false,
            },
        )
    }

    /// The remote type tag, e.g. `"heading_2"` or `"bulleted_list_item"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Heading(HeadingLevel::H1, _) => "heading_1",
            Block::Heading(HeadingLevel::H2, _) => "heading_2",
            Block::Heading(HeadingLevel::H3, _) => "heading_3",
            Block::Paragraph(_) => "paragraph",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::Code(_) => "code",
            Block::Quote(_) => "quote",
            Block::Divider => "divider",
            Block::Bookmark(_) => "bookmark",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
            Block::Toggle(_) => "toggle",
            Block::Equation(_) => "equation",
        }
    }

    pub fn heading_level(&self) -> Option<HeadingLevel> {
        match self {
            Block::Heading(level, _) => Some(*level),
            _ => None,
        }
    }

    /// The block's rich text, for the variants that carry one.
    pub fn rich_text(&self) -> Option<&[RichText]> {
        match self {
            Block::Heading(_, body) => Some(&body.rich_text),
            Block::Paragraph(body)
            | Block::BulletedListItem(body)
            | Block::NumberedListItem(body)
            | Block::Quote(body)
            | Block::Toggle(body) => Some(&body.rich_text),
            Block::Code(body) => Some(&body.rich_text),
            Block::Divider | Block::Bookmark(_) | Block::Table(_) | Block::TableRow(_) | Block::Equation(_) => None,
        }
    }

    pub fn rich_text_mut(&mut self) -> Option<&mut Vec<RichText>> {
        match self {
            Block::Heading(_, body) => Some(&mut body.rich_text),
            Block::Paragraph(body)
            | Block::BulletedListItem(body)
            | Block::NumberedListItem(body)
            | Block::Quote(body)
            | Block::Toggle(body) => Some(&mut body.rich_text),
            Block::Code(body) => Some(&mut body.rich_text),
            Block::Divider | Block::Bookmark(_) | Block::Table(_) | Block::TableRow(_) | Block::Equation(_) => None,
        }
    }

    /// Nested child blocks that travel inside this block's body. Tables own their rows, but rows aren't content
    /// in their own right, so tables report `None` here.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::Paragraph(body)
            | Block::BulletedListItem(body)
            | Block::NumberedListItem(body)
            | Block::Quote(body)
            | Block::Toggle(body) => Some(&mut body.children),
            _ => None,
        }
    }

    /// Concatenated plain text of the block's rich text (empty for blocks without one).
    pub fn plain_text(&self) -> String {
        match self.rich_text() {
            Some(rich_text) => rich_text.iter().map(RichText::plain_text).collect(),
            None => String::new(),
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let type_name = self.type_name();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("type", type_name)?;
        match self {
            Block::Heading(_, body) => map.serialize_entry(type_name, body)?,
            Block::Paragraph(body)
            | Block::BulletedListItem(body)
            | Block::NumberedListItem(body)
            | Block::Quote(body)
            | Block::Toggle(body) => map.serialize_entry(type_name, body)?,
            Block::Code(body) => map.serialize_entry(type_name, body)?,
            Block::Divider => map.serialize_entry(type_name, &EmptyBody {})?,
            Block::Bookmark(body) => map.serialize_entry(type_name, body)?,
            Block::Table(body) => map.serialize_entry(type_name, body)?,
            Block::TableRow(body) => map.serialize_entry(type_name, body)?,
            Block::Equation(body) => map.serialize_entry(type_name, body)?,
        }
        map.end()
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.type_name(), self.plain_text())
    }
}
