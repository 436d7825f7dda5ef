//! Regrouping a flat block list into a heading tree, for collapsible-outline publishing.
use crate::blocks::{Block, HeadingLevel};
use serde::Serialize;

/// A heading, the content directly under it, and its deeper headings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingNode {
    pub level: HeadingLevel,
    pub heading: Block,
    pub children: Vec<Block>,
    pub sub_headings: Vec<HeadingNode>,
}

/// A document as a forest of [`HeadingNode`]s, plus whatever content came before the first heading.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStructure {
    pub root_nodes: Vec<HeadingNode>,
    pub orphan_blocks: Vec<Block>,
}

impl ToggleStructure {
    /// Builds the heading tree in one pass.
    ///
    /// Open headings live on a stack whose levels strictly increase from bottom to top. A heading closes every open
    /// heading at its level or deeper; each closed node is attached to the node under it (or to the roots). Content
    /// goes to the top open heading, or to the orphans if there isn't one.
    ///
    /// # Examples
    ///
    /// ```
    /// use md2notion::convert::{convert_markdown, ConvertOptions};
    /// use md2notion::outline::ToggleStructure;
    ///
    /// let blocks = convert_markdown("Intro\n\n# A\nBody\n## B\nMore", &ConvertOptions::default()).unwrap();
    /// let tree = ToggleStructure::build(blocks);
    /// assert_eq!(tree.orphan_blocks.len(), 1);
    /// assert_eq!(tree.root_nodes.len(), 1);
    /// assert_eq!(tree.root_nodes[0].sub_headings[0].children.len(), 1);
    /// ```
    pub fn build(blocks: Vec<Block>) -> Self {
        let mut result = Self::default();
        let mut open: Vec<HeadingNode> = Vec::with_capacity(3);

        for block in blocks {
            let Some(level) = block.heading_level() else {
                match open.last_mut() {
                    Some(top) => top.children.push(block),
                    None => result.orphan_blocks.push(block),
                }
                continue;
            };
            while let Some(top) = open.last() {
                if top.level < level {
                    break;
                }
                if let Some(closed) = open.pop() {
                    result.attach(&mut open, closed);
                }
            }
            open.push(HeadingNode {
                level,
                heading: block,
                children: Vec::new(),
                sub_headings: Vec::new(),
            });
        }
        while let Some(closed) = open.pop() {
            result.attach(&mut open, closed);
        }
        result
    }

    fn attach(&mut self, open: &mut [HeadingNode], node: HeadingNode) {
        match open.last_mut() {
            Some(parent) => parent.sub_headings.push(node),
            None => self.root_nodes.push(node),
        }
    }

    /// Every heading, in document order.
    pub fn headings(&self) -> Vec<&Block> {
        let mut result = Vec::new();
        let mut pending: Vec<&HeadingNode> = self.root_nodes.iter().rev().collect();
        while let Some(node) = pending.pop() {
            result.push(&node.heading);
            pending.extend(node.sub_headings.iter().rev());
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.root_nodes.is_empty() && self.orphan_blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::*;
    use serde_json::json;

    #[test]
    fn empty() {
        let tree = ToggleStructure::build(vec![]);
        assert!(tree.is_empty());
    }

    #[test]
    fn only_orphans() {
        let tree = ToggleStructure::build(vec![paragraph!("a"), paragraph!("b")]);
        assert_eq!(
            tree,
            ToggleStructure {
                root_nodes: vec![],
                orphan_blocks: vec![paragraph!("a"), paragraph!("b")],
            }
        );
    }

    #[test]
    fn nested_headings() {
        let tree = ToggleStructure::build(vec![
            heading!(H1, "Main"),
            paragraph!("Hello"),
            heading!(H2, "Sub"),
            paragraph!("World"),
        ]);
        assert_eq!(
            tree,
            ToggleStructure {
                root_nodes: vec![HeadingNode {
                    level: HeadingLevel::H1,
                    heading: heading!(H1, "Main"),
                    children: vec![paragraph!("Hello")],
                    sub_headings: vec![HeadingNode {
                        level: HeadingLevel::H2,
                        heading: heading!(H2, "Sub"),
                        children: vec![paragraph!("World")],
                        sub_headings: vec![],
                    }],
                }],
                orphan_blocks: vec![],
            }
        );
    }

    #[test]
    fn orphans_before_first_heading() {
        let tree = ToggleStructure::build(vec![paragraph!("Orphan text"), heading!(H1, "H1"), paragraph!("Body")]);
        assert_eq!(tree.orphan_blocks, vec![paragraph!("Orphan text")]);
        assert_eq!(tree.root_nodes.len(), 1);
        assert_eq!(tree.root_nodes[0].children, vec![paragraph!("Body")]);
    }

    #[test]
    fn same_level_headings_are_siblings() {
        let tree = ToggleStructure::build(vec![heading!(H2, "a"), heading!(H2, "b"), heading!(H2, "c")]);
        assert_eq!(tree.root_nodes.len(), 3);
        assert!(tree.root_nodes.iter().all(|n| n.sub_headings.is_empty()));
    }

    #[test]
    fn shallower_heading_closes_deeper_ones() {
        let tree = ToggleStructure::build(vec![
            heading!(H1, "one"),
            heading!(H2, "one.a"),
            heading!(H3, "one.a.i"),
            paragraph!("deep"),
            heading!(H2, "one.b"),
            heading!(H1, "two"),
            paragraph!("shallow"),
        ]);
        assert_eq!(tree.root_nodes.len(), 2);
        let one = &tree.root_nodes[0];
        assert_eq!(one.sub_headings.len(), 2);
        assert_eq!(one.sub_headings[0].sub_headings[0].children, vec![paragraph!("deep")]);
        assert!(one.sub_headings[1].sub_headings.is_empty());
        assert_eq!(tree.root_nodes[1].children, vec![paragraph!("shallow")]);
    }

    #[test]
    fn first_heading_deeper_than_later_ones() {
        let tree = ToggleStructure::build(vec![heading!(H3, "deep"), heading!(H1, "top"), heading!(H2, "mid")]);
        assert_eq!(tree.root_nodes.len(), 2);
        assert_eq!(tree.root_nodes[0].level, HeadingLevel::H3);
        assert_eq!(tree.root_nodes[1].sub_headings[0].level, HeadingLevel::H2);
    }

    #[test]
    fn long_documents_keep_invariants() {
        let levels = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3];
        let mut blocks = Vec::new();
        for i in 0..300 {
            let level = levels[(i * 7 + i / 3) % 3];
            blocks.push(Block::heading(level, vec![RichText::plain(format!("h{i}"))]));
            if i % 2 == 0 {
                blocks.push(paragraph!("body"));
            }
        }
        let expected_headings: Vec<_> = blocks.iter().filter(|b| b.heading_level().is_some()).cloned().collect();

        let tree = ToggleStructure::build(blocks);

        let found: Vec<_> = tree.headings().into_iter().cloned().collect();
        assert_eq!(found, expected_headings);

        let mut pending: Vec<&HeadingNode> = tree.root_nodes.iter().collect();
        while let Some(node) = pending.pop() {
            assert_eq!(node.heading.heading_level(), Some(node.level));
            for sub in &node.sub_headings {
                assert!(sub.level > node.level, "{:?} under {:?}", sub.level, node.level);
                pending.push(sub);
            }
        }
    }

    #[test]
    fn serializes_camel_case() {
        let tree = ToggleStructure::build(vec![paragraph!("o"), heading!(H1, "h")]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "rootNodes": [{
                    "level": 1,
                    "heading": {"object": "block", "type": "heading_1", "heading_1": {
                        "rich_text": [{"type": "text", "text": {"content": "h"}}]
                    }},
                    "children": [],
                    "subHeadings": []
                }],
                "orphanBlocks": [{"object": "block", "type": "paragraph", "paragraph": {
                    "rich_text": [{"type": "text", "text": {"content": "o"}}]
                }}]
            })
        );
    }
}
