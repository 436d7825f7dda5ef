use crate::blocks::Block;
use crate::outline::{HeadingNode, ToggleStructure};
use crate::publish::{BatchPublisher, BlockStore, PublishError, PublishReport};

/// Publishes a heading tree as a collapsible outline.
///
/// Orphan blocks go first, straight under `page_id`. Then each heading, depth-first in document order: the heading
/// alone (as a toggleable heading), then its content under it, then its sub-headings under it. A heading has to exist
/// before anything can be appended to it, so every heading costs its own request.
///
/// If the store doesn't report an id for a heading (it was rejected, or the reply had no ids), that heading's
/// content and sub-headings go to the heading's own parent instead, with a warning.
pub fn publish_outline<S: BlockStore>(
    store: &mut S,
    page_id: &str,
    structure: ToggleStructure,
) -> Result<PublishReport, PublishError> {
    let ToggleStructure {
        root_nodes,
        orphan_blocks,
    } = structure;
    let mut report = PublishReport::default();
    if !orphan_blocks.is_empty() {
        report.absorb(BatchPublisher::new(store).publish(page_id, orphan_blocks)?);
    }

    let mut pending: Vec<(String, HeadingNode)> =
        root_nodes.into_iter().rev().map(|node| (page_id.to_string(), node)).collect();
    while let Some((parent_id, node)) = pending.pop() {
        let HeadingNode {
            mut heading,
            children,
            sub_headings,
            ..
        } = node;
        if let Block::Heading(_, body) = &mut heading {
            body.is_toggleable = true;
        }
        let title = heading.plain_text();

        let heading_report = BatchPublisher::new(store).publish(&parent_id, vec![heading])?;
        let heading_id = heading_report.created_ids.first().cloned();
        report.absorb(heading_report);

        let content_parent = match heading_id {
            Some(id) => id,
            None => {
                let warning = format!("Heading {title:?} was not created; its content was added to its parent instead");
                tracing::warn!("{warning}");
                report.warnings.push(warning);
                parent_id
            }
        };
        if !children.is_empty() {
            report.absorb(BatchPublisher::new(store).publish(&content_parent, children)?);
        }
        pending.extend(
            sub_headings
                .into_iter()
                .rev()
                .map(|sub| (content_parent.clone(), sub)),
        );
    }
    tracing::info!(
        page_id,
        added = report.added_count,
        requests = report.chunk_count,
        "published outline"
    );
    Ok(report)
}
