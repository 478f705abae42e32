//! Hierarchical tree layout.
//!
//! Siblings are placed left to right with a fixed gap, every parent is
//! centred over the midpoint of its first and last child, and depth maps
//! linearly to the vertical axis.

use crate::parser::{LogData, NodePosition};
use crate::utils::config::{DEFAULT_HORIZONTAL_GAP, DEFAULT_LEVEL_HEIGHT, DEFAULT_NODE_WIDTH};
use crate::utils::error::LayoutError;
use log::debug;
use std::collections::HashMap;

/// Layout configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub gap: f64,
    pub level_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: DEFAULT_NODE_WIDTH,
            gap: DEFAULT_HORIZONTAL_GAP,
            level_height: DEFAULT_LEVEL_HEIGHT,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_width(mut self, node_width: f64) -> Self {
        self.node_width = node_width;
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_level_height(mut self, level_height: f64) -> Self {
        self.level_height = level_height;
        self
    }

    /// Horizontal distance reserved per leaf
    fn slot(&self) -> f64 {
        self.node_width + self.gap
    }
}

/// Compute positions for every node
///
/// **Public** - main entry point for layout
///
/// # Arguments
/// * `data` - Graph whose `parentId` links form a forest
/// * `config` - Card size and spacing
///
/// # Returns
/// One position per node, parents before their subtrees
///
/// # Errors
/// * `LayoutError::DanglingParent` - a parent id does not exist
/// * `LayoutError::Unreachable` - nodes not reachable from any root (a cycle)
pub fn compute_layout(
    data: &LogData,
    config: &LayoutConfig,
) -> Result<Vec<NodePosition>, LayoutError> {
    let index: HashMap<&str, usize> = data
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); data.nodes.len()];
    let mut roots = Vec::new();

    for (i, node) in data.nodes.iter().enumerate() {
        match node.parent_id.as_deref() {
            None => roots.push(i),
            Some(parent) => {
                let &p = index.get(parent).ok_or_else(|| LayoutError::DanglingParent {
                    node: node.id.clone(),
                    parent: parent.to_string(),
                })?;
                children[p].push(i);
            }
        }
    }

    let mut placer = Placer {
        config,
        children: &children,
        xs: vec![0.0; data.nodes.len()],
        order: Vec::with_capacity(data.nodes.len()),
    };

    let mut offset = 0.0;
    for &root in &roots {
        offset = placer.place(root, offset);
    }

    if placer.order.len() != data.nodes.len() {
        return Err(LayoutError::Unreachable(
            data.nodes.len() - placer.order.len(),
        ));
    }

    debug!(
        "Laid out {} nodes across {} root(s), width {:.0}",
        data.nodes.len(),
        roots.len(),
        offset
    );

    Ok(placer
        .order
        .iter()
        .map(|&(i, level)| NodePosition {
            id: data.nodes[i].id.clone(),
            x: placer.xs[i],
            y: level as f64 * config.level_height,
            level,
        })
        .collect())
}

/// Placement state shared across roots
///
/// **Private** - internal state for compute_layout
struct Placer<'a> {
    config: &'a LayoutConfig,
    children: &'a [Vec<usize>],
    xs: Vec<f64>,
    /// (node index, level) in pre-order
    order: Vec<(usize, usize)>,
}

/// A node whose subtree is being placed
///
/// **Private** - work item for Placer::place
struct Pending {
    node: usize,
    level: usize,
    /// Left edge of the subtree
    offset: f64,
    /// Next child to place
    child: usize,
    /// Next free offset after the children placed so far
    next: f64,
}

impl Placer<'_> {
    /// Place the subtree under `root` starting at `offset`
    ///
    /// Returns the next free horizontal offset. Uses an explicit work
    /// stack, so depth is bounded by memory rather than the call stack.
    fn place(&mut self, root: usize, offset: f64) -> f64 {
        let children = self.children;
        let slot = self.config.slot();

        self.order.push((root, 0));
        let mut stack = vec![Pending {
            node: root,
            level: 0,
            offset,
            child: 0,
            next: offset,
        }];
        let mut end = offset;

        while let Some(top) = stack.last_mut() {
            let kids = &children[top.node];

            if let Some(&child) = kids.get(top.child) {
                top.child += 1;
                let (level, start) = (top.level + 1, top.next);
                self.order.push((child, level));
                stack.push(Pending {
                    node: child,
                    level,
                    offset: start,
                    child: 0,
                    next: start,
                });
                continue;
            }

            let Some(done) = stack.pop() else { break };
            end = match (kids.first(), kids.last()) {
                (Some(&first), Some(&last)) => {
                    self.xs[done.node] = (self.xs[first] + self.xs[last]) / 2.0;
                    done.next.max(done.offset + slot)
                }
                _ => {
                    self.xs[done.node] = done.offset;
                    done.offset + slot
                }
            };
            if let Some(parent) = stack.last_mut() {
                parent.next = end;
            }
        }

        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LogNode, NodeStats, NodeStatus, NodeType};

    fn data(links: &[(&str, Option<&str>)]) -> LogData {
        LogData {
            nodes: links
                .iter()
                .map(|(id, parent)| LogNode {
                    id: id.to_string(),
                    node_type: NodeType::Function,
                    status: NodeStatus::Success,
                    label: id.to_string(),
                    details: None,
                    soql_query: None,
                    stats: NodeStats::default(),
                    parent_id: parent.map(str::to_string),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn x_of(positions: &[NodePosition], id: &str) -> f64 {
        positions.iter().find(|p| p.id == id).map(|p| p.x).unwrap()
    }

    #[test]
    fn test_parent_centred_over_children() {
        let graph = data(&[("a", None), ("b", Some("a")), ("c", Some("a")), ("d", Some("a"))]);
        let positions = compute_layout(&graph, &LayoutConfig::default()).unwrap();

        assert_eq!(x_of(&positions, "b"), 0.0);
        assert_eq!(x_of(&positions, "c"), 300.0);
        assert_eq!(x_of(&positions, "d"), 600.0);
        assert_eq!(x_of(&positions, "a"), 300.0);
        assert_eq!(positions[0].y, 0.0);
        assert_eq!(positions[1].y, 200.0);
    }

    #[test]
    fn test_single_child_sits_under_parent() {
        let graph = data(&[("a", None), ("b", Some("a")), ("c", Some("b"))]);
        let positions = compute_layout(&graph, &LayoutConfig::default()).unwrap();

        assert!(positions.iter().all(|p| p.x == 0.0));
        assert_eq!(positions[2].level, 2);
        assert_eq!(positions[2].y, 400.0);
    }

    #[test]
    fn test_roots_do_not_overlap() {
        let graph = data(&[("a", None), ("a1", Some("a")), ("a2", Some("a")), ("b", None)]);
        let positions = compute_layout(&graph, &LayoutConfig::default()).unwrap();

        assert_eq!(x_of(&positions, "a"), 150.0);
        assert_eq!(x_of(&positions, "b"), 600.0);
    }

    #[test]
    fn test_preorder_output() {
        let graph = data(&[("a", None), ("b", None), ("a1", Some("a"))]);
        let positions = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let ids: Vec<&str> = positions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "b"]);
    }

    #[test]
    fn test_custom_spacing() {
        let graph = data(&[("a", None), ("b", None)]);
        let config = LayoutConfig::new()
            .with_node_width(100.0)
            .with_gap(20.0)
            .with_level_height(80.0);
        let positions = compute_layout(&graph, &config).unwrap();
        assert_eq!(x_of(&positions, "b"), 120.0);
    }

    #[test]
    fn test_dangling_parent() {
        let graph = data(&[("a", Some("ghost"))]);
        assert_eq!(
            compute_layout(&graph, &LayoutConfig::default()),
            Err(LayoutError::DanglingParent {
                node: "a".to_string(),
                parent: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_cycle_is_unreachable() {
        let graph = data(&[("root", None), ("a", Some("b")), ("b", Some("a"))]);
        assert_eq!(
            compute_layout(&graph, &LayoutConfig::default()),
            Err(LayoutError::Unreachable(2))
        );
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let ids: Vec<String> = (0..150_000).map(|i| format!("n{}", i)).collect();
        let links: Vec<(&str, Option<&str>)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i.checked_sub(1).map(|p| ids[p].as_str())))
            .collect();
        let positions = compute_layout(&data(&links), &LayoutConfig::default()).unwrap();

        assert_eq!(positions.len(), 150_000);
        assert!(positions.iter().all(|p| p.x == 0.0));
        assert_eq!(positions[149_999].level, 149_999);
        assert_eq!(positions[149_999].y, 149_999.0 * 200.0);
    }

    #[test]
    fn test_empty_graph() {
        let positions = compute_layout(&LogData::default(), &LayoutConfig::default()).unwrap();
        assert!(positions.is_empty());
    }
}
