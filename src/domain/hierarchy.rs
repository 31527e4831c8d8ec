//! The system breakdown structure (SBS) requirements are classified into.
//!
//! A [`HierarchyCatalog`] is an immutable tree of [`HierarchyNode`]s. Its
//! parent and child references are checked once, on construction.

use std::collections::BTreeMap;

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;
use thiserror::Error;

/// A single node of the system breakdown structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    /// Unique identifier, e.g. `WCS`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Depth in the breakdown structure, starting at 0.
    pub level: usize,
    /// The enclosing node, if any.
    pub parent: Option<String>,
    /// Nodes directly below this one, in presentation order.
    pub children: Vec<String>,
    /// What the node covers.
    pub description: String,
}

impl HierarchyNode {
    /// Creates a node.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        level: usize,
        parent: Option<&str>,
        children: &[&str],
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            parent: parent.map(str::to_string),
            children: children.iter().map(ToString::to_string).collect(),
            description: description.to_string(),
        }
    }
}

/// Reasons a set of nodes does not form a valid catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two nodes share an id.
    #[error("node '{0}' is defined more than once")]
    DuplicateNode(String),
    /// A node names a parent that does not exist.
    #[error("node '{node}' names unknown parent '{parent}'")]
    UnknownParent {
        /// The node holding the reference.
        node: String,
        /// The missing parent.
        parent: String,
    },
    /// A node lists a child that does not exist.
    #[error("node '{node}' lists unknown child '{child}'")]
    UnknownChild {
        /// The node holding the reference.
        node: String,
        /// The missing child.
        child: String,
    },
    /// A node lists a child whose parent is some other node.
    #[error("node '{node}' lists child '{child}' whose parent is not '{node}'")]
    ChildParentMismatch {
        /// The node holding the reference.
        node: String,
        /// The child whose parent disagrees.
        child: String,
    },
    /// A node sits at a shallower level than its parent.
    #[error("node '{node}' is shallower than its parent '{parent}'")]
    LevelInversion {
        /// The offending node.
        node: String,
        /// Its parent.
        parent: String,
    },
    /// The parent relation loops back on itself.
    #[error("parent relation contains a cycle through {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// An immutable, validated system breakdown structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyCatalog {
    /// Nodes in declaration order.
    nodes: Vec<HierarchyNode>,
    /// Lookup from id to position in `nodes`.
    index: BTreeMap<String, usize>,
}

impl HierarchyCatalog {
    /// Builds a catalog, checking that every parent and child reference is
    /// consistent and that the parent relation is acyclic.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found.
    pub fn new(nodes: Vec<HierarchyNode>) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateNode(node.id.clone()));
            }
        }

        let catalog = Self { nodes, index };
        catalog.check_references()?;
        catalog.check_acyclic()?;
        Ok(catalog)
    }

    /// The cryogenic system breakdown structure used by default.
    ///
    /// # Panics
    ///
    /// Never panics; the built-in table is covered by tests.
    #[must_use]
    pub fn sbs() -> Self {
        Self::new(sbs_nodes()).expect("built-in SBS catalog is consistent")
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        for node in &self.nodes {
            if let Some(parent_id) = &node.parent {
                let parent = self
                    .get(parent_id)
                    .ok_or_else(|| CatalogError::UnknownParent {
                        node: node.id.clone(),
                        parent: parent_id.clone(),
                    })?;
                if node.level < parent.level {
                    return Err(CatalogError::LevelInversion {
                        node: node.id.clone(),
                        parent: parent_id.clone(),
                    });
                }
            }

            for child_id in &node.children {
                let child = self
                    .get(child_id)
                    .ok_or_else(|| CatalogError::UnknownChild {
                        node: node.id.clone(),
                        child: child_id.clone(),
                    })?;
                if child.parent.as_deref() != Some(node.id.as_str()) {
                    return Err(CatalogError::ChildParentMismatch {
                        node: node.id.clone(),
                        child: child_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::with_capacity(self.nodes.len(), self.nodes.len());
        for node in &self.nodes {
            graph.add_node(node.id.as_str());
            if let Some(parent) = &node.parent {
                graph.add_edge(node.id.as_str(), parent.as_str(), ());
            }
        }

        for component in tarjan_scc(&graph) {
            let looped = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node));
            if looped {
                let mut members: Vec<String> = component.into_iter().map(str::to_string).collect();
                members.sort();
                return Err(CatalogError::Cycle(members));
            }
        }
        Ok(())
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HierarchyNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    /// Whether a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes, in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.iter()
    }

    /// Nodes at the given level, in declaration order.
    pub fn at_level(&self, level: usize) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.iter().filter(move |node| node.level == level)
    }

    /// The deepest level present in the catalog.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.nodes.iter().map(|node| node.level).max().unwrap_or_default()
    }

    /// The number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the catalog has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the tree depth-first from each root, yielding each node with
    /// its distance from the root.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, &HierarchyNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &HierarchyNode)> = self
            .nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .rev()
            .map(|node| (0, node))
            .collect();

        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev().filter_map(|id| self.get(id)) {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

impl Default for HierarchyCatalog {
    fn default() -> Self {
        Self::sbs()
    }
}

fn sbs_nodes() -> Vec<HierarchyNode> {
    vec![
        // Level 0
        HierarchyNode::new(
            "QSYS",
            "Cryogenic System",
            0,
            None,
            &["QSYS-PR"],
            "Complete cryogenic system including plant, infrastructure, and distribution",
        ),
        HierarchyNode::new(
            "QSYS-PR",
            "Project Requirements",
            0,
            Some("QSYS"),
            &["QPLANT", "QINFRA", "QCELL", "QDIST"],
            "Overall project requirements and constraints",
        ),
        // Level 1
        HierarchyNode::new(
            "QPLANT",
            "Cryoplant",
            1,
            Some("QSYS-PR"),
            &["WCS", "QRB"],
            "Main cryogenic refrigeration plant including compressors and cold box",
        ),
        HierarchyNode::new(
            "QINFRA",
            "Cryogenic Infrastructure",
            1,
            Some("QSYS-PR"),
            &[],
            "CSS cryogenic supply system infrastructure",
        ),
        HierarchyNode::new(
            "QCELL",
            "Cryogenic Cell",
            1,
            Some("QSYS-PR"),
            &[],
            "CSS cryogenic USER - individual cryomodule and valve box combinations",
        ),
        HierarchyNode::new(
            "QDIST",
            "Cryogenic Distribution",
            1,
            Some("QSYS-PR"),
            &[],
            "CSS cryogenic USER - distribution lines and headers",
        ),
        // Level 2
        HierarchyNode::new(
            "WCS",
            "Warm Compressor Station",
            2,
            Some("QPLANT"),
            &["PVPS", "HP"],
            "Warm compression system including LP to HP and VLP to LP compressors",
        ),
        HierarchyNode::new(
            "QRB",
            "Refrigeration Cold Box",
            2,
            Some("QPLANT"),
            &["CC", "TURBINES", "BATH-4K", "BATH-2K"],
            "Cold box containing refrigeration equipment and heat exchangers",
        ),
        // Level 3
        HierarchyNode::new(
            "PVPS",
            "Pressure Vessel & Piping System",
            3,
            Some("WCS"),
            &[],
            "Pressure vessels, piping, and associated safety systems for WCS",
        ),
        HierarchyNode::new(
            "HP",
            "High Pressure System",
            3,
            Some("WCS"),
            &[],
            "High pressure compressors and associated equipment",
        ),
        HierarchyNode::new(
            "CC",
            "Cold Compressors",
            3,
            Some("QRB"),
            &[],
            "Cold compression equipment within refrigeration cold box",
        ),
        HierarchyNode::new(
            "TURBINES",
            "Turbo Expanders",
            3,
            Some("QRB"),
            &[],
            "Turbine expanders for refrigeration cycle",
        ),
        HierarchyNode::new(
            "BATH-4K",
            "4K Bath System",
            3,
            Some("QRB"),
            &[],
            "4K temperature helium bath and associated equipment",
        ),
        HierarchyNode::new(
            "BATH-2K",
            "2K Bath System",
            3,
            Some("QRB"),
            &[],
            "2K temperature helium bath and associated equipment",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_consistent() {
        let catalog = HierarchyCatalog::new(sbs_nodes()).expect("built-in catalog should be valid");
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.max_level(), 3);
    }

    #[test]
    fn lookup_by_id() {
        let catalog = HierarchyCatalog::sbs();
        let wcs = catalog.get("WCS").unwrap();
        assert_eq!(wcs.name, "Warm Compressor Station");
        assert_eq!(wcs.parent.as_deref(), Some("QPLANT"));
        assert!(catalog.get("NOPE").is_none());
    }

    #[test]
    fn children_reference_their_parent() {
        let catalog = HierarchyCatalog::sbs();
        for node in catalog.nodes() {
            for child in &node.children {
                assert_eq!(catalog.get(child).unwrap().parent.as_ref(), Some(&node.id));
            }
        }
    }

    #[test]
    fn level_filter_preserves_declaration_order() {
        let catalog = HierarchyCatalog::sbs();
        let level1: Vec<_> = catalog.at_level(1).map(|node| node.id.as_str()).collect();
        assert_eq!(level1, ["QPLANT", "QINFRA", "QCELL", "QDIST"]);
    }

    #[test]
    fn walk_is_depth_first() {
        let catalog = HierarchyCatalog::sbs();
        let walked: Vec<_> = catalog
            .walk()
            .into_iter()
            .map(|(depth, node)| (depth, node.id.as_str()))
            .take(5)
            .collect();
        assert_eq!(
            walked,
            [
                (0, "QSYS"),
                (1, "QSYS-PR"),
                (2, "QPLANT"),
                (3, "WCS"),
                (4, "PVPS")
            ]
        );
        assert_eq!(catalog.walk().len(), catalog.len());
    }

    #[test]
    fn rejects_duplicate_node() {
        let nodes = vec![
            HierarchyNode::new("A", "A", 0, None, &[], ""),
            HierarchyNode::new("A", "A again", 0, None, &[], ""),
        ];
        assert_eq!(
            HierarchyCatalog::new(nodes).unwrap_err(),
            CatalogError::DuplicateNode("A".to_string())
        );
    }

    #[test]
    fn rejects_unknown_parent() {
        let nodes = vec![HierarchyNode::new("A", "A", 1, Some("ROOT"), &[], "")];
        assert!(matches!(
            HierarchyCatalog::new(nodes).unwrap_err(),
            CatalogError::UnknownParent { .. }
        ));
    }

    #[test]
    fn rejects_child_with_other_parent() {
        // Mirrors a source table that listed the plant components under the
        // infrastructure node as well.
        let nodes = vec![
            HierarchyNode::new("PLANT", "Plant", 0, None, &["WCS"], ""),
            HierarchyNode::new("INFRA", "Infra", 0, None, &["WCS"], ""),
            HierarchyNode::new("WCS", "Compressors", 1, Some("PLANT"), &[], ""),
        ];
        assert_eq!(
            HierarchyCatalog::new(nodes).unwrap_err(),
            CatalogError::ChildParentMismatch {
                node: "INFRA".to_string(),
                child: "WCS".to_string()
            }
        );
    }

    #[test]
    fn rejects_level_inversion() {
        let nodes = vec![
            HierarchyNode::new("A", "A", 2, None, &["B"], ""),
            HierarchyNode::new("B", "B", 1, Some("A"), &[], ""),
        ];
        assert!(matches!(
            HierarchyCatalog::new(nodes).unwrap_err(),
            CatalogError::LevelInversion { .. }
        ));
    }

    #[test]
    fn rejects_cycle() {
        let nodes = vec![
            HierarchyNode::new("A", "A", 0, Some("B"), &["B"], ""),
            HierarchyNode::new("B", "B", 0, Some("A"), &["A"], ""),
        ];
        assert_eq!(
            HierarchyCatalog::new(nodes).unwrap_err(),
            CatalogError::Cycle(vec!["A".to_string(), "B".to_string()])
        );
    }
}
