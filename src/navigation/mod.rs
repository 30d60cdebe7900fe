// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The heat pump's menu tree.
//!
//! After `LOGIN` the controller answers with its menu structure:
//!
//! ```text
//! <Navigation id='0x45cd88'>
//!   <item id='0x45e068'><name>Informatie</name>
//!     <item id='0x45df90'><name>Temperaturen</name></item>
//!     <item id='0x455968'><name>Ingangen</name></item>
//!   </item>
//!   ...
//! </Navigation>
//! ```
//!
//! [`NavigationTree`] stores that structure in an arena and resolves
//! human-readable paths such as `"Informatie > Temperaturen"` to the opaque
//! id used by the `GET` command.
//!
//! # Examples
//!
//! ```
//! use luxws::navigation::NavigationTree;
//!
//! let tree = NavigationTree::parse(
//!     "<Navigation id='0x1'><item id='0x2'><name>Info</name>\
//!      <item id='0xAAA'><name>Temps</name></item></item></Navigation>",
//! )
//! .unwrap();
//!
//! assert_eq!(tree.resolve("Info > Temps").unwrap(), "0xAAA");
//! assert!(tree.resolve("Info > Pressure").is_err());
//! ```

mod parser;

use crate::error::NavigationError;

/// Separator between path segments.
pub const PATH_SEPARATOR: &str = " > ";

/// Index of a node inside a [`NavigationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A menu item of the heat pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNode {
    id: String,
    name: String,
    children: Vec<NodeId>,
}

impl NavigationNode {
    /// Returns the device identifier used in `GET` commands.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display label, used as a path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the child node ids in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The menu tree sent by the heat pump on login.
///
/// Nodes live in a single arena and refer to their children by index.
/// The tree is immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationTree {
    id: Option<String>,
    nodes: Vec<NavigationNode>,
    roots: Vec<NodeId>,
}

impl NavigationTree {
    /// Decodes the navigation payload returned by `LOGIN`.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if the payload is not well-formed, its root
    /// is not a `Navigation` element, or an item lacks an `id`.
    pub fn parse(raw: &str) -> Result<Self, NavigationError> {
        parser::parse(raw)
    }

    /// Returns the id attribute of the `Navigation` element, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the top-level nodes in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NavigationNode {
        &self.nodes[id.0]
    }

    /// Returns the total number of menu items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no menu items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a `" > "`-separated path to the id of its last segment.
    ///
    /// At each level the first sibling whose name matches the segment exactly
    /// is chosen. The returned id need not belong to a leaf.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::PathNotFound` naming the first segment
    /// without a matching sibling.
    pub fn resolve(&self, path: &str) -> Result<&str, NavigationError> {
        let mut level = self.roots.as_slice();
        let mut resolved: Option<&NavigationNode> = None;

        for segment in path.split(PATH_SEPARATOR) {
            let node = level
                .iter()
                .map(|&child| self.node(child))
                .find(|node| node.name == segment)
                .ok_or_else(|| NavigationError::PathNotFound {
                    segment: segment.to_string(),
                    path: path.to_string(),
                })?;

            level = &node.children;
            resolved = Some(node);
        }

        // split() always yields at least one segment
        resolved
            .map(NavigationNode::id)
            .ok_or_else(|| NavigationError::PathNotFound {
                segment: String::new(),
                path: path.to_string(),
            })
    }

    /// Lists every path in the tree with its id, depth-first in declaration order.
    #[must_use]
    pub fn paths(&self) -> Vec<(String, &str)> {
        let mut paths = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, String)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, self.node(root).name.clone()))
            .collect();

        while let Some((id, path)) = stack.pop() {
            let node = self.node(id);
            for &child in node.children.iter().rev() {
                let child_path = format!("{path}{PATH_SEPARATOR}{}", self.node(child).name);
                stack.push((child, child_path));
            }
            paths.push((path, node.id.as_str()));
        }

        paths
    }

    fn push_node(&mut self, parent: Option<NodeId>, id: String) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(NavigationNode {
            id,
            name: String::new(),
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(node_id),
            None => self.roots.push(node_id),
        }
        node_id
    }

    fn append_name(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].name.push_str(text);
    }
}
