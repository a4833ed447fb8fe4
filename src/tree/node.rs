//! The watch tree node type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DEFAULT_INDENT_UNIT, DEFAULT_LINE_SEPARATOR};

/// A node of a watch tree.
///
/// `name` is the field to watch at this level; `children` are the sub-fields to
/// watch when that field holds an observed object or list. The root node's name
/// is the identity of the watched object and is used as the leading path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Field identifier to watch at this level
    pub name: String,
    /// Sub-fields to watch, in declaration order
    #[serde(default)]
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create a node without children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Append a child node, builder style.
    ///
    /// ```rust
    /// use obsweave::tree::ConfigNode;
    ///
    /// let tree = ConfigNode::new("Profile")
    ///     .with_child(ConfigNode::new("name"))
    ///     .with_child(ConfigNode::new("address").with_child(ConfigNode::new("city")));
    ///
    /// assert_eq!(tree.children.len(), 2);
    /// assert_eq!(tree.children[1].children[0].name, "city");
    /// ```
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Returns true when nothing below this node is configured.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Total number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Render the children of this node in the indentation mini-language.
    ///
    /// The root name is not part of the text, it is supplied separately when the
    /// text is parsed again.
    pub fn to_text(&self, line_separator: &str, indent_unit: &str) -> String {
        let mut lines = Vec::new();
        for child in &self.children {
            child.collect_lines(0, indent_unit, &mut lines);
        }
        lines.join(line_separator)
    }

    fn collect_lines(&self, depth: usize, indent_unit: &str, lines: &mut Vec<String>) {
        lines.push(format!("{}{}", indent_unit.repeat(depth), self.name));
        for child in &self.children {
            child.collect_lines(depth + 1, indent_unit, lines);
        }
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_text(DEFAULT_LINE_SEPARATOR, DEFAULT_INDENT_UNIT)
        )
    }
}
