//! Parser for the indentation-based watch language.

use super::{ConfigNode, DEFAULT_INDENT_UNIT, DEFAULT_LINE_SEPARATOR};
use crate::error::{ObserveError, Result};

/// Builder turning indented text into a [`ConfigNode`] tree.
///
/// Each line of the text names one field. A line's depth is the number of
/// indent units it contains, and the tree shape follows the *change* in depth
/// between consecutive lines:
///
/// - same depth: the line becomes a sibling of the previous line;
/// - deeper: the line becomes a child of the previous line, one level down no
///   matter how many extra indent units it carries;
/// - shallower: the cursor climbs one ancestor per indent unit removed.
///
/// Blank lines and lines made only of indent units are ignored.
///
/// # Examples
///
/// ```rust
/// use obsweave::tree::ConfigTreeBuilder;
///
/// # fn example() -> obsweave::error::Result<()> {
/// let tree = ConfigTreeBuilder::new("Profile").build("name\naddress\n  city\n  zip\ntags")?;
///
/// assert_eq!(tree.name, "Profile");
/// assert_eq!(tree.children.len(), 3);
/// assert_eq!(tree.children[1].children.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigTreeBuilder {
    root_name: String,
    line_separator: String,
    indent_unit: String,
}

impl ConfigTreeBuilder {
    /// Create a builder with the default delimiters (newline, two spaces).
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            line_separator: DEFAULT_LINE_SEPARATOR.to_string(),
            indent_unit: DEFAULT_INDENT_UNIT.to_string(),
        }
    }

    /// Set the token that separates lines.
    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Set the token counted to compute a line's depth.
    pub fn with_indent_unit(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    /// Parse `text` into a tree rooted at the builder's root name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line separator or indent unit is empty
    /// - A line dedents past the root
    pub fn build(&self, text: &str) -> Result<ConfigNode> {
        build_config_tree(&self.root_name, text, &self.line_separator, &self.indent_unit)
    }
}

/// Node under construction. Children are indices into the arena.
struct PendingNode {
    name: String,
    children: Vec<usize>,
}

impl PendingNode {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }
}

/// Parse indented `text` into a tree whose root is named `root_name`.
///
/// See [`ConfigTreeBuilder`] for the rules. Parent links only exist as the
/// `ancestry` stack during parsing; the returned tree is a plain forward tree.
///
/// # Errors
///
/// Returns [`ObserveError::InvalidDelimiter`] for an empty separator or indent
/// unit and [`ObserveError::Structural`] when a dedent climbs above the root.
pub fn build_config_tree(
    root_name: &str,
    text: &str,
    line_separator: &str,
    indent_unit: &str,
) -> Result<ConfigNode> {
    if line_separator.is_empty() {
        return Err(ObserveError::InvalidDelimiter("line separator"));
    }
    if indent_unit.is_empty() {
        return Err(ObserveError::InvalidDelimiter("indent unit"));
    }

    let mut arena = vec![PendingNode::new(root_name.to_string())];
    // Cursor is the top of the stack; the root sits at the bottom.
    let mut ancestry: Vec<usize> = vec![0];
    let mut previous_level = 0usize;

    for (index, line) in text.split(line_separator).enumerate() {
        let name = line.replace(indent_unit, "");
        // Lines holding only indentation or whitespace carry no node.
        if name.trim().is_empty() {
            continue;
        }
        let level = line.matches(indent_unit).count();

        if level > previous_level {
            // Single-level descent into the most recent child, if any.
            let cursor = ancestry[ancestry.len() - 1];
            if let Some(&last) = arena[cursor].children.last() {
                ancestry.push(last);
            }
        } else if level < previous_level {
            let steps = previous_level - level;
            for _ in 0..steps {
                if ancestry.len() == 1 {
                    return Err(ObserveError::Structural {
                        line: index + 1,
                        name,
                        steps,
                    });
                }
                ancestry.pop();
            }
        }

        let cursor = ancestry[ancestry.len() - 1];
        let id = arena.len();
        arena.push(PendingNode::new(name));
        arena[cursor].children.push(id);
        previous_level = level;
    }

    tracing::trace!(root = root_name, nodes = arena.len(), "built watch tree");
    Ok(assemble(&mut arena, 0))
}

fn assemble(arena: &mut [PendingNode], id: usize) -> ConfigNode {
    let name = std::mem::take(&mut arena[id].name);
    let child_ids = std::mem::take(&mut arena[id].children);
    ConfigNode {
        name,
        children: child_ids
            .into_iter()
            .map(|child| assemble(arena, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(node: &ConfigNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_flat_siblings() {
        let tree = build_config_tree("Root", "a\nb\nc", "\n", "  ").unwrap();
        assert_eq!(tree.name, "Root");
        assert_eq!(names(&tree), vec!["a", "b", "c"]);
        assert!(tree.children.iter().all(ConfigNode::is_leaf));
    }

    #[test]
    fn test_nested_and_dedent() {
        let text = "name\naddress\n  city\n  geo\n    lat\n    lng\n  zip\ntags";
        let tree = build_config_tree("Profile", text, "\n", "  ").unwrap();

        assert_eq!(names(&tree), vec!["name", "address", "tags"]);
        let address = tree.child("address").unwrap();
        assert_eq!(names(address), vec!["city", "geo", "zip"]);
        assert_eq!(names(address.child("geo").unwrap()), vec!["lat", "lng"]);
    }

    #[test]
    fn test_indent_only_lines_are_skipped() {
        let tree = build_config_tree("Root", "a\n--\n-b\n- \nc", "\n", "-").unwrap();
        assert_eq!(names(&tree), vec!["a", "c"]);
        assert_eq!(names(tree.child("a").unwrap()), vec!["b"]);
    }

    #[test]
    fn test_indentation_is_not_part_of_name() {
        let tree = build_config_tree("Root", "a\n  b", "\n", "  ").unwrap();
        assert_eq!(tree.children[0].children[0].name, "b");
    }

    #[test]
    fn test_only_indent_units_are_stripped() {
        let tree = build_config_tree("Root", "a\n   b ", "\n", "  ").unwrap();
        assert_eq!(tree.children[0].children[0].name, " b ");
    }

    #[test]
    fn test_deep_jump_descends_one_level() {
        // "b" carries two indent units but still lands directly under "a".
        let tree = build_config_tree("Root", "a\n    b\n    c", "\n", "  ").unwrap();
        let a = tree.child("a").unwrap();
        assert_eq!(names(a), vec!["b", "c"]);
    }

    #[test]
    fn test_deep_jump_then_dedent_past_root_fails() {
        // Descent was one level, but returning to level 0 asks for two ascents.
        let err = build_config_tree("Root", "a\n    b\nc", "\n", "  ").unwrap_err();
        match err {
            ObserveError::Structural { line, name, steps } => {
                assert_eq!(line, 3);
                assert_eq!(name, "c");
                assert_eq!(steps, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dedent_within_ancestry_resumes_at_ancestor() {
        let tree = build_config_tree("Root", "a\n  b\n    c\nd", "\n", "  ").unwrap();
        assert_eq!(names(&tree), vec!["a", "d"]);
        assert_eq!(tree.child("a").unwrap().child("b").unwrap().children.len(), 1);
    }

    #[test]
    fn test_indented_first_line_attaches_to_root() {
        let tree = build_config_tree("Root", "  a\n  b", "\n", "  ").unwrap();
        assert_eq!(names(&tree), vec!["a", "b"]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let tree = build_config_tree("Root", "\na\n\n  b\n   \n", "\n", "  ").unwrap();
        assert_eq!(names(&tree), vec!["a"]);
        assert_eq!(names(&tree.children[0]), vec!["b"]);
    }

    #[test]
    fn test_custom_delimiters() {
        let tree = ConfigTreeBuilder::new("Root")
            .with_line_separator(";")
            .with_indent_unit("-")
            .build("a;-b;-c;d")
            .unwrap();
        assert_eq!(names(&tree), vec!["a", "d"]);
        assert_eq!(names(&tree.children[0]), vec!["b", "c"]);
    }

    #[test]
    fn test_empty_delimiters_rejected() {
        assert!(matches!(
            build_config_tree("Root", "a", "", "  "),
            Err(ObserveError::InvalidDelimiter("line separator"))
        ));
        assert!(matches!(
            build_config_tree("Root", "a", "\n", ""),
            Err(ObserveError::InvalidDelimiter("indent unit"))
        ));
    }

    #[test]
    fn test_empty_text_yields_bare_root() {
        let tree = build_config_tree("Root", "", "\n", "  ").unwrap();
        assert_eq!(tree, ConfigNode::new("Root"));
    }

    #[test]
    fn test_render_then_parse() {
        let tree = ConfigNode::new("Root")
            .with_child(ConfigNode::new("a").with_child(
                ConfigNode::new("b").with_child(ConfigNode::new("c")),
            ))
            .with_child(ConfigNode::new("d"));
        let parsed = build_config_tree("Root", &tree.to_string(), "\n", "  ").unwrap();
        assert_eq!(parsed, tree);
    }

    proptest! {
        #[test]
        fn prop_root_name_is_preserved(
            root in "[A-Za-z]{1,12}",
            lines in prop::collection::vec("[a-z]{1,8}", 0..8),
        ) {
            let tree = build_config_tree(&root, &lines.join("\n"), "\n", "  ").unwrap();
            prop_assert_eq!(tree.name, root);
        }

        #[test]
        fn prop_same_level_run_stays_flat(
            parent in "[a-z]{1,8}",
            siblings in prop::collection::vec("[a-z]{1,8}", 1..10),
        ) {
            let mut text = parent.clone();
            for sibling in &siblings {
                text.push_str("\n  ");
                text.push_str(sibling);
            }
            let tree = build_config_tree("Root", &text, "\n", "  ").unwrap();
            prop_assert_eq!(tree.children.len(), 1);
            let node = &tree.children[0];
            prop_assert_eq!(node.children.len(), siblings.len());
            prop_assert!(node.children.iter().all(ConfigNode::is_leaf));
        }
    }
}
