//! Watch trees and the indentation language that describes them.
//!
//! A watch tree names which fields of an object graph should be observed:
//!
//! ```text
//! name
//! address
//!   city
//! tags
//!   label
//! ```

mod builder;
mod node;

pub use builder::{ConfigTreeBuilder, build_config_tree};
pub use node::ConfigNode;

/// Line separator used when none is configured.
pub const DEFAULT_LINE_SEPARATOR: &str = "\n";

/// Indent unit used when none is configured.
pub const DEFAULT_INDENT_UNIT: &str = "  ";
