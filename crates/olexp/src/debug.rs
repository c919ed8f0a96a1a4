//! Outline debug visualization.
//!
//! [`OutlineDebug`] renders any [`Outline`] subtree as indented text, which
//! is handy in trace logs and test failure messages:
//!
//! ```text
//! Layers [layers]
//! ├── Roads [layers-2]
//! └── Basemaps [layers-1]
//!     └── OSM [layers-1-1]
//! ```

use std::fmt::Write as FmtWrite;

use crate::outline::{Outline, OutlineNode};

/// Style options for outline visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// One line per node, indented by depth only.
    Compact,
}

/// Configuration for outline debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Append `[id]` after the node text.
    pub show_ids: bool,
    /// Append the icon class.
    pub show_icons: bool,
    /// Mark disabled nodes.
    pub show_state: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_icons: false,
            show_state: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Everything shown.
    pub fn detailed() -> Self {
        Self {
            show_icons: true,
            ..Default::default()
        }
    }

    /// Texts only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_icons: false,
            show_state: false,
            ..Default::default()
        }
    }
}

/// Formats outline subtrees.
#[derive(Debug, Clone, Default)]
pub struct OutlineDebug {
    options: TreeFormatOptions,
}

impl OutlineDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Formats the subtree rooted at `id`, or `"(missing id)"` if absent.
    pub fn format_subtree(&self, outline: &dyn Outline, id: &str) -> String {
        match outline.get(id) {
            Some(node) => self.format_node(&node),
            None => format!("(missing {id})\n"),
        }
    }

    /// Formats several root nodes one after another.
    pub fn format_roots<I, S>(&self, outline: &dyn Outline, ids: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| self.format_subtree(outline, id.as_ref()))
            .collect()
    }

    /// Formats an already fetched node snapshot.
    pub fn format_node(&self, node: &OutlineNode) -> String {
        let mut output = String::new();
        self.format_into(node, &mut Vec::new(), &mut output);
        output
    }

    /// `ancestors_last[i]` says whether the ancestor at depth `i + 1` was the
    /// last of its siblings.
    fn format_into(&self, node: &OutlineNode, ancestors_last: &mut Vec<bool>, output: &mut String) {
        let depth = ancestors_last.len();
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(ancestors_last));
        output.push_str(if node.text.is_empty() { "(untitled)" } else { &node.text });
        // Writing to a String cannot fail.
        if self.options.show_ids {
            let _ = write!(output, " [{}]", node.id);
        }
        if self.options.show_icons && !node.img.is_empty() {
            let _ = write!(output, " <{}>", node.img);
        }
        if self.options.show_state && node.disabled {
            output.push_str(" (disabled)");
        }
        output.push('\n');

        let count = node.nodes.len();
        for (i, child) in node.nodes.iter().enumerate() {
            ancestors_last.push(i + 1 == count);
            self.format_into(child, ancestors_last, output);
            ancestors_last.pop();
        }
    }

    fn build_prefix(&self, ancestors_last: &[bool]) -> String {
        let Some((&is_last, parents)) = ancestors_last.split_last() else {
            return String::new();
        };

        let (branch, tee, corner, gap) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "`-- ", "    "),
            TreeStyle::Unicode => ("\u{2502}   ", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} ", "    "),
            TreeStyle::Compact => ("  ", "- ", "- ", "  "),
        };

        let mut prefix = String::new();
        for &last in parents {
            prefix.push_str(if last { gap } else { branch });
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::TreeOutline;

    fn sample() -> TreeOutline {
        let outline = TreeOutline::new();
        outline.add_root(OutlineNode::new("layers", "Layers", "icon-folder"));
        outline.add(
            "layers",
            vec![
                OutlineNode::new("layers-2", "Roads", "icon-vector").with_disabled(true),
                OutlineNode::new("layers-1", "Basemaps", "icon-folder")
                    .with_children(vec![OutlineNode::new("layers-1-1", "OSM", "icon-tile")]),
            ],
        );
        outline
    }

    #[test]
    fn test_unicode_tree() {
        let text = OutlineDebug::new().format_subtree(&sample(), "layers");
        let expected = "Layers [layers]\n\
                        \u{251c}\u{2500}\u{2500} Roads [layers-2] (disabled)\n\
                        \u{2514}\u{2500}\u{2500} Basemaps [layers-1]\n    \
                        \u{2514}\u{2500}\u{2500} OSM [layers-1-1]\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_ascii_minimal_with_depth_limit() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        };
        let text = OutlineDebug::with_options(options).format_subtree(&sample(), "layers");
        assert_eq!(text, "Layers\n+-- Roads\n`-- Basemaps\n");
    }

    #[test]
    fn test_missing_root() {
        let text = OutlineDebug::new().format_roots(&sample(), ["nope"]);
        assert_eq!(text, "(missing nope)\n");
    }
}
