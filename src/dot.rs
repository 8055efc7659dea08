//! PAG to DOT (Graphviz) conversion.
//!
//! Every edge is drawn once, from its first node to its second, with `dir=both` so that both
//! endpoint marks are visible:
//!
//! - an **arrow** mark is drawn as `normal`,
//! - a **tail** mark is drawn as `none`,
//! - a **circle** mark is drawn as `odot`.
//!
//! Latent variables use a separate node shape.
//!
//! # Examples
//!
//! ```
//! use ion_rs::graph::{Edge, Graph, Node};
//!
//! let (a, b) = (Node::new("A"), Node::new("B"));
//! let mut g = Graph::new([a.clone(), b.clone()]);
//! g.add_edge(Edge::partially_oriented(&a, &b));
//!
//! let dot = g.to_dot().unwrap();
//! assert!(dot.contains("\"A\" -> \"B\" [dir=both, arrowtail=odot, arrowhead=normal];"));
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use crate::graph::{Endpoint, Graph, NodeType};

/// Configuration options for DOT output generation.
///
/// # Examples
///
/// ```
/// use ion_rs::dot::DotConfig;
/// use ion_rs::graph::{Graph, Node};
///
/// let g = Graph::new([Node::new("X"), Node::latent("L")]);
/// let config = DotConfig {
///     node_shape: "box",
///     rank_dir: "TB",
///     ..DotConfig::default()
/// };
///
/// let dot = g.to_dot_with_config(&config).unwrap();
/// assert!(dot.contains("rankdir=TB;"));
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for measured variables (default: "ellipse")
    pub node_shape: &'static str,
    /// Shape for latent variables (default: "box")
    pub latent_shape: &'static str,
    /// Layout direction (default: "LR")
    pub rank_dir: &'static str,
    /// Whether to list the underlined triples in a comment (default: false)
    pub show_underlines: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "ellipse",
            latent_shape: "box",
            rank_dir: "LR",
            show_underlines: false,
        }
    }
}

fn arrow_style(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Arrow => "normal",
        Endpoint::Tail => "none",
        Endpoint::Circle => "odot",
    }
}

impl Graph {
    /// Converts the graph to DOT format with the default [`DotConfig`].
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "rankdir={};", config.rank_dir)?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        for node in self.nodes() {
            match node.node_type() {
                NodeType::Measured => writeln!(dot, "\"{}\";", node.name())?,
                NodeType::Latent => writeln!(dot, "\"{}\" [shape={}];", node.name(), config.latent_shape)?,
            }
        }

        for edge in self.edges() {
            writeln!(
                dot,
                "\"{}\" -> \"{}\" [dir=both, arrowtail={}, arrowhead={}];",
                edge.node1().name(),
                edge.node2().name(),
                arrow_style(edge.endpoint1()),
                arrow_style(edge.endpoint2())
            )?;
        }

        if config.show_underlines {
            for triple in self.underlines() {
                writeln!(dot, "// underline {}", triple)?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    #[test]
    fn test_to_dot_basic() {
        let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
        let mut g = Graph::new([a.clone(), b.clone(), c.clone()]);
        g.add_edge(Edge::directed(&a, &b));
        g.add_edge(Edge::nondirected(&b, &c));

        let dot = g.to_dot().unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\"A\" -> \"B\" [dir=both, arrowtail=none, arrowhead=normal];"));
        assert!(dot.contains("\"B\" -> \"C\" [dir=both, arrowtail=odot, arrowhead=odot];"));
    }

    #[test]
    fn test_to_dot_latent_and_underlines() {
        let (x, l, y) = (Node::new("X"), Node::latent("L"), Node::new("Y"));
        let mut g = Graph::new([x.clone(), l.clone(), y.clone()]);
        g.add_edge(Edge::directed(&l, &x));
        g.add_edge(Edge::directed(&l, &y));
        g.add_underline(&x, &l, &y);

        let config = DotConfig {
            show_underlines: true,
            ..DotConfig::default()
        };
        let dot = g.to_dot_with_config(&config).unwrap();
        assert!(dot.contains("\"L\" [shape=box];"));
        assert!(dot.contains("// underline <X, L, Y>"));
        assert!(!g.to_dot().unwrap().contains("underline"));
    }

    #[test]
    fn test_to_dot_empty() {
        let dot = Graph::default().to_dot().unwrap();
        assert_eq!(dot, "digraph {\nrankdir=LR;\nnode [shape=ellipse];\n}\n");
    }

    #[test]
    #[ignore]
    fn test_write_dot_file() {
        let (a, b) = (Node::new("A"), Node::new("B"));
        let mut g = Graph::new([a.clone(), b.clone()]);
        g.add_edge(Edge::bidirected(&a, &b));

        let dot = g.to_dot().unwrap();
        std::fs::write("test_output.dot", &dot).unwrap();
        println!("DOT output:\n{}", dot);

        if let Ok(output) = std::process::Command::new("dot")
            .arg("-Tsvg")
            .arg("test_output.dot")
            .arg("-o")
            .arg("test_output.svg")
            .output()
        {
            if output.status.success() {
                println!("Generated test_output.svg");
            }
        }
    }
}
