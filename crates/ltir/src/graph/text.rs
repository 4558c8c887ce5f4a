//! Human-readable IR dumps.
//!
//! ```text
//! graph {
//!   %0 = [2x3x4] ltc::device_data, device=0
//!   %1 = [2x4x3] aten::permute(%0), dims=(0, 2, 1)
//!   return %1
//! }
//! ```
//!
//! The format is for diagnostics only and may change between versions.

use std::fmt;

use crate::error::IrResult;
use crate::node::{Node, NodeId, Value};

use super::arena::Graph;

struct Params<'a>(&'a dyn Node);

impl fmt::Display for Params<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_params(f)
    }
}

fn format_shapes(node: &dyn Node) -> String {
    match node.shapes() {
        [single] => format!("[{single}]"),
        shapes => {
            let inner = shapes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({inner})")
        }
    }
}

/// Single dump line for `node` recorded as `id`.
pub fn format_node(id: NodeId, node: &dyn Node) -> String {
    let operands = node
        .operands()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    let operands = if operands.is_empty() {
        String::new()
    } else {
        format!("({})", operands.join(", "))
    };
    format!(
        "{id} = {} {}{operands}{}",
        format_shapes(node),
        node.kind(),
        Params(node)
    )
}

fn write_line(f: &mut fmt::Formatter<'_>, indent: usize, line: &str) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    writeln!(f, "{line}")
}

fn fmt_graph(
    graph: &Graph,
    nodes: &[NodeId],
    roots: &[Value],
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    write_line(f, 0, "graph {")?;
    for &id in nodes {
        if let Some(node) = graph.get(id) {
            write_line(f, 1, &format_node(id, node))?;
        }
    }
    if !roots.is_empty() {
        let roots = roots
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write_line(f, 1, &format!("return {roots}"))?;
    }
    write_line(f, 0, "}")
}

struct RootedDump<'a> {
    graph: &'a Graph,
    nodes: Vec<NodeId>,
    roots: &'a [Value],
}

impl fmt::Display for RootedDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_graph(self.graph, &self.nodes, self.roots, f)
    }
}

impl Graph {
    /// Dumps the nodes reachable from `roots`, followed by a `return` line.
    pub fn to_text(&self, roots: &[Value]) -> IrResult<String> {
        let nodes = self.topological_order(roots)?;
        Ok(RootedDump {
            graph: self,
            nodes,
            roots,
        }
        .to_string())
    }
}

/// Dumps every node in the arena.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.iter().map(|(id, _)| id).collect::<Vec<_>>();
        fmt_graph(self, &nodes, &[], f)
    }
}
