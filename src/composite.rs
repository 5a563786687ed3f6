use std::fs;

use thiserror::Error;
use tracing::warn;

use crate::attr::AttrValue;
use crate::edge::Edge;
use crate::graph::{Graph, GraphKind, SubgraphOption};
use crate::node::Node;

/// Where a composite's inner graph lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// The inner graph is a cluster subgraph of the outer graph.
    SameGraph,
    /// The inner graph stands alone and can be exported to its own file,
    /// linked from the outer node.
    External,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export to file is only available for an external composite")]
    NotExternal,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything a composite port can connect to: a plain node, or another
/// composite (through its outer node).
pub trait Connectable {
    fn connectable_node(&self) -> Node;
}

impl Connectable for Node {
    fn connectable_node(&self) -> Node {
        self.clone()
    }
}

impl Connectable for Composite {
    fn connectable_node(&self) -> Node {
        self.outer_node.clone()
    }
}

/// Packages a subgraph as a box-shaped node with named input/output ports,
/// for building abstractions inside larger graphs.
pub struct Composite {
    inner: Graph,
    outer_node: Node,
    dot_filename: String,
    kind: CompositeKind,
}

impl Composite {
    /// Creates the composite and its `box3d` representation node in `graph`.
    pub fn new(id: &str, graph: &Graph, kind: CompositeKind) -> Composite {
        let inner = match kind {
            CompositeKind::SameGraph => graph.subgraph_with(id, &[SubgraphOption::Cluster]),
            CompositeKind::External => Graph::new(GraphKind::Directed),
        };
        let outer_node = graph.node(id).attr("shape", "box3d");
        let mut composite = Composite {
            inner,
            outer_node,
            dot_filename: String::new(),
            kind,
        };
        composite.set_export_name(id);
        composite
    }

    /// The inner graph; build the composite's content here.
    pub fn graph(&self) -> &Graph {
        &self.inner
    }

    /// The node representing the composite in the outer graph.
    pub fn outer_node(&self) -> &Node {
        &self.outer_node
    }

    /// Sets an attribute on the outer node.
    pub fn attr(&self, name: &str, value: impl Into<AttrValue>) -> Node {
        self.outer_node.attr(name, value)
    }

    /// Derives the export file name and the `href` link from `name`:
    /// `"my example"` exports to `my_example.dot` and links `my_example.svg`.
    pub fn set_export_name(&mut self, name: &str) {
        let base = name.replace(' ', "_");
        self.outer_node.attr("href", format!("{base}.svg"));
        self.dot_filename = format!("{base}.dot");
    }

    pub fn export_filename(&self) -> &str {
        &self.dot_filename
    }

    /// Connects `from` into the named input port. A source inside the
    /// composite connects to a port node within the inner graph; an outside
    /// source connects to the outer node instead, labeled with the port.
    pub fn input(&self, port: &str, from: &dyn Connectable) -> Edge {
        let from_node = from.connectable_node();
        if self.inner.has_node(&from_node) {
            return self.connect(port, true, &from_node);
        }
        self.inner.node(port).attr("shape", "point");
        from_node.edge(&self.outer_node).label(port)
    }

    /// Output counterpart of [`Composite::input`].
    pub fn output(&self, port: &str, to: &dyn Connectable) -> Edge {
        let to_node = to.connectable_node();
        if self.inner.has_node(&to_node) {
            return self.connect(port, false, &to_node);
        }
        self.inner.node(port).attr("shape", "point");
        self.outer_node.edge(&to_node).label(port)
    }

    fn connect(&self, port: &str, is_input: bool, inner_node: &Node) -> Edge {
        // node creation is idempotent
        let port_node = self.inner.node(port).attr("shape", "point");
        if is_input {
            self.inner
                .edge_with_ports(&port_node, inner_node, Some("s"), Some("n"))
                .attr("taillabel", port)
        } else {
            self.inner
                .edge_with_ports(inner_node, &port_node, Some("s"), Some("n"))
                .attr("headlabel", port)
        }
    }

    /// Writes the inner graph's DOT text to [`Composite::export_filename`].
    pub fn export_file(&self) -> Result<(), ExportError> {
        if self.kind != CompositeKind::External {
            return Err(ExportError::NotExternal);
        }
        fs::write(&self.dot_filename, self.inner.to_dot())?;
        Ok(())
    }

    /// Builds the inner graph with `build`, then exports it. A failing
    /// write is logged and does not abort the caller's workflow.
    pub fn export(&self, build: impl FnOnce(&Graph)) -> &Self {
        build(&self.inner);
        if let Err(error) = self.export_file() {
            warn!(file = %self.dot_filename, %error, "composite export failed");
        }
        self
    }
}
