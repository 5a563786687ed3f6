use crate::attr::{AttrValue, Attributes};
use crate::graph::{Graph, WeakGraphRef};
use crate::node::Node;

/// A directed or undirected connection between two nodes, optionally using
/// named ports on either endpoint. Owned by exactly one graph scope.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) graph: WeakGraphRef,
    pub(crate) from: Node,
    pub(crate) to: Node,
    pub(crate) from_port: Option<String>,
    pub(crate) to_port: Option<String>,
    pub(crate) attributes: Attributes,
}

impl Edge {
    pub fn from(&self) -> &Node {
        &self.from
    }

    pub fn to(&self) -> &Node {
        &self.to
    }

    pub fn from_port(&self) -> Option<&str> {
        self.from_port.as_deref()
    }

    pub fn to_port(&self) -> Option<&str> {
        self.to_port.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str, value: impl Into<AttrValue>) -> Edge {
        self.attributes.set(name, value);
        self.clone()
    }

    pub fn get_attr(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name)
    }

    pub fn label(&self, value: impl Into<AttrValue>) -> Edge {
        self.attr("label", value)
    }

    pub fn solid(&self) -> Edge {
        self.attr("style", "solid")
    }

    pub fn bold(&self) -> Edge {
        self.attr("style", "bold")
    }

    pub fn dashed(&self) -> Edge {
        self.attr("style", "dashed")
    }

    pub fn dotted(&self) -> Edge {
        self.attr("style", "dotted")
    }

    /// Continues the chain: a new edge from this edge's `to` node.
    pub fn edge(&self, to: &Node) -> Edge {
        self.owning_graph().edge(&self.to, to)
    }

    pub fn edge_labeled(&self, to: &Node, labels: &[&str]) -> Edge {
        self.owning_graph().edge_labeled(&self.to, to, labels)
    }

    fn owning_graph(&self) -> Graph {
        Graph::from_ref(
            self.graph
                .upgrade()
                .expect("edge outlived the graph that owns it"),
        )
    }
}
