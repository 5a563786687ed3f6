use crate::attr::{AttrValue, Attributes};
use crate::edge::Edge;
use crate::graph::{Graph, WeakGraphRef};

/// A graph vertex. Handles are cheap to clone and share one attribute
/// store, so every copy of the same logical node observes the same state.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) graph: WeakGraphRef,
    pub(crate) id: String,
    pub(crate) seq: usize,
    pub(crate) attributes: Attributes,
}

impl Node {
    /// The caller-supplied identifier, unique within the creating scope.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The render sequence number used in emitted text (`n<seq>`).
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str, value: impl Into<AttrValue>) -> Node {
        self.attributes.set(name, value);
        self.clone()
    }

    pub fn attrs(&self, pairs: &[(&str, &str)]) -> Node {
        for (name, value) in pairs {
            self.attributes.set(name, *value);
        }
        self.clone()
    }

    pub fn get_attr(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name)
    }

    /// Overwrites the default label seeded at creation.
    pub fn label(&self, value: impl Into<AttrValue>) -> Node {
        self.attr("label", value)
    }

    /// Sets the `shape` attribute to `box`.
    pub fn box_shape(&self) -> Node {
        self.attr("shape", "box")
    }

    /// Connects this node to `to`; ownership of the edge is resolved by the
    /// scope tree, not by which handle the call is made on.
    pub fn edge(&self, to: &Node) -> Edge {
        self.owning_graph().edge(self, to)
    }

    pub fn edge_labeled(&self, to: &Node, labels: &[&str]) -> Edge {
        self.owning_graph().edge_labeled(self, to, labels)
    }

    pub(crate) fn owning_graph(&self) -> Graph {
        Graph::from_ref(
            self.graph
                .upgrade()
                .expect("node outlived the graph that created it"),
        )
    }
}
