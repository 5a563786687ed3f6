use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::attr::{AttrValue, Attributes};
use crate::edge::Edge;
use crate::node::Node;

pub(crate) type GraphRef = Rc<RefCell<GraphInner>>;
pub(crate) type WeakGraphRef = Weak<RefCell<GraphInner>>;

type NodeHook = Rc<dyn Fn(&Node)>;
type EdgeHook = Rc<dyn Fn(&Edge)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Directed,
    Undirected,
    Subgraph,
}

impl GraphKind {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Self::Directed => "digraph",
            Self::Undirected => "graph",
            Self::Subgraph => "subgraph",
        }
    }
}

/// Options accepted at subgraph creation. `Strict` is a root-only modifier
/// and is silently ignored here; it exists so call sites can pass one option
/// list around without caring where it ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgraphOption {
    Cluster,
    Strict,
}

pub(crate) struct GraphInner {
    pub(crate) id: String,
    pub(crate) strict: bool,
    pub(crate) kind: GraphKind,
    pub(crate) attributes: Attributes,
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) edges_from: BTreeMap<String, Vec<Edge>>,
    pub(crate) subgraphs: BTreeMap<String, Graph>,
    pub(crate) parent: Option<WeakGraphRef>,
    pub(crate) same_rank: BTreeMap<String, Vec<Node>>,
    // One counter per tree, created by the root and shared down so every
    // scope hands out globally unique render ids.
    pub(crate) seq: Rc<Cell<usize>>,
    pub(crate) node_hook: Option<NodeHook>,
    pub(crate) edge_hook: Option<EdgeHook>,
}

/// A graph scope: the root of a tree, or a nested subgraph. Handles are
/// cheap to clone and refer to the same underlying scope.
///
/// The model is mutable shared state with no internal synchronization;
/// concurrent mutation from multiple threads requires external locking by
/// the caller.
#[derive(Clone)]
pub struct Graph {
    inner: GraphRef,
}

impl Graph {
    pub fn new(kind: GraphKind) -> Graph {
        Graph::from_inner(GraphInner {
            id: String::new(),
            strict: false,
            kind,
            attributes: Attributes::new(),
            nodes: BTreeMap::new(),
            edges_from: BTreeMap::new(),
            subgraphs: BTreeMap::new(),
            parent: None,
            same_rank: BTreeMap::new(),
            seq: Rc::new(Cell::new(0)),
            node_hook: None,
            edge_hook: None,
        })
    }

    pub fn directed() -> Graph {
        Graph::new(GraphKind::Directed)
    }

    pub fn undirected() -> Graph {
        Graph::new(GraphKind::Undirected)
    }

    /// Marks the graph strict. Only the outermost scope ever renders the
    /// marker; a DOT consumer then drops duplicate edges.
    pub fn strict(&self) -> Graph {
        self.inner.borrow_mut().strict = true;
        self.clone()
    }

    fn from_inner(inner: GraphInner) -> Graph {
        Graph {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub(crate) fn from_ref(inner: GraphRef) -> Graph {
        Graph { inner }
    }

    pub(crate) fn inner(&self) -> Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }

    /// Sets the identifier.
    ///
    /// # Panics
    ///
    /// Panics when the identifier was already set: both the old and the new
    /// id could be referenced by emitted output and neither can be proven
    /// unused, so overwriting must fail loudly instead of corrupting output.
    pub fn set_id(&self, id: &str) -> Graph {
        {
            let mut inner = self.inner.borrow_mut();
            assert!(
                inner.id.is_empty(),
                "cannot overwrite non-empty graph id {:?}; both the old and the new could be in use",
                inner.id
            );
            inner.id = id.to_string();
        }
        self.clone()
    }

    pub fn kind(&self) -> GraphKind {
        self.inner.borrow().kind
    }

    pub fn is_directed(&self) -> bool {
        self.kind() == GraphKind::Directed
    }

    pub fn is_strict(&self) -> bool {
        self.inner.borrow().strict
    }

    /// The shared attribute store for this scope.
    pub fn attributes(&self) -> Attributes {
        self.inner.borrow().attributes.clone()
    }

    pub fn attr(&self, name: &str, value: impl Into<AttrValue>) -> Graph {
        self.attributes().set(name, value);
        self.clone()
    }

    pub fn attrs(&self, pairs: &[(&str, &str)]) -> Graph {
        let attributes = self.attributes();
        for (name, value) in pairs {
            attributes.set(name, *value);
        }
        self.clone()
    }

    pub fn get_attr(&self, name: &str) -> Option<AttrValue> {
        self.attributes().get(name)
    }

    pub fn label(&self, value: impl Into<AttrValue>) -> Graph {
        self.attr("label", value)
    }

    pub fn parent(&self) -> Option<Graph> {
        self.inner
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Graph::from_ref)
    }

    /// The top-level graph of the nesting chain (self when not nested).
    pub fn root(&self) -> Graph {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn same_graph(&self, other: &Graph) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn next_seq(&self) -> usize {
        let counter = self.inner.borrow().seq.clone();
        counter.set(counter.get() + 1);
        counter.get()
    }

    /// Registers a callback invoked once for every node created through this
    /// scope (not on lookup). Subgraphs created afterwards inherit it.
    pub fn node_initializer(&self, hook: impl Fn(&Node) + 'static) {
        self.inner.borrow_mut().node_hook = Some(Rc::new(hook));
    }

    /// Edge counterpart of [`Graph::node_initializer`]; the callback of the
    /// scope the creation call was made on is the one that runs.
    pub fn edge_initializer(&self, hook: impl Fn(&Edge) + 'static) {
        self.inner.borrow_mut().edge_hook = Some(Rc::new(hook));
    }

    /// Returns the node with this id, walking outward through parent scopes;
    /// creates it in *this* scope when no scope on the chain has it. The new
    /// node's label defaults to its id.
    pub fn node(&self, id: &str) -> Node {
        if let Some(existing) = self.find_node(id) {
            return existing;
        }
        let node = Node {
            graph: Rc::downgrade(&self.inner),
            id: id.to_string(),
            seq: self.next_seq(),
            attributes: Attributes::new(),
        };
        node.attributes.set("label", id);
        self.inner
            .borrow_mut()
            .nodes
            .insert(id.to_string(), node.clone());
        let hook = self.inner.borrow().node_hook.clone();
        if let Some(hook) = hook {
            hook(&node);
        }
        node
    }

    fn find_node(&self, id: &str) -> Option<Node> {
        if let Some(node) = self.inner.borrow().nodes.get(id) {
            return Some(node.clone());
        }
        self.parent()?.find_node(id)
    }

    /// Whether the node was created in this scope (subgraphs not searched).
    pub fn has_node(&self, node: &Node) -> bool {
        node.graph
            .upgrade()
            .is_some_and(|owner| Rc::ptr_eq(&owner, &self.inner))
    }

    /// Removes the node from this scope together with every edge here that
    /// starts or ends at it. Returns false, changing nothing, when this
    /// scope has no such node.
    pub fn delete_node(&self, id: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.nodes.remove(id).is_none() {
            return false;
        }
        inner.edges_from.remove(id);
        for bucket in inner.edges_from.values_mut() {
            bucket.retain(|edge| edge.to.id() != id);
        }
        true
    }

    /// Returns the named subgraph, creating it on first use. Its label
    /// attribute defaults to the name, mirroring node creation; options on
    /// later calls for the same name are ignored.
    pub fn subgraph(&self, name: &str) -> Graph {
        self.subgraph_with(name, &[])
    }

    pub fn subgraph_with(&self, name: &str, options: &[SubgraphOption]) -> Graph {
        if let Some(existing) = self.inner.borrow().subgraphs.get(name) {
            return existing.clone();
        }
        let seq = self.next_seq();
        let (counter, node_hook, edge_hook) = {
            let inner = self.inner.borrow();
            (
                inner.seq.clone(),
                inner.node_hook.clone(),
                inner.edge_hook.clone(),
            )
        };
        let sub = Graph::from_inner(GraphInner {
            id: format!("s{seq}"),
            strict: false,
            kind: GraphKind::Subgraph,
            attributes: Attributes::new(),
            nodes: BTreeMap::new(),
            edges_from: BTreeMap::new(),
            subgraphs: BTreeMap::new(),
            parent: Some(Rc::downgrade(&self.inner)),
            same_rank: BTreeMap::new(),
            seq: counter,
            node_hook,
            edge_hook,
        });
        sub.attributes().set("label", name);
        for option in options {
            match option {
                SubgraphOption::Cluster => {
                    let mut inner = sub.inner.borrow_mut();
                    inner.id = format!("cluster_{}", inner.id);
                }
                // strict is a root-only modifier
                SubgraphOption::Strict => {}
            }
        }
        self.inner
            .borrow_mut()
            .subgraphs
            .insert(name.to_string(), sub.clone());
        sub
    }

    /// Looks up a subgraph by creation name in this scope, then outward
    /// through the parents.
    pub fn find_subgraph(&self, name: &str) -> Option<Graph> {
        if let Some(sub) = self.inner.borrow().subgraphs.get(name) {
            return Some(sub.clone());
        }
        self.parent()?.find_subgraph(name)
    }

    pub fn edge(&self, from: &Node, to: &Node) -> Edge {
        self.edge_labeled(from, to, &[])
    }

    /// Creates an edge; multiple labels are joined with a comma into the
    /// `label` attribute. Parallel edges between the same endpoints are
    /// permitted and keep their creation order.
    pub fn edge_labeled(&self, from: &Node, to: &Node, labels: &[&str]) -> Edge {
        self.create_edge(from, to, None, None, labels)
    }

    pub fn edge_with_ports(
        &self,
        from: &Node,
        to: &Node,
        from_port: Option<&str>,
        to_port: Option<&str>,
    ) -> Edge {
        self.create_edge(from, to, from_port, to_port, &[])
    }

    fn create_edge(
        &self,
        from: &Node,
        to: &Node,
        from_port: Option<&str>,
        to_port: Option<&str>,
        labels: &[&str],
    ) -> Edge {
        let owner = self.edge_owner(from, to);
        let edge = Edge {
            graph: Rc::downgrade(&owner.inner),
            from: from.clone(),
            to: to.clone(),
            from_port: from_port.filter(|p| !p.is_empty()).map(str::to_string),
            to_port: to_port.filter(|p| !p.is_empty()).map(str::to_string),
            attributes: Attributes::new(),
        };
        if !labels.is_empty() {
            edge.attributes.set("label", labels.join(","));
        }
        owner
            .inner
            .borrow_mut()
            .edges_from
            .entry(from.id().to_string())
            .or_default()
            .push(edge.clone());
        let hook = self.inner.borrow().edge_hook.clone();
        if let Some(hook) = hook {
            hook(&edge);
        }
        edge
    }

    // Endpoints from one scope keep the edge there; otherwise the nearest
    // common ancestor of the two scopes owns it.
    fn edge_owner(&self, from: &Node, to: &Node) -> Graph {
        let from_scope = from.owning_graph();
        let to_scope = to.owning_graph();
        if from_scope.same_graph(&to_scope) {
            return from_scope;
        }
        common_ancestor(&from_scope, &to_scope)
    }

    /// All edges from `from` to `to` held by the owning scope, in creation
    /// order; empty when none match.
    pub fn find_edges(&self, from: &Node, to: &Node) -> Vec<Edge> {
        let owner = self.edge_owner(from, to);
        let inner = owner.inner.borrow();
        inner
            .edges_from
            .get(from.id())
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|edge| edge.to.id() == to.id())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rendering hint forcing the given nodes onto the same rank. Purely
    /// additive; membership of the nodes in this scope is not checked.
    pub fn add_to_same_rank(&self, group: &str, nodes: &[Node]) {
        self.inner
            .borrow_mut()
            .same_rank
            .entry(group.to_string())
            .or_default()
            .extend(nodes.iter().cloned());
    }

    /// Visits all nodes of this scope and its subgraphs. Stops early when
    /// the callback returns true.
    pub fn visit_nodes(&self, mut callback: impl FnMut(&Node) -> bool) {
        self.visit_nodes_inner(&mut callback);
    }

    fn visit_nodes_inner(&self, callback: &mut dyn FnMut(&Node) -> bool) -> bool {
        let nodes: Vec<Node> = self.inner.borrow().nodes.values().cloned().collect();
        for node in &nodes {
            if callback(node) {
                return true;
            }
        }
        let subgraphs: Vec<Graph> = self.inner.borrow().subgraphs.values().cloned().collect();
        for sub in &subgraphs {
            if sub.visit_nodes_inner(callback) {
                return true;
            }
        }
        false
    }

    /// Searches this scope and the whole nested tree below it.
    pub fn find_node_by_id(&self, id: &str) -> Option<Node> {
        let mut found = None;
        self.visit_nodes(|node| {
            if node.id() == id {
                found = Some(node.clone());
                true
            } else {
                false
            }
        });
        found
    }

    pub fn find_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        self.visit_nodes(|node| {
            nodes.push(node.clone());
            false
        });
        nodes
    }

    /// First node in this scope whose plain-text label matches; falls back
    /// to asking the parent scope.
    pub fn find_node_with_label(&self, label: &str) -> Option<Node> {
        let local = self
            .inner
            .borrow()
            .nodes
            .values()
            .find(|node| {
                matches!(node.get_attr("label"), Some(AttrValue::Text(text)) if text == label)
            })
            .cloned();
        if local.is_some() {
            return local;
        }
        self.parent()?.find_node_with_label(label)
    }

    /// Visits every edge in this scope and its subgraphs; stops when the
    /// callback returns false.
    pub fn walk_edges(&self, mut callback: impl FnMut(&Edge) -> bool) {
        self.walk_edges_inner(&mut callback);
    }

    fn walk_edges_inner(&self, callback: &mut dyn FnMut(&Edge) -> bool) -> bool {
        let edges: Vec<Edge> = self
            .inner
            .borrow()
            .edges_from
            .values()
            .flatten()
            .cloned()
            .collect();
        for edge in &edges {
            if !callback(edge) {
                return true;
            }
        }
        let subgraphs: Vec<Graph> = self.inner.borrow().subgraphs.values().cloned().collect();
        for sub in &subgraphs {
            if sub.walk_edges_inner(callback) {
                return true;
            }
        }
        false
    }

    /// Copy of the from-id edge buckets of this scope.
    pub fn edges_map(&self) -> BTreeMap<String, Vec<Edge>> {
        self.inner.borrow().edges_from.clone()
    }

    /// Recreates this scope tree with fresh backing stores: same ids and
    /// sequence numbers, detached attribute maps, hooks re-shared.
    pub fn deep_copy(&self) -> Graph {
        let (seq_value, parent) = {
            let inner = self.inner.borrow();
            (inner.seq.get(), inner.parent.clone())
        };
        self.deep_copy_impl(Rc::new(Cell::new(seq_value)), parent)
    }

    fn deep_copy_impl(&self, counter: Rc<Cell<usize>>, parent: Option<WeakGraphRef>) -> Graph {
        let inner = self.inner.borrow();
        let copy = Graph::from_inner(GraphInner {
            id: inner.id.clone(),
            strict: inner.strict,
            kind: inner.kind,
            attributes: inner.attributes.detached_clone(),
            nodes: BTreeMap::new(),
            edges_from: BTreeMap::new(),
            subgraphs: BTreeMap::new(),
            parent,
            same_rank: BTreeMap::new(),
            seq: counter.clone(),
            node_hook: inner.node_hook.clone(),
            edge_hook: inner.edge_hook.clone(),
        });

        let mut nodes = BTreeMap::new();
        for (id, node) in &inner.nodes {
            nodes.insert(
                id.clone(),
                Node {
                    graph: Rc::downgrade(&copy.inner),
                    id: node.id().to_string(),
                    seq: node.seq(),
                    attributes: node.attributes.detached_clone(),
                },
            );
        }

        // Cross-scope endpoints keep their original handle; only nodes of
        // this scope are rebound to the copy.
        let rebind = |node: &Node| nodes.get(node.id()).cloned().unwrap_or_else(|| node.clone());

        let mut edges_from = BTreeMap::new();
        for (from_id, bucket) in &inner.edges_from {
            let copied: Vec<Edge> = bucket
                .iter()
                .map(|edge| Edge {
                    graph: Rc::downgrade(&copy.inner),
                    from: rebind(&edge.from),
                    to: rebind(&edge.to),
                    from_port: edge.from_port.clone(),
                    to_port: edge.to_port.clone(),
                    attributes: edge.attributes.detached_clone(),
                })
                .collect();
            edges_from.insert(from_id.clone(), copied);
        }

        let mut same_rank = BTreeMap::new();
        for (group, members) in &inner.same_rank {
            same_rank.insert(group.clone(), members.iter().map(&rebind).collect());
        }

        let mut subgraphs = BTreeMap::new();
        for (name, sub) in &inner.subgraphs {
            subgraphs.insert(
                name.clone(),
                sub.deep_copy_impl(counter.clone(), Some(Rc::downgrade(&copy.inner))),
            );
        }

        {
            let mut copy_inner = copy.inner.borrow_mut();
            copy_inner.nodes = nodes;
            copy_inner.edges_from = edges_from;
            copy_inner.same_rank = same_rank;
            copy_inner.subgraphs = subgraphs;
        }
        copy
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::directed()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Graph")
            .field("id", &inner.id)
            .field("kind", &inner.kind)
            .field("strict", &inner.strict)
            .field("nodes", &inner.nodes.len())
            .field(
                "edges",
                &inner.edges_from.values().map(Vec::len).sum::<usize>(),
            )
            .field("subgraphs", &inner.subgraphs.len())
            .finish()
    }
}

fn common_ancestor(one: &Graph, two: &Graph) -> Graph {
    let mut chain = Vec::new();
    let mut cursor = Some(one.clone());
    while let Some(scope) = cursor {
        cursor = scope.parent();
        chain.push(scope);
    }
    let mut cursor = Some(two.clone());
    while let Some(scope) = cursor {
        if chain.iter().any(|candidate| candidate.same_graph(&scope)) {
            return scope;
        }
        cursor = scope.parent();
    }
    // Endpoints from unrelated trees; fall back to the first one's root.
    one.root()
}
