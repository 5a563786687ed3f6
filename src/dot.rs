use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use crate::attr::AttrValue;
use crate::graph::{Graph, GraphKind};
use crate::indent::IndentWriter;

impl Graph {
    /// The graph in DOT notation. Output is canonical: rendering twice
    /// without mutation yields byte-identical text.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        self.write_dot(&mut out)
            .expect("writing into a String cannot fail");
        out
    }

    /// Writes DOT notation into any `fmt::Write` sink.
    pub fn write_dot<W: fmt::Write>(&self, writer: W) -> fmt::Result {
        let mut writer = IndentWriter::new(writer);
        write_scope(self, &mut writer, tree_connector(self))
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_dot(f)
    }
}

// Directedness is a property of the tree, so subgraphs of an undirected
// root render `--` as well.
fn tree_connector(graph: &Graph) -> &'static str {
    if graph.root().kind() == GraphKind::Undirected {
        "--"
    } else {
        "->"
    }
}

fn write_scope<W: fmt::Write>(
    graph: &Graph,
    w: &mut IndentWriter<W>,
    connector: &'static str,
) -> fmt::Result {
    let inner = graph.inner();
    if inner.strict && inner.kind != GraphKind::Subgraph {
        w.write_str("strict ")?;
    }
    write!(w, "{} {} {{", inner.kind.keyword(), inner.id)?;
    w.new_line_indent_while(|w| {
        for sub in inner.subgraphs.values() {
            write_scope(sub, w, connector)?;
        }
        write_attributes(&inner.attributes.to_map(), false, w)?;
        w.new_line()?;
        for node in inner.nodes.values() {
            write!(w, "n{}", node.seq())?;
            write_attributes(&node.attributes().to_map(), true, w)?;
            w.write_str(";")?;
            w.new_line()?;
        }
        for bucket in inner.edges_from.values() {
            for edge in bucket {
                write!(w, "n{}", edge.from().seq())?;
                if let Some(port) = edge.from_port() {
                    write!(w, ":{port}")?;
                }
                w.write_str(connector)?;
                write!(w, "n{}", edge.to().seq())?;
                if let Some(port) = edge.to_port() {
                    write!(w, ":{port}")?;
                }
                write_attributes(&edge.attributes().to_map(), true, w)?;
                w.write_str(";")?;
                w.new_line()?;
            }
        }
        for members in inner.same_rank.values() {
            w.write_str("{rank=same; ")?;
            for node in members {
                write!(w, "n{};", node.seq())?;
            }
            w.write_str("};")?;
            w.new_line()?;
        }
        Ok(())
    })?;
    w.write_str("}")?;
    w.new_line()
}

fn write_attributes<W: fmt::Write>(
    attributes: &BTreeMap<String, AttrValue>,
    must_bracket: bool,
    w: &mut IndentWriter<W>,
) -> fmt::Result {
    if attributes.is_empty() {
        return Ok(());
    }
    if must_bracket {
        w.write_str("[")?;
    }
    let mut first = true;
    for (name, value) in attributes {
        if !first {
            w.write_str(if must_bracket { "," } else { ";" })?;
        }
        match value {
            AttrValue::Html(markup) => write!(w, "{name}=<{markup}>")?,
            AttrValue::Literal(raw) => write!(w, "{name}={raw}")?,
            AttrValue::Text(text) => write!(w, "{name}={}", quoted(text))?,
        }
        first = false;
    }
    w.write_str(if must_bracket { "]" } else { ";" })
}

fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use crate::attr::AttrValue;
    use crate::graph::{Graph, GraphKind, SubgraphOption};

    fn flatten(source: &str) -> String {
        source.replace(['\n', '\t'], "")
    }

    #[test]
    fn empty_directed_graph() {
        let g = Graph::directed();
        assert_eq!(g.to_dot(), "digraph  {\n\t\n\t\n}\n");
    }

    #[test]
    fn graph_with_id_and_attributes() {
        let g = Graph::directed().set_id("G");
        g.attr("style", "filled");
        g.attr("color", "lightgrey");
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph G {color="lightgrey";style="filled";}"#
        );
    }

    #[test]
    fn two_connected_nodes() {
        let g = Graph::directed();
        let a = g.node("A");
        let b = g.node("B");
        g.edge(&a, &b);
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {n1[label="A"];n2[label="B"];n1->n2;}"#
        );
    }

    #[test]
    fn output_is_independent_of_insertion_order() {
        let forward = Graph::directed();
        let a = forward.node("A");
        let b = forward.node("B");
        forward.edge(&a, &b);

        let backward = Graph::directed();
        let b2 = backward.node("B");
        let a2 = backward.node("A");
        backward.edge(&a2, &b2);

        // render ids differ (creation order), statement order does not
        assert_eq!(
            flatten(&backward.to_dot()),
            r#"digraph  {n2[label="A"];n1[label="B"];n2->n1;}"#
        );
        assert_eq!(
            flatten(&forward.to_dot()),
            r#"digraph  {n1[label="A"];n2[label="B"];n1->n2;}"#
        );
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let g = Graph::directed();
        let a = g.node("A");
        let b = g.node("B");
        g.edge_labeled(&a, &b, &["go"]);
        g.subgraph("inner").node("C");
        assert_eq!(g.to_dot(), g.to_dot());
    }

    #[test]
    fn undirected_graphs_use_dash_connectors() {
        let g = Graph::undirected();
        let a = g.node("A");
        let b = g.node("B");
        g.edge(&a, &b);
        assert_eq!(
            flatten(&g.to_dot()),
            r#"graph  {n1[label="A"];n2[label="B"];n1--n2;}"#
        );
    }

    #[test]
    fn subgraphs_of_undirected_roots_stay_undirected() {
        let g = Graph::undirected();
        let sub = g.subgraph("inner");
        let a = sub.node("a");
        let b = sub.node("b");
        sub.edge(&a, &b);
        assert!(flatten(&g.to_dot()).contains("n2--n3;"));
    }

    #[test]
    fn strict_marker_on_the_root_only() {
        let g = Graph::directed().strict();
        let sub = g.subgraph("inner");
        let out = flatten(&g.to_dot());
        assert!(out.starts_with("strict digraph"));
        assert!(!out.contains("strict subgraph"));
        assert!(!sub.is_strict());
    }

    #[test]
    fn subgraph_with_attributes() {
        let g = Graph::directed();
        let sub = g.subgraph("test");
        sub.attr("style", "filled");
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {subgraph s1 {label="test";style="filled";}}"#
        );
    }

    #[test]
    fn cluster_subgraphs_render_nested_with_prefixed_id() {
        let g = Graph::directed();
        let sub = g.subgraph_with("area", &[SubgraphOption::Cluster]);
        sub.node("a");
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {subgraph cluster_s1 {label="area";n2[label="a"];}}"#
        );
    }

    #[test]
    fn edges_with_ports() {
        let g = Graph::directed();
        let a = g.node("A");
        let b = g.node("B");
        g.edge_with_ports(&a, &b, Some("f1"), Some("here"));
        assert!(flatten(&g.to_dot()).contains("n1:f1->n2:here;"));
    }

    #[test]
    fn attribute_value_kinds_render_distinctly() {
        let g = Graph::directed();
        g.node("A")
            .attr("html", AttrValue::html("<b>bold</b>"))
            .attr("raw", AttrValue::literal("{rank=same}"))
            .attr("text", "quo\"ted")
            .attr("weight", 2);
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {n1[html=<<b>bold</b>>,label="A",raw={rank=same},text="quo\"ted",weight="2"];}"#
        );
    }

    #[test]
    fn rank_groups_render_after_edges() {
        let g = Graph::directed();
        let a = g.node("A");
        let b = g.node("B");
        g.add_to_same_rank("row", &[a, b]);
        assert!(flatten(&g.to_dot()).ends_with(r#"{rank=same; n1;n2;};}"#));
    }

    #[test]
    fn parallel_edges_keep_creation_order() {
        let g = Graph::directed();
        let a = g.node("A");
        let b = g.node("B");
        g.edge_labeled(&a, &b, &["first"]);
        g.edge_labeled(&a, &b, &["second"]);
        let out = flatten(&g.to_dot());
        let first = out.find(r#"label="first""#).unwrap();
        let second = out.find(r#"label="second""#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn root_subgraph_kind_renders_subgraph_keyword() {
        let g = Graph::new(GraphKind::Subgraph);
        assert!(g.to_dot().starts_with("subgraph  {"));
    }
}
