use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;

use crate::attr::AttrValue;
use crate::graph::{Graph, GraphKind};

/// Requested flowchart layout orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    TopDown,
    BottomToTop,
    RightToLeft,
    LeftToRight,
}

impl Orientation {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomToTop),
            "RL" => Some(Self::RightToLeft),
            "LR" => Some(Self::LeftToRight),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::BottomToTop => "BT",
            Self::RightToLeft => "RL",
            Self::LeftToRight => "LR",
        }
    }
}

/// Node shapes of the flowchart syntax, each a fixed pair of open/close
/// delimiters around the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MermaidShape {
    Round,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    Asymmetric,
    Rhombus,
    Trapezoid,
    TrapezoidAlt,
    Hexagon,
    Parallelogram,
    ParallelogramAlt,
}

static SHAPE_BY_NAME: Lazy<HashMap<&'static str, MermaidShape>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert("round", MermaidShape::Round);
    table.insert("stadium", MermaidShape::Stadium);
    table.insert("subroutine", MermaidShape::Subroutine);
    table.insert("cylinder", MermaidShape::Cylinder);
    table.insert("circle", MermaidShape::Circle);
    table.insert("asymmetric", MermaidShape::Asymmetric);
    table.insert("rhombus", MermaidShape::Rhombus);
    table.insert("diamond", MermaidShape::Rhombus);
    table.insert("trapezoid", MermaidShape::Trapezoid);
    table.insert("trapezoid-alt", MermaidShape::TrapezoidAlt);
    table.insert("hexagon", MermaidShape::Hexagon);
    table.insert("parallelogram", MermaidShape::Parallelogram);
    table.insert("parallelogram-alt", MermaidShape::ParallelogramAlt);
    table
});

impl MermaidShape {
    /// Recognized shape names; unknown names fall back to [`Self::Round`]
    /// at render time.
    pub fn from_name(name: &str) -> Option<Self> {
        SHAPE_BY_NAME.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Stadium => "stadium",
            Self::Subroutine => "subroutine",
            Self::Cylinder => "cylinder",
            Self::Circle => "circle",
            Self::Asymmetric => "asymmetric",
            Self::Rhombus => "rhombus",
            Self::Trapezoid => "trapezoid",
            Self::TrapezoidAlt => "trapezoid-alt",
            Self::Hexagon => "hexagon",
            Self::Parallelogram => "parallelogram",
            Self::ParallelogramAlt => "parallelogram-alt",
        }
    }

    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::Round => ("(", ")"),
            Self::Stadium => ("([", "])"),
            Self::Subroutine => ("[[", "]]"),
            Self::Cylinder => ("[(", ")]"),
            Self::Circle => ("((", "))"),
            Self::Asymmetric => (">", "]"),
            Self::Rhombus => ("{", "}"),
            Self::Trapezoid => ("[/", "\\]"),
            Self::TrapezoidAlt => ("[\\", "/]"),
            Self::Hexagon => ("[{{", "}}]"),
            Self::Parallelogram => ("[/", "/]"),
            Self::ParallelogramAlt => ("[\\", "\\]"),
        }
    }
}

impl From<MermaidShape> for AttrValue {
    fn from(shape: MermaidShape) -> Self {
        AttrValue::Text(shape.name().to_string())
    }
}

/// Renders with the `graph` keyword.
pub fn mermaid_graph(graph: &Graph, orientation: Orientation) -> String {
    diagram(graph, "graph", orientation)
}

/// Renders with the `flowchart` keyword.
pub fn mermaid_flowchart(graph: &Graph, orientation: Orientation) -> String {
    diagram(graph, "flowchart", orientation)
}

fn diagram(graph: &Graph, keyword: &str, orientation: Orientation) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {};\n", keyword, orientation.token());
    let directed = graph.root().kind() != GraphKind::Undirected;
    write_scope_content(graph, &mut out, directed);
    write_subgraph_blocks(graph, &mut out, directed);
    out
}

fn write_scope_content(graph: &Graph, out: &mut String, directed: bool) {
    let inner = graph.inner();
    for node in inner.nodes.values() {
        let shape = match node.get_attr("shape") {
            Some(AttrValue::Text(name)) => {
                MermaidShape::from_name(&name).unwrap_or(MermaidShape::Round)
            }
            _ => MermaidShape::Round,
        };
        let (open, close) = shape.delimiters();
        let label = match node.get_attr("label") {
            Some(AttrValue::Text(text)) => text,
            _ => "?".to_string(),
        };
        let _ = write!(
            out,
            "\tn{}{}{}{};\n",
            node.seq(),
            open,
            quoted_label(&label),
            close
        );
        if let Some(style) = node.get_attr("style") {
            let _ = write!(out, "\tstyle n{} {}\n", node.seq(), style.display());
        }
    }
    let connector = if directed { "-->" } else { "---" };
    for bucket in inner.edges_from.values() {
        for edge in bucket {
            let link = edge
                .get_attr("link")
                .map(|value| value.display().to_string())
                .unwrap_or_else(|| connector.to_string());
            let label = edge
                .get_attr("label")
                .map(|value| value.display().to_string())
                .unwrap_or_default();
            if label.is_empty() {
                let _ = write!(
                    out,
                    "\tn{}{}n{};\n",
                    edge.from().seq(),
                    link,
                    edge.to().seq()
                );
            } else {
                let _ = write!(
                    out,
                    "\tn{}{}|{}|n{};\n",
                    edge.from().seq(),
                    link,
                    quoted_label(&label),
                    edge.to().seq()
                );
            }
        }
    }
}

// Subgraph blocks come after the enclosing scope's own statements; nested
// scopes recurse inside their parent's block.
fn write_subgraph_blocks(graph: &Graph, out: &mut String, directed: bool) {
    let inner = graph.inner();
    for (name, sub) in &inner.subgraphs {
        let label = sub
            .get_attr("label")
            .map(|value| value.display().to_string())
            .unwrap_or_default();
        let _ = write!(out, "subgraph {} [{}];\n", name, label);
        write_scope_content(sub, out, directed);
        write_subgraph_blocks(sub, out, directed);
        out.push_str("end;\n");
    }
}

fn quoted_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
