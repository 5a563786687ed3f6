use std::mem;

use crate::node::Node;

#[derive(Debug, Clone)]
enum RecordField {
    Leaf {
        port: Option<String>,
        content: String,
    },
    Nested(Vec<RecordField>),
}

impl RecordField {
    fn write_on(&self, out: &mut String) {
        match self {
            Self::Leaf { port, content } => {
                if let Some(port) = port {
                    out.push('<');
                    out.push_str(port);
                    out.push_str("> ");
                }
                out.push_str(content);
            }
            Self::Nested(fields) => {
                out.push('{');
                write_fields(fields, out);
                out.push('}');
            }
        }
    }
}

fn write_fields(fields: &[RecordField], out: &mut String) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        field.write_on(out);
    }
}

/// Builds the pipe-delimited label of a node with shape `record` or
/// `mrecord`. Fields accumulate left to right; [`RecordBuilder::nesting`]
/// flips the layout orientation for the fields added inside its block.
pub struct RecordBuilder {
    target: Node,
    shape: &'static str,
    // LIFO of in-progress field lists; every nesting() call pushes the
    // active list and pops it back when its block returns.
    stack: Vec<Vec<RecordField>>,
    current: Vec<RecordField>,
}

impl RecordBuilder {
    pub fn new(target: &Node) -> Self {
        Self {
            target: target.clone(),
            shape: "record",
            stack: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Switches the node shape written by [`RecordBuilder::build`] to
    /// `mrecord` (rounded corners).
    pub fn mrecord(&mut self) -> &mut Self {
        self.shape = "mrecord";
        self
    }

    pub fn field(&mut self, content: &str) -> &mut Self {
        self.current.push(RecordField::Leaf {
            port: None,
            content: content.to_string(),
        });
        self
    }

    /// Adds a field with a port identifier so edges can target the
    /// sub-field, rendered as `<port> content`.
    pub fn field_with_id(&mut self, content: &str, port: &str) -> &mut Self {
        self.current.push(RecordField::Leaf {
            port: Some(port.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Collects every field added inside `block` into one nested `{...}`
    /// field. Blocks nest arbitrarily deep and are always balanced: the
    /// closure bounds its own scope.
    pub fn nesting(&mut self, block: impl FnOnce(&mut Self)) -> &mut Self {
        self.stack.push(mem::take(&mut self.current));
        block(self);
        let nested = mem::take(&mut self.current);
        self.current = self.stack.pop().expect("nesting stack cannot underflow");
        self.current.push(RecordField::Nested(nested));
        self
    }

    /// The computed label, without touching the node.
    pub fn label(&self) -> String {
        let mut out = String::new();
        write_fields(&self.current, &mut out);
        out
    }

    /// Writes the computed label and shape onto the target node. Calling
    /// again after adding more fields recomputes both.
    pub fn build(&self) {
        self.target.attr("shape", self.shape);
        self.target.attr("label", self.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn flatten(source: &str) -> String {
        source.replace(['\n', '\t'], "")
    }

    #[test]
    fn single_field_record() {
        let g = Graph::directed();
        let mut rb = RecordBuilder::new(&g.node("r"));
        rb.field("a");
        rb.build();
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {n1[label="a",shape="record"];}"#
        );
    }

    #[test]
    fn mrecord_with_field_id() {
        let g = Graph::directed();
        let mut rb = RecordBuilder::new(&g.node("r"));
        rb.mrecord();
        rb.field_with_id("a", "a1");
        rb.build();
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {n1[label="<a1> a",shape="mrecord"];}"#
        );
    }

    #[test]
    fn two_columns() {
        let g = Graph::directed();
        let mut rb = RecordBuilder::new(&g.node("r"));
        rb.field("a").field("b");
        rb.build();
        assert_eq!(rb.label(), "a|b");
    }

    #[test]
    fn nesting_flips_orientation() {
        let g = Graph::directed();
        let mut rb = RecordBuilder::new(&g.node("r"));
        rb.field("a");
        rb.nesting(|rb| {
            rb.field("b");
            rb.field("c");
        });
        rb.field("d");
        rb.build();
        assert_eq!(
            flatten(&g.to_dot()),
            r#"digraph  {n1[label="a|{b|c}|d",shape="record"];}"#
        );
    }

    #[test]
    fn nesting_goes_arbitrarily_deep() {
        let g = Graph::directed();
        let mut rb = RecordBuilder::new(&g.node("structs"));
        rb.field("hello world");
        rb.nesting(|rb| {
            rb.field("b");
            rb.nesting(|rb| {
                rb.field("c");
                rb.field_with_id("d", "here");
                rb.field("e");
            });
            rb.field("f");
        });
        rb.field("g");
        rb.field("h");
        assert_eq!(rb.label(), "hello world|{b|{c|<here> d|e}|f}|g|h");
    }

    #[test]
    fn label_preview_does_not_mutate_the_node() {
        let g = Graph::directed();
        let node = g.node("r");
        let mut rb = RecordBuilder::new(&node);
        rb.field("a");
        assert_eq!(rb.label(), "a");
        assert_eq!(node.get_attr("label").unwrap().display(), "r");
        assert!(node.get_attr("shape").is_none());
    }

    #[test]
    fn build_recomputes_after_more_fields() {
        let g = Graph::directed();
        let node = g.node("r");
        let mut rb = RecordBuilder::new(&node);
        rb.field("a");
        rb.build();
        assert_eq!(node.get_attr("label").unwrap().display(), "a");
        rb.field("b");
        rb.build();
        assert_eq!(node.get_attr("label").unwrap().display(), "a|b");
    }
}
