pub mod attr;
pub mod composite;
pub mod dot;
pub mod edge;
pub mod graph;
pub mod indent;
pub mod mermaid;
pub mod node;
pub mod record;

pub use attr::{AttrValue, Attributes};
pub use composite::{Composite, CompositeKind, Connectable, ExportError};
pub use edge::Edge;
pub use graph::{Graph, GraphKind, SubgraphOption};
pub use indent::IndentWriter;
pub use mermaid::{MermaidShape, Orientation, mermaid_flowchart, mermaid_graph};
pub use node::Node;
pub use record::RecordBuilder;
