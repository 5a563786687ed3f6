use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use dotgraph::{Graph, Orientation, mermaid_graph};

fn build_graph(nodes: usize) -> Graph {
    let g = Graph::directed();
    let mut previous = g.node("n0");
    for i in 1..nodes {
        let next = g.node(&format!("n{i}"));
        g.edge_labeled(&previous, &next, &["step"]);
        previous = next;
    }
    for i in 0..nodes / 10 {
        let sub = g.subgraph(&format!("group{i}"));
        sub.node(&format!("g{i}"));
    }
    g
}

fn bench_dot(c: &mut Criterion) {
    let graph = build_graph(500);
    c.bench_function("dot_500_nodes", |b| {
        b.iter(|| black_box(graph.to_dot()));
    });
}

fn bench_mermaid(c: &mut Criterion) {
    let graph = build_graph(500);
    c.bench_function("mermaid_500_nodes", |b| {
        b.iter(|| black_box(mermaid_graph(&graph, Orientation::TopDown)));
    });
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_500_nodes", |b| {
        b.iter(|| black_box(build_graph(500)));
    });
}

criterion_group!(benches, bench_dot, bench_mermaid, bench_build);
criterion_main!(benches);
