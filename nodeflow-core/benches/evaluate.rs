use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nodeflow_core::{
    DataType, Graph, Node, NodeId, PortSpec, ProcessContext, ProcessError, Processor, Value,
};

/// Adds one to its input.
struct Increment;

impl Processor for Increment {
    fn type_name(&self) -> &str {
        "increment"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("x", DataType::Int),
            PortSpec::output("y", DataType::Int),
        ]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessError> {
        let x = ctx.input("x").and_then(Value::as_int).unwrap_or(0);
        ctx.set_output("y", x + 1)
    }
}

fn chain(len: usize) -> (Graph, Vec<NodeId>) {
    let mut graph = Graph::new();
    let ids: Vec<NodeId> = (0..len)
        .map(|i| {
            let node = Node::new(format!("n{i}"), Box::new(Increment)).unwrap();
            graph.add_node(node).unwrap()
        })
        .collect();
    for pair in ids.windows(2) {
        graph.add_connection(pair[0], "y", pair[1], "x").unwrap();
    }
    (graph, ids)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for len in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("full", len), &len, |b, &len| {
            let (mut graph, _) = chain(len);
            b.iter(|| {
                graph.clear_cache();
                black_box(graph.evaluate(None).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("tail_dirty", len), &len, |b, &len| {
            let (mut graph, ids) = chain(len);
            let tail = ids[ids.len() - 1];
            graph.evaluate(None).unwrap();
            b.iter(|| {
                graph.mark_dirty(tail).unwrap();
                black_box(graph.evaluate(Some(tail)).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", len), &len, |b, &len| {
            let (mut graph, _) = chain(len);
            graph.evaluate(None).unwrap();
            b.iter(|| black_box(graph.evaluate(None).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
