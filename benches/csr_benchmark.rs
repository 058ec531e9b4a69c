use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use blockgraph::{
    edge_list_to_csr, edge_list_to_graph, to_sorted_csr, to_unsorted_csr, CsrFields, EdgeList,
    Graph, GraphConfig,
};

const NODES: usize = 10_000;
const DEGREE: usize = 32;

fn edge_columns() -> (Vec<i64>, Vec<i64>, Vec<i64>) {
    let mut src = Vec::with_capacity(NODES * DEGREE);
    let mut dst = Vec::with_capacity(NODES * DEGREE);
    for i in 0..NODES {
        // Fixed pattern so runs are comparable
        for j in 0..DEGREE {
            src.push(i as i64);
            dst.push(((i * 131 + j * 7919) % NODES) as i64);
        }
    }
    let w = vec![1; src.len()];
    (src, dst, w)
}

fn bench_build(c: &mut Criterion) {
    let (src, dst, w) = edge_columns();
    let edges = EdgeList::new(&src, &dst, &w);
    let config = GraphConfig::with_vertices(NODES);

    let mut group = c.benchmark_group("csr_build");
    group.throughput(Throughput::Elements(src.len() as u64));
    group.bench_function("edge_list_to_csr", |b| {
        b.iter(|| black_box(edge_list_to_csr(NODES, &edges, 0).unwrap()));
    });
    group.bench_function("edge_list_to_graph", |b| {
        b.iter(|| black_box(edge_list_to_graph::<14>(&config, NODES, &edges).unwrap()));
    });
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let (src, dst, w) = edge_columns();
    let graph: Graph =
        edge_list_to_graph(&GraphConfig::with_vertices(NODES), NODES, &EdgeList::new(&src, &dst, &w))
            .unwrap();

    let mut group = c.benchmark_group("csr_extract");
    group.throughput(Throughput::Elements(src.len() as u64));
    group.bench_function("unsorted_ind_only", |b| {
        b.iter(|| black_box(to_unsorted_csr(&graph, NODES, CsrFields::NONE).unwrap()));
    });
    group.bench_function("unsorted_all_columns", |b| {
        b.iter(|| black_box(to_unsorted_csr(&graph, NODES, CsrFields::ALL).unwrap()));
    });
    group.bench_function("sorted_all_columns", |b| {
        b.iter(|| black_box(to_sorted_csr(&graph, NODES, CsrFields::ALL).unwrap()));
    });
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let (src, dst, w) = edge_columns();
    let edges = EdgeList::new(&src, &dst, &w);
    let config = GraphConfig::with_vertices(NODES);

    c.bench_function("normalize_all", |b| {
        b.iter_batched(
            || edge_list_to_graph::<14>(&config, NODES, &edges).unwrap(),
            |g| black_box(g.normalize_all().unwrap()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_build, bench_extract, bench_normalize);
criterion_main!(benches);
