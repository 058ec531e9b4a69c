use blockgraph::{
    edge_list_to_csr, edge_list_to_graph, to_sorted_csr, to_unsorted_csr, CsrFields, EdgeList,
    Graph, GraphConfig, StreamingGraph,
};

fn worked_example() -> Graph {
    let src = [0, 0, 1];
    let dst = [1, 2, 0];
    let w = [5, 3, 5];
    let t = [100, 50, 100];
    let edges = EdgeList::new(&src, &dst, &w)
        .with_time_first(&t)
        .with_time_recent(&t);
    edge_list_to_graph(&GraphConfig::with_vertices(3), 3, &edges).unwrap()
}

#[test]
fn worked_example_offsets_and_sorted_row() {
    let g = worked_example();
    let unsorted = to_unsorted_csr(&g, 3, CsrFields::ALL).unwrap();
    assert_eq!(unsorted.offsets, vec![0, 2, 3, 3]);

    let sorted = to_sorted_csr(&g, 3, CsrFields::ALL).unwrap();
    assert_eq!(sorted.offsets, vec![0, 2, 3, 3]);
    assert_eq!(sorted.neighbors(0), &[1, 2]);
    assert_eq!(&sorted.weight.as_ref().unwrap()[..2], &[5, 3]);
    assert_eq!(&sorted.time_first.as_ref().unwrap()[..2], &[100, 50]);
    assert_eq!(sorted.neighbors(1), &[0]);
    assert!(sorted.neighbors(2).is_empty());
    assert_eq!(sorted.etype.as_deref(), Some(&[0, 0, 0][..]));
}

#[test]
fn sorted_rows_carry_every_column_through_one_permutation() {
    // Weight and both stamps encode the destination, so any misaligned permutation shows.
    let src: Vec<i64> = (0..200).map(|i| i % 5).collect();
    let dst: Vec<i64> = (0..200).map(|i| (i * 37) % 50).collect();
    let w: Vec<i64> = dst.iter().map(|d| d * 10).collect();
    let t1: Vec<i64> = dst.iter().map(|d| d * 100).collect();
    let t2: Vec<i64> = dst.iter().map(|d| d * 1000).collect();
    let edges = EdgeList::new(&src, &dst, &w)
        .with_time_first(&t1)
        .with_time_recent(&t2);
    let g: StreamingGraph<3> = edge_list_to_graph(&GraphConfig::with_vertices(50), 50, &edges).unwrap();

    let snap = to_sorted_csr(&g, 50, CsrFields::ALL).unwrap();
    assert!(snap.sorted);
    for v in 0..snap.nv() {
        let r = snap.row(v);
        let ind = &snap.ind[r.clone()];
        assert!(ind.windows(2).all(|p| p[0] <= p[1]), "row {v} not sorted");
        for k in r {
            let d = snap.ind[k];
            assert_eq!(snap.weight.as_ref().unwrap()[k], d * 10);
            assert_eq!(snap.time_first.as_ref().unwrap()[k], d * 100);
            assert_eq!(snap.time_recent.as_ref().unwrap()[k], d * 1000);
        }
    }
}

#[test]
fn degree_zero_vertices_produce_empty_rows() {
    let g: Graph = edge_list_to_graph(
        &GraphConfig::with_vertices(6),
        6,
        &EdgeList::new(&[4], &[1], &[1]),
    )
    .unwrap();
    let snap = to_unsorted_csr(&g, 6, CsrFields::NONE).unwrap();
    assert_eq!(snap.offsets, vec![0, 0, 0, 0, 0, 1, 1]);
    assert_eq!(snap.ind, vec![1]);
    for v in [0, 1, 2, 3, 5] {
        assert_eq!(snap.degree(v), 0);
    }
}

#[test]
fn missing_timestamps_take_the_default() {
    let config = GraphConfig {
        default_timestamp: 77,
        ..GraphConfig::with_vertices(2)
    };
    let g: Graph = edge_list_to_graph(&config, 2, &EdgeList::new(&[0], &[1], &[9])).unwrap();
    let e = g.find_edge(0, 0, 1).unwrap();
    assert_eq!((e.weight, e.time_first, e.time_recent), (9, 77, 77));

    let csr = edge_list_to_csr(2, &EdgeList::new(&[0], &[1], &[9]), -3).unwrap();
    assert_eq!(csr.time_recent, Some(vec![-3]));
}

#[test]
fn snapshot_survives_json() {
    let g = worked_example();
    let snap = to_sorted_csr(&g, 3, CsrFields::ALL).unwrap();
    let json = serde_json::to_string(&snap).unwrap();
    let back: blockgraph::CsrSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snap);
    assert!(back.has_edge(0, 2));
    assert!(!back.has_edge(2, 0));
}

#[test]
fn extraction_after_incremental_updates() {
    let g = worked_example();
    g.insert_edge(0, 2, 1, 4, 200).unwrap();
    g.remove_edge(0, 0, 1).unwrap();
    let snap = to_sorted_csr(&g, 3, CsrFields::NONE).unwrap();
    assert_eq!(snap.offsets, vec![0, 1, 2, 3]);
    assert_eq!(snap.ind, vec![2, 0, 1]);
}
