use std::sync::Arc;
use std::thread;

use blockgraph::{
    Batch, CsrFields, EdgeDeletion, EdgeInsertion, Error, GraphConfig, RandomEdgeGenerator,
    SharedGraph,
};

fn shared(nv: usize) -> SharedGraph<4> {
    SharedGraph::with_config(GraphConfig {
        max_vertices: nv,
        edge_types: 2,
        max_blocks: 1 << 14,
        workers: Some(4),
        ..GraphConfig::default()
    })
    .unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ins(source: i64, destination: i64, time: i64) -> EdgeInsertion {
    EdgeInsertion {
        source,
        destination,
        weight: 1,
        time,
    }
}

#[test]
fn generated_stream_is_symmetric() {
    init_tracing();
    let g = shared(64);
    let mut batches = 0;
    let mut last_keep_alive = true;
    for batch in RandomEdgeGenerator::new(7, 64, 100).with_batches(5) {
        let outcome = g.apply(&batch).unwrap();
        last_keep_alive = outcome.keep_alive;
        batches += 1;
    }
    assert_eq!(batches, 6);
    assert!(!last_keep_alive);
    assert_eq!(g.batches_applied(), 6);

    let snap = g.snapshot(CsrFields::NONE, true);
    for u in 0..snap.nv() {
        for &v in snap.neighbors(u) {
            assert!(snap.has_edge(v as usize, u as i64), "{u} -> {v} has no reverse");
        }
    }
}

#[test]
fn grouped_application_matches_sequential_semantics() {
    init_tracing();
    // The same source appears many times; its actions must land in batch order.
    let g = shared(16);
    let mut batch = Batch::new(1);
    for t in 0..40 {
        batch.insertions.push(ins(3, t % 8, t));
        batch.insertions.push(ins(t % 5, 9, t));
    }
    batch.deletions.push(EdgeDeletion {
        source: 3,
        destination: 2,
    });
    batch.deletions.push(EdgeDeletion {
        source: 3,
        destination: 15,
    });

    let outcome = g.apply(&batch).unwrap();
    assert_eq!(outcome.inserted, 8 + 5);
    assert_eq!(outcome.updated, 80 - 13);
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.missing, 1);

    let graph = g.read();
    assert!(graph.find_edge(1, 3, 2).is_none());
    let e = graph.find_edge(1, 3, 7).unwrap();
    // Destination 7 is hit at t = 7, 15, 23, 31, 39.
    assert_eq!((e.time_first, e.time_recent), (7, 39));
    assert_eq!(graph.out_degree(3), 8);
    assert_eq!(graph.in_degree(9), 5);
}

#[test]
fn rejected_batches_leave_the_graph_untouched() {
    let g = shared(8);
    let mut bad = Batch::new(0);
    bad.insertions.push(ins(1, 2, 1));
    bad.insertions.push(ins(1, 8, 1));
    assert!(matches!(g.apply(&bad), Err(Error::VertexOutOfRange { .. })));
    assert!(matches!(
        g.apply(&Batch::new(2)),
        Err(Error::EdgeTypeOutOfRange { .. })
    ));
    assert!(g.read().find_edge(0, 1, 2).is_none());
    assert_eq!(g.read().ne(), 0);
}

#[test]
fn readers_see_whole_batches() {
    let g = Arc::new(shared(32));
    let writer = {
        let g = Arc::clone(&g);
        thread::spawn(move || {
            for k in 0..50i64 {
                // Each batch adds one undirected pair and the same pair the other way, so
                // every consistent snapshot has an even edge count.
                let mut batch = Batch::new(0);
                batch.make_undirected = true;
                batch.insertions.push(ins(k % 32, (k * 7 + 1) % 32, k));
                g.apply(&batch).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let g = Arc::clone(&g);
            thread::spawn(move || {
                for _ in 0..50 {
                    let snap = g.snapshot(CsrFields::ALL, false);
                    let self_loops = (0..snap.nv())
                        .filter(|&u| snap.has_edge(u, u as i64))
                        .count();
                    assert_eq!((snap.ne() - self_loops) % 2, 0);
                }
            })
        })
        .collect();
    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(g.batches_applied(), 50);
}

#[test]
fn batches_travel_as_json() {
    let mut batch = Batch::new(1);
    batch.make_undirected = true;
    batch.insertions.push(ins(0, 1, 10));
    let wire = batch.to_json_string().unwrap();
    let back = Batch::from_json_str(&wire).unwrap();
    assert_eq!(back, batch);

    let g = shared(4);
    let outcome = g.apply(&back).unwrap();
    assert_eq!(outcome.inserted, 2);
    assert!(outcome.keep_alive);
}
