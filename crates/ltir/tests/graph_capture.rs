use std::sync::Arc;
use std::thread;

use ltir::node::Node;
use ltir::ops::{Expand, Narrow, Permute, Split, Squeeze, View};
use ltir::{
    ComputationCache, Dimension, Graph, GraphConfig, IrError, NodeContext, Shape, Value,
};

/// `x[2, 3, 4] -> permute(0, 2, 1) -> narrow(1, 1, 2) -> view(-1, 3)`.
fn capture_block(graph: &mut Graph, handle: u64) -> anyhow::Result<Value> {
    let x = graph.device_data(handle, Shape::from_static(&[2, 3, 4]))?;
    capture_block_on(graph, x)
}

fn capture_block_on(graph: &mut Graph, x: Value) -> anyhow::Result<Value> {
    let p = graph.permute(x, &[0, 2, 1])?;
    let n = graph.narrow(p, 1, 1, 2)?;
    let v = graph.view(n, &[-1, 3])?;
    Ok(v)
}

#[test]
fn equal_captures_share_signature_across_arenas() -> anyhow::Result<()> {
    let mut first = Graph::default();
    let a = capture_block(&mut first, 0)?;

    let mut second = Graph::default();
    second.device_data(99, Shape::from_static(&[8]))?;
    let b = capture_block(&mut second, 0)?;

    assert_ne!(a.node, b.node);
    assert_eq!(first.signature(&[a])?, second.signature(&[b])?);
    assert_eq!(first.describe(&[a])?, second.describe(&[b])?);
    Ok(())
}

#[test]
fn signature_ignores_data_handles_but_not_parameters() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let base = capture_block(&mut graph, 0)?;
    let fresh_data = capture_block(&mut graph, 1)?;
    assert_ne!(base, fresh_data, "different handles stay distinct nodes");

    let x = graph.device_data(0, Shape::from_static(&[2, 3, 4]))?;
    let p = graph.permute(x, &[1, 0, 2])?;
    let other_dims = graph.view(p, &[-1, 4])?;

    let y = graph.device_data(0, Shape::from_static(&[3, 2, 4]))?;
    let other_shape = capture_block_on(&mut graph, y)?;

    let signature = graph.signature(&[base])?;
    assert_eq!(signature, graph.signature(&[fresh_data])?);
    assert_ne!(signature, graph.signature(&[other_dims])?);
    assert_ne!(signature, graph.signature(&[other_shape])?);
    Ok(())
}

#[test]
fn signature_tracks_shared_leaves() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = graph.device_data(0, Shape::from_static(&[2, 2]))?;
    let y = graph.device_data(1, Shape::from_static(&[2, 2]))?;
    let split_x = graph.split(x, 1, 0)?;
    let split_y = graph.split(y, 1, 0)?;

    // Two roots over one leaf versus two roots over two leaves.
    let shared = graph.signature(&[split_x[0], split_x[1]])?;
    let separate = graph.signature(&[split_x[0], split_y[1]])?;
    assert_ne!(shared, separate);
    Ok(())
}

#[test]
fn nodes_built_for_another_graph_are_rejected() -> anyhow::Result<()> {
    let mut first = Graph::default();
    let x = first.device_data(0, Shape::from_static(&[2, 3, 4]))?;
    let node = Permute::new(&first, x, ltir::dims![0, 2, 1])?;

    let mut second = Graph::default();
    second.device_data(0, Shape::from_static(&[7]))?;
    let err = second.add(node.clone()).unwrap_err();
    assert!(err.is_unknown_operand(), "{err}");
    assert_eq!(second.len(), 1);

    let mut twin = Graph::default();
    twin.device_data(0, Shape::from_static(&[2, 3, 4]))?;
    let id = twin.add(node)?;
    assert_eq!(twin.shape_of(Value::from(id))?, &Shape::from_static(&[2, 4, 3]));
    Ok(())
}

#[test]
fn recapture_reuses_every_node() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let first = capture_block(&mut graph, 0)?;
    let len = graph.len();
    let second = capture_block(&mut graph, 0)?;
    assert_eq!(first, second);
    assert_eq!(graph.len(), len);
    assert_eq!(graph.reused_count(), len);
    Ok(())
}

#[test]
fn dynamic_batch_propagates_through_view_family() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let batch = Dimension::dynamic("B");
    let x = graph.device_data(
        0,
        Shape::new(vec![batch.clone(), Dimension::Static(1), Dimension::Static(4)]),
    )?;
    let p = graph.permute(x, &[2, 0, 1])?;
    assert_eq!(graph.shape_of(p)?.dims()[1], batch);

    let e = graph.expand(p, &[-1, -1, 6])?;
    assert_eq!(
        graph.shape_of(e)?,
        &Shape::new(vec![Dimension::Static(4), batch.clone(), Dimension::Static(6)])
    );

    let s = graph.squeeze(x, None)?;
    assert_eq!(graph.shape_of(s)?.dims(), &[batch.clone(), Dimension::Static(4)]);

    let t = graph.transpose(s, 0, -1)?;
    assert_eq!(graph.shape_of(t)?.dims(), &[Dimension::Static(4), batch]);

    let err = graph.view(t, &[-1]).unwrap_err();
    assert!(err.is_invalid_argument(), "{err}");
    Ok(())
}

#[test]
fn split_results_are_addressable_operands() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = graph.device_data(0, Shape::from_static(&[7, 2]))?;
    let parts = graph.split(x, 3, 0)?;
    assert_eq!(parts.len(), 3);
    assert_eq!(graph.node_as::<Split>(parts[0])?.num_outputs(), 3);

    let last = graph.permute(parts[2], &[1, 0])?;
    assert_eq!(graph.shape_of(last)?, &Shape::from_static(&[2, 1]));

    let first = graph.permute(parts[0], &[1, 0])?;
    assert_ne!(
        graph.get(first.node).unwrap().hash(),
        graph.get(last.node).unwrap().hash(),
        "result index must feed the hash"
    );

    let err = graph.permute(Value::new(parts[0].node, 3), &[1, 0]).unwrap_err();
    assert!(matches!(err, IrError::UnknownOperand { index: 3, .. }), "{err}");
    Ok(())
}

#[test]
fn typed_accessors_survive_the_arena() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = graph.device_data(0, Shape::from_static(&[1, 3, 1]))?;
    let e = graph.expand(x, &[2, -1, 3])?;
    let n = graph.narrow(e, -2, 0, 2)?;
    let sq = graph.squeeze(x, Some(0))?;
    let v = graph.view(x, &[3])?;
    let p = graph.permute(x, &[-1, 0, 1])?;

    assert_eq!(graph.node_as::<Expand>(e)?.size(), &[2, -1, 3]);
    let narrow = graph.node_as::<Narrow>(n)?;
    assert_eq!((narrow.dim(), narrow.start(), narrow.length()), (1, 0, 2));
    assert_eq!(graph.node_as::<Squeeze>(sq)?.dim(), Some(0));
    assert_eq!(graph.node_as::<View>(v)?.size(), &[3]);
    assert_eq!(graph.node_as::<Permute>(p)?.dims(), &[2, 0, 1]);
    Ok(())
}

#[test]
fn computation_cache_is_shared_between_threads() -> anyhow::Result<()> {
    let mut graph = Graph::new(GraphConfig {
        cache_capacity: 8,
        ..GraphConfig::default()
    });
    let root = capture_block(&mut graph, 0)?;
    let signature = graph.signature(&[root])?;
    let text = graph.to_text(&[root])?;

    let cache = Arc::new(ComputationCache::<String>::from_config(graph.config()));
    let handles = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let text = text.clone();
            thread::spawn(move || {
                cache
                    .get_or_try_insert_with(signature, || Ok::<_, IrError>(text))
                    .map(|compiled| compiled.len())
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        let len = handle.join().expect("cache worker panicked")?;
        assert_eq!(len, text.len());
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.capacity(), 8);
    Ok(())
}
