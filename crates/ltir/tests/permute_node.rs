use ltir::dims;
use ltir::node::Node;
use ltir::ops::{Dims, Permute};
use ltir::{Graph, IrError, Shape, Value};
use proptest::prelude::*;

fn operand(graph: &mut Graph, dims: &[usize]) -> Value {
    graph
        .device_data(0, Shape::from_static(dims))
        .expect("device data should always build")
}

#[test]
fn permute_three_axes() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3, 4]);
    let node = Permute::new(&graph, x, dims![0, 2, 1])?;
    assert_eq!(node.shape(), &Shape::from_static(&[2, 4, 3]));
    assert_eq!(node.kind(), &Permute::class_op_kind());
    assert_eq!(node.operands(), &[x]);
    Ok(())
}

#[test]
fn permute_as_transpose() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[5, 6]);
    let node = Permute::new(&graph, x, dims![1, 0])?;
    assert_eq!(node.shape(), &Shape::from_static(&[6, 5]));
    Ok(())
}

#[test]
fn wrong_length_is_invalid_argument() {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3, 4]);
    let err = Permute::new(&graph, x, dims![0, 1]).unwrap_err();
    assert!(
        matches!(err, IrError::InvalidArgument { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn repeated_index_is_invalid_argument() {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3]);
    let err = Permute::new(&graph, x, dims![0, 0]).unwrap_err();
    assert!(
        matches!(err, IrError::InvalidArgument { .. }),
        "unexpected error: {err}"
    );
    assert_eq!(graph.len(), 1, "failed construction must not touch the graph");
}

#[test]
fn out_of_range_result_index_is_unknown_operand() {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3]);
    let err = Permute::new(&graph, Value::new(x.node, 1), dims![1, 0]).unwrap_err();
    assert!(
        matches!(err, IrError::UnknownOperand { index: 1, .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn same_operand_and_dims_are_identical() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3, 4]);
    let a = Permute::new(&graph, x, dims![2, 0, 1])?;
    let b = Permute::new(&graph, x, dims![2, 0, 1])?;
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.to_string(), b.to_string());
    assert!(ltir::node::structurally_equal(&a, &b));
    Ok(())
}

#[test]
fn different_dims_are_distinguished() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = operand(&mut graph, &[2, 3, 4]);
    let a = Permute::new(&graph, x, dims![0, 2, 1])?;
    let b = Permute::new(&graph, x, dims![1, 0, 2])?;
    assert_ne!(a.to_string(), b.to_string());
    assert_ne!(a.hash(), b.hash());
    assert!(!ltir::node::structurally_equal(&a, &b));
    Ok(())
}

#[test]
fn hash_depends_on_operand_chain() -> anyhow::Result<()> {
    let mut graph = Graph::default();
    let x = graph.device_data(0, Shape::from_static(&[2, 3]))?;
    let y = graph.device_data(1, Shape::from_static(&[2, 3]))?;
    let px = Permute::new(&graph, x, dims![1, 0])?;
    let py = Permute::new(&graph, y, dims![1, 0])?;
    assert_eq!(px.to_string(), py.to_string());
    assert_ne!(px.hash(), py.hash());
    Ok(())
}

#[test]
fn hash_is_independent_of_arena_position() -> anyhow::Result<()> {
    let mut first = Graph::default();
    let a = first.device_data(0, Shape::from_static(&[4, 5]))?;

    let mut second = Graph::default();
    second.device_data(7, Shape::from_static(&[1]))?;
    let b = second.device_data(0, Shape::from_static(&[4, 5]))?;
    assert_ne!(a.node, b.node);

    let pa = Permute::new(&first, a, dims![1, 0])?;
    let pb = Permute::new(&second, b, dims![1, 0])?;
    assert_eq!(pa.hash(), pb.hash());
    Ok(())
}

fn shape_and_permutation() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    prop::collection::vec(1usize..8, 0..6).prop_flat_map(|dims| {
        let identity = (0..dims.len()).collect::<Vec<_>>();
        (Just(dims), Just(identity).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn permuted_shape_follows_dims((dims, perm) in shape_and_permutation()) {
        let mut graph = Graph::default();
        let x = operand(&mut graph, &dims);
        let node = Permute::new(&graph, x, Dims::from(perm.as_slice())).unwrap();
        prop_assert_eq!(node.shape().rank(), dims.len());
        for (axis, &source) in perm.iter().enumerate() {
            prop_assert_eq!(node.shape().dims()[axis].as_static(), Some(dims[source]));
        }
    }

    #[test]
    fn accessors_do_not_drift((dims, perm) in shape_and_permutation()) {
        let mut graph = Graph::default();
        let x = operand(&mut graph, &dims);
        let node = Permute::new(&graph, x, Dims::from(perm.as_slice())).unwrap();
        let (shape, hash, text) = (node.shape().clone(), node.hash(), node.to_string());
        for _ in 0..3 {
            prop_assert_eq!(node.shape(), &shape);
            prop_assert_eq!(node.hash(), hash);
            prop_assert_eq!(node.dims(), perm.as_slice());
            prop_assert_eq!(node.to_string(), text.clone());
        }
    }

    #[test]
    fn non_permutations_never_build(
        dims in prop::collection::vec(1usize..5, 1..5),
        perm in prop::collection::vec(0usize..6, 0..6),
    ) {
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        let is_permutation = sorted == (0..dims.len()).collect::<Vec<_>>();
        let mut graph = Graph::default();
        let x = operand(&mut graph, &dims);
        let result = Permute::new(&graph, x, Dims::from(perm.as_slice()));
        if is_permutation {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid_argument = matches!(result, Err(IrError::InvalidArgument { .. }));
            prop_assert!(is_invalid_argument);
        }
    }
}
