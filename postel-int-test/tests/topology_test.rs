use postel::errors::ErrorKind;
use postel::topology::{NodeId, TopologyEngine};
use postel_int_test::test_util::{cleanup, create_small_plane_context, create_test_context, run_test};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_get_returns_added_coordinates() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = ctx.engine();
            let points = [(0.0, 0.0), (2047.5, 1.0), (1024.25, 512.75), (3.0, 2047.0)];
            let mut ids = Vec::new();
            for (x, y) in points {
                ids.push(engine.add(x, y)?);
            }

            let mut unique = ids.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), ids.len());

            for (id, (x, y)) in ids.iter().zip(points) {
                let node = engine.get(*id)?;
                assert_eq!((node.x, node.y), (x, y));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_closest_node_scenario() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let id1 = engine.add(10.0, 10.0)?;
            let id2 = engine.add(90.0, 90.0)?;
            let id3 = engine.add(50.0, 50.0)?;
            assert_eq!((id1, id2, id3), (NodeId::new(1), NodeId::new(2), NodeId::new(3)));

            assert_eq!(engine.nearest(48.0, 48.0)?.id, id3);
            engine.remove(id3)?;
            assert_eq!(engine.nearest(48.0, 48.0)?.id, id1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_out_of_bounds_scenario() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let err = engine.add(-1.0, 5.0).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
            assert_eq!(engine.len(), 0);

            engine.add(50.0, 50.0)?;
            for (x, y) in [(100.0, 0.0), (0.0, 100.0), (-0.1, -0.1), (1e9, 1.0)] {
                assert_eq!(engine.add(x, y).unwrap_err().kind(), &ErrorKind::OutOfBounds);
            }
            assert_eq!(engine.len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sequential_adds_and_removes() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = ctx.engine();
            let mut ids = Vec::new();
            for i in 0..1000 {
                ids.push(engine.add((i % 2048) as f64, ((i * 37) % 2048) as f64)?);
            }
            assert_eq!(engine.list().len(), 1000);

            for id in &ids {
                engine.remove(*id)?;
            }
            assert!(engine.is_empty());
            assert_eq!(engine.nearest(0.0, 0.0).unwrap_err().kind(), &ErrorKind::Empty);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_is_idempotent_in_effect() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let keep = engine.add(1.0, 1.0)?;
            let gone = engine.add(2.0, 2.0)?;
            engine.remove(gone)?;
            assert_eq!(engine.remove(gone).unwrap_err().kind(), &ErrorKind::NotFound);
            assert_eq!(engine.get(gone).unwrap_err().kind(), &ErrorKind::NotFound);

            let listed: Vec<NodeId> = engine.list().iter().map(|v| v.id).collect();
            assert_eq!(listed, vec![keep]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_list_follows_insertion_order() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let a = engine.add(90.0, 1.0)?;
            let b = engine.add(1.0, 90.0)?;
            let c = engine.add(45.0, 45.0)?;
            let d = engine.add(10.0, 10.0)?;
            engine.remove(b)?;

            let listed: Vec<NodeId> = engine.list().iter().map(|v| v.id).collect();
            assert_eq!(listed, vec![a, c, d]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_tree_links_alternate_axes() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let ids: Vec<NodeId> = [(50.0, 50.0), (20.0, 30.0), (80.0, 70.0), (10.0, 20.0), (30.0, 10.0)]
                .iter()
                .map(|(x, y)| engine.add(*x, *y))
                .collect::<Result<_, _>>()?;

            for id in &ids {
                let node = engine.get(*id)?;
                assert_eq!(node.tree.axis as usize, node.tree.depth % 2);
                if let Some(parent) = node.tree.parent {
                    let parent = engine.get(parent)?;
                    assert_eq!(parent.tree.axis, 1 - node.tree.axis);
                    assert!(parent.tree.left == Some(*id) || parent.tree.right == Some(*id));
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_origin_offset_configuration() {
    run_test(
        || {
            Ok(postel_int_test::test_util::TestContext::new(
                TopologyEngine::builder()
                    .plane_size(100, 100)
                    .origin(25.0)
                    .build()?,
            ))
        },
        |ctx| {
            let engine = ctx.engine();
            assert!(engine.add(-25.0, -25.0).is_ok());
            assert!(engine.add(74.0, 74.0).is_ok());
            assert_eq!(engine.add(75.0, 0.0).unwrap_err().kind(), &ErrorKind::OutOfBounds);
            assert_eq!(engine.add(-26.0, 0.0).unwrap_err().kind(), &ErrorKind::OutOfBounds);

            let plane = engine.config().plane();
            assert_eq!(plane.canvas_point(-25.0, 0.0), (0.0, 25.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let err = TopologyEngine::builder().plane_size(0, 0).build().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration);

    let err = TopologyEngine::builder().origin(f64::NAN).build().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration);
}
