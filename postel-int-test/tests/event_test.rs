use postel::topology::{
    NodeId, RenderHandle, TopologyEngine, TopologyEventInfo, TopologyEventListener, TopologyEvents,
};
use postel_int_test::test_util::{cleanup, create_small_plane_context, run_test, wait_for};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

fn recording_listener() -> (TopologyEventListener, Arc<Mutex<Vec<TopologyEventInfo>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener = TopologyEventListener::new(move |info: TopologyEventInfo| {
        sink.lock().unwrap().push(info);
        Ok(())
    });
    (listener, events)
}

#[test]
fn test_add_event() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let (listener, events) = recording_listener();
            engine.subscribe(listener)?;

            let id = engine.add(12.0, 34.0)?;
            wait_for(1000, || !events.lock().unwrap().is_empty());

            let events = events.lock().unwrap();
            assert_eq!(events[0].event(), TopologyEvents::NodeAdded);
            let node = events[0].node().unwrap();
            assert_eq!((node.id, node.x, node.y), (id, 12.0, 34.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_event_carries_render_handle() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let (listener, events) = recording_listener();
            engine.subscribe(listener)?;

            let id = engine.add(5.0, 5.0)?;
            engine.attach_render_handle(id, RenderHandle::new(0xbeef))?;
            engine.remove(id)?;

            wait_for(1000, || {
                events
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|e| e.event() == TopologyEvents::NodeRemoved)
            });

            let events = events.lock().unwrap();
            let removed = events
                .iter()
                .find(|e| e.event() == TopologyEvents::NodeRemoved)
                .unwrap();
            assert_eq!(removed.node().map(|n| n.id), Some(id));
            assert_eq!(removed.render_handle(), Some(RenderHandle::new(0xbeef)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_listener_may_call_back_into_engine() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let observed = Arc::new(Mutex::new(None));

            let handle = engine.downgrade();
            let sink = observed.clone();
            engine.subscribe(TopologyEventListener::new(move |info: TopologyEventInfo| {
                if let (Some(node), Some(engine)) = (info.node(), handle.upgrade()) {
                    if info.event() == TopologyEvents::NodeAdded {
                        *sink.lock().unwrap() = Some(engine.get(node.id)?.x);
                    }
                }
                Ok(())
            }))?;

            engine.add(7.0, 8.0)?;
            wait_for(1000, || observed.lock().unwrap().is_some());
            assert_eq!(*observed.lock().unwrap(), Some(7.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unsubscribed_listener_sees_nothing() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let (listener, events) = recording_listener();
            let subscriber = engine.subscribe(listener)?;
            engine.unsubscribe(subscriber)?;

            engine.add(1.0, 1.0)?;
            assert!(events.lock().unwrap().is_empty());
            assert_eq!(engine.list()[0].id, NodeId::new(1));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_listener_with_weak_handle_allows_drop_teardown() {
    let removed = Arc::new(AtomicUsize::new(0));
    let seen = removed.clone();
    {
        let engine = TopologyEngine::builder().plane_size(64, 64).build().unwrap();
        let handle = engine.downgrade();
        engine
            .subscribe(TopologyEventListener::new(move |info: TopologyEventInfo| {
                if info.event() == TopologyEvents::NodeAdded {
                    if let Some(engine) = handle.upgrade() {
                        engine.len();
                    }
                } else if info.event() == TopologyEvents::NodeRemoved {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }))
            .unwrap();
        engine.add(1.0, 1.0).unwrap();
        engine.add(2.0, 2.0).unwrap();
    }
    wait_for(1000, || removed.load(Ordering::SeqCst) == 2);
    assert_eq!(removed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_removal_never_announced_before_addition() {
    run_test(
        create_small_plane_context,
        |ctx| {
            let engine = ctx.engine();
            let history: Arc<Mutex<HashMap<NodeId, Vec<TopologyEvents>>>> = Arc::default();
            let sink = history.clone();
            engine.subscribe(TopologyEventListener::new(move |info: TopologyEventInfo| {
                if let Some(node) = info.node() {
                    sink.lock().unwrap().entry(node.id).or_default().push(info.event());
                }
                Ok(())
            }))?;

            let adds = 4000;
            let adder = {
                let engine = engine.clone();
                thread::spawn(move || {
                    for i in 0..adds {
                        engine.add((i % 64) as f64, (i / 64 % 64) as f64).unwrap();
                    }
                })
            };
            let remover = {
                let engine = engine.clone();
                thread::spawn(move || {
                    let mut removed = 0;
                    while removed < adds {
                        if let Some(last) = engine.list().last() {
                            if engine.remove(last.id).is_ok() {
                                removed += 1;
                            }
                        }
                    }
                })
            };
            adder.join().unwrap();
            remover.join().unwrap();

            let history = history.lock().unwrap();
            assert_eq!(history.len(), adds);
            let inverted: Vec<_> = history
                .iter()
                .filter(|(_, events)| events.first() != Some(&TopologyEvents::NodeAdded))
                .collect();
            assert!(inverted.is_empty(), "inverted: {:?}", inverted);
            Ok(())
        },
        cleanup,
    )
}
