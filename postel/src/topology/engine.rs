use parking_lot::Mutex;
use postel_spatial::{IntegrityReport, KdTree};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use crate::common::{PostelEventBus, SubscriberRef};
use crate::errors::{ErrorKind, PostelError, PostelResult};
use crate::postel_builder::TopologyBuilder;
use crate::postel_config::PostelConfig;
use crate::topology::{
    IdAllocator, Node, NodeId, NodeRecord, NodeRegistry, NodeView, RenderHandle,
    TopologyEventInfo, TopologyEventListener, TopologyEvents,
};

/// Thread-safe registry of point nodes on a bounded plane.
///
/// The engine owns a node registry and a k-d tree over the same ids and keeps
/// them in lock-step behind a single mutex that every public operation takes
/// internally. Callers never lock. Clones share the same topology.
///
/// Listeners registered with [`TopologyEngine::subscribe`] are told about
/// added and removed nodes in the order the changes were committed, after
/// the lock has been released. A listener may call back into the engine
/// through a [`WeakTopologyEngine`]; a strong clone captured by a listener
/// keeps the engine alive and its drop teardown never runs.
///
/// The index is never rebalanced. Sorted insertion orders degrade the tree
/// to a chain and queries to linear time.
///
/// # Examples
///
/// ```rust
/// use postel::topology::TopologyEngine;
///
/// let engine = TopologyEngine::builder().plane_size(100, 100).build()?;
/// let a = engine.add(10.0, 10.0)?;
/// let b = engine.add(90.0, 90.0)?;
/// assert_eq!(engine.nearest(20.0, 15.0)?.id, a);
///
/// engine.remove(a)?;
/// assert_eq!(engine.nearest(20.0, 15.0)?.id, b);
/// # Ok::<(), postel::errors::PostelError>(())
/// ```
#[derive(Clone)]
pub struct TopologyEngine {
    inner: Arc<TopologyInner>,
}

impl TopologyEngine {
    /// Returns a builder for configuring a new engine.
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::new()
    }

    pub(crate) fn new(config: PostelConfig) -> Self {
        TopologyEngine {
            inner: Arc::new(TopologyInner::new(config)),
        }
    }

    /// Returns a handle that does not keep the engine alive.
    pub fn downgrade(&self) -> WeakTopologyEngine {
        WeakTopologyEngine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Places a new node at `(x, y)` and returns its id.
    ///
    /// # Errors
    ///
    /// * `EngineShuttingDown` once [`TopologyEngine::shutdown`] has started.
    /// * `OutOfBounds` if the shifted coordinate lies outside the plane.
    /// * `IdentitySpaceExhausted` when no ids are left.
    pub fn add(&self, x: f64, y: f64) -> PostelResult<NodeId> {
        self.inner.add(x, y)
    }

    /// Removes a node and announces its render handle to listeners.
    pub fn remove(&self, id: NodeId) -> PostelResult<()> {
        self.inner.remove(id)
    }

    /// Returns the full record of a node, including its tree links.
    pub fn get(&self, id: NodeId) -> PostelResult<Node> {
        self.inner.get(id)
    }

    /// Lists all live nodes in insertion order.
    pub fn list(&self) -> Vec<NodeView> {
        self.inner.list()
    }

    /// Returns the live node closest to `(x, y)`.
    ///
    /// The query point itself may lie outside the plane but must be finite.
    ///
    /// # Errors
    ///
    /// `Empty` when no nodes are live, `OutOfBounds` for NaN or infinite
    /// query coordinates.
    pub fn nearest(&self, x: f64, y: f64) -> PostelResult<NodeView> {
        self.inner.nearest(x, y)
    }

    /// Returns up to `k` nodes closest to `(x, y)` with their distances,
    /// nearest first.
    pub fn nearest_k(&self, x: f64, y: f64, k: usize) -> PostelResult<Vec<(NodeView, f64)>> {
        self.inner.nearest_k(x, y, k)
    }

    /// Returns every node within `distance` of `(x, y)`, nearest first.
    /// A negative or NaN distance matches nothing.
    pub fn within_distance(
        &self,
        x: f64,
        y: f64,
        distance: f64,
    ) -> PostelResult<Vec<(NodeView, f64)>> {
        self.inner.within_distance(x, y, distance)
    }

    /// Records the renderer's handle for a node and returns the one it
    /// replaces.
    pub fn attach_render_handle(
        &self,
        id: NodeId,
        handle: RenderHandle,
    ) -> PostelResult<Option<RenderHandle>> {
        self.inner.attach_render_handle(id, handle)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> PostelConfig {
        self.inner.config.clone()
    }

    /// Verifies the k-d tree invariants and that every registered node is
    /// indexed at its own coordinates and nothing else is.
    pub fn check_integrity(&self) -> IntegrityReport {
        self.inner.check_integrity()
    }

    /// Registers a listener for topology events.
    ///
    /// Events reach listeners on whichever mutating thread is delivering at
    /// the time, so a listener must not block on another mutation finishing.
    /// Fails with `EngineShuttingDown` once shutdown has started.
    pub fn subscribe(&self, listener: TopologyEventListener) -> PostelResult<SubscriberRef> {
        self.inner.state.lock().ensure_running()?;
        let subscriber = self.inner.event_bus.register(listener)?;

        // shutdown may have released the listeners in between
        if let Err(e) = self.inner.state.lock().ensure_running() {
            if let Err(cause) = self.inner.event_bus.deregister(subscriber) {
                log::debug!("Listener was already released: {}", cause);
            }
            return Err(e);
        }
        Ok(subscriber)
    }

    pub fn unsubscribe(&self, subscriber: SubscriberRef) -> PostelResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    /// Drains every node and rejects further mutations. Idempotent.
    ///
    /// Operations already holding the lock finish first. Listeners then
    /// receive one `NodeRemoved` per drained node followed by `Shutdown`,
    /// after which they are released.
    pub fn shutdown(&self) -> PostelResult<()> {
        self.inner.shutdown();
        Ok(())
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.state.lock().shut_down
    }
}

impl Debug for TopologyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("TopologyEngine")
            .field("nodes", &state.registry.len())
            .field("height", &state.index.height())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

/// Non-owning handle to a [`TopologyEngine`], for listeners that call back
/// into the engine they observe.
#[derive(Clone)]
pub struct WeakTopologyEngine {
    inner: Weak<TopologyInner>,
}

impl WeakTopologyEngine {
    /// Returns the engine, or `None` once its last strong handle is gone.
    pub fn upgrade(&self) -> Option<TopologyEngine> {
        self.inner.upgrade().map(|inner| TopologyEngine { inner })
    }
}

impl Debug for WeakTopologyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakTopologyEngine")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

struct TopologyState {
    registry: NodeRegistry,
    index: KdTree<NodeId>,
    allocator: IdAllocator,
    shut_down: bool,
    // sequence number of the next committed event
    next_event: u64,
}

impl TopologyState {
    fn ensure_running(&self) -> PostelResult<()> {
        if self.shut_down {
            log::warn!("Rejected mutation, topology engine is shutting down");
            return Err(PostelError::new(
                "Topology engine is shutting down",
                ErrorKind::EngineShuttingDown,
            ));
        }
        Ok(())
    }

    fn view_of(&self, id: NodeId) -> PostelResult<NodeView> {
        match self.registry.get(id) {
            Ok(record) => Ok(record.view()),
            Err(e) => Err(diverged(id, e)),
        }
    }

    /// Numbers events in commit order. Must be called with the lock held and
    /// only for changes that were committed.
    fn stamp(&mut self, events: Vec<TopologyEventInfo>) -> Vec<(u64, TopologyEventInfo)> {
        events
            .into_iter()
            .map(|info| {
                let seq = self.next_event;
                self.next_event += 1;
                (seq, info)
            })
            .collect()
    }
}

/// Stamped events waiting for delivery.
///
/// Whichever thread finds nobody draining becomes the drainer and hands
/// events to the bus strictly by sequence number, stopping at the first gap.
/// The thread that owns the missing number fills the gap and drains on.
#[derive(Default)]
struct EventQueue {
    next_delivery: u64,
    pending: BTreeMap<u64, TopologyEventInfo>,
    draining: bool,
}

struct TopologyInner {
    config: PostelConfig,
    state: Mutex<TopologyState>,
    queue: Mutex<EventQueue>,
    event_bus: PostelEventBus<TopologyEventInfo, TopologyEventListener>,
}

impl TopologyInner {
    fn new(config: PostelConfig) -> Self {
        TopologyInner {
            config,
            state: Mutex::new(TopologyState {
                registry: NodeRegistry::new(),
                index: KdTree::new(),
                allocator: IdAllocator::new(),
                shut_down: false,
                next_event: 0,
            }),
            queue: Mutex::new(EventQueue::default()),
            event_bus: PostelEventBus::new(),
        }
    }

    fn add(&self, x: f64, y: f64) -> PostelResult<NodeId> {
        // configuration before topology
        let plane = self.config.plane();

        let (view, events) = {
            let mut state = self.state.lock();
            state.ensure_running()?;

            if !plane.contains(x, y) {
                log::warn!(
                    "Rejected node at ({}, {}), outside the {}x{} plane",
                    x,
                    y,
                    plane.width,
                    plane.height
                );
                return Err(PostelError::new(
                    &format!(
                        "Coordinate ({}, {}) is outside the {}x{} plane",
                        x, y, plane.width, plane.height
                    ),
                    ErrorKind::OutOfBounds,
                ));
            }

            let id = state.allocator.next_id()?;
            let record = NodeRecord::new(id, x, y);
            let view = record.view();
            state.registry.insert(record)?;
            if let Err(e) = state.index.insert(id, x, y) {
                log::error!("Failed to index node {}: {}", id, e);
                if let Err(rollback) = state.registry.remove(id) {
                    return Err(diverged(id, rollback));
                }
                return Err(e.into());
            }
            let events = state.stamp(vec![TopologyEventInfo::added(view)]);
            (view, events)
        };

        log::debug!("Added node {} at ({}, {})", view.id, view.x, view.y);
        self.dispatch(events);
        Ok(view.id)
    }

    fn remove(&self, id: NodeId) -> PostelResult<()> {
        let events = {
            let mut state = self.state.lock();
            state.ensure_running()?;

            if let Err(e) = state.registry.get(id) {
                log::warn!("Cannot remove node {}: {}", id, e);
                return Err(e);
            }
            if let Err(e) = state.index.remove(&id) {
                return Err(diverged(id, e.into()));
            }
            let record = state.registry.remove(id)?;
            state.stamp(vec![TopologyEventInfo::removed(
                record.view(),
                record.render_handle,
            )])
        };

        log::debug!("Removed node {}", id);
        self.dispatch(events);
        Ok(())
    }

    fn get(&self, id: NodeId) -> PostelResult<Node> {
        let state = self.state.lock();
        let record = state.registry.get(id)?;
        let placement = state.index.placement(&id).ok_or_else(|| {
            diverged(
                id,
                PostelError::new(&format!("Node {} is not indexed", id), ErrorKind::NotFound),
            )
        })?;

        Ok(Node {
            id: record.id,
            x: record.x,
            y: record.y,
            tree: placement.into(),
            render_handle: record.render_handle,
        })
    }

    fn list(&self) -> Vec<NodeView> {
        let state = self.state.lock();
        state.registry.list().map(NodeRecord::view).collect()
    }

    fn nearest(&self, x: f64, y: f64) -> PostelResult<NodeView> {
        check_query(x, y)?;
        let state = self.state.lock();
        match state.index.nearest(x, y) {
            Some((id, _)) => state.view_of(id),
            None => Err(PostelError::new(
                "Topology holds no nodes",
                ErrorKind::Empty,
            )),
        }
    }

    fn nearest_k(&self, x: f64, y: f64, k: usize) -> PostelResult<Vec<(NodeView, f64)>> {
        check_query(x, y)?;
        let state = self.state.lock();
        state
            .index
            .k_nearest(x, y, k)
            .into_iter()
            .map(|(id, distance)| -> PostelResult<(NodeView, f64)> {
                Ok((state.view_of(id)?, distance))
            })
            .collect()
    }

    fn within_distance(
        &self,
        x: f64,
        y: f64,
        distance: f64,
    ) -> PostelResult<Vec<(NodeView, f64)>> {
        check_query(x, y)?;
        let state = self.state.lock();
        state
            .index
            .within_distance(x, y, distance)
            .into_iter()
            .map(|(id, d)| -> PostelResult<(NodeView, f64)> { Ok((state.view_of(id)?, d)) })
            .collect()
    }

    fn attach_render_handle(
        &self,
        id: NodeId,
        handle: RenderHandle,
    ) -> PostelResult<Option<RenderHandle>> {
        let mut state = self.state.lock();
        state.ensure_running()?;
        let record = state.registry.get_mut(id)?;
        Ok(record.render_handle.replace(handle))
    }

    fn check_integrity(&self) -> IntegrityReport {
        let state = self.state.lock();
        let mut report = state.index.check_integrity();

        if state.registry.len() != state.index.len() {
            report.is_valid = false;
            report.errors.push(format!(
                "Registry holds {} nodes but index holds {}",
                state.registry.len(),
                state.index.len()
            ));
        }
        for record in state.registry.list() {
            match state.index.point(&record.id) {
                Some((x, y)) if x == record.x && y == record.y => {}
                Some((x, y)) => {
                    report.is_valid = false;
                    report.errors.push(format!(
                        "Node {} registered at ({}, {}) but indexed at ({}, {})",
                        record.id, record.x, record.y, x, y
                    ));
                }
                None => {
                    report.is_valid = false;
                    report
                        .errors
                        .push(format!("Node {} is registered but not indexed", record.id));
                }
            }
        }

        for (id, _, _) in state.index.iter() {
            if !state.registry.contains(id) {
                report.is_valid = false;
                report
                    .errors
                    .push(format!("Node {} is indexed but not registered", id));
            }
        }

        if !report.is_valid {
            log::error!("Topology integrity check failed: {:?}", report.errors);
        }
        report
    }

    fn shutdown(&self) {
        let events = {
            let mut state = self.state.lock();
            if state.shut_down {
                log::debug!("Topology engine already shut down");
                return;
            }
            state.shut_down = true;
            state.index.clear();

            let mut events: Vec<TopologyEventInfo> = state
                .registry
                .drain()
                .into_iter()
                .map(|record| TopologyEventInfo::removed(record.view(), record.render_handle))
                .collect();
            log::info!("Topology engine shut down, released {} nodes", events.len());
            events.push(TopologyEventInfo::shutdown());
            state.stamp(events)
        };

        self.dispatch(events);
    }

    /// Queues stamped events and, unless another thread is already draining,
    /// delivers everything that is ready in sequence order.
    fn dispatch(&self, events: Vec<(u64, TopologyEventInfo)>) {
        {
            let mut queue = self.queue.lock();
            queue.pending.extend(events);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }

        loop {
            let info = {
                let mut queue = self.queue.lock();
                let seq = queue.next_delivery;
                match queue.pending.remove(&seq) {
                    Some(info) => {
                        queue.next_delivery += 1;
                        info
                    }
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };
            self.publish(info);
        }
    }

    fn publish(&self, info: TopologyEventInfo) {
        let event = info.event();
        match catch_unwind(AssertUnwindSafe(|| self.event_bus.publish(info))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Failed to publish {:?} event: {}", event, e),
            Err(_) => log::error!("A listener panicked while handling {:?} event", event),
        }

        if event == TopologyEvents::Shutdown {
            if let Err(e) = self.event_bus.close() {
                log::error!("Failed to release topology listeners: {}", e);
            }
        }
    }
}

impl Drop for TopologyInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn check_query(x: f64, y: f64) -> PostelResult<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        log::warn!("Rejected query point ({}, {})", x, y);
        Err(PostelError::new(
            &format!("Query point ({}, {}) is not finite", x, y),
            ErrorKind::OutOfBounds,
        ))
    }
}

fn diverged(id: NodeId, cause: PostelError) -> PostelError {
    log::error!("Registry and index disagree on node {}: {}", id, cause);
    PostelError::new_with_cause(
        &format!("Registry and index disagree on node {}", id),
        ErrorKind::InternalError,
        cause,
    )
}
