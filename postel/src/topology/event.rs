use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::PostelResult;
use crate::topology::{NodeView, RenderHandle};

/// Changes the rendering collaborator is told about.
///
/// ```ignore
/// let listener = TopologyEventListener::new(|info: TopologyEventInfo| {
///     match info.event() {
///         TopologyEvents::NodeAdded => draw(info.node()),
///         TopologyEvents::NodeRemoved => release(info.render_handle()),
///         TopologyEvents::Shutdown => {}
///     }
///     Ok(())
/// });
/// engine.subscribe(listener)?;
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TopologyEvents {
    NodeAdded,
    NodeRemoved,
    /// Published once, after every live node was drained and announced.
    Shutdown,
}

/// Payload delivered with each topology event.
///
/// For `NodeRemoved` the render handle is whatever the renderer attached to
/// the node before it went away, so it can release its primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyEventInfo {
    event: TopologyEvents,
    node: Option<NodeView>,
    render_handle: Option<RenderHandle>,
}

impl TopologyEventInfo {
    pub fn new(
        event: TopologyEvents,
        node: Option<NodeView>,
        render_handle: Option<RenderHandle>,
    ) -> Self {
        TopologyEventInfo {
            event,
            node,
            render_handle,
        }
    }

    pub(crate) fn added(node: NodeView) -> Self {
        Self::new(TopologyEvents::NodeAdded, Some(node), None)
    }

    pub(crate) fn removed(node: NodeView, render_handle: Option<RenderHandle>) -> Self {
        Self::new(TopologyEvents::NodeRemoved, Some(node), render_handle)
    }

    pub(crate) fn shutdown() -> Self {
        Self::new(TopologyEvents::Shutdown, None, None)
    }

    pub fn event(&self) -> TopologyEvents {
        self.event
    }

    pub fn node(&self) -> Option<NodeView> {
        self.node
    }

    pub fn render_handle(&self) -> Option<RenderHandle> {
        self.render_handle
    }
}

pub trait TopologyEventCallback:
    Send + Sync + Fn(TopologyEventInfo) -> PostelResult<()>
{
}

impl<F> TopologyEventCallback for F where F: Send + Sync + Fn(TopologyEventInfo) -> PostelResult<()> {}

/// Listener for topology events, registered through
/// [`crate::topology::TopologyEngine::subscribe`].
#[derive(Clone)]
pub struct TopologyEventListener {
    on_event: Arc<dyn TopologyEventCallback>,
}

impl TopologyEventListener {
    pub fn new(on_event: impl TopologyEventCallback + 'static) -> Self {
        TopologyEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<TopologyEventInfo> for TopologyEventListener {
    fn handle(&self, event: &Event<TopologyEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for TopologyEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyEventListener").finish()
    }
}
