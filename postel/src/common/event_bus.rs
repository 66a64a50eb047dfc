use crate::common::TOPOLOGY_EVENT;
use crate::errors::{ErrorKind, PostelError, PostelResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;

/// Listener registry for one event type, keyed by [`TOPOLOGY_EVENT`].
///
/// Owned by the engine. Handlers run on the publishing thread; publishing
/// with nobody registered skips building the event.
pub(crate) struct PostelEventBus<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> PostelEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub(crate) fn new() -> Self {
        PostelEventBus {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    pub(crate) fn register(&self, listener: L) -> PostelResult<SubscriberRef> {
        self.event_bus
            .subscribe(TOPOLOGY_EVENT, Box::new(listener))
            .map(SubscriberRef::new)
            .map_err(bus_error)
    }

    pub(crate) fn deregister(&self, subscriber: SubscriberRef) -> PostelResult<()> {
        self.event_bus
            .unsubscribe(TOPOLOGY_EVENT, &subscriber.inner)
            .map_err(bus_error)
    }

    pub(crate) fn publish(&self, event: E) -> PostelResult<()> {
        match self.event_bus.get_handler_count(TOPOLOGY_EVENT) {
            Ok(0) | Err(BasuError::EventTypeNotFOUND) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(bus_error(e)),
        }

        self.event_bus
            .publish(TOPOLOGY_EVENT, &Event::new(event))
            .map_err(bus_error)
    }

    /// Drops every registered listener.
    pub(crate) fn close(&self) -> PostelResult<()> {
        self.event_bus.clear().map_err(bus_error)
    }
}

/// Handle returned by a registration, used to deregister the listener.
#[derive(Debug)]
pub struct SubscriberRef {
    inner: HandlerId,
}

impl SubscriberRef {
    fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

fn bus_error(e: BasuError) -> PostelError {
    match e {
        BasuError::EventTypeNotFOUND => PostelError::new(
            "Event bus error: the topology event type is not registered",
            ErrorKind::EventError,
        ),
        BasuError::MutexPoisoned => PostelError::new(
            "Event bus error: internal mutex poisoned",
            ErrorKind::EventError,
        ),
        BasuError::HandlerError(e) => {
            let error_message = e
                .source()
                .map(|s| s.to_string())
                .unwrap_or_else(|| e.to_string());
            PostelError::new(
                &format!("Event handler error: {}", error_message),
                ErrorKind::EventError,
            )
        }
    }
}
