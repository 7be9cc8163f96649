use crate::common::{current_time_or_zero, MIGRATION_EVENT};
use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::fmt::Debug;
use std::sync::Arc;

/// Lifecycle events emitted while executing a plan.
///
/// Each migration in a plan produces exactly two events: `Migrating` before its
/// up action runs and `Migrated` after it has been recorded as applied (or the
/// `Reverting`/`Reverted` pair for a down run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvents {
    Migrating,
    Migrated,
    Reverting,
    Reverted,
}

/// Information about a migration lifecycle event.
///
/// `MigrationEventInfo` carries the event type, the display name of the
/// migration the event refers to, and the creation timestamp.
///
/// # Characteristics
/// - **Cloneable**: Thread-safe sharing via Arc, suitable for concurrent event processing
/// - **Immutable**: All fields are captured at event time
///
/// # Usage
///
/// Event listeners receive `MigrationEventInfo` instances when events are triggered:
/// ```ignore
/// migratory.subscribe(MigrationEventListener::new(|event| {
///     match event.event_type() {
///         MigrationEvents::Migrated => println!("{} applied", event.name()),
///         _ => {}
///     }
///     Ok(())
/// }))?;
/// ```
#[derive(Clone)]
pub struct MigrationEventInfo {
    inner: Arc<MigrationEventInner>,
}

impl MigrationEventInfo {
    /// Creates a new event for the named migration.
    ///
    /// The creation timestamp is captured automatically.
    pub fn new(event_type: MigrationEvents, name: &str) -> Self {
        MigrationEventInfo {
            inner: Arc::new(MigrationEventInner {
                event_type,
                name: name.to_string(),
                timestamp: current_time_or_zero(),
            }),
        }
    }

    /// Returns the type of event (Migrating, Migrated, Reverting, Reverted).
    pub fn event_type(&self) -> MigrationEvents {
        self.inner.event_type.clone()
    }

    /// Returns the display name of the migration this event refers to.
    pub fn name(&self) -> String {
        self.inner.name.clone()
    }

    /// Returns the timestamp (milliseconds since epoch) when this event was created.
    pub fn timestamp(&self) -> u128 {
        self.inner.timestamp
    }
}

impl Debug for MigrationEventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationEventInfo")
            .field("event_type", &self.event_type())
            .field("name", &self.inner.name)
            .field("timestamp", &self.inner.timestamp)
            .finish()
    }
}

struct MigrationEventInner {
    event_type: MigrationEvents,
    name: String,
    timestamp: u128,
}

/// Trait for closure-based event handlers.
///
/// Any closure matching `Fn(MigrationEventInfo) -> MigratoryResult<()>`
/// automatically implements this trait. Must be `Send + Sync` for thread-safe
/// delivery.
pub trait MigrationEventCallback:
    Send + Sync + Fn(MigrationEventInfo) -> MigratoryResult<()>
{
}

impl<F> MigrationEventCallback for F where
    F: Send + Sync + Fn(MigrationEventInfo) -> MigratoryResult<()>
{
}

/// Listener for migration lifecycle events.
///
/// Wraps an event handler callback and can be registered with an engine
/// instance to receive notifications while plans execute.
///
/// A callback that returns an error is logged at warn level and otherwise
/// ignored: one failing listener never prevents delivery to the remaining
/// listeners and never disturbs the executing plan.
#[derive(Clone)]
pub struct MigrationEventListener {
    on_event: Arc<dyn MigrationEventCallback>,
}

impl MigrationEventListener {
    /// Creates a new event listener wrapping the provided callback.
    pub fn new(on_event: impl MigrationEventCallback + 'static) -> Self {
        MigrationEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<MigrationEventInfo> for MigrationEventListener {
    fn handle(&self, event: &Event<MigrationEventInfo>) -> Result<(), BasuError> {
        if let Err(e) = (self.on_event)(event.data.clone()) {
            log::warn!("Migration event listener failed: {}", e);
        }
        Ok(())
    }
}

impl Debug for MigrationEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationEventListener").finish()
    }
}

/// Handle returned by `register`, used to deregister a listener later.
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

/// Publishes and subscribes to migration lifecycle events.
///
/// This struct manages an event bus that allows callers to register listeners
/// and receive notifications while plans execute. Delivery is synchronous at
/// publish time, in subscription order.
///
/// # Responsibilities
///
/// * **Event Publishing**: Broadcasts events to all registered listeners
/// * **Listener Registration**: Registers event handlers to receive notifications
/// * **Listener Deregistration**: Removes previously registered event handlers
/// * **Lifecycle Management**: Closes the event bus and cleans up resources
/// * **Performance Optimization**: Fast path for no-listener scenarios
#[derive(Clone)]
pub struct MigrationEventBus {
    inner: Arc<MigrationEventBusInner>,
}

impl Default for MigrationEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationEventBus {
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        MigrationEventBus {
            inner: Arc::new(MigrationEventBusInner {
                event_bus: EventBus::new(),
            }),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: MigrationEventListener) -> MigratoryResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> MigratoryResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: MigrationEventInfo) -> MigratoryResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) -> MigratoryResult<()> {
        self.inner.close()
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

/// Inner implementation of the event bus.
struct MigrationEventBusInner {
    event_bus: EventBus<MigrationEventInfo>,
}

impl MigrationEventBusInner {
    fn register(&self, listener: MigrationEventListener) -> MigratoryResult<Option<SubscriberRef>> {
        let subscriber = self.event_bus.subscribe(MIGRATION_EVENT, Box::new(listener));
        match subscriber {
            Ok(subscriber) => Ok(Some(SubscriberRef::new(subscriber))),
            Err(e) => Err(Self::migratory_error(e)),
        }
    }

    #[inline]
    fn deregister(&self, subscriber: SubscriberRef) -> MigratoryResult<()> {
        match self.event_bus.unsubscribe(MIGRATION_EVENT, &subscriber.inner) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::migratory_error(e)),
        }
    }

    #[inline]
    fn publish(&self, event: MigrationEventInfo) -> MigratoryResult<()> {
        // Fast path: check if there are listeners before creating event
        let handler_count = match self.event_bus.get_handler_count(MIGRATION_EVENT) {
            Ok(count) => count,
            Err(e) => {
                // If event type not found, no listeners - early return
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    return Ok(());
                }
                return Err(Self::migratory_error(e));
            }
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        match self.event_bus.publish(MIGRATION_EVENT, &basu_event) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::migratory_error(e)),
        }
    }

    #[inline]
    fn close(&self) -> MigratoryResult<()> {
        match self.event_bus.clear() {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::migratory_error(e)),
        }
    }

    #[inline]
    fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(MIGRATION_EVENT) {
            Ok(count) => count > 0,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    false
                } else {
                    log::warn!("Failed to check listeners: {}, defaulting to false", e);
                    false
                }
            }
        }
    }

    #[inline]
    fn migratory_error(e: BasuError) -> MigratoryError {
        match e {
            BasuError::EventTypeNotFOUND => MigratoryError::new(
                "Event bus error: the requested event type is not registered. Register a handler for the event type before publishing",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => MigratoryError::new(
                "Event bus error: internal mutex poisoned - the event bus may be in an inconsistent state",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Unknown error in event handler".to_string());
                MigratoryError::new(
                    &format!("Event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ReadExecutor, WriteExecutor};
    use crate::{atomic, Atomic};
    use basu::HandlerId;

    fn noop_listener() -> MigrationEventListener {
        MigrationEventListener::new(|_event| Ok(()))
    }

    // ==================== MigrationEventInfo Tests ====================

    #[test]
    fn test_event_info_new() {
        let event = MigrationEventInfo::new(MigrationEvents::Migrating, "001-init");
        assert_eq!(event.event_type(), MigrationEvents::Migrating);
        assert_eq!(event.name(), "001-init");
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn test_event_info_clone_shares_state() {
        let event = MigrationEventInfo::new(MigrationEvents::Reverted, "001-init");
        let cloned = event.clone();
        assert_eq!(cloned.event_type(), event.event_type());
        assert_eq!(cloned.name(), event.name());
        assert_eq!(cloned.timestamp(), event.timestamp());
    }

    #[test]
    fn test_event_info_debug_format() {
        let event = MigrationEventInfo::new(MigrationEvents::Migrated, "001-init");
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("Migrated"));
        assert!(debug_str.contains("001-init"));
    }

    // ==================== MigrationEventBus Tests ====================

    #[test]
    fn test_event_bus_register() {
        let event_bus = MigrationEventBus::new();
        let subscriber = event_bus.register(noop_listener());
        assert!(subscriber.is_ok());
    }

    #[test]
    fn test_event_bus_deregister() {
        let event_bus = MigrationEventBus::new();
        let subscriber = event_bus.register(noop_listener()).unwrap().unwrap();
        let result = event_bus.deregister(subscriber);
        assert!(result.is_ok());
    }

    #[test]
    fn test_event_bus_deregister_unknown_handler_fails() {
        let event_bus = MigrationEventBus::new();
        let subscriber = SubscriberRef::new(HandlerId::new());
        let result = event_bus.deregister(subscriber);
        assert!(result.is_err());
    }

    #[test]
    fn test_event_bus_publish_delivers_event() {
        let event_bus = MigrationEventBus::new();
        let received: Atomic<Vec<String>> = atomic(Vec::new());

        let received_clone = received.clone();
        let _subscriber = event_bus
            .register(MigrationEventListener::new(move |event| {
                received_clone.write_with(|names| names.push(event.name()));
                Ok(())
            }))
            .unwrap();

        event_bus
            .publish(MigrationEventInfo::new(MigrationEvents::Migrating, "001-init"))
            .unwrap();

        assert_eq!(received.read_with(|names| names.clone()), vec!["001-init"]);
    }

    #[test]
    fn test_event_bus_publish_without_listeners_is_noop() {
        let event_bus = MigrationEventBus::new();
        let result =
            event_bus.publish(MigrationEventInfo::new(MigrationEvents::Migrated, "001-init"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_failing_listener_does_not_poison_delivery() {
        let event_bus = MigrationEventBus::new();
        let received: Atomic<usize> = atomic(0);

        let _failing = event_bus
            .register(MigrationEventListener::new(|_event| {
                Err(MigratoryError::new("listener bug", ErrorKind::InternalError))
            }))
            .unwrap();

        let received_clone = received.clone();
        let _counting = event_bus
            .register(MigrationEventListener::new(move |_event| {
                received_clone.write_with(|count| *count += 1);
                Ok(())
            }))
            .unwrap();

        let result =
            event_bus.publish(MigrationEventInfo::new(MigrationEvents::Migrating, "001-init"));
        assert!(result.is_ok());
        assert_eq!(received.read_with(|count| *count), 1);
    }

    #[test]
    fn test_has_listeners() {
        let event_bus = MigrationEventBus::new();
        assert!(!event_bus.has_listeners());

        let _subscriber = event_bus.register(noop_listener()).unwrap();
        assert!(event_bus.has_listeners());
    }

    #[test]
    fn test_event_bus_close() {
        let event_bus = MigrationEventBus::new();
        let _subscriber = event_bus.register(noop_listener()).unwrap();
        let result = event_bus.close();
        assert!(result.is_ok());
    }

    #[test]
    fn test_migratory_error_mutex_poisoned() {
        let error = BasuError::MutexPoisoned;
        let result = MigrationEventBusInner::migratory_error(error);
        assert_eq!(*result.kind(), ErrorKind::EventError);
        assert!(result.to_string().contains("mutex poisoned"));
    }

    #[test]
    fn test_migratory_error_event_type_not_found() {
        let error = BasuError::EventTypeNotFOUND;
        let result = MigrationEventBusInner::migratory_error(error);
        assert_eq!(*result.kind(), ErrorKind::EventError);
        assert!(result.to_string().contains("not registered"));
    }
}
