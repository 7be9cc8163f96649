use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use std::any::Any;
use std::fmt::Debug;
use std::sync::mpsc;
use std::sync::Arc;

/// A single type-erased invocation parameter.
///
/// Actions receive their parameters as `&[Param]` and downcast to the concrete
/// types they expect. Values are shared via `Arc`, not copied.
pub type Param = Arc<dyn Any + Send + Sync>;

/// Wraps a value into a [`Param`].
#[inline]
pub fn param<T: Any + Send + Sync>(value: T) -> Param {
    Arc::new(value)
}

/// A normalized migration action.
///
/// The engine only ever calls normalized actions: invoking one blocks until the
/// unit of work has fully completed or failed, and the returned result reflects
/// that outcome. Raw actions of other calling conventions are converted into
/// this form by a [`WrapFn`] adapter before execution.
pub type ActionFn = Arc<dyn Fn(&[Param]) -> MigratoryResult<()> + Send + Sync>;

/// Completion callback handed to a callback-last raw action.
///
/// The action must invoke it exactly once, with the outcome of the work.
pub type Done = Box<dyn FnOnce(MigratoryResult<()>) + Send>;

/// A raw migration action as produced by a loader, before normalization.
///
/// # Variants
/// * `Ready` - completes by returning: synchronous work, or work that already
///   blocks internally until finished
/// * `CallbackLast` - signals completion through a [`Done`] callback passed as
///   its last argument, possibly from another thread
#[derive(Clone)]
pub enum RawAction {
    Ready(ActionFn),
    CallbackLast(Arc<dyn Fn(&[Param], Done) + Send + Sync>),
}

impl RawAction {
    /// Creates a raw action that completes by returning.
    pub fn ready(f: impl Fn(&[Param]) -> MigratoryResult<()> + Send + Sync + 'static) -> Self {
        RawAction::Ready(Arc::new(f))
    }

    /// Creates a raw action that completes through its last-argument callback.
    pub fn callback_last(f: impl Fn(&[Param], Done) + Send + Sync + 'static) -> Self {
        RawAction::CallbackLast(Arc::new(f))
    }
}

impl Debug for RawAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAction::Ready(_) => write!(f, "Ready(<action>)"),
            RawAction::CallbackLast(_) => write!(f, "CallbackLast(<action>)"),
        }
    }
}

/// Adapter normalizing raw actions into [`ActionFn`] form.
///
/// Configured once per engine instance; every action of every migration record
/// passes through it at set construction time.
pub type WrapFn = Arc<dyn Fn(RawAction) -> ActionFn + Send + Sync>;

/// The default wrap adapter.
///
/// Ready actions pass through untouched. Callback-last actions are bridged
/// over a channel: the produced action invokes the raw one with a `Done` that
/// sends into the channel, then blocks until that callback fires. A raw action
/// that drops its callback without invoking it fails the step instead of
/// stalling forever.
pub fn default_wrap() -> WrapFn {
    Arc::new(|raw| match raw {
        RawAction::Ready(action) => action,
        RawAction::CallbackLast(action) => Arc::new(move |params: &[Param]| {
            let (tx, rx) = mpsc::channel();
            let done: Done = Box::new(move |result| {
                let _ = tx.send(result);
            });
            action(params, done);
            rx.recv().map_err(|_| {
                MigratoryError::new(
                    "Migration action dropped its completion callback without invoking it",
                    ErrorKind::ActionFailure,
                )
            })?
        }),
    })
}

/// Source of the parameters passed to every action invocation.
///
/// # Variants
/// * `None` - actions are invoked with an empty parameter list (the default)
/// * `Fixed` - the literal list is passed on every invocation
/// * `Factory` - the function is re-invoked on every action call and its
///   return value is passed
#[derive(Clone, Default)]
pub enum ParamsProvider {
    #[default]
    None,
    Fixed(Vec<Param>),
    Factory(Arc<dyn Fn() -> Vec<Param> + Send + Sync>),
}

impl ParamsProvider {
    /// Creates a fixed parameter list provider.
    pub fn fixed(params: Vec<Param>) -> Self {
        ParamsProvider::Fixed(params)
    }

    /// Creates a factory provider, evaluated once per action invocation.
    pub fn factory(f: impl Fn() -> Vec<Param> + Send + Sync + 'static) -> Self {
        ParamsProvider::Factory(Arc::new(f))
    }

    /// Produces the parameter list for one action invocation.
    pub fn resolve(&self) -> Vec<Param> {
        match self {
            ParamsProvider::None => Vec::new(),
            ParamsProvider::Fixed(params) => params.clone(),
            ParamsProvider::Factory(f) => f(),
        }
    }
}

impl Debug for ParamsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamsProvider::None => write!(f, "None"),
            ParamsProvider::Fixed(params) => write!(f, "Fixed({} params)", params.len()),
            ParamsProvider::Factory(_) => write!(f, "Factory(<fn>)"),
        }
    }
}
