//! Area controllers: handler/filter chains and their registry.
//!
//! A handler translates raw input (a sensor frame, a state variable, a gate
//! action) into a [`RoutingPackage`]. An optional filter then reshapes that
//! package, typically emptying slices that should not travel further. The
//! controller owns the registered chains and hands every resulting package
//! to its [`Dispatcher`].

use std::collections::BTreeMap;
use std::fmt;

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::{MgpResult, RegistryError};
use crate::package::RoutingPackage;

type RuleFn<P> = dyn Fn(P) -> P + Send + Sync;
type HandlerFn<In, P> = dyn Fn(In) -> MgpResult<P> + Send + Sync;

/// A named filter rule applied to a package.
pub struct Filter<P> {
    filter_type: String,
    rule: Box<RuleFn<P>>,
}

impl<P> Filter<P> {
    pub fn new(
        filter_type: impl Into<String>,
        rule: impl Fn(P) -> P + Send + Sync + 'static,
    ) -> Self {
        Self {
            filter_type: filter_type.into(),
            rule: Box::new(rule),
        }
    }

    #[must_use]
    pub fn filter_type(&self) -> &str {
        &self.filter_type
    }

    /// Runs the rule and returns its result.
    pub fn apply(&self, package: P) -> P {
        (self.rule)(package)
    }
}

impl<P> fmt::Debug for Filter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("filter_type", &self.filter_type).finish_non_exhaustive()
    }
}

/// A handler chain: translation followed by an optional filter.
pub struct Handler<In, F, D = F, U = F> {
    handler_type: String,
    handler: Box<HandlerFn<In, RoutingPackage<F, D, U>>>,
    filter: Option<Filter<RoutingPackage<F, D, U>>>,
}

impl<In, F, D, U> Handler<In, F, D, U> {
    pub fn new(
        handler_type: impl Into<String>,
        handler: impl Fn(In) -> MgpResult<RoutingPackage<F, D, U>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler_type: handler_type.into(),
            handler: Box::new(handler),
            filter: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter<RoutingPackage<F, D, U>>) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn handler_type(&self) -> &str {
        &self.handler_type
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Filter<RoutingPackage<F, D, U>>> {
        self.filter.as_ref()
    }

    /// Translates the raw input and applies the filter.
    ///
    /// # Errors
    ///
    /// Propagates the translation error; the filter is not run.
    pub fn handle(&self, raw: In) -> MgpResult<RoutingPackage<F, D, U>> {
        let package = self.just_handle(raw)?;
        Ok(match &self.filter {
            Some(filter) => filter.apply(package),
            None => package,
        })
    }

    /// Translates the raw input without filtering.
    ///
    /// # Errors
    ///
    /// Propagates the translation error.
    pub fn just_handle(&self, raw: In) -> MgpResult<RoutingPackage<F, D, U>> {
        (self.handler)(raw)
    }
}

impl<In, F, D, U> fmt::Debug for Handler<In, F, D, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("handler_type", &self.handler_type)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Registry of named handler chains bound to a dispatcher.
///
/// # Examples
///
/// ```
/// use mgp::{Controller, DataPoint, Handler, RoutingPackage};
///
/// let mut controller: Controller<f64, DataPoint> = Controller::default();
/// controller
///     .register(
///         "thermo-1",
///         Handler::new("sensor", |celsius: f64| {
///             let point = DataPoint::new("temperature", celsius, "C");
///             Ok(RoutingPackage::builder().flow(point).build())
///         }),
///     )
///     .unwrap();
///
/// let report = controller.read("thermo-1", 36.6).unwrap();
/// assert!(report.is_success());
/// assert!(controller.read("thermo-2", 36.6).is_err());
/// ```
#[derive(Debug)]
pub struct Controller<In, F, D = F, U = F> {
    handlers: BTreeMap<String, Handler<In, F, D, U>>,
    dispatcher: Dispatcher<F, D, U>,
}

impl<In, F, D, U> Default for Controller<In, F, D, U> {
    fn default() -> Self {
        Self::new(Dispatcher::new())
    }
}

impl<In, F, D, U> Controller<In, F, D, U> {
    #[must_use]
    pub fn new(dispatcher: Dispatcher<F, D, U>) -> Self {
        Self {
            handlers: BTreeMap::new(),
            dispatcher,
        }
    }

    /// Registers a handler under `name`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateHandler` if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Handler<In, F, D, U>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateHandler { name });
        }
        tracing::info!(
            handler = %name,
            handler_type = handler.handler_type(),
            "handler registered"
        );
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Removes the handler registered under `name` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownHandler` if nothing is registered.
    pub fn unregister(&mut self, name: &str) -> Result<Handler<In, F, D, U>, RegistryError> {
        let handler = self.handlers.remove(name).ok_or_else(|| RegistryError::UnknownHandler {
            name: name.to_string(),
        })?;
        tracing::info!(handler = %name, "handler unregistered");
        Ok(handler)
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<F, D, U> {
        &self.dispatcher
    }

    /// Runs the named chain on `raw` and dispatches the package.
    ///
    /// Sink failures are reported in the returned [`DispatchReport`], not
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownHandler` for an unregistered name, or
    /// the handler's own error.
    pub fn read(&self, name: &str, raw: In) -> MgpResult<DispatchReport> {
        let handler = self.handlers.get(name).ok_or_else(|| RegistryError::UnknownHandler {
            name: name.to_string(),
        })?;
        let package = handler.handle(raw)?;
        Ok(self.dispatcher.dispatch(package))
    }
}
