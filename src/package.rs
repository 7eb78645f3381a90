//! Routing packages: the exit object of one controller cycle.
//!
//! A package bundles what a controller wants to hand to each of its three
//! downstream consumers: the main flow, the data flow and the UI flow. The
//! slices are independent, any of them may be empty, and nothing is merged
//! or computed when they are read back.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::Flow;

/// Identifier of one package, shared by the three deliveries it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(Uuid);

impl PackageId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PackageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable bundle of three payload slices, one per downstream flow.
///
/// The slice types default to a single type for the common case where all
/// three flows carry the same row level.
///
/// # Examples
///
/// ```
/// use mgp::{DataPoint, RoutingPackage};
///
/// let package: RoutingPackage<DataPoint> = RoutingPackage::builder()
///     .flow(DataPoint::new("temperature", 72.5, "F"))
///     .ui(DataPoint::event("summary", "72.5 F"))
///     .build();
///
/// assert_eq!(package.flow().map(DataPoint::label), Some("temperature"));
/// assert!(package.data().is_none());
/// assert_eq!(package.ui().map(DataPoint::label), Some("summary"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPackage<F, D = F, U = F> {
    id: PackageId,
    flow: Option<F>,
    data: Option<D>,
    ui: Option<U>,
}

impl<F, D, U> RoutingPackage<F, D, U> {
    /// Creates a package; `None` marks a flow with nothing to send.
    #[must_use]
    pub fn new(flow: Option<F>, data: Option<D>, ui: Option<U>) -> Self {
        Self {
            id: PackageId::new(),
            flow,
            data,
            ui,
        }
    }

    /// A package that sends nothing anywhere.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(None, None, None)
    }

    #[must_use]
    pub fn builder() -> RoutingPackageBuilder<F, D, U> {
        RoutingPackageBuilder::default()
    }

    #[must_use]
    pub const fn id(&self) -> PackageId {
        self.id
    }

    /// Slice for the main flow.
    #[must_use]
    pub const fn flow(&self) -> Option<&F> {
        self.flow.as_ref()
    }

    /// Slice for the data flow.
    #[must_use]
    pub const fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Slice for the UI flow.
    #[must_use]
    pub const fn ui(&self) -> Option<&U> {
        self.ui.as_ref()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flow.is_none() && self.data.is_none() && self.ui.is_none()
    }

    /// Flows that have something to send, in dispatch order.
    #[must_use]
    pub fn occupied(&self) -> Vec<Flow> {
        let mut out = Vec::with_capacity(3);
        if self.flow.is_some() {
            out.push(Flow::Main);
        }
        if self.data.is_some() {
            out.push(Flow::Data);
        }
        if self.ui.is_some() {
            out.push(Flow::Ui);
        }
        out
    }

    /// Splits the package into its owned slices.
    #[must_use]
    pub fn into_parts(self) -> (Option<F>, Option<D>, Option<U>) {
        (self.flow, self.data, self.ui)
    }
}

impl<T> RoutingPackage<T> {
    /// Slice addressed by flow, for packages with a single payload type.
    #[must_use]
    pub const fn slot(&self, flow: Flow) -> Option<&T> {
        match flow {
            Flow::Main => self.flow.as_ref(),
            Flow::Data => self.data.as_ref(),
            Flow::Ui => self.ui.as_ref(),
        }
    }
}

/// Builder for [`RoutingPackage`]; unset slices stay empty.
#[derive(Debug)]
pub struct RoutingPackageBuilder<F, D = F, U = F> {
    flow: Option<F>,
    data: Option<D>,
    ui: Option<U>,
}

impl<F, D, U> Default for RoutingPackageBuilder<F, D, U> {
    fn default() -> Self {
        Self {
            flow: None,
            data: None,
            ui: None,
        }
    }
}

impl<F, D, U> RoutingPackageBuilder<F, D, U> {
    #[must_use]
    pub fn flow(mut self, payload: F) -> Self {
        self.flow = Some(payload);
        self
    }

    #[must_use]
    pub fn data(mut self, payload: D) -> Self {
        self.data = Some(payload);
        self
    }

    #[must_use]
    pub fn ui(mut self, payload: U) -> Self {
        self.ui = Some(payload);
        self
    }

    #[must_use]
    pub fn build(self) -> RoutingPackage<F, D, U> {
        RoutingPackage::new(self.flow, self.data, self.ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getters_return_supplied_slices() {
        let package: RoutingPackage<String> =
            RoutingPackage::new(Some("flow".to_string()), None, Some("ui".to_string()));
        assert_eq!(package.flow().map(String::as_str), Some("flow"));
        assert_eq!(package.data(), None);
        assert_eq!(package.ui().map(String::as_str), Some("ui"));
        assert_eq!(package.occupied(), vec![Flow::Main, Flow::Ui]);
        assert!(!package.is_empty());
    }

    #[test]
    fn test_heterogeneous_slices() {
        let package: RoutingPackage<u32, (), String> = RoutingPackage::builder()
            .flow(7)
            .ui("7 readings".to_string())
            .build();
        assert_eq!(package.flow(), Some(&7));
        assert!(package.data().is_none());
        assert_eq!(package.ui().map(String::len), Some(10));
    }

    #[test]
    fn test_owned_parts_do_not_affect_each_other() {
        let package = RoutingPackage::new(Some(vec![1]), Some(vec![2]), Some(vec![3]));
        let (flow, data, ui) = package.into_parts();
        let mut flow = flow.unwrap();
        flow.push(9);
        assert_eq!(flow, vec![1, 9]);
        assert_eq!(data, Some(vec![2]));
        assert_eq!(ui, Some(vec![3]));
    }

    #[test]
    fn test_slot() {
        let package = RoutingPackage::new(Some(1), Some(2), None);
        assert_eq!(package.slot(Flow::Main), Some(&1));
        assert_eq!(package.slot(Flow::Data), Some(&2));
        assert_eq!(package.slot(Flow::Ui), None);
    }

    #[test]
    fn test_empty_and_ids() {
        let a: RoutingPackage<u8> = RoutingPackage::empty();
        let b: RoutingPackage<u8> = RoutingPackage::empty();
        assert!(a.is_empty());
        assert!(a.occupied().is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_package_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RoutingPackage<crate::row::EventRow>>();
    }
}
