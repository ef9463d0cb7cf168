use crate::{
    clock::Clock,
    conditions::{self, ConditionLedger, ConditionStatus, Transition},
    gateway::ListenerView,
    k8s::{gateway::conditions as types, gateway::v1beta1, Condition},
    route::{RouteHandle, RouteType},
};
use std::{cell::RefCell, rc::Rc};

/// One route's binding to one parent Gateway, bound to the route's status
/// entry for that parent.
#[derive(Debug)]
pub struct ParentBinding {
    route: RouteHandle,
    parent_ref: v1beta1::ParentReference,
    status_idx: usize,
    clock: Clock,
    listeners: RefCell<Vec<Rc<ListenerView>>>,
}

impl ParentBinding {
    pub(crate) fn new(
        route: RouteHandle,
        parent_ref: v1beta1::ParentReference,
        status_idx: usize,
        clock: Clock,
    ) -> Self {
        Self {
            route,
            parent_ref,
            status_idx,
            clock,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// The parent reference from the route's spec, in the canonical schema.
    pub fn parent_ref(&self) -> &v1beta1::ParentReference {
        &self.parent_ref
    }

    pub fn route_type(&self) -> RouteType {
        self.route.route_type()
    }

    /// Records listeners this binding resolved to.
    ///
    /// More than one listener means the reference matched ambiguously; no
    /// winner is picked here. Listeners already recorded are skipped.
    pub fn set_listeners(&self, listeners: impl IntoIterator<Item = Rc<ListenerView>>) {
        let mut recorded = self.listeners.borrow_mut();
        for listener in listeners {
            if !recorded.iter().any(|l| Rc::ptr_eq(l, &listener)) {
                recorded.push(listener);
            }
        }
    }

    pub fn listeners(&self) -> Vec<Rc<ListenerView>> {
        self.listeners.borrow().clone()
    }

    pub fn set_condition(
        &self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Transition {
        let generation = self.route.generation();
        let transition = self
            .route
            .with_parent_conditions_mut(self.status_idx, |conditions| {
                ConditionLedger::new(conditions)
                    .upsert(type_, status, reason, message, generation, &self.clock)
            });
        if transition != Transition::Unchanged {
            tracing::trace!(
                kind = %self.route_type(),
                parent = %self.parent_ref.name,
                type_,
                %status,
                reason,
                ?transition
            );
        }
        transition
    }

    pub fn reset_conditions(&self) {
        self.route.with_parent_conditions_mut(self.status_idx, |conditions| {
            ConditionLedger::new(conditions).reset()
        });
    }

    pub fn is_accepted(&self) -> bool {
        self.route.with_parent_conditions(self.status_idx, |conditions| {
            conditions::has_true(conditions, types::route::ACCEPTED)
        })
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.route
            .with_parent_conditions(self.status_idx, |conditions| conditions.to_vec())
    }
}
