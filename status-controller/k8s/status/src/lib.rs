#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod clock;
pub mod conditions;
mod error;
mod gateway;
mod parent;
pub mod parent_ref;
mod pass;
mod route;
mod settings;


pub use self::{
    clock::Clock,
    conditions::{ConditionLedger, ConditionStatus, Transition},
    error::{Error, Result},
    gateway::{GatewayView, ListenerView},
    parent::ParentBinding,
    parent_ref::CanonicalParentRef,
    pass::Pass,
    route::{RouteType, RouteView},
    settings::Settings,
};
pub use gateway_status_controller_k8s_api as k8s;
use std::{cell::RefCell, rc::Rc};

/// A caller-owned entity whose status is mutated in place by the views of a
/// single reconciliation pass.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(inner: T) -> Shared<T> {
    Rc::new(RefCell::new(inner))
}
