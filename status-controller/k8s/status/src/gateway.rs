use crate::{
    clock::Clock,
    conditions::{self, ConditionLedger, ConditionStatus, Transition},
    error::{Error, Result},
    k8s::{
        gateway::{
            self, conditions as types,
            v1beta1::{
                FromNamespaces, Gateway, GatewayStatus, Listener, ListenerStatus, RouteGroupKind,
            },
        },
        labels::Selector,
        Condition, Labels, Namespace, ResourceExt, Secret,
    },
    Shared,
};
use std::{cell::RefCell, rc::Rc};

/// Wraps a Gateway for the duration of one reconciliation pass.
///
/// Listener views are materialized on first lookup and cached, so every
/// lookup of a name within the pass yields the same view.
#[derive(Debug)]
pub struct GatewayView {
    gateway: Shared<Gateway>,
    clock: Clock,
    listeners: Vec<Rc<ListenerView>>,
}

/// Wraps one of a Gateway's listeners, bound to that listener's entry in the
/// Gateway's status.
#[derive(Debug)]
pub struct ListenerView {
    name: String,
    gateway: Shared<Gateway>,
    clock: Clock,
    spec_idx: usize,
    status_idx: usize,
    namespace_selector: RefCell<Option<Selector>>,
    tls_secret: RefCell<Option<Secret>>,
}

// === impl GatewayView ===

impl GatewayView {
    pub fn new(gateway: Shared<Gateway>, clock: Clock) -> Self {
        Self {
            gateway,
            clock,
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        self.gateway.borrow().name_any()
    }

    pub fn namespace(&self) -> Option<String> {
        self.gateway.borrow().namespace()
    }

    pub fn generation(&self) -> Option<i64> {
        self.gateway.borrow().metadata.generation
    }

    /// Returns the view for the named listener, creating its status entry if
    /// the Gateway has none yet.
    pub fn listener(&mut self, name: &str) -> Result<Rc<ListenerView>> {
        if let Some(listener) = self.listeners.iter().find(|l| l.name == name) {
            return Ok(listener.clone());
        }

        let mut gw = self.gateway.borrow_mut();
        let Some(spec_idx) = gw.spec.listeners.iter().position(|l| l.name == name) else {
            let error = Error::ListenerNotFound {
                namespace: gw.namespace().unwrap_or_default(),
                gateway: gw.name_any(),
                listener: name.to_string(),
            };
            tracing::debug!(%error, "Listener lookup missed");
            return Err(error);
        };

        let status = gw.status.get_or_insert_with(GatewayStatus::default);
        let status_idx = match status.listeners.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                status.listeners.push(ListenerStatus {
                    name: name.to_string(),
                    ..Default::default()
                });
                status.listeners.len() - 1
            }
        };
        tracing::debug!(
            gateway = %gw.name_any(),
            listener = %name,
            status_idx,
            "Materialized listener"
        );
        drop(gw);

        let listener = Rc::new(ListenerView {
            name: name.to_string(),
            gateway: self.gateway.clone(),
            clock: self.clock.clone(),
            spec_idx,
            status_idx,
            namespace_selector: RefCell::new(None),
            tls_secret: RefCell::new(None),
        });
        self.listeners.push(listener.clone());
        Ok(listener)
    }

    /// Returns a view for every listener in the Gateway's spec, in spec order.
    pub fn listeners(&mut self) -> Result<Vec<Rc<ListenerView>>> {
        let names = self
            .gateway
            .borrow()
            .spec
            .listeners
            .iter()
            .map(|l| l.name.clone())
            .collect::<Vec<_>>();
        names.iter().map(|name| self.listener(name)).collect()
    }

    pub fn set_condition(
        &self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Transition {
        let mut gw = self.gateway.borrow_mut();
        let generation = gw.metadata.generation;
        let status_ = gw.status.get_or_insert_with(GatewayStatus::default);
        let transition = ConditionLedger::new(&mut status_.conditions)
            .upsert(type_, status, reason, message, generation, &self.clock);
        if transition != Transition::Unchanged {
            tracing::trace!(gateway = %gw.name_any(), type_, %status, reason, ?transition);
        }
        transition
    }

    pub fn reset_conditions(&self) {
        let mut gw = self.gateway.borrow_mut();
        if let Some(status) = gw.status.as_mut() {
            ConditionLedger::new(&mut status.conditions).reset();
        }
    }

    pub fn conditions(&self) -> Vec<Condition> {
        let gw = self.gateway.borrow();
        gw.status
            .as_ref()
            .map(|s| s.conditions.clone())
            .unwrap_or_default()
    }

    /// A snapshot of the Gateway's status as mutated so far.
    pub fn status(&self) -> GatewayStatus {
        self.gateway.borrow().status.clone().unwrap_or_default()
    }
}

// === impl ListenerView ===

impl ListenerView {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The listener's spec, as declared on the Gateway.
    pub fn spec(&self) -> Listener {
        self.gateway.borrow().spec.listeners[self.spec_idx].clone()
    }

    pub fn hostname(&self) -> Option<String> {
        self.gateway.borrow().spec.listeners[self.spec_idx].hostname.clone()
    }

    pub fn port(&self) -> i32 {
        self.gateway.borrow().spec.listeners[self.spec_idx].port
    }

    pub fn protocol(&self) -> String {
        self.gateway.borrow().spec.listeners[self.spec_idx].protocol.clone()
    }

    pub fn set_condition(
        &self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Transition {
        let generation = self.gateway.borrow().metadata.generation;
        let clock = &self.clock;
        let transition = self.with_status_mut(|s| {
            ConditionLedger::new(&mut s.conditions)
                .upsert(type_, status, reason, message, generation, clock)
        });
        if transition != Transition::Unchanged {
            tracing::trace!(listener = %self.name, type_, %status, reason, ?transition);
        }
        transition
    }

    pub fn reset_conditions(&self) {
        self.with_status_mut(|s| ConditionLedger::new(&mut s.conditions).reset());
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.with_status(|s| s.conditions.clone())
    }

    pub fn set_supported_kinds(&self, kinds: impl IntoIterator<Item = RouteGroupKind>) {
        let kinds = kinds.into_iter().collect();
        self.with_status_mut(|s| s.supported_kinds = kinds);
    }

    pub fn supported_kinds(&self) -> Vec<RouteGroupKind> {
        self.with_status(|s| s.supported_kinds.clone())
    }

    /// Zeroes the attached route count, which is recomputed on every pass.
    pub fn reset_attached_routes(&self) {
        self.with_status_mut(|s| s.attached_routes = 0);
    }

    pub fn increment_attached_routes(&self) {
        self.with_status_mut(|s| s.attached_routes += 1);
    }

    pub fn attached_routes(&self) -> i32 {
        self.with_status(|s| s.attached_routes)
    }

    /// Returns true if a supported kind has the same group and kind name.
    ///
    /// An absent or empty group is read as the Gateway API group, so it also
    /// matches a kind that names that group explicitly.
    pub fn allows_kind(&self, kind: &RouteGroupKind) -> bool {
        let group = group_or_default(kind);
        self.with_status(|s| {
            s.supported_kinds
                .iter()
                .any(|allowed| group_or_default(allowed) == group && allowed.kind == kind.kind)
        })
    }

    /// Returns true if routes in `namespace` may attach to this listener.
    pub fn allows_namespace(&self, namespace: Option<&Namespace>) -> bool {
        let Some(namespace) = namespace else {
            return false;
        };

        let gw = self.gateway.borrow();
        let from = gw.spec.listeners[self.spec_idx]
            .allowed_routes
            .as_ref()
            .and_then(|r| r.namespaces.as_ref())
            .and_then(|n| n.from)
            .unwrap_or_default();
        match from {
            FromNamespaces::All => true,
            FromNamespaces::Selector => {
                let labels = Labels::from(namespace.metadata.labels.as_ref());
                match self.namespace_selector.borrow().as_ref() {
                    Some(selector) => selector.matches(&labels),
                    None => false,
                }
            }
            FromNamespaces::Same => {
                let gw_ns = gw.metadata.namespace.as_deref();
                gw_ns.is_some() && gw_ns == namespace.metadata.name.as_deref()
            }
        }
    }

    pub fn set_namespace_selector(&self, selector: Option<Selector>) {
        *self.namespace_selector.borrow_mut() = selector;
    }

    /// Configures the namespace selector from the listener's own
    /// `allowedRoutes.namespaces.selector`.
    pub fn configure_namespace_selector(&self) -> Result<()> {
        let selector = {
            let gw = self.gateway.borrow();
            gw.spec.listeners[self.spec_idx]
                .allowed_routes
                .as_ref()
                .and_then(|r| r.namespaces.as_ref())
                .and_then(|n| n.selector.as_ref())
                .map(Selector::try_from)
                .transpose()
                .map_err(|source| Error::InvalidNamespaceSelector {
                    listener: self.name.clone(),
                    source,
                })?
        };
        self.set_namespace_selector(selector);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.with_status(|s| conditions::has_true(&s.conditions, types::listener::READY))
    }

    /// Carries the resolved TLS secret to the translation stage.
    pub fn set_tls_secret(&self, secret: Option<Secret>) {
        *self.tls_secret.borrow_mut() = secret;
    }

    pub fn tls_secret(&self) -> Option<Secret> {
        self.tls_secret.borrow().clone()
    }

    pub fn gateway_namespace(&self) -> Option<String> {
        self.gateway.borrow().namespace()
    }

    // Status entries are only ever appended while views are alive, so the
    // index taken at materialization stays valid for the whole pass.
    fn with_status<T>(&self, f: impl FnOnce(&ListenerStatus) -> T) -> T {
        let gw = self.gateway.borrow();
        let listeners = gw
            .status
            .as_ref()
            .map(|s| s.listeners.as_slice())
            .unwrap_or_default();
        f(&listeners[self.status_idx])
    }

    fn with_status_mut<T>(&self, f: impl FnOnce(&mut ListenerStatus) -> T) -> T {
        let mut gw = self.gateway.borrow_mut();
        let status = gw.status.get_or_insert_with(GatewayStatus::default);
        f(&mut status.listeners[self.status_idx])
    }
}

fn group_or_default(kind: &RouteGroupKind) -> &str {
    match kind.group.as_deref() {
        None | Some("") => gateway::GROUP,
        Some(group) => group,
    }
}
