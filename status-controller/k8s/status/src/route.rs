use crate::{
    clock::Clock,
    error::{Error, Result},
    k8s::{
        gateway::{
            self, v1alpha2,
            v1beta1::{self, HttpRoute},
            v1alpha2::TlsRoute,
        },
        Condition, ResourceExt,
    },
    parent::ParentBinding,
    parent_ref::{CanonicalParentRef, ParentRef},
    settings::Settings,
    Shared,
};
use ahash::AHashMap as HashMap;
use std::{fmt, rc::Rc};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteType {
    Http,
    Tls,
}

/// Wraps an HTTPRoute or TLSRoute for the duration of one reconciliation
/// pass.
///
/// Parent references are exposed in the canonical schema regardless of the
/// route's own schema generation. Bindings are cached by canonical reference.
#[derive(Debug)]
pub struct RouteView {
    route: RouteHandle,
    settings: Rc<Settings>,
    clock: Clock,
    bindings: HashMap<CanonicalParentRef, Rc<ParentBinding>>,
}

/// The owning route of a view or binding.
///
/// This is the only place that distinguishes route variants; everything
/// else goes through its methods.
#[derive(Clone, Debug)]
pub(crate) enum RouteHandle {
    Http(Shared<HttpRoute>),
    Tls(Shared<TlsRoute>),
}

// === impl RouteType ===

impl RouteType {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http => gateway::KIND_HTTP_ROUTE,
            Self::Tls => gateway::KIND_TLS_ROUTE,
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

// === impl RouteView ===

impl RouteView {
    pub(crate) fn new(route: RouteHandle, settings: Rc<Settings>, clock: Clock) -> Self {
        Self {
            route,
            settings,
            clock,
            bindings: HashMap::new(),
        }
    }

    pub fn route_type(&self) -> RouteType {
        self.route.route_type()
    }

    pub fn name(&self) -> String {
        self.route.name()
    }

    /// The route's namespace, or the configured default when it has none.
    pub fn namespace(&self) -> String {
        self.route
            .namespace()
            .unwrap_or_else(|| self.settings.default_namespace.clone())
    }

    pub fn generation(&self) -> Option<i64> {
        self.route.generation()
    }

    pub fn hostnames(&self) -> Vec<String> {
        self.route.hostnames()
    }

    /// The route's parent references in the canonical schema, in spec order.
    pub fn parent_references(&self) -> Vec<v1beta1::ParentReference> {
        self.route.parent_references()
    }

    /// Returns the binding for `parent`, creating the route's status entry
    /// for it if none exists yet.
    ///
    /// References that omit a namespace resolve to the configured default
    /// namespace, never to the route's own.
    pub fn parent_binding(&mut self, parent: &impl ParentRef) -> Result<Rc<ParentBinding>> {
        let key = CanonicalParentRef::new(parent, &self.settings.default_namespace);
        if let Some(binding) = self.bindings.get(&key) {
            return Ok(binding.clone());
        }

        let Some((parent_ref, status_idx)) = self.route.bind_parent(
            &key,
            &self.settings.default_namespace,
            &self.settings.controller_name,
        ) else {
            let error = Error::ParentRefNotFound {
                kind: self.route_type().kind(),
                namespace: self.namespace(),
                route: self.name(),
                parent: key.to_string(),
            };
            tracing::debug!(%error, "Parent reference lookup missed");
            return Err(error);
        };

        tracing::debug!(
            route = %self.name(),
            kind = %self.route_type(),
            parent = %key,
            status_idx,
            "Materialized parent binding"
        );

        let binding = Rc::new(ParentBinding::new(
            self.route.clone(),
            parent_ref,
            status_idx,
            self.clock.clone(),
        ));
        self.bindings.insert(key, binding.clone());
        Ok(binding)
    }

    /// Returns a binding for every distinct parent reference in the route's
    /// spec, in spec order.
    pub fn parent_bindings(&mut self) -> Result<Vec<Rc<ParentBinding>>> {
        let mut bindings = Vec::<Rc<ParentBinding>>::new();
        for parent in self.parent_references() {
            let binding = self.parent_binding(&parent)?;
            if !bindings.iter().any(|b| Rc::ptr_eq(b, &binding)) {
                bindings.push(binding);
            }
        }
        Ok(bindings)
    }
}

// === impl RouteHandle ===

impl RouteHandle {
    pub(crate) fn route_type(&self) -> RouteType {
        match self {
            Self::Http(_) => RouteType::Http,
            Self::Tls(_) => RouteType::Tls,
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Http(route) => route.borrow().name_any(),
            Self::Tls(route) => route.borrow().name_any(),
        }
    }

    fn namespace(&self) -> Option<String> {
        match self {
            Self::Http(route) => route.borrow().namespace(),
            Self::Tls(route) => route.borrow().namespace(),
        }
    }

    pub(crate) fn generation(&self) -> Option<i64> {
        match self {
            Self::Http(route) => route.borrow().metadata.generation,
            Self::Tls(route) => route.borrow().metadata.generation,
        }
    }

    fn hostnames(&self) -> Vec<String> {
        match self {
            Self::Http(route) => route.borrow().spec.hostnames.clone().unwrap_or_default(),
            Self::Tls(route) => route.borrow().spec.hostnames.clone().unwrap_or_default(),
        }
    }

    fn parent_references(&self) -> Vec<v1beta1::ParentReference> {
        match self {
            Self::Http(route) => upgrade_all(route.borrow().spec.parent_refs.as_deref()),
            Self::Tls(route) => upgrade_all(route.borrow().spec.parent_refs.as_deref()),
        }
    }

    /// Finds the spec reference matching `key` and the status entry for it,
    /// appending an entry owned by `controller_name` if the route has none.
    ///
    /// New entries record the reference as the spec declares it. Persisted
    /// entries may omit their namespace, so both sides are compared in
    /// canonical form.
    fn bind_parent(
        &self,
        key: &CanonicalParentRef,
        default_namespace: &str,
        controller_name: &str,
    ) -> Option<(v1beta1::ParentReference, usize)> {
        match self {
            Self::Http(route) => {
                let mut route = route.borrow_mut();
                let declared = route
                    .spec
                    .parent_refs
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .find(|p| CanonicalParentRef::new(*p, default_namespace) == *key)?
                    .clone();
                let status = route.status.get_or_insert_with(Default::default);
                let idx = find_or_push(
                    &mut status.inner.parents,
                    |s| CanonicalParentRef::new(&s.parent_ref, default_namespace) == *key,
                    || v1beta1::RouteParentStatus {
                        parent_ref: declared.clone(),
                        controller_name: controller_name.to_string(),
                        conditions: Vec::new(),
                    },
                );
                Some((declared.upgrade(), idx))
            }
            Self::Tls(route) => {
                let mut route = route.borrow_mut();
                let declared = route
                    .spec
                    .parent_refs
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .find(|p| CanonicalParentRef::new(*p, default_namespace) == *key)?
                    .clone();
                let status = route.status.get_or_insert_with(Default::default);
                let idx = find_or_push(
                    &mut status.inner.parents,
                    |s| CanonicalParentRef::new(&s.parent_ref, default_namespace) == *key,
                    || v1alpha2::RouteParentStatus {
                        parent_ref: declared.clone(),
                        controller_name: controller_name.to_string(),
                        conditions: Vec::new(),
                    },
                );
                Some((declared.upgrade(), idx))
            }
        }
    }

    pub(crate) fn with_parent_conditions<T>(
        &self,
        status_idx: usize,
        f: impl FnOnce(&[Condition]) -> T,
    ) -> T {
        match self {
            Self::Http(route) => {
                let route = route.borrow();
                let status = route.status.as_ref().map(|s| &s.inner.parents[status_idx]);
                f(status.map(|s| s.conditions.as_slice()).unwrap_or_default())
            }
            Self::Tls(route) => {
                let route = route.borrow();
                let status = route.status.as_ref().map(|s| &s.inner.parents[status_idx]);
                f(status.map(|s| s.conditions.as_slice()).unwrap_or_default())
            }
        }
    }

    pub(crate) fn with_parent_conditions_mut<T>(
        &self,
        status_idx: usize,
        f: impl FnOnce(&mut Vec<Condition>) -> T,
    ) -> T {
        match self {
            Self::Http(route) => {
                let mut route = route.borrow_mut();
                let status = route.status.get_or_insert_with(Default::default);
                f(&mut status.inner.parents[status_idx].conditions)
            }
            Self::Tls(route) => {
                let mut route = route.borrow_mut();
                let status = route.status.get_or_insert_with(Default::default);
                f(&mut status.inner.parents[status_idx].conditions)
            }
        }
    }
}

fn upgrade_all<P: ParentRef>(parents: Option<&[P]>) -> Vec<v1beta1::ParentReference> {
    parents.unwrap_or_default().iter().map(ParentRef::upgrade).collect()
}

fn find_or_push<T>(
    items: &mut Vec<T>,
    matches: impl Fn(&T) -> bool,
    make: impl FnOnce() -> T,
) -> usize {
    match items.iter().position(matches) {
        Some(idx) => idx,
        None => {
            items.push(make());
            items.len() - 1
        }
    }
}
