use super::*;
use crate::{
    k8s::{
        gateway::{
            conditions::{
                listener::{reason::READY as LISTENER_READY_REASON, READY as LISTENER_READY},
                route::{self, reason::ACCEPTED},
            },
            v1alpha2::{TlsRoute, TlsRouteSpec, TlsRouteStatus},
            v1beta1::{
                HttpRoute, HttpRouteSpec, HttpRouteStatus, RouteGroupKind, RouteParentStatus,
                RouteStatus,
            },
            GROUP, KIND_GATEWAY, KIND_HTTP_ROUTE,
        },
        Condition,
    },
    conditions::eq_time_insensitive,
    parent_ref::ParentRef,
    shared, ConditionStatus, Error, RouteType, Transition,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn make_http_route(namespace: Option<&str>, parents: Vec<v1beta1::ParentReference>) -> HttpRoute {
    HttpRoute {
        metadata: ObjectMeta {
            namespace: namespace.map(Into::into),
            name: Some("web-route".to_string()),
            generation: Some(4),
            ..Default::default()
        },
        spec: HttpRouteSpec {
            parent_refs: Some(parents),
            hostnames: Some(vec!["example.com".to_string()]),
        },
        status: None,
    }
}

fn make_tls_route(namespace: Option<&str>, parents: Vec<v1alpha2::ParentReference>) -> TlsRoute {
    TlsRoute {
        metadata: ObjectMeta {
            namespace: namespace.map(Into::into),
            name: Some("tls-route".to_string()),
            generation: Some(2),
            ..Default::default()
        },
        spec: TlsRouteSpec {
            parent_refs: Some(parents),
            hostnames: Some(vec!["a.example.com".to_string(), "b.example.com".to_string()]),
        },
        status: None,
    }
}

#[test]
fn route_capabilities() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);

    let http = pass.http_route(shared(make_http_route(
        Some("apps"),
        vec![gateway_ref(None, Some("web"))],
    )));
    assert_eq!(http.route_type(), RouteType::Http);
    assert_eq!(http.route_type().to_string(), "HTTPRoute");
    assert_eq!(http.name(), "web-route");
    assert_eq!(http.namespace(), "apps");
    assert_eq!(http.generation(), Some(4));
    assert_eq!(http.hostnames(), vec!["example.com"]);

    let tls = pass.tls_route(shared(make_tls_route(
        None,
        vec![legacy_gateway_ref(None, Some("tls"))],
    )));
    assert_eq!(tls.route_type(), RouteType::Tls);
    assert_eq!(tls.route_type().to_string(), "TLSRoute");
    assert_eq!(tls.namespace(), "default");
    assert_eq!(tls.hostnames(), vec!["a.example.com", "b.example.com"]);
}

#[test]
fn legacy_parent_references_are_upgraded() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let tls = pass.tls_route(shared(make_tls_route(
        Some("apps"),
        vec![legacy_gateway_ref(Some("infra"), Some("tls"))],
    )));

    assert_eq!(
        tls.parent_references(),
        vec![v1beta1::ParentReference {
            group: Some(GROUP.to_string()),
            kind: Some(KIND_GATEWAY.to_string()),
            namespace: Some("infra".to_string()),
            name: "g".to_string(),
            section_name: Some("tls".to_string()),
            port: None,
        }]
    );
}

#[test]
fn parent_bindings_are_cached_by_canonical_reference() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let object = shared(make_http_route(Some("default"), vec![gateway_ref(None, Some("web"))]));
    let mut http = pass.http_route(object.clone());

    let first = http.parent_binding(&gateway_ref(None, Some("web"))).unwrap();
    let second = http.parent_binding(&gateway_ref(Some("default"), Some("web"))).unwrap();
    let upgraded = http.parent_binding(&gateway_ref(None, Some("web")).upgrade()).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(Rc::ptr_eq(&first, &upgraded));

    let status = object.borrow().status.clone().unwrap();
    assert_eq!(status.inner.parents.len(), 1);
    assert_eq!(status.inner.parents[0].controller_name, Settings::default().controller_name);
    assert_eq!(status.inner.parents[0].parent_ref, gateway_ref(None, Some("web")));
    assert_eq!(first.parent_ref(), &gateway_ref(None, Some("web")).upgrade());
}

#[test]
fn omitted_namespace_resolves_to_default_namespace() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let mut http = pass.http_route(shared(make_http_route(
        Some("apps"),
        vec![gateway_ref(None, None)],
    )));

    let implicit = http.parent_binding(&gateway_ref(None, None)).unwrap();
    let explicit = http.parent_binding(&gateway_ref(Some("default"), None)).unwrap();
    assert!(Rc::ptr_eq(&implicit, &explicit));

    let err = http.parent_binding(&gateway_ref(Some("apps"), None)).unwrap_err();
    assert!(matches!(err, Error::ParentRefNotFound { kind: "HTTPRoute", .. }));
}

#[test]
fn stored_entry_without_namespace_is_reused_outside_default_namespace() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let mut object = make_tls_route(
        Some("apps"),
        vec![legacy_gateway_ref(Some("default"), Some("tls"))],
    );
    object.status = Some(TlsRouteStatus {
        inner: v1alpha2::RouteStatus {
            parents: vec![v1alpha2::RouteParentStatus {
                parent_ref: legacy_gateway_ref(None, Some("tls")),
                controller_name: Settings::default().controller_name,
                conditions: vec![],
            }],
        },
    });
    let object = shared(object);
    let mut tls = pass.tls_route(object.clone());

    let binding = tls.parent_binding(&gateway_ref(Some("default"), Some("tls"))).unwrap();
    binding.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");

    let parents = object.borrow().status.clone().unwrap().inner.parents;
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].parent_ref, legacy_gateway_ref(None, Some("tls")));
    assert_eq!(parents[0].conditions.len(), 1);
}

#[test]
fn unknown_parent_reference_is_not_found() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let object = shared(make_tls_route(Some("apps"), vec![legacy_gateway_ref(None, Some("tls"))]));
    let mut tls = pass.tls_route(object.clone());

    let err = tls.parent_binding(&legacy_gateway_ref(None, Some("web"))).unwrap_err();
    assert_eq!(
        err,
        Error::ParentRefNotFound {
            kind: "TLSRoute",
            namespace: "apps".to_string(),
            route: "tls-route".to_string(),
            parent: "Gateway.gateway.networking.k8s.io default/g section web".to_string(),
        }
    );
    assert!(object.borrow().status.is_none());
}

#[test]
fn legacy_status_entry_without_namespace_is_reused() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let mut object = make_tls_route(
        Some("default"),
        vec![legacy_gateway_ref(Some("default"), Some("tls"))],
    );
    object.status = Some(TlsRouteStatus {
        inner: v1alpha2::RouteStatus {
            parents: vec![v1alpha2::RouteParentStatus {
                parent_ref: legacy_gateway_ref(None, Some("tls")),
                controller_name: "other.io/controller".to_string(),
                conditions: vec![],
            }],
        },
    });
    let object = shared(object);
    let mut tls = pass.tls_route(object.clone());

    let binding = tls.parent_binding(&gateway_ref(Some("default"), Some("tls"))).unwrap();
    binding.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");

    let status = object.borrow().status.clone().unwrap();
    assert_eq!(status.inner.parents.len(), 1);
    assert_eq!(status.inner.parents[0].parent_ref, legacy_gateway_ref(None, Some("tls")));
    assert_eq!(status.inner.parents[0].conditions.len(), 1);
}

#[test]
fn new_legacy_status_entry_records_declared_reference() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let object = shared(make_tls_route(Some("apps"), vec![legacy_gateway_ref(None, Some("tls"))]));
    let mut tls = pass.tls_route(object.clone());

    let parent = tls.parent_references().remove(0);
    let binding = tls.parent_binding(&parent).unwrap();
    assert_eq!(binding.parent_ref(), &parent);
    assert_eq!(binding.route_type(), RouteType::Tls);

    let status = object.borrow().status.clone().unwrap();
    assert_eq!(status.inner.parents[0].parent_ref, legacy_gateway_ref(None, Some("tls")));
}

#[test]
fn conditions_are_written_to_the_binding_entry() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let object = shared(make_http_route(
        Some("apps"),
        vec![gateway_ref(None, Some("web")), gateway_ref(None, Some("admin"))],
    ));
    let mut http = pass.http_route(object.clone());

    let bindings = http.parent_bindings().unwrap();
    assert_eq!(bindings.len(), 2);
    let (web, admin) = (&bindings[0], &bindings[1]);

    let t = admin.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");
    assert_eq!(t, Transition::Added);
    let t = admin.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");
    assert_eq!(t, Transition::Unchanged);
    web.set_condition(
        route::ACCEPTED,
        ConditionStatus::False,
        route::reason::NOT_ALLOWED_BY_LISTENERS,
        "no listener allows this route",
    );

    assert!(admin.is_accepted());
    assert!(!web.is_accepted());

    let parents = object.borrow().status.clone().unwrap().inner.parents;
    assert_eq!(parents[0].parent_ref.section_name.as_deref(), Some("web"));
    assert_eq!(parents[0].conditions[0].status, "False");
    assert_eq!(parents[0].conditions[0].observed_generation, Some(4));
    assert_eq!(parents[1].parent_ref.section_name.as_deref(), Some("admin"));
    assert_eq!(parents[1].conditions[0].status, "True");
    assert_eq!(parents[1].conditions.len(), 1);

    admin.reset_conditions();
    assert!(!admin.is_accepted());
    assert!(admin.conditions().is_empty());
    assert_eq!(web.conditions().len(), 1);
}

#[test]
fn duplicate_parent_references_share_a_binding() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let object = shared(make_http_route(
        Some("default"),
        vec![gateway_ref(None, Some("web")), gateway_ref(Some("default"), Some("web"))],
    ));
    let mut http = pass.http_route(object.clone());

    assert_eq!(http.parent_bindings().unwrap().len(), 1);
    assert_eq!(object.borrow().status.as_ref().unwrap().inner.parents.len(), 1);
}

#[test]
fn listeners_are_recorded_without_arbitration() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let mut gw = pass.gateway(shared(make_gateway(
        "default",
        1,
        vec![make_listener("web", None), make_listener("alt", None)],
    )));
    let mut http = pass.http_route(shared(make_http_route(
        Some("default"),
        vec![gateway_ref(None, None)],
    )));
    let binding = http.parent_binding(&gateway_ref(None, None)).unwrap();

    let web = gw.listener("web").unwrap();
    let alt = gw.listener("alt").unwrap();
    binding.set_listeners(vec![web.clone(), alt.clone()]);
    binding.set_listeners(Some(gw.listener("web").unwrap()));

    let recorded = binding.listeners();
    assert_eq!(recorded.len(), 2);
    assert!(Rc::ptr_eq(&recorded[0], &web));
    assert!(Rc::ptr_eq(&recorded[1], &alt));
}

/// Drives a full pass the way the translation stage does and checks that a
/// second pass over the unchanged objects leaves their status untouched.
#[test]
fn repeated_passes_are_stable() {
    let clock = StepClock::default();
    let gateway = shared(make_gateway(
        "default",
        1,
        vec![make_listener("web", Some(FromNamespaces::All))],
    ));
    let http_route = shared(make_http_route(Some("default"), vec![gateway_ref(None, Some("web"))]));
    let route_ns = make_namespace("default", BTreeMap::new());

    let reconcile = || {
        let pass = make_pass(&clock);
        let mut gw = pass.gateway(gateway.clone());
        let web = gw.listener("web").unwrap();
        web.set_supported_kinds(Some(RouteGroupKind {
            group: None,
            kind: KIND_HTTP_ROUTE.to_string(),
        }));
        web.reset_attached_routes();
        web.set_condition(LISTENER_READY, ConditionStatus::True, LISTENER_READY_REASON, "");

        let mut http = pass.http_route(http_route.clone());
        for parent in http.parent_references() {
            let binding = http.parent_binding(&parent).unwrap();
            let section = parent.section_name.as_deref().unwrap_or_default();
            let listener = gw.listener(section).unwrap();
            let kind = RouteGroupKind {
                group: Some(GROUP.to_string()),
                kind: http.route_type().kind().to_string(),
            };
            if listener.allows_kind(&kind) && listener.allows_namespace(Some(&route_ns)) {
                binding.set_listeners(Some(listener.clone()));
                listener.increment_attached_routes();
                binding.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");
            }
        }
    };

    reconcile();
    let gateway_status = gateway.borrow().status.clone().unwrap();
    let route_status = http_route.borrow().status.clone().unwrap();

    reconcile();
    assert_eq!(gateway.borrow().status.clone().unwrap(), gateway_status);
    assert_eq!(http_route.borrow().status.clone().unwrap(), route_status);
    assert_eq!(gateway_status.listeners[0].attached_routes, 1);
    assert!(route_status.inner.parents[0]
        .conditions
        .iter()
        .any(|c| c.type_ == route::ACCEPTED && c.status == "True"));
}

#[test]
fn time_insensitive_equality_across_routes() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let make = || shared(make_http_route(Some("default"), vec![gateway_ref(None, None)]));
    let (a, b) = (make(), make());

    for shared_route in [&a, &b] {
        let mut http = pass.http_route(shared_route.clone());
        let binding = http.parent_binding(&gateway_ref(None, None)).unwrap();
        binding.set_condition(route::ACCEPTED, ConditionStatus::True, ACCEPTED, "");
    }

    let conditions = |shared_route: &crate::Shared<HttpRoute>| -> Vec<Condition> {
        shared_route.borrow().status.clone().unwrap().inner.parents[0].conditions.clone()
    };
    assert_ne!(conditions(&a), conditions(&b));
    assert!(eq_time_insensitive(&conditions(&a), &conditions(&b)));
}

#[test]
fn http_status_round_trips_through_persisted_shape() {
    let clock = StepClock::default();
    let pass = make_pass(&clock);
    let mut object = make_http_route(Some("default"), vec![gateway_ref(None, Some("web"))]);
    object.status = Some(HttpRouteStatus {
        inner: RouteStatus {
            parents: vec![RouteParentStatus {
                parent_ref: gateway_ref(Some("default"), Some("web")),
                controller_name: Settings::default().controller_name,
                conditions: vec![],
            }],
        },
    });
    let object = shared(object);
    let mut http = pass.http_route(object.clone());

    http.parent_binding(&gateway_ref(None, Some("web"))).unwrap();
    assert_eq!(object.borrow().status.as_ref().unwrap().inner.parents.len(), 1);
}
