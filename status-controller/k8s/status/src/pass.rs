use crate::{
    clock::Clock,
    gateway::GatewayView,
    k8s::gateway::{v1alpha2::TlsRoute, v1beta1::{Gateway, HttpRoute}},
    route::{RouteHandle, RouteView},
    settings::Settings,
    Shared,
};
use std::rc::Rc;

/// The settings and clock shared by the views of one reconciliation pass.
///
/// Views created from a pass cache the listener views and parent bindings
/// they materialize; dropping them at the end of the pass discards those
/// caches. All state that outlives the pass is written to the entities.
#[derive(Clone, Debug, Default)]
pub struct Pass {
    settings: Rc<Settings>,
    clock: Clock,
}

impl Pass {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Rc::new(settings),
            clock: Clock::system(),
        }
    }

    pub fn with_clock(self, clock: Clock) -> Self {
        Self { clock, ..self }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gateway(&self, gateway: Shared<Gateway>) -> GatewayView {
        GatewayView::new(gateway, self.clock.clone())
    }

    pub fn http_route(&self, route: Shared<HttpRoute>) -> RouteView {
        RouteView::new(RouteHandle::Http(route), self.settings.clone(), self.clock.clone())
    }

    pub fn tls_route(&self, route: Shared<TlsRoute>) -> RouteView {
        RouteView::new(RouteHandle::Tls(route), self.settings.clone(), self.clock.clone())
    }
}
