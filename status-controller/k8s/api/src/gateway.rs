//! Gateway API resources as persisted by the surrounding system.
//!
//! Two schema generations coexist: [`v1beta1`] carries the full parent
//! reference shape, while [`v1alpha2`] predates the `port` field and is still
//! used by TLSRoutes.

pub mod conditions;
pub mod v1alpha2;
pub mod v1beta1;

/// The API group shared by every Gateway API resource.
pub const GROUP: &str = "gateway.networking.k8s.io";

pub const KIND_GATEWAY: &str = "Gateway";
pub const KIND_HTTP_ROUTE: &str = "HTTPRoute";
pub const KIND_TLS_ROUTE: &str = "TLSRoute";
