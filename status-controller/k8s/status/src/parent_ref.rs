//! Normalization of route parent references across schema generations.
//!
//! Routes written against the older schema carry [`v1alpha2::ParentReference`]
//! values, which lack a `port`. Everything above this module works with the
//! canonical [`v1beta1::ParentReference`] shape, upgraded with the implied
//! group and kind filled in. Equality is decided on a [`CanonicalParentRef`],
//! never on raw references, so that a reference omitting its namespace
//! matches one that spells out the namespace it defaults to.

use crate::k8s::gateway::{self, v1alpha2, v1beta1};
use std::fmt;

/// A parent reference with every defaultable field resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalParentRef {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub section_name: Option<String>,
    pub port: Option<i32>,
}

/// A parent reference of either schema generation.
pub trait ParentRef {
    /// Returns this reference in the canonical schema, with an omitted group
    /// or kind filled in. The namespace is left as written.
    fn upgrade(&self) -> v1beta1::ParentReference;
}

impl ParentRef for v1beta1::ParentReference {
    fn upgrade(&self) -> v1beta1::ParentReference {
        v1beta1::ParentReference {
            group: Some(self.group.clone().unwrap_or_else(|| gateway::GROUP.to_string())),
            kind: Some(self.kind.clone().unwrap_or_else(|| gateway::KIND_GATEWAY.to_string())),
            ..self.clone()
        }
    }
}

impl ParentRef for v1alpha2::ParentReference {
    fn upgrade(&self) -> v1beta1::ParentReference {
        v1beta1::ParentReference {
            group: Some(self.group.clone().unwrap_or_else(|| gateway::GROUP.to_string())),
            kind: Some(self.kind.clone().unwrap_or_else(|| gateway::KIND_GATEWAY.to_string())),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            section_name: self.section_name.clone(),
            port: None,
        }
    }
}

/// Converts a canonical reference to the older schema. The port, which the
/// older schema cannot express, is dropped.
pub fn downgrade(parent: &v1beta1::ParentReference) -> v1alpha2::ParentReference {
    if let Some(port) = parent.port {
        tracing::debug!(name = %parent.name, port, "Dropping port from v1alpha2 parent reference");
    }
    v1alpha2::ParentReference {
        group: parent.group.clone(),
        kind: parent.kind.clone(),
        namespace: parent.namespace.clone(),
        name: parent.name.clone(),
        section_name: parent.section_name.clone(),
    }
}

/// Returns true if both references identify the same parent once defaults
/// are applied.
pub fn same_parent(a: &impl ParentRef, b: &impl ParentRef, default_namespace: &str) -> bool {
    CanonicalParentRef::new(a, default_namespace) == CanonicalParentRef::new(b, default_namespace)
}

// === impl CanonicalParentRef ===

impl CanonicalParentRef {
    pub fn new(parent: &impl ParentRef, default_namespace: &str) -> Self {
        let v1beta1::ParentReference {
            group,
            kind,
            namespace,
            name,
            section_name,
            port,
        } = parent.upgrade();
        Self {
            group: group.unwrap_or_default(),
            kind: kind.unwrap_or_default(),
            namespace: namespace.unwrap_or_else(|| default_namespace.to_string()),
            name,
            section_name,
            port,
        }
    }
}

impl fmt::Display for CanonicalParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}/{}", self.kind, self.group, self.namespace, self.name)?;
        if let Some(section) = &self.section_name {
            write!(f, " section {section}")?;
        }
        if let Some(port) = self.port {
            write!(f, " port {port}")?;
        }
        Ok(())
    }
}
