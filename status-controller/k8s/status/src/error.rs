use crate::k8s::labels::InvalidSelector;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Gateway {namespace}/{gateway} has no listener named {listener:?}")]
    ListenerNotFound {
        namespace: String,
        gateway: String,
        listener: String,
    },

    #[error("{kind} {namespace}/{route} has no parent reference to {parent}")]
    ParentRefNotFound {
        kind: &'static str,
        namespace: String,
        route: String,
        parent: String,
    },

    #[error("listener {listener:?} has an invalid namespace selector: {source}")]
    InvalidNamespaceSelector {
        listener: String,
        #[source]
        source: InvalidSelector,
    },
}
