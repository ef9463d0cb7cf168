#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod gateway;
pub mod labels;

pub use self::labels::Labels;
pub use k8s_openapi::{
    api::core::v1::{Namespace, Secret},
    apimachinery::pkg::apis::meta::v1::{
        Condition, LabelSelector, LabelSelectorRequirement, Time,
    },
    chrono,
};
pub use kube::core::{ObjectMeta, Resource, ResourceExt};
