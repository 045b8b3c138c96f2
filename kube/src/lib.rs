//! Kubernetes-backed [`ktop_core::MetricsSource`].

mod convert;
mod source;

pub use source::ConnectError;
pub use source::KubeMetricsSource;
pub use source::KubeOptions;
pub use source::NamespaceScope;
pub use source::Namespaces;
