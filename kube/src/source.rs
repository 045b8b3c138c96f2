use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::Client;
use kube::Config;
use kube::api::ListParams;
use kube::config::InferConfigError;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::config::KubeconfigError;
use kube::core::ApiResource;
use kube::core::DynamicObject;
use kube::core::GroupVersionKind;
use ktop_core::Inventory;
use ktop_core::KtopError;
use ktop_core::MetricsSource;
use ktop_core::Result;
use ktop_core::inventory::NodeInfo;
use ktop_core::inventory::NodeMetric;
use ktop_core::inventory::PodInfo;
use ktop_core::inventory::PodMetric;
use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::convert;

const METRICS_GROUP: &str = "metrics.k8s.io";
const METRICS_VERSION: &str = "v1beta1";

/// Which pods (and pod metrics) are listed. Nodes are always cluster-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceScope {
    /// The namespace of the selected kubeconfig context, or `default`.
    #[default]
    ContextDefault,
    Named(String),
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeOptions {
    /// Explicit kubeconfig path; otherwise `$KUBECONFIG` / `~/.kube/config`
    /// or in-cluster configuration.
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub namespace: NamespaceScope,
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("failed to infer Kubernetes configuration: {0}")]
    Infer(#[from] InferConfigError),

    #[error("failed to initialize Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Resolved namespace scope, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespaces {
    One(String),
    All,
}

impl fmt::Display for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespaces::One(namespace) => write!(f, "namespace {namespace}"),
            Namespaces::All => f.write_str("all namespaces"),
        }
    }
}

/// Lists nodes, pods, node metrics and pod metrics through the API server.
#[derive(Clone)]
pub struct KubeMetricsSource {
    client: Client,
    namespaces: Namespaces,
    node_metrics: ApiResource,
    pod_metrics: ApiResource,
}

impl KubeMetricsSource {
    pub async fn connect(options: &KubeOptions) -> std::result::Result<Self, ConnectError> {
        let config = if options.kubeconfig.is_none() && options.context.is_none() {
            Config::infer().await?
        } else {
            let kubeconfig = match &options.kubeconfig {
                Some(path) => Kubeconfig::read_from(path)?,
                None => Kubeconfig::read()?,
            };
            let selection = KubeConfigOptions {
                context: options.context.clone(),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig, &selection).await?
        };

        let namespaces = match &options.namespace {
            NamespaceScope::All => Namespaces::All,
            NamespaceScope::Named(namespace) => Namespaces::One(namespace.clone()),
            NamespaceScope::ContextDefault => Namespaces::One(config.default_namespace.clone()),
        };
        info!(
            cluster = %config.cluster_url,
            context = options.context.as_deref().unwrap_or("<current>"),
            scope = %namespaces,
            "connected to Kubernetes API"
        );
        let client = Client::try_from(config)?;
        Ok(Self::new(client, namespaces))
    }

    pub fn new(client: Client, namespaces: Namespaces) -> Self {
        let node_metrics = GroupVersionKind::gvk(METRICS_GROUP, METRICS_VERSION, "NodeMetrics");
        let pod_metrics = GroupVersionKind::gvk(METRICS_GROUP, METRICS_VERSION, "PodMetrics");
        Self {
            client,
            namespaces,
            node_metrics: ApiResource::from_gvk_with_plural(&node_metrics, "nodes"),
            pod_metrics: ApiResource::from_gvk_with_plural(&pod_metrics, "pods"),
        }
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    async fn list_nodes(&self, params: &ListParams) -> Result<Vec<NodeInfo>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(params)
            .await
            .map_err(|e| KtopError::fetch("nodes", e))?;
        Ok(list.items.iter().filter_map(convert::node_info).collect())
    }

    async fn list_pods(&self, params: &ListParams) -> Result<Vec<PodInfo>> {
        let api: Api<Pod> = match &self.namespaces {
            Namespaces::One(namespace) => Api::namespaced(self.client.clone(), namespace),
            Namespaces::All => Api::all(self.client.clone()),
        };
        let list = api
            .list(params)
            .await
            .map_err(|e| KtopError::fetch("pods", e))?;
        Ok(list.items.iter().filter_map(convert::pod_info).collect())
    }

    async fn list_node_metrics(&self, params: &ListParams) -> Result<Vec<NodeMetric>> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &self.node_metrics);
        let list = api
            .list(params)
            .await
            .map_err(|e| KtopError::fetch("node metrics", e))?;
        Ok(list.items.iter().filter_map(convert::node_metric).collect())
    }

    async fn list_pod_metrics(&self, params: &ListParams) -> Result<Vec<PodMetric>> {
        let api: Api<DynamicObject> = match &self.namespaces {
            Namespaces::One(namespace) => {
                Api::namespaced_with(self.client.clone(), namespace, &self.pod_metrics)
            }
            Namespaces::All => Api::all_with(self.client.clone(), &self.pod_metrics),
        };
        let list = api
            .list(params)
            .await
            .map_err(|e| KtopError::fetch("pod metrics", e))?;
        Ok(list.items.iter().filter_map(convert::pod_metric).collect())
    }
}

#[async_trait]
impl MetricsSource for KubeMetricsSource {
    async fn fetch(&self) -> Result<Inventory> {
        let params = ListParams::default();
        let (nodes, node_metrics, pods, pod_metrics) = tokio::try_join!(
            self.list_nodes(&params),
            self.list_node_metrics(&params),
            self.list_pods(&params),
            self.list_pod_metrics(&params),
        )?;
        debug!(
            nodes = nodes.len(),
            node_metrics = node_metrics.len(),
            pods = pods.len(),
            pod_metrics = pod_metrics.len(),
            "fetched inventory"
        );
        Ok(Inventory {
            nodes,
            node_metrics,
            pods,
            pod_metrics,
        })
    }
}
