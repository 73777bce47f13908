use oapi_discovery::k8s_client::{api::cluster_config::ClusterConfigError, K8sClientError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Kubernetes client error: {}", _0)]
    K8sClient(#[from] K8sClientError),
    #[error("Could not obtain cluster config: {}", _0)]
    ClusterConfig(#[from] ClusterConfigError),
    #[error("Could not serialize output as json: {:?}", _0)]
    Json(#[from] serde_json::Error),
    #[error("Could not serialize output as yaml: {:?}", _0)]
    Yaml(#[from] serde_yaml::Error),
}
