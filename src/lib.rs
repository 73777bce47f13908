pub mod discovery;
pub mod k8s_client;

pub use discovery::{Discovery, DiscoveryClient, OapiDiscoveryClient};
pub use k8s_client::{K8sClient, K8sClientError};
