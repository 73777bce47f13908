mod args;
mod error;

use args::Output;
use error::Error;
use oapi_discovery::{
    k8s_client::api::cluster_config::{ClusterConfig, Kubeconfig},
    Discovery, K8sClient, OapiDiscoveryClient,
};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = args::parse();

    let cluster_config = match &args.kubeconfig {
        Some(path) => ClusterConfig::from_kubeconfig(Kubeconfig::from_path(path)?)?,
        None => ClusterConfig::detect()?,
    };
    let retry_timeout = match args.retry_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let k8s_client = K8sClient::new(cluster_config)?.with_retry_timeout(retry_timeout);
    tracing::info!(server = %k8s_client.base_url(), "discovering resources");
    let discovery = OapiDiscoveryClient::new(k8s_client);

    match &args.group_version {
        Some(group_version) => print(args.output, &discovery.server_resources_for_group_version(group_version).await?),
        None => print(args.output, &discovery.server_resources().await?),
    }
}

fn print<T: Serialize>(output: Output, value: &T) -> Result<(), Error> {
    let out = match output {
        Output::Json => serde_json::to_string_pretty(value)?,
        Output::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", out);
    Ok(())
}
