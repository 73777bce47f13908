use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    Json,
    Yaml,
}

impl FromStr for Output {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format {:?}, expected json or yaml", other)),
        }
    }
}

/// List the resources an apiserver serves, including the legacy /oapi resources.
#[derive(Debug, StructOpt)]
#[structopt(name = "oapi-discovery")]
pub struct Args {
    /// Kubeconfig to use instead of $KUBECONFIG, the in-cluster service account or ~/.kube/config
    #[structopt(long, parse(from_os_str))]
    pub kubeconfig: Option<PathBuf>,
    /// Only list this group-version, e.g. "v1" or "apps/v1"
    #[structopt(long = "group-version")]
    pub group_version: Option<String>,
    /// json or yaml
    #[structopt(long, default_value = "json")]
    pub output: Output,
    /// Seconds to keep retrying connection errors, 0 retries forever
    #[structopt(long = "retry-timeout", default_value = "30")]
    pub retry_timeout: u64,
}

pub fn parse() -> Args {
    Args::from_args()
}
