use super::error::ClusterConfigError;
use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Kubeconfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cluster {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: Option<String>,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: User,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct User {
    #[serde(rename = "client-certificate-data")]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data")]
    pub client_key_data: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
}

impl Kubeconfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Kubeconfig, ClusterConfigError> {
        let file = fs::File::open(path.as_ref()).map_err(|err| ClusterConfigError::FileOpen {
            path: path.as_ref().into(),
            err,
        })?;
        let kubeconfig: Kubeconfig =
            serde_yaml::from_reader(file).map_err(|err| ClusterConfigError::FileDeserialize {
                path: path.as_ref().into(),
                err,
            })?;
        Ok(kubeconfig)
    }

    pub fn from_default_path() -> Option<Result<Kubeconfig, ClusterConfigError>> {
        let homedir = dirs::home_dir()?;
        let path = homedir.join(".kube").join("config");
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => return None,
                _ => return Some(Err(ClusterConfigError::FileOpen { path, err })),
            },
        };
        Some(serde_yaml::from_reader(file).map_err(|err| ClusterConfigError::FileDeserialize { path, err }))
    }

    pub fn from_env() -> Option<Result<Self, ClusterConfigError>> {
        // only the first entry of a path list is honoured, entries are not merged
        let paths = std::env::var_os("KUBECONFIG")?;
        let path = std::env::split_paths(&paths).next()?;
        Some(Self::from_path(path))
    }
}
