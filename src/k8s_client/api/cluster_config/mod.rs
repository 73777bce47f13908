mod error;
mod kubeconfig;

pub use error::ClusterConfigError;
pub use kubeconfig::Kubeconfig;
use reqwest::{header::HeaderValue, Certificate, Identity};
use std::{
    fs,
    io::{self, BufReader, Read},
};
use ClusterConfigError as Error;

pub enum AuthMethod {
    Identity(Identity),
    Token(HeaderValue),
    None,
}

pub struct ClusterConfig {
    pub server: String,
    pub cacert: Option<Certificate>,
    pub auth: AuthMethod,
    pub accept_invalid_certs: bool,
}

impl ClusterConfig {
    /// Plain config for a server that needs neither TLS material nor credentials.
    pub fn insecure<S: Into<String>>(server: S) -> Self {
        Self {
            server: server.into(),
            cacert: None,
            auth: AuthMethod::None,
            accept_invalid_certs: false,
        }
    }

    pub fn in_cluster() -> Option<Result<Self, Error>> {
        const TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
        const CACERT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

        let token = match fs::File::open(TOKEN_PATH) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => return None,
                _ => {
                    return Some(Err(Error::FileOpen {
                        path: TOKEN_PATH.into(),
                        err,
                    }))
                }
            },
        };
        return Some(in_cluster_inner(token));

        fn read_to_vec(file: fs::File) -> Result<Vec<u8>, io::Error> {
            let mut buf = Vec::new();
            BufReader::new(file).read_to_end(&mut buf)?;
            Ok(buf)
        }
        fn read_token(mut file: fs::File) -> Result<String, io::Error> {
            let mut buf = String::new();
            file.read_to_string(&mut buf)?;
            Ok(buf)
        }
        fn in_cluster_inner(token_file: fs::File) -> Result<ClusterConfig, Error> {
            let cacert_file = fs::File::open(CACERT_PATH).map_err(|err| Error::FileOpen {
                path: CACERT_PATH.into(),
                err,
            })?;

            let cacert = read_to_vec(cacert_file).map_err(|err| Error::FileRead {
                path: CACERT_PATH.into(),
                err,
            })?;
            let token = read_token(token_file).map_err(|err| Error::FileRead {
                path: TOKEN_PATH.into(),
                err,
            })?;
            Ok(ClusterConfig {
                auth: bearer(&token)?,
                cacert: Some(Certificate::from_pem(&cacert).map_err(Error::Certificate)?),
                server: "https://kubernetes.default.svc:443".into(),
                accept_invalid_certs: false,
            })
        }
    }

    pub fn from_kubeconfig(k: Kubeconfig) -> Result<Self, Error> {
        let current_context = k.current_context;
        let context = k
            .contexts
            .into_iter()
            .find(|c| c.name == current_context)
            .ok_or(Error::MissingContext(current_context))?
            .context;
        let current_cluster = context.cluster;
        let current_user = context.user;

        let cluster = k
            .clusters
            .into_iter()
            .find(|c| c.name == current_cluster)
            .ok_or(Error::MissingCluster(current_cluster))?
            .cluster;

        let user = k
            .users
            .into_iter()
            .find(|u| u.name == current_user)
            .ok_or_else(|| Error::MissingUser(current_user.clone()))?
            .user;

        let auth = match (user.client_certificate_data, user.client_key_data, user.token) {
            (Some(cert), Some(key), _) => {
                let client_cert_data = base64::decode(cert).map_err(Error::InvalidBase64Cert)?;
                let mut pem = base64::decode(key).map_err(Error::InvalidBase64Key)?;
                pem.push(b'\n');
                pem.extend_from_slice(&client_cert_data);
                AuthMethod::Identity(Identity::from_pem(&pem).map_err(Error::Identity)?)
            }
            (Some(_), None, _) | (None, Some(_), _) => return Err(Error::IncompleteIdentity(current_user)),
            (_, _, Some(token)) => bearer(&token)?,
            _ => AuthMethod::None,
        };

        let cacert = match cluster.certificate_authority_data {
            Some(data) => {
                let cacert_data = base64::decode(data).map_err(Error::InvalidBase64Cacert)?;
                Some(Certificate::from_pem(&cacert_data).map_err(Error::Certificate)?)
            }
            None => None,
        };

        Ok(Self {
            auth,
            cacert,
            server: cluster.server,
            accept_invalid_certs: cluster.insecure_skip_tls_verify,
        })
    }

    pub fn detect() -> Result<Self, Error> {
        let cc = match Kubeconfig::from_env() {
            Some(r) => Self::from_kubeconfig(r?)?,
            None => match Self::in_cluster() {
                Some(cc) => cc?,
                None => match Kubeconfig::from_default_path() {
                    Some(r) => Self::from_kubeconfig(r?)?,
                    None => return Err(Error::Detect),
                },
            },
        };
        tracing::debug!(server = cc.server.as_str(), "detected cluster config");
        Ok(cc)
    }
}

fn bearer(token: &str) -> Result<AuthMethod, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(Error::InvalidToken)?;
    value.set_sensitive(true);
    Ok(AuthMethod::Token(value))
}
