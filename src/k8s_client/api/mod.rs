mod api_group;
mod api_resource;
mod api_version;
pub mod cluster_config;
mod status;

pub use api_group::{ApiGroup, ApiGroupList, ApiGroupVersion};
pub use api_resource::{ApiResource, ApiResourceList};
pub use api_version::{ApiVersions, Cidr};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
pub use status::{Status, REASON_FORBIDDEN, REASON_NOT_FOUND};

/// Prefix of the legacy, ungrouped OpenShift API.
pub const LEGACY_API_PREFIX: &str = "/oapi";

pub trait ApiGetter {
    type Output;
    fn get(&self) -> Req<Self::Output>;
}

#[derive(Debug, thiserror::Error)]
pub enum K8sApiError {
    #[error("Unexpected status [{}]: {} ({})", .code, .status.message, .status.reason)]
    UnexpectedStatus { code: StatusCode, status: Status },
    #[error("Deserialization error: {:?}", _0)]
    Deserialize(#[from] serde_json::Error),
}

impl K8sApiError {
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(status.reason.as_str()),
            Self::Deserialize(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct Req<T> {
    pub method: Method,
    pub absolute_path: String,
    pub status_check: fn(StatusCode) -> bool,
    pub response: fn(&[u8]) -> Result<T, K8sApiError>,
}

impl<T> fmt::Debug for Req<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Req")
            .field("method", &self.method)
            .field("absolute_path", &self.absolute_path)
            .field("response", &"fn(...)")
            .finish()
    }
}

impl<T: DeserializeOwned> Req<T> {
    fn get_json<S: Into<String>>(absolute_path: S) -> Self {
        Self {
            method: Method::GET,
            absolute_path: absolute_path.into(),
            status_check: |status_code| status_code.is_success(),
            response: |resp| Ok(serde_json::from_slice(resp)?),
        }
    }
}

/// `GET /api`
#[derive(Debug, Clone)]
pub struct ApiVersionListGetter;
impl ApiGetter for ApiVersionListGetter {
    type Output = ApiVersions;
    fn get(&self) -> Req<Self::Output> {
        Req::get_json("/api")
    }
}

/// `GET /apis`
#[derive(Debug, Clone)]
pub struct ApiGroupListGetter;
impl ApiGetter for ApiGroupListGetter {
    type Output = ApiGroupList;
    fn get(&self) -> Req<Self::Output> {
        Req::get_json("/apis")
    }
}

/// Resources of one group-version: `/api/<version>` for bare versions,
/// `/apis/<group>/<version>` otherwise.
#[derive(Debug, Clone)]
pub struct GroupVersionResourcesGetter<'a> {
    pub group_version: &'a str,
}
impl<'a> ApiGetter for GroupVersionResourcesGetter<'a> {
    type Output = ApiResourceList;
    fn get(&self) -> Req<Self::Output> {
        let path = if self.group_version.contains('/') {
            format!("/apis/{}", self.group_version)
        } else {
            format!("/api/{}", self.group_version)
        };
        Req::get_json(path)
    }
}

/// Resources served under the legacy prefix, `/oapi/<version>`.
#[derive(Debug, Clone)]
pub struct LegacyResourcesGetter<'a> {
    pub group_version: &'a str,
}
impl<'a> ApiGetter for LegacyResourcesGetter<'a> {
    type Output = ApiResourceList;
    fn get(&self) -> Req<Self::Output> {
        Req::get_json(format!("{}/{}", LEGACY_API_PREFIX, self.group_version))
    }
}
