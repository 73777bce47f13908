//! API discovery.
//!
//! [`DiscoveryClient`] lists what a plain apiserver serves. [`OapiDiscoveryClient`] wraps any
//! [`Discovery`] implementation and adds the resources of the legacy `/oapi` API to `v1`.

use crate::k8s_client::{
    api::{
        ApiGroup, ApiGroupList, ApiGroupListGetter, ApiResourceList, ApiVersionListGetter,
        GroupVersionResourcesGetter, LegacyResourcesGetter,
    },
    K8sClient, K8sClientError,
};
use async_trait::async_trait;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Group-version whose resources also live under `/oapi`.
pub const LEGACY_GROUP_VERSION: &str = "v1";
/// Retired group-version that is never reported.
pub const MASKED_GROUP_VERSION: &str = "v1beta3";

#[async_trait]
pub trait Discovery: Send + Sync {
    /// Groups the server advertises, the ungrouped `/api` versions first.
    async fn server_groups(&self) -> Result<ApiGroupList, K8sClientError>;

    /// Resources served for one group-version.
    async fn server_resources_for_group_version(&self, group_version: &str)
        -> Result<ApiResourceList, K8sClientError>;

    /// Resources of every advertised group-version. Fails as a whole on the first failed lookup.
    async fn server_resources(&self) -> Result<BTreeMap<String, ApiResourceList>, K8sClientError> {
        let groups = self.server_groups().await?;
        let mut result = BTreeMap::new();
        for group_version in extract_group_versions(&groups) {
            let resources = self.server_resources_for_group_version(&group_version).await?;
            result.insert(group_version, resources);
        }
        Ok(result)
    }
}

/// Every group-version of every group, in server order, without duplicates.
pub fn extract_group_versions(groups: &ApiGroupList) -> Vec<String> {
    groups
        .groups
        .iter()
        .flat_map(|group| group.versions.iter())
        .map(|version| version.group_version.clone())
        .unique()
        .collect()
}

#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    client: K8sClient,
}

impl DiscoveryClient {
    pub fn new(client: K8sClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Discovery for DiscoveryClient {
    async fn server_groups(&self) -> Result<ApiGroupList, K8sClientError> {
        let core = self.client.get(&ApiVersionListGetter).await?;
        let mut groups = match self.client.get(&ApiGroupListGetter).await {
            Ok(groups) => groups,
            // servers from before API groups existed
            Err(err) if err.is_not_found() || err.is_forbidden() => {
                tracing::debug!("no /apis endpoint, only the legacy API is served: {}", err);
                ApiGroupList::default()
            }
            Err(err) => return Err(err),
        };
        groups.groups.insert(0, ApiGroup::legacy(core.versions));
        Ok(groups)
    }

    async fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<ApiResourceList, K8sClientError> {
        if group_version.is_empty() {
            return Err(K8sClientError::InvalidGroupVersion(group_version.into()));
        }
        self.client.get(&GroupVersionResourcesGetter { group_version }).await
    }
}

/// Discovery that merges the legacy `/oapi` API into `v1` and hides `v1beta3`.
#[derive(Debug, Clone)]
pub struct OapiDiscoveryClient<D = DiscoveryClient> {
    delegate: D,
    client: K8sClient,
}

impl OapiDiscoveryClient<DiscoveryClient> {
    pub fn new(client: K8sClient) -> Self {
        Self {
            delegate: DiscoveryClient::new(client.clone()),
            client,
        }
    }
}

impl<D: Discovery> OapiDiscoveryClient<D> {
    /// Wraps an arbitrary discovery implementation; `client` is used for the `/oapi` lookups.
    pub fn with_delegate(delegate: D, client: K8sClient) -> Self {
        Self { delegate, client }
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }
}

#[async_trait]
impl<D: Discovery> Discovery for OapiDiscoveryClient<D> {
    async fn server_groups(&self) -> Result<ApiGroupList, K8sClientError> {
        self.delegate.server_groups().await
    }

    async fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<ApiResourceList, K8sClientError> {
        if group_version == MASKED_GROUP_VERSION {
            tracing::debug!(group_version, "masked");
            return Ok(ApiResourceList::default());
        }

        let mut resources = self.delegate.server_resources_for_group_version(group_version).await?;
        if group_version != LEGACY_GROUP_VERSION {
            return Ok(resources);
        }

        match self.client.get(&LegacyResourcesGetter { group_version }).await {
            Ok(legacy) => {
                tracing::debug!(
                    group_version,
                    primary = resources.resources.len(),
                    legacy = legacy.resources.len(),
                    "merging legacy resources"
                );
                resources.extend(legacy);
                Ok(resources)
            }
            // v1.0 servers have no /oapi, or hide it
            Err(err) if err.is_not_found() || err.is_forbidden() => {
                tracing::debug!(group_version, "legacy API absent: {}", err);
                Ok(resources)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::k8s_client::api::{cluster_config::ClusterConfig, ApiGroupVersion, ApiResource};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tokio_test::{assert_err, assert_ok};
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn resource_list(group_version: &str, names: &[&str]) -> serde_json::Value {
        let resources: Vec<_> = names
            .iter()
            .map(|name| json!({"name": name, "namespaced": true, "kind": "Kind", "verbs": ["get", "list"]}))
            .collect();
        json!({"kind": "APIResourceList", "groupVersion": group_version, "resources": resources})
    }

    fn names(list: &ApiResourceList) -> Vec<&str> {
        list.resources.iter().map(|r| r.name.as_str()).collect()
    }

    async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_status(server: &MockServer, at: &str, code: u16) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(code).set_body_string("failure"))
            .mount(server)
            .await;
    }

    fn oapi_client(server: &MockServer) -> OapiDiscoveryClient {
        let client = assert_ok!(K8sClient::new(ClusterConfig::insecure(server.uri())));
        OapiDiscoveryClient::new(client)
    }

    #[test]
    fn group_versions_in_order_without_duplicates() {
        let gv = |group_version: &str| ApiGroupVersion {
            group_version: group_version.into(),
            version: group_version.rsplit('/').next().unwrap_or_default().into(),
        };
        let groups = ApiGroupList {
            groups: vec![
                ApiGroup::legacy(vec!["v1".to_string()]),
                ApiGroup {
                    name: "apps".into(),
                    versions: vec![gv("apps/v1"), gv("apps/v1beta1")],
                    preferred_version: None,
                },
                ApiGroup {
                    name: "apps".into(),
                    versions: vec![gv("apps/v1")],
                    preferred_version: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(extract_group_versions(&groups), vec!["v1", "apps/v1", "apps/v1beta1"]);
    }

    #[tokio::test]
    async fn masked_version_is_empty_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let list = assert_ok!(oapi_client(&server).server_resources_for_group_version("v1beta3").await);
        assert_eq!(list, ApiResourceList::default());
    }

    #[tokio::test]
    async fn other_versions_pass_through() {
        let server = MockServer::start().await;
        mount_json(&server, "/apis/apps/v1", resource_list("apps/v1", &["deployments", "statefulsets"])).await;
        Mock::given(method("GET"))
            .and(path("/oapi/apps/v1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = oapi_client(&server);
        let merged = assert_ok!(client.server_resources_for_group_version("apps/v1").await);
        let plain = assert_ok!(client.delegate().server_resources_for_group_version("apps/v1").await);
        assert_eq!(merged, plain);
        assert_eq!(merged.group_version, "apps/v1");
        assert_eq!(names(&merged), vec!["deployments", "statefulsets"]);
    }

    #[tokio::test]
    async fn v1_appends_legacy_resources() {
        let server = MockServer::start().await;
        mount_json(&server, "/api/v1", resource_list("v1", &["pods", "services"])).await;
        mount_json(&server, "/oapi/v1", resource_list("v1", &["builds", "routes"])).await;

        let list = assert_ok!(oapi_client(&server).server_resources_for_group_version("v1").await);
        assert_eq!(list.group_version, "v1");
        assert_eq!(names(&list), vec!["pods", "services", "builds", "routes"]);
    }

    #[tokio::test]
    async fn v1_without_legacy_api() {
        for code in [404, 403] {
            let server = MockServer::start().await;
            mount_json(&server, "/api/v1", resource_list("v1", &["pods"])).await;
            mount_status(&server, "/oapi/v1", code).await;

            let list = assert_ok!(oapi_client(&server).server_resources_for_group_version("v1").await);
            assert_eq!(names(&list), vec!["pods"], "status {}", code);
        }
    }

    #[tokio::test]
    async fn v1_merge_behind_path_prefix() {
        let server = MockServer::start().await;
        mount_json(&server, "/k8s/clusters/c1/api/v1", resource_list("v1", &["pods"])).await;
        mount_json(&server, "/k8s/clusters/c1/oapi/v1", resource_list("v1", &["builds"])).await;

        let config = ClusterConfig::insecure(format!("{}/k8s/clusters/c1", server.uri()));
        let client = assert_ok!(K8sClient::new(config));
        let list = assert_ok!(OapiDiscoveryClient::new(client).server_resources_for_group_version("v1").await);
        assert_eq!(names(&list), vec!["pods", "builds"]);
    }

    #[tokio::test]
    async fn v1_legacy_failure_propagates() {
        let server = MockServer::start().await;
        mount_json(&server, "/api/v1", resource_list("v1", &["pods"])).await;
        mount_status(&server, "/oapi/v1", 500).await;

        let err = assert_err!(oapi_client(&server).server_resources_for_group_version("v1").await);
        assert_eq!(err.status().map(|s| s.code), Some(500));
    }

    #[tokio::test]
    async fn v1_primary_failure_skips_legacy() {
        let server = MockServer::start().await;
        mount_status(&server, "/api/v1", 404).await;
        Mock::given(method("GET"))
            .and(path("/oapi/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resource_list("v1", &["builds"])))
            .expect(0)
            .mount(&server)
            .await;

        let err = assert_err!(oapi_client(&server).server_resources_for_group_version("v1").await);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_group_version_is_rejected() {
        let server = MockServer::start().await;
        let err = assert_err!(oapi_client(&server).server_resources_for_group_version("").await);
        assert!(matches!(err, K8sClientError::InvalidGroupVersion(_)));
    }

    #[tokio::test]
    async fn server_groups_tolerates_missing_apis() {
        let server = MockServer::start().await;
        mount_json(&server, "/api", json!({"kind": "APIVersions", "versions": ["v1"]})).await;
        mount_status(&server, "/apis", 404).await;

        let groups = assert_ok!(oapi_client(&server).server_groups().await);
        assert_eq!(extract_group_versions(&groups), vec!["v1"]);
        assert_eq!(groups.groups[0].name, "");
    }

    #[tokio::test]
    async fn server_groups_propagates_apis_failure() {
        let server = MockServer::start().await;
        mount_json(&server, "/api", json!({"kind": "APIVersions", "versions": ["v1"]})).await;
        mount_status(&server, "/apis", 503).await;

        let err = assert_err!(oapi_client(&server).server_groups().await);
        assert_eq!(err.status().map(|s| s.code), Some(503));
    }

    async fn mount_cluster(server: &MockServer) {
        mount_json(&server, "/api", json!({"kind": "APIVersions", "versions": ["v1", "v1beta3"]})).await;
        mount_json(
            &server,
            "/apis",
            json!({
                "kind": "APIGroupList",
                "groups": [{
                    "name": "apps",
                    "versions": [{"groupVersion": "apps/v1", "version": "v1"}],
                    "preferredVersion": {"groupVersion": "apps/v1", "version": "v1"}
                }]
            }),
        )
        .await;
        mount_json(&server, "/api/v1", resource_list("v1", &["pods"])).await;
        mount_json(&server, "/apis/apps/v1", resource_list("apps/v1", &["deployments"])).await;
    }

    #[tokio::test]
    async fn server_resources_for_all_group_versions() {
        let server = MockServer::start().await;
        mount_cluster(&server).await;
        mount_json(&server, "/oapi/v1", resource_list("v1", &["builds"])).await;

        let client = oapi_client(&server);
        let all = assert_ok!(client.server_resources().await);
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["apps/v1", "v1", "v1beta3"]);
        assert_eq!(names(&all["v1"]), vec!["pods", "builds"]);
        assert_eq!(names(&all["apps/v1"]), vec!["deployments"]);
        assert!(all["v1beta3"].resources.is_empty());
        for (group_version, list) in &all {
            let single = assert_ok!(client.server_resources_for_group_version(group_version).await);
            assert_eq!(&single, list);
        }
    }

    #[tokio::test]
    async fn server_resources_aborts_on_first_failure() {
        let server = MockServer::start().await;
        mount_cluster(&server).await;
        mount_status(&server, "/oapi/v1", 500).await;

        let err = assert_err!(oapi_client(&server).server_resources().await);
        assert_eq!(err.status().map(|s| s.code), Some(500));
    }

    /// Records lookups and serves canned lists.
    struct Canned {
        lists: BTreeMap<String, ApiResourceList>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Discovery for Canned {
        async fn server_groups(&self) -> Result<ApiGroupList, K8sClientError> {
            Ok(ApiGroupList {
                groups: vec![ApiGroup::legacy(self.lists.keys().cloned())],
                ..Default::default()
            })
        }

        async fn server_resources_for_group_version(
            &self,
            group_version: &str,
        ) -> Result<ApiResourceList, K8sClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lists
                .get(group_version)
                .cloned()
                .ok_or_else(|| K8sClientError::InvalidGroupVersion(group_version.into()))
        }
    }

    #[tokio::test]
    async fn composes_with_any_delegate() {
        let server = MockServer::start().await;
        mount_status(&server, "/oapi/v1", 404).await;
        let pods = ApiResourceList {
            group_version: "v1".into(),
            resources: vec![ApiResource {
                name: "pods".into(),
                kind: "Pod".into(),
                namespaced: true,
                ..Default::default()
            }],
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let delegate = Canned {
            lists: vec![("v1".to_string(), pods.clone()), ("v1beta3".to_string(), pods.clone())]
                .into_iter()
                .collect(),
            calls: calls.clone(),
        };
        let client = assert_ok!(K8sClient::new(ClusterConfig::insecure(server.uri())));
        let discovery = OapiDiscoveryClient::with_delegate(delegate, client);

        let all = assert_ok!(discovery.server_resources().await);
        assert_eq!(all["v1"], pods);
        assert!(all["v1beta3"].resources.is_empty());
        // v1beta3 never reaches the delegate
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
