use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub kind: String,
    pub name: String,
    pub namespaced: bool,
    #[serde(rename = "shortNames", default, skip_serializing_if = "Option::is_none")]
    pub short_names: Option<Vec<String>>,
    // older servers (and the `/oapi` endpoint) leave this out
    #[serde(rename = "singularName", default)]
    pub singular_name: String,
    #[serde(rename = "storageVersionHash", default, skip_serializing_if = "Option::is_none")]
    pub storage_version_hash: Option<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Resources served for one group-version, in server order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResourceList {
    #[serde(rename = "groupVersion", default)]
    pub group_version: String,
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

impl ApiResourceList {
    /// Appends `other`'s resources after our own, keeping both orders.
    pub fn extend(&mut self, other: ApiResourceList) {
        self.resources.extend(other.resources);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_legacy_list_without_optional_fields() {
        let body = r#"{
            "kind": "APIResourceList",
            "groupVersion": "v1",
            "resources": [
                {"name": "builds", "namespaced": true, "kind": "Build", "verbs": ["get", "list"]},
                {"name": "builds/log", "namespaced": true, "kind": "BuildLog"}
            ]
        }"#;
        let list: ApiResourceList = serde_json::from_str(body).unwrap();
        assert_eq!(list.group_version, "v1");
        assert_eq!(list.resources.len(), 2);
        assert_eq!(list.resources[0].singular_name, "");
        assert_eq!(list.resources[0].verbs, vec!["get", "list"]);
        assert!(list.resources[1].verbs.is_empty());
    }

    #[test]
    fn extend_keeps_order() {
        let res = |name: &str| ApiResource {
            name: name.into(),
            ..Default::default()
        };
        let mut list = ApiResourceList {
            group_version: "v1".into(),
            resources: vec![res("pods"), res("services")],
        };
        list.extend(ApiResourceList {
            group_version: "v1".into(),
            resources: vec![res("builds")],
        });
        let names: Vec<_> = list.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["pods", "services", "builds"]);
    }
}
