use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupVersion {
    #[serde(rename = "groupVersion")]
    pub group_version: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroup {
    /// Empty for the legacy ungrouped API.
    pub name: String,
    pub versions: Vec<ApiGroupVersion>,
    #[serde(rename = "preferredVersion", default, skip_serializing_if = "Option::is_none")]
    pub preferred_version: Option<ApiGroupVersion>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupList {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
}

impl ApiGroup {
    /// The ungrouped group built from `/api` versions, e.g. `v1` with group-version `v1`.
    pub fn legacy<I: IntoIterator<Item = String>>(versions: I) -> Self {
        let versions: Vec<_> = versions
            .into_iter()
            .map(|version| ApiGroupVersion {
                group_version: version.clone(),
                version,
            })
            .collect();
        Self {
            name: String::new(),
            preferred_version: versions.first().cloned(),
            versions,
        }
    }
}
