use chrono::{DateTime, Utc};
use reqwest::{
    header::{self, HeaderValue},
    Method,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::require,
    decode::decode_blueprints,
    params::{DEFAULT_BUDGET_FORMAT, DEFAULT_SNAPSHOT_FORMAT},
    BudgetExportParams, CloudcraftClient, CloudcraftError, ImageExportParams, Response, Result,
};

const BLUEPRINT: &str = "blueprint";

/// Diagram document stored in Cloudcraft.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BlueprintData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_access: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_access: Option<Vec<String>>,
    #[serde(rename = "CustomerId", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(rename = "CreatorId", skip_serializing_if = "String::is_empty")]
    pub creator_id: String,
    #[serde(rename = "CurrentVersionId", skip_serializing_if = "String::is_empty")]
    pub current_version_id: String,
    #[serde(rename = "LastUserId", skip_serializing_if = "String::is_empty")]
    pub last_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Diagram content. Element lists are kept as raw JSON objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlueprintData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub projection: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub grid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_account: Option<LiveAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_options: Option<LiveOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_layers: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub version: i64,
    #[serde(skip_serializing_if = "is_false")]
    pub share_docs: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base: String,
}

/// Cloud account a live blueprint is linked to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_types: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub auto_label: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub auto_connect: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub updates_enabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub update_all_on_scan: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub update_groups_on_scan: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub update_node_on_select: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Operations on the `blueprint` endpoints.
#[derive(Clone, Copy, Debug)]
pub struct BlueprintService<'a> {
    client: &'a CloudcraftClient,
}

impl<'a> BlueprintService<'a> {
    pub(crate) fn new(client: &'a CloudcraftClient) -> Self {
        Self { client }
    }

    /// Lists blueprints visible to the API key.
    pub async fn list(&self) -> Result<Vec<Blueprint>> {
        let url = self.client.resource_url(&[BLUEPRINT])?;
        let response = self.client.send(Method::GET, url).await?;
        decode_blueprints(&response)
    }

    pub async fn get(&self, id: &str) -> Result<Blueprint> {
        self.get_with_etag(id).await.map(|(blueprint, _)| blueprint)
    }

    /// Fetches a blueprint and its `ETag`, for use with
    /// [`BlueprintService::update`].
    pub async fn get_with_etag(&self, id: &str) -> Result<(Blueprint, Option<String>)> {
        require(id, "blueprint ID")?;

        let url = self.client.resource_url(&[BLUEPRINT, id])?;
        let response = self.client.send(Method::GET, url).await?;
        let blueprint = response.json()?;
        Ok((blueprint, response.etag().map(str::to_owned)))
    }

    pub async fn create(&self, blueprint: &Blueprint) -> Result<Blueprint> {
        let url = self.client.resource_url(&[BLUEPRINT])?;
        self.client
            .send_json(Method::POST, url, blueprint)
            .await?
            .json()
    }

    /// Replaces a blueprint.
    ///
    /// With an `etag`, the update is conditional (`If-Match`) and fails with
    /// status 412 if the blueprint changed since it was read.
    pub async fn update(&self, blueprint: &Blueprint, etag: Option<&str>) -> Result<Response> {
        require(&blueprint.id, "blueprint ID")?;

        let url = self
            .client
            .resource_url(&[BLUEPRINT, blueprint.id.as_str()])?;
        let mut request = self.client.prepare_json(Method::PUT, url, blueprint)?;
        if let Some(etag) = etag.filter(|etag| !etag.is_empty()) {
            let value = HeaderValue::from_str(etag)
                .map_err(|_| CloudcraftError::InvalidArgument { field: "etag" })?;
            request = request.header(header::IF_MATCH, value);
        }

        self.client.execute(request).await
    }

    pub async fn delete(&self, id: &str) -> Result<Response> {
        require(id, "blueprint ID")?;

        let url = self.client.resource_url(&[BLUEPRINT, id])?;
        self.client.send(Method::DELETE, url).await
    }

    /// Renders a blueprint as an image; an empty `format` means `png`.
    pub async fn export_image(
        &self,
        id: &str,
        format: &str,
        params: &ImageExportParams,
    ) -> Result<Response> {
        require(id, "blueprint ID")?;
        let format = if format.is_empty() {
            DEFAULT_SNAPSHOT_FORMAT
        } else {
            format
        };

        let mut url = self.client.resource_url(&[BLUEPRINT, id, format])?;
        params.query().apply(&mut url);
        self.client.send(Method::GET, url).await
    }

    /// Exports the cost estimate of a blueprint; an empty `format` means
    /// `csv`.
    pub async fn export_budget(
        &self,
        id: &str,
        format: &str,
        params: &BudgetExportParams,
    ) -> Result<Response> {
        require(id, "blueprint ID")?;
        let format = if format.is_empty() {
            DEFAULT_BUDGET_FORMAT
        } else {
            format
        };

        let mut url = self
            .client
            .resource_url(&[BLUEPRINT, id, "budget", format])?;
        params.query().apply(&mut url);
        self.client.send(Method::GET, url).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Blueprint, BlueprintData, LiveAccount};

    #[test]
    fn blueprint_round_trips_api_shape() {
        let raw = json!({
            "id": "bp1",
            "name": "Prod",
            "CreatorId": "u1",
            "CurrentVersionId": "v9",
            "data": {
                "grid": "standard",
                "liveAccount": {"id": "a1", "type": "aws"},
                "nodes": [{"id": "n1", "type": "ec2"}],
                "version": 4,
                "shareDocs": true
            }
        });

        let blueprint: Blueprint = serde_json::from_value(raw.clone()).expect("must decode");
        let data = blueprint.data.as_ref().expect("data");
        assert_eq!(blueprint.current_version_id, "v9");
        assert_eq!(
            data.live_account,
            Some(LiveAccount {
                id: "a1".to_owned(),
                kind: "aws".to_owned()
            })
        );
        assert_eq!(data.nodes.len(), 1);

        assert_eq!(serde_json::to_value(&blueprint).expect("must encode"), raw);
    }

    #[test]
    fn empty_data_serializes_to_empty_object() {
        let blueprint = Blueprint {
            name: "Empty".to_owned(),
            data: Some(BlueprintData::default()),
            ..Blueprint::default()
        };
        assert_eq!(
            serde_json::to_value(&blueprint).expect("must encode"),
            json!({"name": "Empty", "data": {}})
        );
    }
}
