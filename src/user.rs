use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{CloudcraftClient, Result};

/// Owner of the API key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Free-form UI settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug)]
pub struct UserService<'a> {
    client: &'a CloudcraftClient,
}

impl<'a> UserService<'a> {
    pub(crate) fn new(client: &'a CloudcraftClient) -> Self {
        Self { client }
    }

    /// Returns the user the API key belongs to.
    pub async fn me(&self) -> Result<User> {
        let url = self.client.resource_url(&["user", "me"])?;
        self.client.send(Method::GET, url).await?.json()
    }
}
