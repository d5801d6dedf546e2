use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    client::require, decode::decode_accounts, CloudcraftClient, Response, Result, SnapshotParams,
};

const PROVIDER: &str = "azure";

/// Azure account registered with Cloudcraft.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AzureAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub application_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub directory_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,
    /// Client secret of the service principal; only ever sent, never returned.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(rename = "CreatorId", skip_serializing_if = "String::is_empty")]
    pub creator_id: String,
    #[serde(rename = "CustomerId", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_access: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_access: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AzureAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("application_id", &self.application_id)
            .field("directory_id", &self.directory_id)
            .field("subscription_id", &self.subscription_id)
            .field("client_secret", &"<redacted>")
            .field("creator_id", &self.creator_id)
            .field("customer_id", &self.customer_id)
            .field("hint", &self.hint)
            .field("source", &self.source)
            .field("read_access", &self.read_access)
            .field("write_access", &self.write_access)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl AzureAccount {
    fn validate(&self) -> Result<()> {
        require(&self.name, "account name")?;
        require(&self.application_id, "application ID")?;
        require(&self.directory_id, "directory ID")?;
        require(&self.subscription_id, "subscription ID")?;
        require(&self.client_secret, "client secret")
    }
}

/// Operations on the `azure/account` endpoints.
#[derive(Clone, Copy, Debug)]
pub struct AzureService<'a> {
    client: &'a CloudcraftClient,
}

impl<'a> AzureService<'a> {
    pub(crate) fn new(client: &'a CloudcraftClient) -> Self {
        Self { client }
    }

    /// Lists registered Azure accounts.
    pub async fn list(&self) -> Result<Vec<AzureAccount>> {
        let url = self.client.resource_url(&[PROVIDER, "account"])?;
        let response = self.client.send(Method::GET, url).await?;
        decode_accounts(&response)
    }

    /// Registers an Azure account.
    ///
    /// `name`, `application_id`, `directory_id`, `subscription_id` and
    /// `client_secret` are required.
    pub async fn create(&self, account: &AzureAccount) -> Result<AzureAccount> {
        account.validate()?;

        let url = self.client.resource_url(&[PROVIDER, "account"])?;
        self.client
            .send_json(Method::POST, url, account)
            .await?
            .json()
    }

    /// Updates a registered account; requires `id` plus the fields required
    /// by [`AzureService::create`].
    pub async fn update(&self, account: &AzureAccount) -> Result<Response> {
        require(&account.id, "account ID")?;
        account.validate()?;

        let url = self
            .client
            .resource_url(&[PROVIDER, "account", account.id.as_str()])?;
        self.client.send_json(Method::PUT, url, account).await
    }

    /// Unregisters an account.
    pub async fn delete(&self, id: &str) -> Result<Response> {
        require(id, "account ID")?;

        let url = self.client.resource_url(&[PROVIDER, "account", id])?;
        self.client.send(Method::DELETE, url).await
    }

    /// Renders a live diagram of an account region; an empty `format` means
    /// `png`.
    pub async fn snapshot(
        &self,
        id: &str,
        region: &str,
        format: &str,
        params: &SnapshotParams,
    ) -> Result<Response> {
        self.client
            .account_snapshot(PROVIDER, id, region, format, params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::AzureAccount;
    use crate::CloudcraftError;

    fn complete() -> AzureAccount {
        AzureAccount {
            name: "prod".to_owned(),
            application_id: "app".to_owned(),
            directory_id: "dir".to_owned(),
            subscription_id: "sub".to_owned(),
            client_secret: "s3cr3t".to_owned(),
            ..AzureAccount::default()
        }
    }

    #[test]
    fn validate_names_first_missing_field() {
        complete().validate().expect("complete account must validate");

        let account = AzureAccount {
            directory_id: String::new(),
            ..complete()
        };
        assert!(matches!(
            account.validate(),
            Err(CloudcraftError::InvalidArgument {
                field: "directory ID"
            })
        ));
    }

    #[test]
    fn debug_redacts_client_secret() {
        let debug = format!("{:?}", complete());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("s3cr3t"));
    }
}
