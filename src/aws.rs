use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    client::require, decode::decode_accounts, CloudcraftClient, Response, Result, SnapshotParams,
};

const PROVIDER: &str = "aws";

/// AWS account registered with Cloudcraft.
///
/// Empty strings and `None` are omitted when the account is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// ARN of the IAM role Cloudcraft assumes to scan the account.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role_arn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    #[serde(rename = "CreatorId", skip_serializing_if = "String::is_empty")]
    pub creator_id: String,
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

/// Parameters for creating the IAM role Cloudcraft assumes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IamParams {
    pub account_id: String,
    pub external_id: String,
    pub aws_console_url: String,
}

/// Minimal IAM policy required by Cloudcraft.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IamPolicy {
    pub version: String,
    pub statement: Vec<IamStatement>,
}

/// Statement of an [`IamPolicy`]; `Action` and `Resource` may be a string
/// or a list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IamStatement {
    pub action: serde_json::Value,
    pub resource: serde_json::Value,
    pub effect: String,
}

/// Operations on the `aws/account` endpoints.
#[derive(Clone, Copy, Debug)]
pub struct AwsService<'a> {
    client: &'a CloudcraftClient,
}

impl<'a> AwsService<'a> {
    pub(crate) fn new(client: &'a CloudcraftClient) -> Self {
        Self { client }
    }

    /// Lists registered AWS accounts.
    pub async fn list(&self) -> Result<Vec<AwsAccount>> {
        let url = self.client.resource_url(&[PROVIDER, "account"])?;
        let response = self.client.send(Method::GET, url).await?;
        decode_accounts(&response)
    }

    /// Registers an AWS account. `name` and `role_arn` are required.
    pub async fn create(&self, account: &AwsAccount) -> Result<AwsAccount> {
        require(&account.name, "account name")?;
        require(&account.role_arn, "role ARN")?;

        let url = self.client.resource_url(&[PROVIDER, "account"])?;
        self.client
            .send_json(Method::POST, url, account)
            .await?
            .json()
    }

    /// Updates a registered account. `id`, `name` and `role_arn` are required.
    pub async fn update(&self, account: &AwsAccount) -> Result<Response> {
        require(&account.id, "account ID")?;
        require(&account.name, "account name")?;
        require(&account.role_arn, "role ARN")?;

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

    /// Renders a live diagram of an account region.
    ///
    /// An empty `format` means `png`. The image bytes are in
    /// [`Response::body`].
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

    /// Returns the parameters for the IAM role Cloudcraft assumes.
    pub async fn iam_parameters(&self) -> Result<IamParams> {
        let url = self
            .client
            .resource_url(&[PROVIDER, "account", "iamParameters"])?;
        self.client.send(Method::GET, url).await?.json()
    }

    /// Returns the minimal IAM policy Cloudcraft needs.
    pub async fn iam_policy(&self) -> Result<IamPolicy> {
        let url = self.client.resource_url(&[
            PROVIDER,
            "account",
            "iamParameters",
            "policy",
            "minimal",
        ])?;
        self.client.send(Method::GET, url).await?.json()
    }
}
