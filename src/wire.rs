use serde::Deserialize;

/// `GET aws/account` and `GET azure/account` envelope.
#[derive(Debug, Deserialize)]
pub struct AccountList<T> {
    pub accounts: Option<Vec<T>>,
}

/// `GET blueprint` envelope.
#[derive(Debug, Deserialize)]
pub struct BlueprintList<T> {
    pub blueprints: Option<Vec<T>>,
}
