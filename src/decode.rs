use serde::de::DeserializeOwned;

use crate::{
    wire::{AccountList, BlueprintList},
    CloudcraftError, Response, Result,
};

pub(crate) fn decode_accounts<T: DeserializeOwned>(response: &Response) -> Result<Vec<T>> {
    let list: AccountList<T> = response.json()?;
    list.accounts
        .ok_or(CloudcraftError::MissingKey { key: "accounts" })
}

pub(crate) fn decode_blueprints<T: DeserializeOwned>(response: &Response) -> Result<Vec<T>> {
    let list: BlueprintList<T> = response.json()?;
    list.blueprints
        .ok_or(CloudcraftError::MissingKey { key: "blueprints" })
}
