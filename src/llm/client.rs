use std::future::Future;

use anyhow::{Result, anyhow, bail};
use async_openai::{Client, config::OpenAIConfig};
use tracing::{info, warn};

use super::config::ServiceConfig;
use super::error::ServiceError;
use super::secrets::{API_KEY_ENV, ApiKeySource, KeyStore, prompt_for_api_key};
use super::service::OpenAiService;
use crate::palette::Palette;
use crate::tui::describe_service_error;

const MISSING_KEY_HINT: &str = "run `lexed llm --set <KEY>`";
const MAX_KEY_ATTEMPTS: usize = 3;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyCheck {
    Stored,
    Rejected(ServiceError),
}

/// Builds the language service, asking for an API key when none is configured.
/// A typed key is only saved once the API has accepted it.
pub async fn ensure_service(store: &KeyStore, reason: &str) -> Result<OpenAiService> {
    let key = match store.lookup()? {
        Some(found) => {
            let source = found.source.description();
            info!(source, "using configured API key");
            found.key
        }
        None => prompt_for_valid_key(store, reason).await?,
    };

    let client = initialize_client(&key);
    Ok(OpenAiService::new(client, ServiceConfig::from_env()))
}

pub async fn test_configured_api_key(store: &KeyStore) -> Result<ApiKeySource> {
    let found = store.lookup()?.ok_or_else(|| {
        anyhow!(
            "No API key configured. Set {} or {}.",
            API_KEY_ENV,
            MISSING_KEY_HINT
        )
    })?;
    let client = initialize_client(&found.key);
    verify_key(&client)
        .await
        .map_err(|err| anyhow!(describe_service_error(&err)))?;
    Ok(found.source)
}

async fn prompt_for_valid_key(store: &KeyStore, reason: &str) -> Result<String> {
    let mut message = reason.to_string();

    for _ in 0..MAX_KEY_ATTEMPTS {
        let api_key = prompt_for_api_key(&message)?;
        if api_key.is_empty() {
            bail!(
                "No API key provided. Set {} or {}.",
                API_KEY_ENV,
                MISSING_KEY_HINT
            );
        }

        let client = initialize_client(&api_key);
        match store_if_valid(store, &api_key, verify_key(&client)).await? {
            KeyCheck::Stored => return Ok(api_key),
            KeyCheck::Rejected(err) => {
                message = Palette::paint(Palette::DANGER, describe_service_error(&err));
            }
        }
    }

    bail!("The API key could not be verified. Check it and try again.")
}

/// Saves `api_key` only when `verify` succeeds.
pub(crate) async fn store_if_valid<F>(
    store: &KeyStore,
    api_key: &str,
    verify: F,
) -> Result<KeyCheck>
where
    F: Future<Output = Result<(), ServiceError>>,
{
    if let Err(err) = verify.await {
        warn!(error = %err, "API key rejected, not storing it");
        return Ok(KeyCheck::Rejected(err));
    }
    store.store(api_key)?;
    Ok(KeyCheck::Stored)
}

fn initialize_client(api_key: &str) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new().with_api_key(api_key);
    Client::with_config(config)
}

async fn verify_key(client: &Client<OpenAIConfig>) -> Result<(), ServiceError> {
    client.models().list().await?;
    Ok(())
}
