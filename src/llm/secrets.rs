use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::palette::Palette;
use crate::utils::{get_data_dir, strip_controls_and_escapes, trim_line};

pub const API_KEY_ENV: &str = "LEXED_OPENAI_API_KEY";

const AUTH_FILE_NAME: &str = "auth.json";
const OPENAI_PROVIDER: &str = "openai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub source: ApiKeySource,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

/// The credentials file, kept apart from the rest of the program so the
/// language service only ever receives a plain key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn open_default() -> Result<Self> {
        let data_dir = get_data_dir()?;
        Ok(Self::at(data_dir.join(AUTH_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment variable first, then the auth file.
    pub fn lookup(&self) -> Result<Option<ApiKey>> {
        self.lookup_with_env(env::var(API_KEY_ENV).ok())
    }

    fn lookup_with_env(&self, env_value: Option<String>) -> Result<Option<ApiKey>> {
        if let Some(value) = env_value
            && let Some(key) = trim_line(&value)
        {
            return Ok(Some(ApiKey {
                key: key.to_string(),
                source: ApiKeySource::Environment,
            }));
        }

        let Some(auth) = read_auth_file(&self.path)? else {
            return Ok(None);
        };

        Ok(auth
            .providers
            .get(OPENAI_PROVIDER)
            .and_then(|entry| trim_line(&entry.key))
            .map(|key| ApiKey {
                key: key.to_string(),
                source: ApiKeySource::AuthFile,
            }))
    }

    pub fn store(&self, api_key: &str) -> Result<()> {
        let trimmed = trim_line(api_key).context("Cannot store an empty API key")?;

        let mut auth = read_auth_file(&self.path)?.unwrap_or_default();
        auth.providers.insert(
            OPENAI_PROVIDER.to_string(),
            ProviderAuth {
                key: trimmed.to_string(),
            },
        );

        write_auth_file(&self.path, &auth)?;
        info!(path = %self.path.display(), "stored API key");
        Ok(())
    }

    /// Returns whether a key was removed.
    pub fn clear(&self) -> Result<bool> {
        let Some(mut auth) = read_auth_file(&self.path)? else {
            return Ok(false);
        };

        if auth.providers.remove(OPENAI_PROVIDER).is_none() {
            return Ok(false);
        }

        if auth.providers.is_empty() {
            fs::remove_file(&self.path).with_context(|| {
                format!(
                    "Failed to remove empty auth file at {}",
                    self.path.display()
                )
            })?;
        } else {
            write_auth_file(&self.path, &auth)?;
        }
        info!(path = %self.path.display(), "cleared API key");
        Ok(true)
    }
}

pub fn prompt_for_api_key(reason: &str) -> Result<String> {
    println!("\n{}", reason);
    println!(
        "{} (https://platform.openai.com/account/api-keys). It's stored locally for future use.",
        Palette::paint(Palette::SUCCESS, "Enter your OpenAI API key")
    );
    println!("{}", Palette::dim("Leave the field blank to cancel."));
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read the API key")?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(password.trim().to_string())
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_auth_contents(&contents, path)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            let context = format!("Failed to read auth file at {}", path.display());
            Err(err).context(context)
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    let contents = serialize_auth(value)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write auth file at {}", path.display()))
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<AuthFile> {
    if contents.trim().is_empty() {
        return Ok(AuthFile::default());
    }

    serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}
