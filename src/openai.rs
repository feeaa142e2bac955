//! OpenAI-compatible client construction.
//!
//! Credentials and base URL are passed in by the caller; nothing here reads the
//! environment or the filesystem.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for an OpenAI-compatible API with a request timeout.
pub fn create_client(base_url: &str, api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
