//! Blocking client for the Telegraph page API.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};
use crate::publish::{PageRequest, PageService};

pub const DEFAULT_TELEGRAPH_API: &str = "https://api.telegra.ph";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    path: String,
}

#[derive(Clone)]
pub struct TelegraphClient {
    api_base: String,
    http: ureq::Agent,
}

impl TelegraphClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, String> {
        let url = format!("{}/{method}", self.api_base);
        let response: ApiResponse<T> = self
            .http
            .post(&url)
            .send_json(body)
            .map_err(|e| e.to_string())?
            .into_json()
            .map_err(|e| format!("invalid {method} response: {e}"))?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(response
                .error
                .unwrap_or_else(|| format!("{method} returned no result"))),
        }
    }
}

impl PageService for TelegraphClient {
    fn create_account(&self, short_name: &str, author_name: &str) -> CatalogResult<String> {
        let account: Account = self
            .call(
                "createAccount",
                json!({ "short_name": short_name, "author_name": author_name }),
            )
            .map_err(|message| CatalogError::SessionInit { message })?;
        Ok(account.access_token)
    }

    fn create_page(&self, access_token: &str, page: &PageRequest<'_>) -> CatalogResult<String> {
        let body = json!({
            "access_token": access_token,
            "title": page.draft.title,
            "author_name": page.author_name,
            "author_url": page.author_url,
            "content": page.draft.to_nodes(),
            "return_content": false,
        });
        let created: Page = self
            .call("createPage", body)
            .map_err(|message| CatalogError::Publish {
                letter: page.draft.title.clone(),
                message,
            })?;
        Ok(created.path)
    }
}
