//! `reqwest` implementation of [`HubClient`].

use std::collections::BTreeMap;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use homepilot_app::ports::HubClient;
use homepilot_domain::error::HubError;
use homepilot_domain::hub::{HubArea, HubState, ServiceCall};

use crate::config::HubConfig;
use crate::error::HubSetupError;

/// Entry of the hub's entity registry; only the fields we read.
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    entity_id: String,
    #[serde(default)]
    area_id: Option<String>,
}

fn unreachable(err: reqwest::Error) -> HubError {
    HubError::Unreachable(Box::new(err))
}

fn ensure_success(response: Response) -> Result<Response, HubError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HubError::Rejected {
            status: status.as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HubError> {
    let bytes = response.bytes().await.map_err(unreachable)?;
    serde_json::from_slice(&bytes).map_err(|err| HubError::InvalidResponse(Box::new(err)))
}

/// Slug used as the id of an area derived from state attributes.
fn area_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Areas named in the `area` attribute of states, first occurrence wins.
fn areas_from_states(states: &[HubState]) -> Vec<HubArea> {
    let mut areas = BTreeMap::new();
    for state in states {
        let Some(name) = state
            .attributes
            .get("area")
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.is_empty())
        else {
            continue;
        };
        areas.entry(name.to_string()).or_insert_with(|| HubArea {
            area_id: area_slug(name),
            name: name.to_string(),
        });
    }
    areas.into_values().collect()
}

/// HTTP client for the hub REST API.
#[derive(Debug, Clone)]
pub struct ReqwestHubClient {
    client: Client,
    config: HubConfig,
}

impl ReqwestHubClient {
    /// Build a client that authenticates with the configured token and
    /// bounds every request by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HubSetupError`] if the token is not a valid header value or
    /// the TLS backend fails to initialise.
    pub fn new(config: HubConfig) -> Result<Self, HubSetupError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(HubSetupError::InvalidToken)?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(HubSetupError::Client)?;

        Ok(Self { client, config })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, HubError> {
        let response = self
            .client
            .get(self.config.api_url(path))
            .send()
            .await
            .map_err(unreachable)?;
        decode(ensure_success(response)?).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<(), HubError> {
        let response = self
            .client
            .post(self.config.api_url(path))
            .json(body)
            .send()
            .await
            .map_err(unreachable)?;
        ensure_success(response)?;
        Ok(())
    }
}

impl HubClient for ReqwestHubClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_states(&self) -> Result<Vec<HubState>, HubError> {
        self.get("states").await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_state(&self, entity_id: &str) -> Result<Option<HubState>, HubError> {
        match self.get(&format!("states/{entity_id}")).await {
            Ok(state) => Ok(Some(state)),
            Err(HubError::Rejected { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    #[tracing::instrument(skip(self, call), fields(call = %call))]
    async fn invoke_action(&self, call: &ServiceCall) -> Result<(), HubError> {
        self.post(&format!("services/{}/{}", call.domain, call.service), &call.body())
            .await
    }

    /// Areas from the area registry, or, when that endpoint is unavailable,
    /// the distinct `area` attributes found on states.
    #[tracing::instrument(skip(self))]
    async fn fetch_areas(&self) -> Result<Vec<HubArea>, HubError> {
        match self.get("config/area_registry/list").await {
            Ok(areas) => Ok(areas),
            Err(err) => {
                tracing::info!(error = %err, "area registry unavailable, deriving areas from states");
                let states = self.fetch_states().await?;
                Ok(areas_from_states(&states))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_entities_in_area(&self, area_id: &str) -> Result<Vec<String>, HubError> {
        let entries: Vec<RegistryEntry> = self.get("config/entity_registry/list").await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.area_id.as_deref() == Some(area_id))
            .map(|entry| entry.entity_id)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn rename_entity(&self, entity_id: &str, name: &str) -> Result<(), HubError> {
        self.post(
            "config/entity_registry/update",
            &json!({"entity_id": entity_id, "name": name}),
        )
        .await
    }

    #[tracing::instrument(skip(self, state), fields(entity_id = %state.entity_id))]
    async fn set_state(&self, state: &HubState) -> Result<(), HubError> {
        self.post(
            &format!("states/{}", state.entity_id),
            &json!({"state": state.state, "attributes": state.attributes}),
        )
        .await
    }
}
