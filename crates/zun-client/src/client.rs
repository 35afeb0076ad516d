//! Zun API client
//!
//! The client speaks to the OpenStack container service ("zun"). It
//! authenticates once against Keystone v3 with credentials taken from the
//! standard OS_* environment variables, resolves the public container
//! endpoint for the configured region from the service catalog, and from
//! then on fetches capsules with the acquired subject token.

use std::env;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::errors::ZunError;
use crate::models::Capsule;

const CONTAINER_SERVICE_TYPE: &str = "container";
const PUBLIC_INTERFACE: &str = "public";

/// Credentials and endpoint settings for the OpenStack identity service.
///
/// Field for field this mirrors the standard OS_* environment variables, so
/// configuration that works for the OpenStack CLI works here unchanged.
#[derive(Clone, Debug)]
pub struct AuthOptions {
    /// Keystone v3 endpoint, e.g. `https://keystone.example.com/v3`
    pub auth_url: String,
    /// User to authenticate as
    pub username: String,
    /// Password for the user
    pub password: String,
    /// Project the token is scoped to
    pub project_name: String,
    /// Domain the user belongs to
    pub user_domain_name: String,
    /// Domain the project belongs to
    pub project_domain_name: String,
    /// Region whose container endpoint should be used
    pub region: String,
}

impl AuthOptions {
    /// Read options from the standard OS_* environment variables.
    ///
    /// `OS_AUTH_URL`, `OS_USERNAME`, `OS_PASSWORD` and `OS_PROJECT_NAME` are
    /// required; the domains default to "Default" and the region to
    /// "RegionOne".
    pub fn from_env() -> Result<Self, ZunError> {
        Ok(AuthOptions {
            auth_url: required_env("OS_AUTH_URL")?,
            username: required_env("OS_USERNAME")?,
            password: required_env("OS_PASSWORD")?,
            project_name: required_env("OS_PROJECT_NAME")?,
            user_domain_name: env_or("OS_USER_DOMAIN_NAME", "Default"),
            project_domain_name: env_or("OS_PROJECT_DOMAIN_NAME", "Default"),
            region: env_or("OS_REGION_NAME", "RegionOne"),
        })
    }
}

fn required_env(var: &'static str) -> Result<String, ZunError> {
    env::var(var).map_err(|_| ZunError::MissingEnv(var))
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_owned())
}

/// The Zun client fetches capsules from an OpenStack deployment.
///
/// Construction performs the whole setup: a project-scoped token is acquired
/// from Keystone and the container endpoint is picked out of the service
/// catalog, so a constructed client is ready to serve lookups.
pub struct Client {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl Client {
    /// Authenticate against Keystone and resolve the container endpoint.
    pub async fn new(options: &AuthOptions) -> Result<Self, ZunError> {
        let client = reqwest::Client::new();
        let (token, endpoint) = authenticate(&client, options).await?;
        debug!(%endpoint, "resolved container service endpoint");
        Ok(Client {
            client,
            endpoint,
            token,
        })
    }

    /// Fetch a capsule by name or UUID.
    ///
    /// A 404 from the API is reported as [`ZunError::CapsuleNotFound`] so
    /// that callers can tell a missing workload apart from a failed request.
    pub async fn capsule(&self, name: &str) -> Result<Capsule, ZunError> {
        let url = format!("{}/capsules/{}", self.endpoint.trim_end_matches('/'), name);
        debug!(%url, "fetching capsule");
        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ZunError::CapsuleNotFound {
                name: name.to_owned(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(ZunError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenPayload,
}

#[derive(Deserialize)]
struct TokenPayload {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Deserialize)]
struct CatalogEndpoint {
    interface: String,
    region: String,
    url: String,
}

async fn authenticate(
    client: &reqwest::Client,
    options: &AuthOptions,
) -> Result<(String, String), ZunError> {
    let request = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": options.username,
                        "domain": { "name": options.user_domain_name },
                        "password": options.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": options.project_name,
                    "domain": { "name": options.project_domain_name },
                }
            }
        }
    });

    let url = format!("{}/auth/tokens", options.auth_url.trim_end_matches('/'));
    debug!(%url, username = %options.username, "requesting token");
    let response = client.post(&url).json(&request).send().await?;
    if !response.status().is_success() {
        return Err(ZunError::AuthFailed(format!(
            "{}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    let token = response
        .headers()
        .get("x-subject-token")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| ZunError::AuthFailed("no X-Subject-Token header in response".to_owned()))?;

    let payload: TokenResponse = response.json().await?;
    let endpoint = container_endpoint(&payload.token, &options.region).ok_or_else(|| {
        ZunError::EndpointNotFound {
            service: CONTAINER_SERVICE_TYPE.to_owned(),
            region: options.region.clone(),
        }
    })?;

    Ok((token, endpoint))
}

fn container_endpoint(token: &TokenPayload, region: &str) -> Option<String> {
    token
        .catalog
        .iter()
        .filter(|entry| entry.service_type == CONTAINER_SERVICE_TYPE)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|endpoint| endpoint.interface == PUBLIC_INTERFACE && endpoint.region == region)
        .map(|endpoint| endpoint.url.clone())
}
