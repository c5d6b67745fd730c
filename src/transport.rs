use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::Dhis2Error;

/// Authenticated JSON GET against the DHIS2 API root.
pub trait Transport: Send + Sync {
    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, Dhis2Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, Dhis2Error> {
        (**self).get(endpoint, query)
    }
}

#[derive(Clone)]
pub struct Dhis2HttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl Dhis2HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, Dhis2Error> {
        Self::with_builder(config, Self::builder(config)?)
    }

    fn builder(config: &ClientConfig) -> Result<ClientBuilder, Dhis2Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dhis2-client/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| Dhis2Error::InvalidConfig(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Client::builder()
            .default_headers(headers)
            .timeout(config.timeout))
    }

    fn with_builder(config: &ClientConfig, builder: ClientBuilder) -> Result<Self, Dhis2Error> {
        let client = builder
            .build()
            .map_err(|err| Dhis2Error::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.trim().to_string(),
            password: config.password.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl Transport for Dhis2HttpClient {
    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, Dhis2Error> {
        let url = self.url(endpoint);
        tracing::debug!(%url, ?query, "GET");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .map_err(|err| map_send_error(&url, err))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "DHIS2 request failed".to_string());
            return Err(classify_status(status, message));
        }

        response.json::<Value>().map_err(|err| {
            if err.is_timeout() {
                Dhis2Error::RequestTimedOut { url: url.clone() }
            } else {
                Dhis2Error::malformed(endpoint, err.to_string())
            }
        })
    }
}

/// Maps a non-2xx status onto the error taxonomy.
pub fn classify_status(status: u16, message: String) -> Dhis2Error {
    match status {
        401 => Dhis2Error::Unauthorized,
        500..=599 => Dhis2Error::ServerUnavailable { status },
        _ => Dhis2Error::HttpStatus { status, message },
    }
}

fn map_send_error(url: &str, err: reqwest::Error) -> Dhis2Error {
    if err.is_timeout() {
        Dhis2Error::RequestTimedOut {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        Dhis2Error::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        Dhis2Error::Http(err.to_string())
    }
}
