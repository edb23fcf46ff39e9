use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin reqwest wrapper shared by outbound HTTP clients: owns the base URL
/// and an optional auth header, exposes a JSON POST.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
}

impl HttpClient {
    pub fn new(base_url: String, auth_header: Option<(String, String)>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            auth_header,
        }
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, reqwest::Error> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some((name, value)) = &self.auth_header {
            request = request.header(name, value);
        }

        request.json(payload).send().await
    }
}
