use std::str::FromStr;

use crate::{ApiResponseOrError, Credentials, OpenAiError};
use anyhow::Result;
use reqwest::{
    header::{HeaderName, HeaderValue, AUTHORIZATION},
    multipart::Form,
    Client, Method, Response,
};
use reqwest_eventsource::{EventSource, RequestBuilderExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Clone)]
pub struct OpenAiClient {
    credentials: Credentials,
    client: Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpenAiClient({})", self.credentials.base_url())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiErrorWrapper {
    error: OpenAiError,
}

/// Sort order for list endpoints, by `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ListOrder {
    Asc,
    #[default]
    Desc,
}

impl OpenAiClient {
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Result<Self> {
        Self::new(Credentials::from_env())
    }

    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .default_headers(
                [
                    (
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("Bearer {}", credentials.api_key()))?,
                    ),
                    (
                        HeaderName::from_str("OpenAI-Beta")?,
                        HeaderValue::from_str("assistants=v2")?,
                    ),
                ]
                .into_iter()
                .collect(),
            )
            .build()?;

        Ok(Self {
            credentials,
            client,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.credentials.base_url(), route)
    }

    async fn request_inner<S, R>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> Result<Response, reqwest::Error>
    where
        R: Into<String>,
        S: Serialize,
    {
        let url = self.url(&route.into());
        log::debug!("OpenAI Request[{}] {}", method, url);

        let mut request = self.client.request(method.clone(), url.clone());

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;

        log::debug!(
            "OpenAI Response[{}] {} {url}",
            method,
            response.status().as_str()
        );
        Ok(response)
    }

    async fn parse_response<T>(response: Response) -> ApiResponseOrError<T>
    where
        T: DeserializeOwned,
    {
        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        let result = response.text().await?;
        match serde_json::from_str::<OpenAiErrorWrapper>(&result) {
            Ok(api_response) => Err(api_response.error),
            Err(_) => Err(OpenAiError::new(result, "unknown".to_string())),
        }
    }

    pub async fn request<S, R, T>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        let response = self.request_inner(method, route, body).await?;
        Self::parse_response(response).await
    }

    pub async fn get<R, T>(&self, route: R) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        self.request::<(), R, T>(Method::GET, route, None).await
    }

    pub async fn post<S, R, T>(&self, route: R, body: S) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        self.request(Method::POST, route, Some(body)).await
    }

    pub async fn post_multipart<R, T>(&self, route: R, form: Form) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        let url = self.url(&route.into());
        log::debug!("OpenAI Request[POST multipart] {}", url);

        let response = self.client.post(url.clone()).multipart(form).send().await?;

        log::debug!(
            "OpenAI Response[POST multipart] {} {url}",
            response.status().as_str()
        );
        Self::parse_response(response).await
    }

    /// Opens a server-sent event stream for a POST request with a JSON body.
    pub fn post_stream<S, R>(&self, route: R, body: &S) -> ApiResponseOrError<EventSource>
    where
        R: Into<String>,
        S: Serialize + ?Sized,
    {
        let url = self.url(&route.into());
        log::debug!("OpenAI Request[POST stream] {}", url);

        Ok(self.client.post(url).json(body).eventsource()?)
    }

    /// Fetches every page of a list endpoint, following `last_id` cursors
    /// until the API reports no more entries.
    pub async fn list<R, T>(
        &self,
        route: R,
        order: ListOrder,
        after: Option<String>,
    ) -> ApiResponseOrError<Vec<T>>
    where
        R: Into<String>,
        T: DeserializeOwned + std::fmt::Debug,
    {
        let base = route.into();
        let page_route = |after: Option<&str>| match after {
            Some(after) => format!("{base}?order={order}&after={after}"),
            None => format!("{base}?order={order}"),
        };

        let mut route = page_route(after.as_deref());
        let mut data = Vec::new();

        loop {
            let list: List<T> = self.get(&route).await?;
            data.extend(list.data);
            match list.last_id {
                Some(last_id) if list.has_more => route = page_route(Some(&last_id)),
                _ => break,
            }
        }

        Ok(data)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct List<T> {
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub data: Vec<T>,
    pub has_more: bool,
}
