use crate::{
    config::Config,
    domain::{ApiRequest, Method, RawResponse, RequestBody, Transport},
    errors::TransportError,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

/// Talks to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        tracing::info!(base_url = %config.api_base_url, "Initializing HTTP transport");
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { title, image } => {
                let mut part = Part::bytes(image.bytes).file_name(image.file_name);
                if let Some(content_type) = image.content_type {
                    part = part.mime_str(&content_type).map_err(|e| {
                        TransportError::InvalidRequest(format!(
                            "bad content type '{}': {}",
                            content_type, e
                        ))
                    })?;
                }
                builder.multipart(Form::new().text("title", title).part("image", part))
            }
        };

        tracing::debug!(method = request.method.as_str(), %url, "Sending request");
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
