//! Network seam between the dispatch core and the HTTP stack.
//!
//! The core talks to a [`Transport`] so hosts and tests can swap the
//! real HTTP client for stubs. Cancellation happens by dropping the
//! returned future; implementations must not detach work.

use async_trait::async_trait;
use log::{debug, trace, error};

use crate::error::Error;

/// One outbound HTTP call, fully described
#[derive(Debug, Clone)]
pub struct TransportRequest
{   /// HTTP method name, e.g. "POST"
    pub method: String
  , pub url: String
  , /// Header name/value pairs in send order
    pub headers: Vec<(String, String)>
  , /// JSON body, absent for bodyless calls
    pub body: Option<serde_json::Value>
}

/// Raw response before content-type aware decoding
#[derive(Debug, Clone)]
pub struct TransportResponse
{   pub status: u16
  , /// Declared Content-Type header, when present
    pub content_type: Option<String>
  , /// Body bytes read as text
    pub body: String
}

/// Minimal HTTP capability the core needs
#[async_trait]
pub trait Transport: Send + Sync
{   /// Perform exactly one call. A transport-level failure maps to
    /// `Error::Transport`; an HTTP response of any status is `Ok`.
    async fn send(&self, request: TransportRequest)
      -> Result<TransportResponse, Error>;
}

/// Production transport over a shared reqwest client
pub struct HttpTransport
{   client: reqwest::Client
}

impl HttpTransport
{   pub fn new() -> Self
    {   debug!("Creating HttpTransport");
        HttpTransport
        {   client: reqwest::Client::new()
        }
    }
}

impl Default for HttpTransport
{   fn default() -> Self
    {   HttpTransport::new()
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn send(&self, request: TransportRequest)
      -> Result<TransportResponse, Error>
    {   trace!(
          "{} {} ({} headers)",
          request.method,
          request.url,
          request.headers.len()
        );

        let method = reqwest::Method::from_bytes(
          request.method.as_bytes()
        ).map_err(|e| {
          error!("Bad method {}: {}", request.method, e);
          Error::Transport(e.to_string())
        })?;

        let mut builder
          = self.client.request(method, &request.url);
        for (name, value) in &request.headers
        {   builder = builder.header(
              name.as_str(),
              value.as_str()
            );
        }
        if let Some(body) = &request.body
        {   builder = builder.json(body);
        }

        let response = builder
          .send()
          .await
          .map_err(|e| {
            error!("Transport failure: {}", e);
            Error::Transport(e.to_string())
          })?;

        let status = response.status().as_u16();
        let content_type = response
          .headers()
          .get(reqwest::header::CONTENT_TYPE)
          .and_then(|v| v.to_str().ok())
          .map(|s| s.to_string());

        let body = response
          .text()
          .await
          .map_err(|e| {
            error!("Failed reading body: {}", e);
            Error::Transport(e.to_string())
          })?;

        trace!("Response status: {}", status);
        Ok(TransportResponse
        {   status
          , content_type
          , body
        })
    }
}
