//! Envelope types shared by every core operation

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::resolver::EndpointRef;

/// Per-request transport overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions
{   /// HTTP method override, POST when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>
  , /// Extra headers appended after the standard set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>
}

/// One caller request into the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope
{   /// Destination reference, resolved at dispatch time
    pub endpoint: EndpointRef
  , /// Prompt text; must be non-empty
    pub prompt: String
  , /// Opaque page-derived context forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>
  , /// Optional transport overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>
}

impl RequestEnvelope
{   /// Envelope with just an endpoint and a prompt
    pub fn new(
      endpoint: EndpointRef
    , prompt: impl Into<String>
    ) -> Self
    {   RequestEnvelope
        {   endpoint
          , prompt: prompt.into()
          , context: None
          , options: None
        }
    }

    /// Attach page-derived context
    pub fn with_context(
      mut self
    , context: serde_json::Value
    ) -> Self
    {   self.context = Some(context);
        self
    }

    /// Attach transport overrides
    pub fn with_options(
      mut self
    , options: RequestOptions
    ) -> Self
    {   self.options = Some(options);
        self
    }
}

/// Decoded response payload, chosen by declared content-type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody
{   /// Structured body from a JSON content-type
    Json(serde_json::Value)
  , /// Opaque body text
    Text(String)
}

/// Normalized result of one dispatch.
/// Exactly one of (ok, error=None) or (!ok, error=Some) holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope
{   pub ok: bool
  , /// HTTP status, 0 when no response was received
    pub status: u16
  , /// Wire label of the endpoint the call targeted
    pub endpoint: String
  , /// Wall-clock elapsed time for the call
    pub duration_ms: u64
  , pub data: Option<ResponseBody>
  , pub error: Option<String>
}

impl ResponseEnvelope
{   /// Successful envelope
    pub fn success(
      endpoint: String
    , status: u16
    , duration_ms: u64
    , data: Option<ResponseBody>
    ) -> Self
    {   ResponseEnvelope
        {   ok: true
          , status
          , endpoint
          , duration_ms
          , data
          , error: None
        }
    }

    /// Failed envelope carrying the error's display string
    pub fn failure(
      endpoint: String
    , status: u16
    , duration_ms: u64
    , error: Error
    ) -> Self
    {   ResponseEnvelope
        {   ok: false
          , status
          , endpoint
          , duration_ms
          , data: None
          , error: Some(error.to_string())
        }
    }
}

/// Result of a reachability probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult
{   pub ok: bool
  , /// Wire label of the probed endpoint
    pub endpoint: String
  , pub duration_ms: u64
  , /// HTTP status when a response came back at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}
