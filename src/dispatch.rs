//! Timeout-bounded request dispatch.
//!
//! One invocation is exactly one transport call: no retries, no
//! queueing. The call is raced against a cancellation timer and a
//! caller-held token; whichever fires first drops the in-flight
//! transport future.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use serde_json::Value;
use log::{debug, trace, error};

use crate::error::Error;
use crate::request::{
  RequestEnvelope, ResponseBody, ResponseEnvelope
};
use crate::resolver::EndpointConfig;
use crate::telemetry::Telemetry;
use crate::transport::{
  Transport, TransportRequest, TransportResponse
};

/// Default bound on one dispatch when settings carry none
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Executes bounded HTTP calls and records their outcomes
pub struct Dispatcher
{   transport: Arc<dyn Transport>
  , telemetry: Arc<Mutex<Telemetry>>
}

impl Dispatcher
{   pub fn new(
      transport: Arc<dyn Transport>
    , telemetry: Arc<Mutex<Telemetry>>
    ) -> Self
    {   debug!("Creating Dispatcher");
        Dispatcher
        {   transport
          , telemetry
        }
    }

    /// Run one dispatch against an already-resolved endpoint.
    ///
    /// Never returns an error: every outcome, including timeout and
    /// cancellation, is folded into the envelope. The elapsed
    /// duration is recorded to telemetry whatever happens.
    pub async fn dispatch(
      &self
    , envelope: &RequestEnvelope
    , config: &EndpointConfig
    , timeout_ms: Option<u64>
    , cancel: CancellationToken
    ) -> ResponseEnvelope
    {   let endpoint = envelope.endpoint.label();
        let timeout_ms
          = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        debug!(
          "Dispatching to {} (timeout {}ms)",
          endpoint, timeout_ms
        );

        let request = build_request(envelope, config);
        trace!("Outbound request: {:?}", request);

        let started = Instant::now();
        let outcome = tokio::select!
        {   _ = cancel.cancelled() => {
              debug!("Dispatch to {} cancelled", endpoint);
              Err(Error::Cancelled)
            }
          , _ = tokio::time::sleep(
              Duration::from_millis(timeout_ms)
            ) => {
              error!(
                "Dispatch to {} timed out after {}ms",
                endpoint, timeout_ms
              );
              Err(Error::Timeout(timeout_ms))
            }
          , result = self.transport.send(request) => result
        };
        let duration_ms
          = started.elapsed().as_millis() as u64;

        let reply = match outcome
        {   Ok(response) => {
              classify_response(
                endpoint.clone(),
                duration_ms,
                &response
              )
            }
          , Err(err) => {
              ResponseEnvelope::failure(
                endpoint.clone(),
                0,
                duration_ms,
                err
              )
            }
        };

        self.telemetry
          .lock()
          .await
          .record(&endpoint, duration_ms, reply.ok);

        reply
    }
}

/// Assemble the outbound body and headers.
/// Optional fields are merged only when present.
fn build_request(
  envelope: &RequestEnvelope
, config: &EndpointConfig
) -> TransportRequest
{   let mut body = serde_json::Map::new();
    body.insert(
      "prompt".to_string(),
      Value::String(envelope.prompt.clone())
    );
    if let Some(context) = &envelope.context
    {   body.insert("context".to_string(), context.clone());
    }
    if let Some(preamble) = &config.default_preamble
    {   body.insert(
          "preamble".to_string(),
          Value::String(preamble.clone())
        );
    }
    if let Some(temperature) = config.default_temperature
    {   body.insert(
          "temperature".to_string(),
          Value::from(temperature)
        );
    }

    let mut headers = vec![
      (
        "Content-Type".to_string()
      , "application/json".to_string()
      )
    ];
    if let Some(token) = &config.token
    {   headers.push((
          "Authorization".to_string()
        , format!("Bearer {}", token)
        ));
    }

    let mut method = "POST".to_string();
    if let Some(options) = &envelope.options
    {   if let Some(override_method) = &options.method
        {   method = override_method.clone();
        }
        headers.extend(options.headers.iter().cloned());
    }

    TransportRequest
    {   method
      , url: config.url.clone()
      , headers
      , body: Some(Value::Object(body))
    }
}

/// Classify an HTTP response into an envelope. A 2xx status is ok;
/// anything else keeps the decoded body but carries an HTTP error.
fn classify_response(
  endpoint: String
, duration_ms: u64
, response: &TransportResponse
) -> ResponseEnvelope
{   let ok = (200..=299).contains(&response.status);
    let error = if ok
    {   None
    } else
    {   Some(Error::Http(response.status).to_string())
    };

    ResponseEnvelope
    {   ok
      , status: response.status
      , endpoint
      , duration_ms
      , data: decode_body(response)
      , error
    }
}

/// Decode by declared content-type; decode failure degrades to the
/// raw text rather than failing the call.
fn decode_body(response: &TransportResponse)
  -> Option<ResponseBody>
{   if response.body.is_empty()
    {   return None;
    }

    let declares_json = response.content_type
      .as_deref()
      .map(|ct| {
        ct.to_ascii_lowercase().contains("application/json")
      })
      .unwrap_or(false);

    if declares_json
    {   match serde_json::from_str(&response.body)
        {   Ok(value) => Some(ResponseBody::Json(value))
          , Err(e) => {
              trace!("JSON decode fell back to text: {}", e);
              Some(ResponseBody::Text(response.body.clone()))
            }
        }
    } else
    {   Some(ResponseBody::Text(response.body.clone()))
    }
}
