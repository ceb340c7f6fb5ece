//! Loosely-typed JSON message contract for host surfaces.
//!
//! Hosts deliver messages tagged by a "type" field. The contract is
//! deliberately open: unknown or malformed types parse to `None`,
//! producing no reply and no error, so new message types can ship
//! without breaking existing callers.

use serde_json::Value;
use log::{debug, trace};

use crate::resolver::EndpointRef;

/// Commands a host message can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Message
{   /// Forward a prompt to an endpoint
    McpRequest
    {   endpoint: EndpointRef
      , prompt: String
      , context: Option<Value>
    }
  , /// Probe an endpoint for reachability
    PingEndpoint
    {   endpoint: EndpointRef
    }
  , /// Read the current telemetry snapshot
    GetTelemetry
}

impl Message
{   /// Parse one raw host message.
    ///
    /// A missing prompt parses to an empty string so the request
    /// path can reject it with its own envelope; an absent or
    /// unparseable endpoint makes the whole message malformed.
    pub fn parse(raw: &Value) -> Option<Message>
    {   let kind = raw.get("type")?.as_str()?;
        trace!("Parsing host message type: {}", kind);

        match kind
        {   "mcpRequest" => {
              let endpoint = parse_endpoint(raw)?;
              let prompt = raw.get("prompt")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
              let context = raw.get("context").cloned();
              Some(Message::McpRequest
              {   endpoint
                , prompt
                , context
              })
            }
          , "pingEndpoint" => {
              let endpoint = parse_endpoint(raw)?;
              Some(Message::PingEndpoint
              {   endpoint
              })
            }
          , "getTelemetry" => Some(Message::GetTelemetry)
          , other => {
              debug!("Ignoring message type: {}", other);
              None
            }
        }
    }
}

fn parse_endpoint(raw: &Value) -> Option<EndpointRef>
{   raw.get("endpoint")
      .and_then(Value::as_str)
      .and_then(EndpointRef::parse)
}
