pub mod error;
pub mod config;
pub mod resolver;
pub mod request;
pub mod transport;
pub mod telemetry;
pub mod dispatch;
pub mod probe;
pub mod message;
pub mod client;

/*

prompt-relay is the request-dispatch core of a prompt proxy: callers
hand it a logical endpoint ("local", "remote" or a named profile), a
prompt and optional page-derived context, and get back exactly one
normalized envelope whatever happens on the wire. endpoint lookup,
the bounded network call, response decoding and rolling telemetry
live here; every UI / storage surface stays outside and talks to the
core through the message contract or the direct-call API.

prompt-relay/
├── Cargo.toml          # Main manifest
├── src/
│   ├── lib.rs          # Re-exports and the channel contract
│   ├── error.rs        # Error taxonomy with fixed display strings
│   ├── config.rs       # Settings snapshot, store trait, memory store
│   ├── resolver.rs     # EndpointRef -> EndpointConfig resolution
│   ├── request.rs      # Request/response/probe envelopes
│   ├── transport.rs    # Transport trait + reqwest implementation
│   ├── telemetry.rs    # Rolling per-endpoint call statistics
│   ├── dispatch.rs     # Timeout-bounded dispatch
│   ├── probe.rs        # Reachability probes
│   ├── message.rs      # Loosely-typed host message codec
│   └── client.rs       # Backend event loop + direct-call core
└── tests/              # Integration tests over stub transports

*/

/// RELAY API INTERFACE:

// ===== RelayRequest =====

pub type RelayRequestReply = crate::request::ResponseEnvelope;
pub type RelayRequestReplySender
  = tokio::sync::mpsc::UnboundedSender<RelayRequestReply>;

pub struct RelayRequestArgs
{   pub endpoint: crate::resolver::EndpointRef
  , pub prompt: String
  , pub context: Option<serde_json::Value>
  , pub reply: RelayRequestReplySender
}

// ===== PingEndpoint =====

pub type PingEndpointReply = crate::request::ProbeResult;
pub type PingEndpointReplySender
  = tokio::sync::mpsc::UnboundedSender<PingEndpointReply>;

pub struct PingEndpointArgs
{   pub endpoint: crate::resolver::EndpointRef
  , pub reply: PingEndpointReplySender
}

// ===== GetTelemetry =====

pub type GetTelemetryReply = crate::telemetry::TelemetrySnapshot;
pub type GetTelemetryReplySender
  = tokio::sync::mpsc::UnboundedSender<GetTelemetryReply>;

pub struct GetTelemetryArgs
{   pub reply: GetTelemetryReplySender
}

// ===== Shutdown =====

pub type ShutdownReply = Result<(), crate::error::Error>;
pub type ShutdownReplySender
  = tokio::sync::mpsc::UnboundedSender<ShutdownReply>;

pub struct ShutdownArgs
{   pub reply: ShutdownReplySender
}

// ===== RelayHand (sender side) =====

pub struct RelayHand
{   pub request_tx
      : tokio::sync::mpsc::UnboundedSender<RelayRequestArgs>
  , pub ping_tx
      : tokio::sync::mpsc::UnboundedSender<PingEndpointArgs>
  , pub telemetry_tx
      : tokio::sync::mpsc::UnboundedSender<GetTelemetryArgs>
  , pub shutdown_tx
      : tokio::sync::mpsc::UnboundedSender<ShutdownArgs>
}

// ===== RelayFoot (receiver side) =====

pub struct RelayFoot
{   pub request_rx
      : tokio::sync::mpsc::UnboundedReceiver<RelayRequestArgs>
  , pub ping_rx
      : tokio::sync::mpsc::UnboundedReceiver<PingEndpointArgs>
  , pub telemetry_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetTelemetryArgs>
  , pub shutdown_rx
      : tokio::sync::mpsc::UnboundedReceiver<ShutdownArgs>
}

// ===== Re-exports =====

pub use client::{RelayBackend, RelayCore};
pub use config::{MemoryStore, Profile, SettingsSnapshot, SettingsStore};
pub use error::Error;
pub use message::Message;
pub use request::{
  ProbeResult, RequestEnvelope, RequestOptions, ResponseBody,
  ResponseEnvelope
};
pub use resolver::{resolve, EndpointConfig, EndpointRef};
pub use telemetry::{
  EndpointSnapshot, Telemetry, TelemetrySnapshot, LATENCY_WINDOW
};
pub use transport::{
  HttpTransport, Transport, TransportRequest, TransportResponse
};
