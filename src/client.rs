use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use serde_json::Value;
use log::{debug, error, info};

use crate::config::SettingsStore;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::message::Message;
use crate::probe::Prober;
use crate::request::{
  ProbeResult, RequestEnvelope, ResponseEnvelope
};
use crate::resolver::{self, EndpointRef};
use crate::telemetry::{Telemetry, TelemetrySnapshot};
use crate::transport::{HttpTransport, Transport};
use crate::RelayFoot;

/// Direct-call dispatch core.
///
/// Owns the settings read source, the transport and the telemetry
/// aggregator. Every request-shaped operation resolves to an
/// envelope; nothing here returns `Err` or panics on a failed call.
pub struct RelayCore
{   store: Arc<dyn SettingsStore>
  , telemetry: Arc<Mutex<Telemetry>>
  , dispatcher: Dispatcher
  , prober: Prober
}

impl RelayCore
{   /// Core over the production HTTP transport
    pub fn new(store: Arc<dyn SettingsStore>) -> Self
    {   RelayCore::with_transport(
          store,
          Arc::new(HttpTransport::new())
        )
    }

    /// Core over a caller-supplied transport
    pub fn with_transport(
      store: Arc<dyn SettingsStore>
    , transport: Arc<dyn Transport>
    ) -> Self
    {   debug!("Creating RelayCore");
        let telemetry
          = Arc::new(Mutex::new(Telemetry::new()));
        let dispatcher = Dispatcher::new(
          Arc::clone(&transport),
          Arc::clone(&telemetry)
        );
        let prober = Prober::new(transport);

        RelayCore
        {   store
          , telemetry
          , dispatcher
          , prober
        }
    }

    /// Forward one prompt to an endpoint
    pub async fn request(
      &self
    , endpoint: EndpointRef
    , prompt: String
    , context: Option<Value>
    ) -> ResponseEnvelope
    {   let mut envelope
          = RequestEnvelope::new(endpoint, prompt);
        envelope.context = context;
        self.request_with_options(envelope).await
    }

    /// Forward one fully-specified request envelope
    pub async fn request_with_options(
      &self
    , envelope: RequestEnvelope
    ) -> ResponseEnvelope
    {   self.request_cancellable(
          envelope,
          CancellationToken::new()
        ).await
    }

    /// Forward one request holding a caller-owned cancellation
    /// token. Cancelling the token aborts only this call.
    pub async fn request_cancellable(
      &self
    , envelope: RequestEnvelope
    , cancel: CancellationToken
    ) -> ResponseEnvelope
    {   let endpoint = envelope.endpoint.label();

        // Reject before any network activity
        if envelope.prompt.is_empty()
        {   debug!("Rejecting request with empty prompt");
            return ResponseEnvelope::failure(
              endpoint,
              0,
              0,
              Error::MissingPrompt
            );
        }

        // Settings are read fresh on every dispatch
        let snapshot = self.store.snapshot().await;
        let config = match resolver::resolve(
          &envelope.endpoint,
          &snapshot
        )
        {   Ok(config) => config
          , Err(err) => {
              return ResponseEnvelope::failure(
                endpoint,
                0,
                0,
                err
              );
            }
        };

        self.dispatcher
          .dispatch(
            &envelope,
            &config,
            snapshot.request_timeout_ms,
            cancel
          )
          .await
    }

    /// Probe an endpoint for reachability; never touches telemetry
    pub async fn ping(
      &self
    , endpoint: EndpointRef
    ) -> ProbeResult
    {   let snapshot = self.store.snapshot().await;
        self.prober.ping(&endpoint, &snapshot).await
    }

    /// Current telemetry snapshot
    pub async fn telemetry(&self) -> TelemetrySnapshot
    {   self.telemetry.lock().await.snapshot()
    }

    /// Drop all telemetry state
    pub async fn reset_telemetry(&self)
    {   self.telemetry.lock().await.reset();
    }

    /// Handle one loosely-typed host message. Unknown message
    /// types yield `None`: no reply, no error.
    pub async fn handle_message(
      &self
    , raw: &Value
    ) -> Option<Value>
    {   match Message::parse(raw)?
        {   Message::McpRequest
            {   endpoint
              , prompt
              , context
            } => {
              let reply = self
                .request(endpoint, prompt, context)
                .await;
              serde_json::to_value(reply).ok()
            }
          , Message::PingEndpoint { endpoint } => {
              let reply = self.ping(endpoint).await;
              serde_json::to_value(reply).ok()
            }
          , Message::GetTelemetry => {
              let reply = self.telemetry().await;
              serde_json::to_value(reply).ok()
            }
        }
    }
}

/// Public API for the relay backend - owns the task
pub struct RelayBackend
{   hand: crate::RelayHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl RelayBackend
{   /// Create and spawn a backend over the production transport
    /// Returns immediately - spawns background task
    pub fn new(store: Arc<dyn SettingsStore>) -> Self
    {   RelayBackend::with_transport(
          store,
          Arc::new(HttpTransport::new())
        )
    }

    /// Create and spawn a backend over a caller-supplied transport
    pub fn with_transport(
      store: Arc<dyn SettingsStore>
    , transport: Arc<dyn Transport>
    ) -> Self
    {   debug!("Creating RelayBackend with task ownership");

        let (request_tx, request_rx)
          = mpsc::unbounded_channel();
        let (ping_tx, ping_rx)
          = mpsc::unbounded_channel();
        let (telemetry_tx, telemetry_rx)
          = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx)
          = mpsc::unbounded_channel();

        let hand = crate::RelayHand
        {   request_tx: request_tx.clone()
          , ping_tx: ping_tx.clone()
          , telemetry_tx: telemetry_tx.clone()
          , shutdown_tx: shutdown_tx.clone()
        };

        let foot = crate::RelayFoot
        {   request_rx
          , ping_rx
          , telemetry_rx
          , shutdown_rx
        };

        let core = Arc::new(
          RelayCore::with_transport(store, transport)
        );
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, core).await
        });

        RelayBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a request - returns almost immediately
    pub async fn request(
      &self
    , endpoint: EndpointRef
    , prompt: String
    , context: Option<Value>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::RelayRequestReply>,
        Error
      >
    {   debug!(
          "request queuing for endpoint: {}",
          endpoint.label()
        );
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::RelayRequestArgs
        {   endpoint
          , prompt
          , context
          , reply: reply_tx
        };

        self.hand.request_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a probe - returns almost immediately
    pub async fn ping(
      &self
    , endpoint: EndpointRef
    ) -> Result<
        mpsc::UnboundedReceiver<crate::PingEndpointReply>,
        Error
      >
    {   debug!(
          "ping queuing for endpoint: {}",
          endpoint.label()
        );
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::PingEndpointArgs
        {   endpoint
          , reply: reply_tx
        };

        self.hand.ping_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a telemetry read - returns almost immediately
    pub async fn telemetry(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetTelemetryReply>,
        Error
      >
    {   debug!("telemetry queuing");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GetTelemetryArgs
        {   reply: reply_tx
        };

        self.hand.telemetry_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shut down the backend
    pub async fn shutdown(self)
      -> Result<(), Error>
    {   debug!("Shutting down RelayBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ShutdownArgs
        {   reply: reply_tx
        };

        self.hand.shutdown_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown channel dropped");
            Err(Error::Other(
              "Backend already shutdown".to_string()
            ))
        }
    }
}

/// Main backend event loop
///
/// Design: tokio::select! is ONLY for fast queueing. Requests and
/// probes are spawned onto their own tasks so any number of calls
/// can be in flight; only the shared telemetry aggregator is
/// touched under its lock.
async fn run_backend_loop(
  foot: RelayFoot
, core: Arc<RelayCore>
)
{   debug!("Starting RelayBackend event loop");
    let RelayFoot
    {   mut request_rx
      , mut ping_rx
      , mut telemetry_rx
      , mut shutdown_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = request_rx.recv() => {
          debug!(
            "Received request for endpoint: {}",
            cmd.endpoint.label()
          );
          let core = Arc::clone(&core);
          tokio::spawn(async move {
            let reply = core
              .request(cmd.endpoint, cmd.prompt, cmd.context)
              .await;
            let _ = cmd.reply.send(reply);
          });
        }
      , Some(cmd) = ping_rx.recv() => {
          debug!(
            "Received ping for endpoint: {}",
            cmd.endpoint.label()
          );
          let core = Arc::clone(&core);
          tokio::spawn(async move {
            let reply = core.ping(cmd.endpoint).await;
            let _ = cmd.reply.send(reply);
          });
        }
      , Some(cmd) = telemetry_rx.recv() => {
          debug!("Received telemetry read");
          let _ = cmd.reply.send(core.telemetry().await);
        }
      , Some(cmd) = shutdown_rx.recv() => {
          debug!("Received shutdown");
          let _ = cmd.reply.send(Ok(()));
          info!("RelayBackend shutting down");
          break;
        }
      , else => {
          debug!("Command channels closed");
          break;
        }
      }
    }
}
