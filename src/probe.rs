//! Endpoint reachability probes.
//!
//! A probe is diagnostic traffic: a bodyless GET with its own short
//! bound, classified like a dispatch but never recorded to
//! telemetry, so health checks cannot skew the latency statistics
//! real traffic decisions read.

use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{debug, error};

use crate::config::SettingsSnapshot;
use crate::error::Error;
use crate::request::ProbeResult;
use crate::resolver::{self, EndpointRef};
use crate::transport::{Transport, TransportRequest};

/// Fixed probe bound, shorter than ordinary dispatch
pub const PROBE_TIMEOUT_MS: u64 = 5_000;

/// Lightweight reachability checker
pub struct Prober
{   transport: Arc<dyn Transport>
}

impl Prober
{   pub fn new(transport: Arc<dyn Transport>) -> Self
    {   debug!("Creating Prober");
        Prober
        {   transport
        }
    }

    /// Test whether an endpoint is reachable. Resolution failures
    /// and transport outcomes all fold into the result.
    pub async fn ping(
      &self
    , reference: &EndpointRef
    , snapshot: &SettingsSnapshot
    ) -> ProbeResult
    {   let endpoint = reference.label();
        debug!("Probing {}", endpoint);

        let config
          = match resolver::resolve(reference, snapshot)
        {   Ok(config) => config
          , Err(err) => {
              return ProbeResult
              {   ok: false
                , endpoint
                , duration_ms: 0
                , status: None
                , error: Some(err.to_string())
              };
            }
        };

        // Same auth path as real traffic, no body
        let mut headers = Vec::new();
        if let Some(token) = &config.token
        {   headers.push((
              "Authorization".to_string()
            , format!("Bearer {}", token)
            ));
        }
        let request = TransportRequest
        {   method: "GET".to_string()
          , url: config.url
          , headers
          , body: None
        };

        let started = Instant::now();
        let outcome = tokio::select!
        {   _ = tokio::time::sleep(
              Duration::from_millis(PROBE_TIMEOUT_MS)
            ) => {
              error!(
                "Probe of {} timed out after {}ms",
                endpoint, PROBE_TIMEOUT_MS
              );
              Err(Error::Timeout(PROBE_TIMEOUT_MS))
            }
          , result = self.transport.send(request) => result
        };
        let duration_ms
          = started.elapsed().as_millis() as u64;

        match outcome
        {   Ok(response) => {
              let ok
                = (200..=299).contains(&response.status);
              ProbeResult
              {   ok
                , endpoint
                , duration_ms
                , status: Some(response.status)
                , error: if ok
                  {   None
                  } else
                  {   Some(
                        Error::Http(response.status)
                          .to_string()
                      )
                  }
              }
            }
          , Err(err) => {
              ProbeResult
              {   ok: false
                , endpoint
                , duration_ms
                , status: None
                , error: Some(err.to_string())
              }
            }
        }
    }
}
