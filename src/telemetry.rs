//! Rolling per-endpoint call statistics.
//!
//! Owned aggregator instance, never ambient: hosts hold one per
//! process and tests instantiate isolated copies. State lives for
//! the process lifetime only.

use std::collections::{HashMap, VecDeque};
use serde::{Deserialize, Serialize};
use log::trace;

/// Latency samples retained per endpoint
pub const LATENCY_WINDOW: usize = 100;

/// Mutable per-endpoint state, created lazily on first record
#[derive(Debug, Clone, Default)]
struct EndpointStats
{   total: u64
  , success: u64
  , failed: u64
  , latencies: VecDeque<u64>
}

/// One row of a telemetry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSnapshot
{   pub total: u64
  , pub success: u64
  , pub failed: u64
  , /// Mean of the current latency window, 0 when empty
    pub avg_latency_ms: f64
}

/// Snapshot map keyed by endpoint wire label
pub type TelemetrySnapshot = HashMap<String, EndpointSnapshot>;

/// Bounded call-outcome aggregator
#[derive(Debug, Default)]
pub struct Telemetry
{   endpoints: HashMap<String, EndpointStats>
}

impl Telemetry
{   pub fn new() -> Self
    {   Telemetry::default()
    }

    /// Record one finished call. Appends to the endpoint's latency
    /// window and evicts the oldest sample past the bound; one call
    /// is one atomic mutation under the owner's lock.
    pub fn record(
      &mut self
    , endpoint_id: &str
    , duration_ms: u64
    , success: bool
    )
    {   trace!(
          "record {} {}ms ok={}",
          endpoint_id, duration_ms, success
        );
        let stats = self.endpoints
          .entry(endpoint_id.to_string())
          .or_default();

        stats.total += 1;
        if success
        {   stats.success += 1;
        } else
        {   stats.failed += 1;
        }

        stats.latencies.push_back(duration_ms);
        if stats.latencies.len() > LATENCY_WINDOW
        {   stats.latencies.pop_front();
        }
    }

    /// Compute current per-endpoint statistics without mutating
    pub fn snapshot(&self) -> TelemetrySnapshot
    {   self.endpoints
          .iter()
          .map(|(id, stats)| {
            (id.clone(), EndpointSnapshot
            {   total: stats.total
              , success: stats.success
              , failed: stats.failed
              , avg_latency_ms: mean(&stats.latencies)
            })
          })
          .collect()
    }

    /// Drop all recorded state
    pub fn reset(&mut self)
    {   self.endpoints.clear();
    }
}

fn mean(samples: &VecDeque<u64>) -> f64
{   if samples.is_empty()
    {   return 0.0;
    }
    let sum: u64 = samples.iter().sum();
    sum as f64 / samples.len() as f64
}
