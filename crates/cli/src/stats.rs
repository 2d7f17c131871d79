//! Run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::{RunningStats, StatsSummary};

/// Statistics from one `run` invocation
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Batches handed to the dispatcher
    pub batches: u64,

    /// Events contained in those batches
    pub events: u64,

    /// Input lines that could not be parsed
    pub malformed_lines: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Dispatch latency per batch, in milliseconds
    pub batch_latency_ms: RunningStats,

    /// Per-sink dispatcher metrics at the end of the run
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl RunStats {
    /// Record one dispatched batch
    pub fn record_batch(&mut self, events: usize, latency: Duration) {
        self.batches += 1;
        self.events += events as u64;
        self.batch_latency_ms.push(latency.as_secs_f64() * 1000.0);
    }

    /// Events per second throughput
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Run Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Batches: {}", self.batches);
        println!("   ├─ Events: {}", self.events);
        println!("   ├─ Events/s: {:.2}", self.events_per_sec());
        println!("   ├─ Malformed lines: {}", self.malformed_lines);
        println!(
            "   └─ Batch latency (ms): {}",
            StatsSummary::from(&self.batch_latency_ms)
        );

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (name, snap) in &self.sinks {
                println!(
                    "   ├─ {}: batches={}, events={}, failures={}, last_latency={}us",
                    name, snap.batch_count, snap.event_count, snap.failure_count, snap.last_latency_us
                );
            }
        }

        println!();
    }
}
