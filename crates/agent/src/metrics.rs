//! Orchestrator-level metrics (component N): per-tier counts and latency,
//! plus global message/error counters. Backed by the `metrics` facade;
//! `reserva-server` installs the Prometheus recorder and scrapes it.

use std::time::Instant;

pub struct TierTiming {
    started: Instant,
    tier: &'static str,
}

impl TierTiming {
    pub fn start(tier: &'static str) -> Self {
        Self {
            started: Instant::now(),
            tier,
        }
    }

    pub fn record(self, outcome: &'static str) {
        metrics::histogram!("reserva_tier_latency_seconds", "tier" => self.tier)
            .record(self.started.elapsed().as_secs_f64());
        metrics::counter!("reserva_tier_outcomes_total", "tier" => self.tier, "outcome" => outcome)
            .increment(1);
    }
}

pub fn record_message_received() {
    metrics::counter!("reserva_messages_total").increment(1);
}

pub fn record_error(stage: &'static str) {
    metrics::counter!("reserva_errors_total", "stage" => stage).increment(1);
}

pub fn record_orchestrator_latency(started: Instant) {
    metrics::histogram!("reserva_orchestrator_latency_seconds")
        .record(started.elapsed().as_secs_f64());
}
