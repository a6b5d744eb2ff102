//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use reserva_agent::{BotEngine, ContextStore, ReservationFlow};
use reserva_config::Settings;
use reserva_core::SystemClock;

use crate::payment_provider::ConfiguredPaymentProvider;

pub type Engine = BotEngine<SystemClock, ConfiguredPaymentProvider>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub reservation_flow: Arc<ReservationFlow<SystemClock>>,
    pub context: Arc<ContextStore>,
    pub settings: Arc<Settings>,
    pub metrics_handle: PrometheusHandle,
}
