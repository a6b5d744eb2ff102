//! Prometheus metrics endpoint. Every other crate records through the
//! `metrics` facade; this installs the recorder that actually aggregates
//! those calls and renders them for `/metrics`.

use axum::extract::State;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}
