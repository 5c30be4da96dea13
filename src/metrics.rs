use crate::types::ProcessingResult;
use metrics::counter;
use std::net::SocketAddr;

pub const TILES_PROCESSED: &str = "westie_tiles_processed_total";
pub const SCROLL_PASSES: &str = "westie_scroll_passes_total";
pub const CRAWL_RUNS: &str = "westie_crawl_runs_total";

pub fn init_metrics(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

pub fn record_tile(processor: &'static str, result: ProcessingResult) {
    counter!(TILES_PROCESSED, "processor" => processor, "result" => result.to_string()).increment(1);
}

pub fn record_pass() {
    counter!(SCROLL_PASSES).increment(1);
}

pub fn record_run(outcome: &'static str) {
    counter!(CRAWL_RUNS, "outcome" => outcome).increment(1);
}
