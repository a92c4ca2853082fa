// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 启用时安装 Prometheus 导出器并注册分发引擎的指标描述
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics listen address {}: {}. Metrics exporter not started.",
                settings.listen_address, e
            );
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "report_dispatch_passes_total",
        "Total number of dispatch passes executed"
    );
    describe_counter!(
        "report_occurrences_total",
        "Processed occurrences by outcome (succeeded, failed, skipped)"
    );
    describe_counter!(
        "report_claim_conflicts_total",
        "Due reports claimed by another worker first"
    );
    describe_histogram!(
        "report_generation_duration_seconds",
        "Duration of generation service calls in seconds"
    );
    describe_counter!(
        "report_generation_failures_total",
        "Failed generation service calls by reason"
    );
    describe_counter!(
        "report_deliveries_total",
        "Per-recipient delivery writes by status"
    );
    describe_counter!(
        "report_manual_runs_total",
        "On-demand report runs by outcome"
    );
}
