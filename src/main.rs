// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use reportrs::application::use_cases::report_dispatcher::{DispatchOptions, ReportDispatcher};
use reportrs::application::use_cases::schedule_preview::SchedulePreviewUseCase;
use reportrs::config::settings::Settings;
use reportrs::domain::services::delivery_persister::DeliveryPersister;
use reportrs::domain::services::recipient_resolver::RecipientResolver;
use reportrs::domain::services::recurrence_calculator::RecurrenceCalculator;
use reportrs::domain::services::reschedule_manager::RescheduleManager;
use reportrs::infrastructure::database::connection;
use reportrs::infrastructure::repositories::delivery_repo_impl::DeliveryRepositoryImpl;
use reportrs::infrastructure::repositories::directory_repo_impl::DirectoryRepositoryImpl;
use reportrs::infrastructure::repositories::report_repo_impl::ReportRepositoryImpl;
use reportrs::infrastructure::services::generation_service_impl::GenerationServiceImpl;
use reportrs::presentation::middleware::auth_middleware::AuthState;
use reportrs::presentation::routes;
use reportrs::workers::dispatch_worker::DispatchWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use migration::{Migrator, MigratorTrait};
use reportrs::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting reportrs...");

    // 2. Load and validate configuration; a missing generation endpoint is fatal
    let settings = Arc::new(Settings::new()?);
    settings
        .validate()
        .context("Invalid configuration, refusing to start")?;
    info!("Configuration loaded");

    reportrs::infrastructure::metrics::init_metrics(&settings.metrics);

    let calculator = RecurrenceCalculator::from_name(&settings.schedule.timezone)?;
    info!("Civil timezone: {}", calculator.timezone());

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Components
    let report_repo = Arc::new(ReportRepositoryImpl::new(db.clone()));
    let delivery_repo = Arc::new(DeliveryRepositoryImpl::new(db.clone()));
    let directory_repo = Arc::new(DirectoryRepositoryImpl::new(db.clone()));
    let generator = Arc::new(GenerationServiceImpl::from_settings(&settings.generation)?);

    let dispatcher = Arc::new(ReportDispatcher::new(
        report_repo.clone(),
        RecipientResolver::new(directory_repo),
        generator,
        DeliveryPersister::new(
            delivery_repo,
            Duration::from_secs(settings.dispatch.persist_timeout_secs),
        ),
        RescheduleManager::new(report_repo, calculator),
        DispatchOptions::from(&settings.dispatch),
    ));

    // 5. Optional in-process trigger
    if settings.dispatch.poll_interval_secs > 0 {
        DispatchWorker::new(
            dispatcher.clone(),
            Duration::from_secs(settings.dispatch.poll_interval_secs),
        )
        .start();
    } else {
        info!("In-process dispatch disabled; waiting for POST /v1/dispatch");
    }

    let auth_state = AuthState::new(settings.auth.api_token.clone());
    if auth_state.api_token.is_none() {
        warn!("auth.api_token is not set; protected endpoints will reject every request");
    }

    // 6. Start HTTP server
    let app = routes::routes(
        dispatcher,
        SchedulePreviewUseCase::new(calculator),
        auth_state,
    )
    .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
