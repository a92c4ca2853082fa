// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use reportrs::application::use_cases::report_dispatcher::{DispatchOptions, ReportDispatcher};
use reportrs::config::settings::DatabaseSettings;
use reportrs::domain::models::delivery::{DeliveryRecord, DeliveryStatus};
use reportrs::domain::models::report::{Schedule, ScheduledReport, TimeOfDay};
use reportrs::domain::repositories::delivery_repository::DeliveryRepository;
use reportrs::domain::repositories::report_repository::{ReportRepository, RepositoryError};
use reportrs::domain::services::delivery_persister::DeliveryPersister;
use reportrs::domain::services::generation_service::{
    GenerationError, GenerationRequest, GenerationService,
};
use reportrs::domain::services::recipient_resolver::RecipientResolver;
use reportrs::domain::services::recurrence_calculator::RecurrenceCalculator;
use reportrs::domain::services::reschedule_manager::RescheduleManager;
use reportrs::infrastructure::database::connection;
use reportrs::infrastructure::database::entities::{team, user};
use reportrs::infrastructure::repositories::delivery_repo_impl::DeliveryRepositoryImpl;
use reportrs::infrastructure::repositories::directory_repo_impl::DirectoryRepositoryImpl;
use reportrs::infrastructure::repositories::report_repo_impl::ReportRepositoryImpl;
use reportrs::infrastructure::services::generation_service_impl::GenerationServiceImpl;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm::DbErr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 2025-01-15 08:00 America/New_York
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap()
}

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub reports: Arc<ReportRepositoryImpl>,
    pub deliveries: Arc<DeliveryRepositoryImpl>,
    pub generator: MockServer,
    pub calculator: RecurrenceCalculator,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = setup_db().await;
        Self {
            reports: Arc::new(ReportRepositoryImpl::new(db.clone())),
            deliveries: Arc::new(DeliveryRepositoryImpl::new(db.clone())),
            generator: MockServer::start().await,
            calculator: RecurrenceCalculator::default(),
            db,
        }
    }

    pub fn generation_service(&self) -> Arc<dyn GenerationService> {
        let endpoint = Url::parse(&format!("{}/generate", self.generator.uri())).unwrap();
        Arc::new(GenerationServiceImpl::new(endpoint, Duration::from_secs(5), None).unwrap())
    }

    pub fn dispatcher(&self) -> ReportDispatcher {
        self.dispatcher_with(
            self.generation_service(),
            self.deliveries.clone(),
            DispatchOptions::default(),
        )
    }

    pub fn dispatcher_with(
        &self,
        generator: Arc<dyn GenerationService>,
        deliveries: Arc<dyn DeliveryRepository>,
        options: DispatchOptions,
    ) -> ReportDispatcher {
        ReportDispatcher::new(
            self.reports.clone(),
            RecipientResolver::new(Arc::new(DirectoryRepositoryImpl::new(self.db.clone()))),
            generator,
            DeliveryPersister::new(deliveries, Duration::from_secs(5)),
            RescheduleManager::new(self.reports.clone(), self.calculator),
            options,
        )
    }

    /// 生成服务返回固定正文
    pub async fn mock_generation_ok(&self, output: &str) {
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "output": output })),
            )
            .mount(&self.generator)
            .await;
    }

    pub async fn insert_team(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        team::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db.as_ref())
        .await
        .unwrap();
        id
    }

    pub async fn insert_user(&self, team_id: Option<Uuid>, email: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(id),
            email: Set(email.map(str::to_string)),
            name: Set(Some(format!("User {}", &id.to_string()[..8]))),
            team_id: Set(team_id),
            role: Set(Some("member".to_string())),
            view_financial: Set(Some(true)),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db.as_ref())
        .await
        .unwrap();
        id
    }

    /// 写入一个已调度且在 `next_fire_at` 到期的每日报告
    pub async fn insert_due_report(
        &self,
        owner_id: Uuid,
        title: &str,
        time: (u32, u32),
        next_fire_at: Option<DateTime<Utc>>,
    ) -> ScheduledReport {
        let schedule = Schedule::daily(TimeOfDay::new(time.0, time.1).unwrap());
        let mut report = ScheduledReport::new(owner_id, title, format!("Prompt for {}", title))
            .with_schedule(&schedule);
        report.next_fire_at = next_fire_at;
        self.insert_report(report).await
    }

    pub async fn insert_report(&self, report: ScheduledReport) -> ScheduledReport {
        self.reports.create(&report).await.unwrap()
    }

    pub async fn reload(&self, id: Uuid) -> ScheduledReport {
        self.reports.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn deliveries_for(&self, report_id: Uuid) -> Vec<DeliveryRecord> {
        self.deliveries.find_by_report(report_id).await.unwrap()
    }
}

/// 内存 SQLite，单连接保证所有查询看到同一个库
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(5),
        idle_timeout: None,
        log_statements: Some(false),
    };
    let db = Arc::new(connection::create_pool(&settings).await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();
    db
}

/// 对指定接收者注入写入失败的投递仓库
pub struct FailingDeliveries {
    pub inner: Arc<DeliveryRepositoryImpl>,
    pub fail_for: Vec<Uuid>,
}

#[async_trait]
impl DeliveryRepository for FailingDeliveries {
    async fn insert(&self, record: &DeliveryRecord) -> Result<DeliveryRecord, RepositoryError> {
        if self.fail_for.contains(&record.recipient_user_id) {
            return Err(RepositoryError::Database(DbErr::Custom(
                "disk full".to_string(),
            )));
        }
        self.inner.insert(record).await
    }

    async fn transition(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Result<(), RepositoryError> {
        self.inner.transition(id, status, error).await
    }

    async fn find_by_report(&self, report_id: Uuid) -> Result<Vec<DeliveryRecord>, RepositoryError> {
        self.inner.find_by_report(report_id).await
    }
}

/// 对指定标题的报告触发 panic 的生成服务
pub struct PanickingGenerator {
    pub panic_on_title: String,
}

#[async_trait]
impl GenerationService for PanickingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if request.report_title == self.panic_on_title {
            panic!("generator exploded for {}", request.report_title);
        }
        Ok(format!("Generated {}", request.report_title))
    }
}

/// 每次生成前固定等待的生成服务
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl GenerationService for SlowGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("Generated {}", request.report_title))
    }
}
