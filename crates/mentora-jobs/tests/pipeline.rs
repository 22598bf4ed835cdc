//! End-to-end pipeline tests: accept, run, terminal transition, progress,
//! access control, and the reconciliation sweeps.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use tempfile::TempDir;
use uuid::Uuid;

use mentora_core::analytics::{
    AiToolRecord, AnalyticsError, AnalyticsSource, ConversationRecord, DateRange,
    LearningPathRecord, MessageRecord, UserRecord,
};
use mentora_core::models::report::{ReportFormat, ReportParameters, ReportStatus, ReportType};
use mentora_core::models::requester::{Requester, Role};
use mentora_export::registry::Registry;
use mentora_export::styles::DocumentStyles;
use mentora_jobs::error::JobError;
use mentora_jobs::progress::{progress_view, ProgressBoard};
use mentora_jobs::queue::start_workers;
use mentora_jobs::reaper::{sweep_expired, sweep_stalled};
use mentora_jobs::runner::run_job;
use mentora_jobs::service::{GenerateRequest, ListQuery, ReportService};
use mentora_jobs::{JobContext, RunnerConfig};
use mentora_store::memory::MemoryAnalytics;
use mentora_store::reports::{NewReport, ReportStore, Transition};

fn sample_analytics() -> MemoryAnalytics {
    let user = Uuid::new_v4();
    let conversation = Uuid::new_v4();
    let now = Timestamp::now();
    MemoryAnalytics {
        users: vec![UserRecord {
            id: user,
            name: "ana".to_string(),
            email: "ana@example.com".to_string(),
            department: Some("Science".to_string()),
            role: Role::User,
            ai_level: None,
            created_at: now,
        }],
        conversations: vec![ConversationRecord {
            id: conversation,
            user_id: user,
            created_at: now,
        }],
        messages: vec![MessageRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation,
            role: "user".to_string(),
            content: "how do I use ChatGPT".to_string(),
            timestamp: now,
        }],
        learning_paths: vec![LearningPathRecord {
            user_id: user,
            current_level: 2,
            progress: 40.0,
            updated_at: now,
        }],
        ai_tools: vec![AiToolRecord {
            name: "ChatGPT".to_string(),
            category: "chat".to_string(),
            difficulty: "beginner".to_string(),
            description: None,
        }],
    }
}

/// An analytical store whose every query fails.
#[derive(Clone)]
struct OfflineAnalytics;

impl AnalyticsSource for OfflineAnalytics {
    async fn users(&self, _: &[Uuid], _: DateRange) -> Result<Vec<UserRecord>, AnalyticsError> {
        Err(AnalyticsError::Query("analytics offline".to_string()))
    }
    async fn conversations(&self, _: DateRange) -> Result<Vec<ConversationRecord>, AnalyticsError> {
        Err(AnalyticsError::Query("analytics offline".to_string()))
    }
    async fn messages(&self, _: DateRange) -> Result<Vec<MessageRecord>, AnalyticsError> {
        Err(AnalyticsError::Query("analytics offline".to_string()))
    }
    async fn learning_paths(&self) -> Result<Vec<LearningPathRecord>, AnalyticsError> {
        Err(AnalyticsError::Query("analytics offline".to_string()))
    }
    async fn ai_tools(&self) -> Result<Vec<AiToolRecord>, AnalyticsError> {
        Err(AnalyticsError::Query("analytics offline".to_string()))
    }
}

async fn context<A>(dir: &TempDir, analytics: A) -> JobContext<A>
where
    A: AnalyticsSource + 'static,
{
    JobContext {
        store: Arc::new(ReportStore::open(dir.path()).await.unwrap()),
        analytics: Arc::new(analytics),
        registry: Arc::new(Registry::standard(DocumentStyles::default()).unwrap()),
        progress: ProgressBoard::new(),
        config: RunnerConfig::default(),
    }
}

fn new_report(report_type: ReportType, format: ReportFormat, created_by: Uuid) -> NewReport {
    NewReport {
        report_type,
        title: report_type.default_title(Timestamp::now()),
        format,
        parameters: ReportParameters::default(),
        created_by,
    }
}

fn plus_seconds(ts: Timestamp, seconds: i64) -> Timestamp {
    Timestamp::from_millisecond(ts.as_millisecond() + seconds * 1000).unwrap()
}

#[tokio::test]
async fn every_type_and_format_runs_to_completed() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    for report_type in ReportType::ALL {
        for format in ReportFormat::ALL {
            let created = ctx
                .store
                .create(new_report(report_type, format, Uuid::new_v4()))
                .await
                .unwrap();
            let done = run_job(&ctx, created.id).await.unwrap();

            assert_eq!(done.status, ReportStatus::Completed, "{report_type} {format}");
            assert!(done.started_at.is_some());
            assert!(done.completed_at.is_some());
            assert!(done.error_message.is_none());

            let path = done.file_path.as_deref().unwrap();
            assert!(path.ends_with(format.extension()));
            let size = std::fs::metadata(path).unwrap().len();
            assert!(size > 0);
            assert_eq!(done.file_size, Some(size));
        }
    }
}

#[tokio::test]
async fn a_second_run_is_rejected_and_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let created = ctx
        .store
        .create(new_report(
            ReportType::UserProgress,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let first = run_job(&ctx, created.id).await.unwrap();

    match run_job(&ctx, created.id).await {
        Err(JobError::AlreadyStarted { status, .. }) => {
            assert_eq!(status, ReportStatus::Completed);
        }
        other => panic!("expected AlreadyStarted, got {other:?}"),
    }

    let after = ctx.store.load(created.id).await.unwrap();
    assert_eq!(after.file_path, first.file_path);
    assert_eq!(after.completed_at, first.completed_at);
}

#[tokio::test]
async fn a_failing_source_marks_the_record_failed() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, OfflineAnalytics).await;

    let created = ctx
        .store
        .create(new_report(
            ReportType::LearningAnalytics,
            ReportFormat::Pdf,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let done = run_job(&ctx, created.id).await.unwrap();

    assert_eq!(done.status, ReportStatus::Failed);
    assert!(done.error_message.unwrap().contains("analytics offline"));
    assert!(done.file_path.is_none());
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn a_render_failure_leaves_no_orphan_artifact() {
    use mentora_export::Renderer;
    use mentora_export::error::ExportError;

    /// Writes partial output, then reports a disk fault.
    struct FaultyRenderer;

    impl Renderer for FaultyRenderer {
        fn render(
            &self,
            _report: &mentora_core::models::report::Report,
            _generated_at: Timestamp,
            _data: &mentora_core::dataset::DataSet,
            out: &Path,
        ) -> Result<(), ExportError> {
            std::fs::write(out, b"partial")?;
            Err(ExportError::Flat("simulated disk fault".to_string()))
        }
    }

    let dir = TempDir::new().unwrap();
    let mut registry = Registry::empty();
    registry.register(
        ReportType::UserProgress,
        ReportFormat::Csv,
        Arc::new(FaultyRenderer),
    );
    let ctx = JobContext {
        store: Arc::new(ReportStore::open(dir.path()).await.unwrap()),
        analytics: Arc::new(sample_analytics()),
        registry: Arc::new(registry),
        progress: ProgressBoard::new(),
        config: RunnerConfig::default(),
    };

    let created = ctx
        .store
        .create(new_report(
            ReportType::UserProgress,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let done = run_job(&ctx, created.id).await.unwrap();

    assert_eq!(done.status, ReportStatus::Failed);
    assert!(done.error_message.unwrap().contains("simulated disk fault"));
    assert!(done.file_path.is_none());

    // The partial file written before the fault is gone.
    let outputs: Vec<_> = std::fs::read_dir(dir.path().join("outputs"))
        .unwrap()
        .collect();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn zero_data_still_produces_a_file() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, MemoryAnalytics::default()).await;

    let created = ctx
        .store
        .create(new_report(
            ReportType::MonthlySummary,
            ReportFormat::Excel,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let done = run_job(&ctx, created.id).await.unwrap();

    assert_eq!(done.status, ReportStatus::Completed);
    assert!(std::fs::metadata(done.file_path.unwrap()).unwrap().len() > 0);
}

#[tokio::test]
async fn progress_reaches_one_hundred_and_the_board_is_cleared() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let created = ctx
        .store
        .create(new_report(
            ReportType::AiUsage,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let done = run_job(&ctx, created.id).await.unwrap();

    assert!(ctx.progress.latest(created.id).is_none());
    let view = progress_view(&done, &ctx.progress);
    assert_eq!(view.progress, 100);
    assert_eq!(view.message, "completed");
}

#[tokio::test]
async fn the_service_enforces_role_and_ownership() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;
    let (queue, _dispatcher) = start_workers(ctx.clone(), 2);
    let service = ReportService::new(ctx, queue);

    let owner = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let other_admin = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let super_admin = Requester {
        id: Uuid::new_v4(),
        role: Role::SuperAdmin,
    };
    let plain_user = Requester {
        id: Uuid::new_v4(),
        role: Role::User,
    };

    let request = GenerateRequest {
        report_type: ReportType::UserProgress,
        format: ReportFormat::Csv,
        parameters: ReportParameters::default(),
    };

    assert!(matches!(
        service.generate(request.clone(), &plain_user).await,
        Err(JobError::Forbidden)
    ));

    let report = service.generate(request, &owner).await.unwrap();
    assert_eq!(report.status, ReportStatus::Pending);

    assert!(service.get(report.id, &owner).await.is_ok());
    assert!(service.get(report.id, &super_admin).await.is_ok());
    assert!(matches!(
        service.get(report.id, &other_admin).await,
        Err(JobError::Forbidden)
    ));
    assert!(matches!(
        service.progress(report.id, &other_admin).await,
        Err(JobError::Forbidden)
    ));
}

#[tokio::test]
async fn download_is_gated_on_completion() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;
    let (queue, _dispatcher) = start_workers(ctx.clone(), 1);
    let service = ReportService::new(ctx.clone(), queue);

    let requester = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let pending = ctx
        .store
        .create(new_report(
            ReportType::UserProgress,
            ReportFormat::Pdf,
            requester.id,
        ))
        .await
        .unwrap();

    assert!(matches!(
        service.download(pending.id, &requester).await,
        Err(JobError::NotReady {
            status: ReportStatus::Pending
        })
    ));

    run_job(&ctx, pending.id).await.unwrap();
    let (report, path) = service.download(pending.id, &requester).await.unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(path.exists());
}

#[tokio::test]
async fn generation_through_the_queue_reaches_a_terminal_state() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;
    let (queue, _dispatcher) = start_workers(ctx.clone(), 2);
    let service = ReportService::new(ctx.clone(), queue);

    let requester = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let report = service
        .generate(
            GenerateRequest {
                report_type: ReportType::CustomReport,
                format: ReportFormat::Excel,
                parameters: ReportParameters::default(),
            },
            &requester,
        )
        .await
        .unwrap();

    let mut latest = report.clone();
    for _ in 0..200 {
        latest = ctx.store.load(report.id).await.unwrap();
        if latest.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(latest.status, ReportStatus::Completed);
}

#[tokio::test]
async fn two_requesters_get_distinct_artifacts() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let a = ctx
        .store
        .create(new_report(
            ReportType::MonthlySummary,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let b = ctx
        .store
        .create(new_report(
            ReportType::MonthlySummary,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();

    let a = run_job(&ctx, a.id).await.unwrap();
    let b = run_job(&ctx, b.id).await.unwrap();
    assert_ne!(a.file_path, b.file_path);

    // The monthly summary flattens to exactly one aggregate row.
    let content = std::fs::read_to_string(a.file_path.unwrap()).unwrap();
    assert_eq!(content.lines().count(), 2, "header plus one row");
}

#[tokio::test]
async fn a_future_range_completes_with_an_empty_document() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let created = ctx
        .store
        .create(NewReport {
            report_type: ReportType::UserProgress,
            title: "User Progress Report".to_string(),
            format: ReportFormat::Pdf,
            parameters: ReportParameters {
                date_from: Some(jiff::civil::date(2030, 1, 1)),
                date_to: Some(jiff::civil::date(2030, 1, 2)),
                ..Default::default()
            },
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let done = run_job(&ctx, created.id).await.unwrap();
    assert_eq!(done.status, ReportStatus::Completed);
    let bytes = std::fs::read(done.file_path.unwrap()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn listing_scopes_to_the_requester_unless_super_admin() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;
    let (queue, _dispatcher) = start_workers(ctx.clone(), 1);
    let service = ReportService::new(ctx.clone(), queue);

    let admin_a = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let admin_b = Requester {
        id: Uuid::new_v4(),
        role: Role::InstitutionAdmin,
    };
    let super_admin = Requester {
        id: Uuid::new_v4(),
        role: Role::SuperAdmin,
    };

    for owner in [admin_a.id, admin_a.id, admin_b.id] {
        ctx.store
            .create(new_report(ReportType::AiUsage, ReportFormat::Csv, owner))
            .await
            .unwrap();
    }

    let page = service.list(ListQuery::default(), &admin_a).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.reports.iter().all(|r| r.created_by == admin_a.id));

    let page = service
        .list(ListQuery::default(), &super_admin)
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let page = service
        .list(
            ListQuery {
                skip: 1,
                limit: 1,
                ..Default::default()
            },
            &super_admin,
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.reports.len(), 1);
}

#[tokio::test]
async fn the_stalled_sweep_fails_abandoned_runs_only() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let stalled = ctx
        .store
        .create(new_report(
            ReportType::UserProgress,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    ctx.store
        .transition(stalled.id, Transition::Start)
        .await
        .unwrap();

    let fresh = ctx
        .store
        .create(new_report(
            ReportType::AiUsage,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    ctx.store
        .transition(fresh.id, Transition::Start)
        .await
        .unwrap();

    // A pending record is never the sweep's business.
    let pending = ctx
        .store
        .create(new_report(
            ReportType::AiUsage,
            ReportFormat::Pdf,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();

    // Sweep as if ten minutes have passed: a one-hour threshold keeps both
    // runs, a five-minute threshold fails them.
    let far_future = plus_seconds(Timestamp::now(), 600);
    let sweep = sweep_stalled(ctx.store.as_ref(), Duration::from_secs(3600), far_future)
        .await
        .unwrap();
    assert!(sweep.failed.is_empty());
    assert_eq!(sweep.still_running, 2);

    let sweep = sweep_stalled(ctx.store.as_ref(), Duration::from_secs(300), far_future)
        .await
        .unwrap();
    assert_eq!(sweep.failed.len(), 2);

    let failed = ctx.store.load(stalled.id).await.unwrap();
    assert_eq!(failed.status, ReportStatus::Failed);
    assert!(
        failed
            .error_message
            .unwrap()
            .contains("worker did not complete")
    );
    assert_eq!(
        ctx.store.load(pending.id).await.unwrap().status,
        ReportStatus::Pending
    );
}

#[tokio::test]
async fn the_retention_sweep_deletes_expired_artifacts() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, sample_analytics()).await;

    let created = ctx
        .store
        .create(new_report(
            ReportType::UserProgress,
            ReportFormat::Csv,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
    let done = run_job(&ctx, created.id).await.unwrap();
    let artifact = done.file_path.clone().unwrap();
    assert!(Path::new(&artifact).exists());

    // Young artifact stays.
    let sweep = sweep_expired(
        ctx.store.as_ref(),
        Duration::from_secs(3600),
        Timestamp::now(),
    )
    .await
    .unwrap();
    assert!(sweep.expired.is_empty());
    assert_eq!(sweep.kept, 1);

    // Past the retention window the file goes and the pointer is cleared,
    // but the record stays completed.
    let sweep = sweep_expired(
        ctx.store.as_ref(),
        Duration::from_secs(60),
        plus_seconds(Timestamp::now(), 120),
    )
    .await
    .unwrap();
    assert_eq!(sweep.expired, vec![created.id]);
    assert!(!Path::new(&artifact).exists());

    let after = ctx.store.load(created.id).await.unwrap();
    assert_eq!(after.status, ReportStatus::Completed);
    assert!(after.file_path.is_none());
    assert!(after.file_size.is_none());

    // Idempotent: a second pass finds nothing to do.
    let sweep = sweep_expired(
        ctx.store.as_ref(),
        Duration::from_secs(60),
        plus_seconds(Timestamp::now(), 120),
    )
    .await
    .unwrap();
    assert!(sweep.expired.is_empty());
}
