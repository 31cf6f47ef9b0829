use labops_core::db::open_db_in_memory;
use labops_core::{
    open_db, AuditService, Caller, CoreConfig, DirectoryIdentityProvider, DirectoryService,
    IdentityProvider, ManualClock, NewReport, NotFoundTarget, Report, ReportPatch, ReportService,
    Role, ServiceContext, ServiceError,
};
use rusqlite::Connection;

const T0: i64 = 1_767_225_600_000;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[test]
fn delete_moves_report_into_audit_trail() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let admin = provision(ctx, "Grace", Role::Admin);
    let reports = ReportService::new(ctx);

    let report = reports
        .create_report(&member, new_report("Calibrated pH meter"))
        .unwrap();
    clock.advance_ms(60_000);
    let entry = reports.delete_report(&member, report.id).unwrap();

    assert_eq!(entry.report_id, report.id);
    assert_eq!(entry.report_title, report.title);
    assert_eq!(entry.report_description, report.description);
    assert_eq!(entry.report_attachment_url, report.attachment_url);
    assert_eq!(entry.original_owner, member.user_id());
    assert_eq!(entry.deleted_by, member.user_id());
    assert_eq!(entry.deleted_at, T0 + 60_000);

    assert!(reports.list_reports(&member).unwrap().is_empty());
    let trail = AuditService::new(ctx).list_audit_trail(&admin).unwrap();
    assert_eq!(trail, vec![entry]);
}

#[test]
fn admin_deletion_records_admin_as_deleter() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let admin = provision(ctx, "Grace", Role::Admin);
    let reports = ReportService::new(ctx);

    let report = reports.create_report(&member, new_report("Freezer log")).unwrap();
    let entry = reports.delete_report(&admin, report.id).unwrap();

    assert_eq!(entry.original_owner, member.user_id());
    assert_eq!(entry.deleted_by, admin.user_id());
}

#[test]
fn mutable_window_closes_after_seven_days_for_everyone() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let admin = provision(ctx, "Grace", Role::Admin);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Weekly")).unwrap();

    clock.set(T0 + 6 * DAY_MS);
    let updated = reports
        .update_report(&member, report.id, title_patch("Weekly (revised)"))
        .unwrap();
    assert_eq!(updated.title, "Weekly (revised)");
    assert_eq!(updated.updated_at, T0 + 6 * DAY_MS);

    clock.set(T0 + 7 * DAY_MS);
    let err = reports
        .update_report(&member, report.id, title_patch("Too late"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::WindowExpired(_)));

    clock.set(T0 + 8 * DAY_MS);
    let err = reports.delete_report(&member, report.id).unwrap_err();
    assert!(matches!(err, ServiceError::WindowExpired(_)));
    let err = reports.delete_report(&admin, report.id).unwrap_err();
    assert!(matches!(err, ServiceError::WindowExpired(_)));

    let stored = reports.list_reports(&member).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Weekly (revised)");
}

#[test]
fn configured_window_length_is_honoured() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = CoreConfig {
        mutable_window_ms: 1_000,
        ..test_config()
    };
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Short-lived")).unwrap();

    clock.advance_ms(999);
    reports
        .update_report(&member, report.id, title_patch("Still editable"))
        .unwrap();
    clock.advance_ms(1);
    assert!(matches!(
        reports.delete_report(&member, report.id),
        Err(ServiceError::WindowExpired(_))
    ));
}

#[test]
fn second_delete_reports_not_found_and_keeps_single_entry() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Once")).unwrap();

    reports.delete_report(&member, report.id).unwrap();
    let err = reports.delete_report(&member, report.id).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound(NotFoundTarget::Report(id)) if id == report.id
    ));
    assert_eq!(audit_rows(&conn), 1);
}

#[test]
fn foreign_report_mutation_is_forbidden_and_missing_report_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let owner = provision(ctx, "Ada", Role::Member);
    let other = provision(ctx, "Linus", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&owner, new_report("Mine")).unwrap();

    assert!(matches!(
        reports.update_report(&other, report.id, title_patch("Yours now")),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        reports.delete_report(&other, report.id),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        reports.delete_report(&other, uuid::Uuid::new_v4()),
        Err(ServiceError::NotFound(NotFoundTarget::Report(_)))
    ));

    clock.advance_ms(30 * DAY_MS);
    assert!(matches!(
        reports.delete_report(&other, report.id),
        Err(ServiceError::Forbidden { .. })
    ));
    assert_eq!(audit_rows(&conn), 0);
}

#[test]
fn failed_archive_write_leaves_report_in_place() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Keep me")).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER reject_archive BEFORE INSERT ON audit_trail
         BEGIN SELECT RAISE(ABORT, 'archive unavailable'); END;",
    )
    .unwrap();

    let err = reports.delete_report(&member, report.id).unwrap_err();
    assert!(matches!(err, ServiceError::ArchiveWriteFailed(_)));
    assert!(!err.is_retryable());
    assert!(conn.is_autocommit());

    let remaining: Vec<Report> = reports.list_reports(&member).unwrap();
    assert_eq!(remaining, vec![report.clone()]);
    assert_eq!(audit_rows(&conn), 0);

    conn.execute_batch("DROP TRIGGER reject_archive;").unwrap();

    let entry = reports.delete_report(&member, report.id).unwrap();
    assert_eq!(entry.report_id, report.id);
    assert_eq!(entry.report_title, "Keep me");
    assert!(reports.list_reports(&member).unwrap().is_empty());
    assert_eq!(audit_rows(&conn), 1);
}

#[test]
fn failed_delete_keeps_archive_and_resumes_on_retry() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Stubborn")).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER reject_delete BEFORE DELETE ON reports
         BEGIN SELECT RAISE(ABORT, 'delete unavailable'); END;",
    )
    .unwrap();

    let err = reports.delete_report(&member, report.id).unwrap_err();
    assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    assert!(err.is_retryable());
    assert!(conn.is_autocommit());
    assert_eq!(audit_rows(&conn), 1);
    assert_eq!(reports.list_reports(&member).unwrap().len(), 1);
    let first_entry_id: String = conn
        .query_row("SELECT id FROM audit_trail;", [], |row| row.get(0))
        .unwrap();

    conn.execute_batch("DROP TRIGGER reject_delete;").unwrap();
    clock.advance_ms(10 * DAY_MS);

    let entry = reports.delete_report(&member, report.id).unwrap();
    assert_eq!(entry.id.to_string(), first_entry_id);
    assert_eq!(entry.deleted_at, T0);
    assert!(reports.list_reports(&member).unwrap().is_empty());
    assert_eq!(audit_rows(&conn), 1);
}

#[test]
fn edit_is_rejected_while_deletion_is_pending() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);
    let report = reports.create_report(&member, new_report("Original")).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER reject_delete BEFORE DELETE ON reports
         BEGIN SELECT RAISE(ABORT, 'delete unavailable'); END;",
    )
    .unwrap();
    let err = reports.delete_report(&member, report.id).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(audit_rows(&conn), 1);
    conn.execute_batch("DROP TRIGGER reject_delete;").unwrap();

    let err = reports
        .update_report(&member, report.id, title_patch("Edited after archive"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::DeletionPending(id) if id == report.id));
    assert!(!err.is_retryable());
    let stored = reports.list_reports(&member).unwrap();
    assert_eq!(stored, vec![report.clone()]);

    let entry = reports.delete_report(&member, report.id).unwrap();
    assert_eq!(entry.report_title, stored[0].title);
    assert_eq!(entry.report_description, stored[0].description);
    assert!(reports.list_reports(&member).unwrap().is_empty());
    assert_eq!(audit_rows(&conn), 1);
}

#[test]
fn concurrent_deletes_archive_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labops.db");
    let clock = ManualClock::new(T0);
    let config = test_config();

    let setup = open_db(&path).unwrap();
    let setup_ctx = ServiceContext::new(&setup, &clock, &config);
    let member = provision(setup_ctx, "Ada", Role::Member);
    let admin = provision(setup_ctx, "Grace", Role::Admin);
    let report = ReportService::new(setup_ctx)
        .create_report(&member, new_report("Contended"))
        .unwrap();
    let report_id = report.id;
    drop(setup);

    let first = open_db(&path).unwrap();
    let second = open_db(&path).unwrap();

    let results = std::thread::scope(|scope| {
        let handles = [(first, member.clone()), (second, admin.clone())].map(|(conn, caller)| {
            let clock = &clock;
            let config = &config;
            scope.spawn(move || {
                let ctx = ServiceContext::new(&conn, clock, config);
                ReportService::new(ctx).delete_report(&caller, report_id)
            })
        });
        handles.map(|handle| handle.join().unwrap())
    });

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(ServiceError::NotFound(NotFoundTarget::Report(_)))
    )));

    let check = open_db(&path).unwrap();
    assert_eq!(audit_rows(&check), 1);
    let reports_left: i64 = check
        .query_row("SELECT COUNT(*) FROM reports;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(reports_left, 0);
}

#[test]
fn invalid_report_input_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let member = provision(ctx, "Ada", Role::Member);
    let reports = ReportService::new(ctx);

    let mut bad_date = new_report("Dated");
    bad_date.report_date = "2026-13-01".to_string();
    assert!(matches!(
        reports.create_report(&member, bad_date),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        reports.create_report(&member, new_report("   ")),
        Err(ServiceError::InvalidInput(_))
    ));

    let report = reports.create_report(&member, new_report("Fine")).unwrap();
    assert!(matches!(
        reports.update_report(&member, report.id, ReportPatch::default()),
        Err(ServiceError::InvalidInput(_))
    ));
}

fn test_config() -> CoreConfig {
    CoreConfig {
        store_retry_backoff_ms: 0,
        ..CoreConfig::default()
    }
}

fn provision(ctx: ServiceContext<'_>, name: &str, role: Role) -> Caller {
    let user = DirectoryService::new(ctx).provision_user(name, role).unwrap();
    DirectoryIdentityProvider::new(ctx.conn)
        .resolve(user.id)
        .unwrap()
        .unwrap()
}

fn new_report(title: &str) -> NewReport {
    NewReport {
        title: title.to_string(),
        description: format!("{title} details"),
        report_date: "2026-01-01".to_string(),
        attachment_url: Some("https://files.example/report.pdf".to_string()),
    }
}

fn title_patch(title: &str) -> ReportPatch {
    ReportPatch {
        title: Some(title.to_string()),
        ..ReportPatch::default()
    }
}

fn audit_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM audit_trail;", [], |row| row.get(0))
        .unwrap()
}
