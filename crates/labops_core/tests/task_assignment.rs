use labops_core::db::open_db_in_memory;
use labops_core::{
    Caller, CoreConfig, DirectoryIdentityProvider, DirectoryService, IdentityProvider, ManualClock,
    NewTask, NotFoundTarget, Role, ServiceContext, ServiceError, TaskService, TaskStatus,
};

const T0: i64 = 1_767_225_600_000;

#[test]
fn admin_assigns_and_only_the_assignee_sees_the_task() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let admin = provision(ctx, "Grace", Role::Admin);
    let assignee = provision(ctx, "Ada", Role::Member);
    let bystander = provision(ctx, "Linus", Role::Member);
    let tasks = TaskService::new(ctx);

    let mut input = new_task("Autoclave run", Some(assignee.user_id()));
    input.due_date = Some("2026-01-05".to_string());
    let task = tasks.create_task(&admin, input).unwrap();

    assert_eq!(task.creator, admin.user_id());
    assert_eq!(task.assignee, assignee.user_id());
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(tasks.list_tasks(&assignee).unwrap(), vec![task.clone()]);
    assert!(tasks.list_tasks(&bystander).unwrap().is_empty());
    assert_eq!(tasks.list_tasks(&admin).unwrap(), vec![task]);
}

#[test]
fn members_cannot_create_or_delete_tasks() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let admin = provision(ctx, "Grace", Role::Admin);
    let member = provision(ctx, "Ada", Role::Member);
    let tasks = TaskService::new(ctx);
    let task = tasks
        .create_task(&admin, new_task("Inventory count", Some(member.user_id())))
        .unwrap();

    assert!(matches!(
        tasks.create_task(&member, new_task("Self-assigned", Some(member.user_id()))),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        tasks.delete_task(&member, task.id),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        tasks.delete_task(&member, uuid::Uuid::new_v4()),
        Err(ServiceError::Forbidden { .. })
    ));
    assert_eq!(tasks.list_tasks(&member).unwrap().len(), 1);

    tasks.delete_task(&admin, task.id).unwrap();
    assert!(tasks.list_tasks(&admin).unwrap().is_empty());
    assert!(matches!(
        tasks.delete_task(&admin, task.id),
        Err(ServiceError::NotFound(NotFoundTarget::Task(_)))
    ));
}

#[test]
fn assignee_must_be_given_and_exist() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let admin = provision(ctx, "Grace", Role::Admin);
    let tasks = TaskService::new(ctx);

    assert!(matches!(
        tasks.create_task(&admin, new_task("Nobody", None)),
        Err(ServiceError::InvalidInput(_))
    ));

    let ghost = uuid::Uuid::new_v4();
    let err = tasks
        .create_task(&admin, new_task("Ghost", Some(ghost)))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound(NotFoundTarget::Assignee(id)) if id == ghost
    ));

    let mut bad_due = new_task("Bad date", Some(admin.user_id()));
    bad_due.due_date = Some("05/01/2026".to_string());
    assert!(matches!(
        tasks.create_task(&admin, bad_due),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(tasks.list_tasks(&admin).unwrap().is_empty());
}

#[test]
fn assignee_advances_status_forward_only() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let admin = provision(ctx, "Grace", Role::Admin);
    let assignee = provision(ctx, "Ada", Role::Member);
    let bystander = provision(ctx, "Linus", Role::Member);
    let tasks = TaskService::new(ctx);
    let task = tasks
        .create_task(&admin, new_task("Label samples", Some(assignee.user_id())))
        .unwrap();

    clock.advance_ms(5_000);
    let started = tasks
        .update_task_status(&assignee, task.id, TaskStatus::InProgress)
        .unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);
    assert_eq!(started.updated_at, T0 + 5_000);

    assert!(matches!(
        tasks.update_task_status(&assignee, task.id, TaskStatus::Pending),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        tasks.update_task_status(&bystander, task.id, TaskStatus::Completed),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        tasks.update_task_status(&assignee, uuid::Uuid::new_v4(), TaskStatus::Completed),
        Err(ServiceError::NotFound(NotFoundTarget::Task(_)))
    ));

    tasks
        .update_task_status(&assignee, task.id, TaskStatus::Completed)
        .unwrap();
    let reopened = tasks
        .update_task_status(&admin, task.id, TaskStatus::Pending)
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(
        tasks.list_tasks(&assignee).unwrap()[0].status,
        TaskStatus::Pending
    );
}

#[test]
fn only_admins_list_assignable_users() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(T0);
    let config = test_config();
    let ctx = ServiceContext::new(&conn, &clock, &config);
    let admin = provision(ctx, "grace", Role::Admin);
    let member = provision(ctx, "Ada", Role::Member);
    provision(ctx, "Linus", Role::Member);
    let tasks = TaskService::new(ctx);

    let names: Vec<String> = tasks
        .list_assignable_users(&admin)
        .unwrap()
        .into_iter()
        .map(|user| user.display_name)
        .collect();
    assert_eq!(names, ["Ada", "grace", "Linus"]);

    assert!(matches!(
        tasks.list_assignable_users(&member),
        Err(ServiceError::Forbidden { .. })
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

fn new_task(title: &str, assignee: Option<uuid::Uuid>) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: format!("{title} steps"),
        assignee,
        due_date: None,
        status: TaskStatus::Pending,
    }
}
