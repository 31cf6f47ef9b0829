//! Task assignment use-cases.
//!
//! # Responsibility
//! - List tasks within scope; create and delete tasks as admin.
//! - Advance task status.
//! - List assignable users for admins.
//!
//! # Invariants
//! - A task is only created for an assignee that exists at creation time.
//! - Assignees only move status forward; admins may set any status.

use super::{with_store_retry, NotFoundTarget, ServiceContext, ServiceError, ServiceResult};
use crate::access::{resolve_scope, ResourceKind};
use crate::model::audit::ActivityAction;
use crate::model::task::{NewTask, Task, TaskId, TaskStatus};
use crate::model::user::{Caller, User};
use crate::model::ModelValidationError;
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use uuid::Uuid;

/// Task service bound to one connection.
pub struct TaskService<'a> {
    ctx: ServiceContext<'a>,
    tasks: SqliteTaskRepository<'a>,
    users: SqliteUserRepository<'a>,
}

impl<'a> TaskService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            tasks: SqliteTaskRepository::new(ctx.conn),
            users: SqliteUserRepository::new(ctx.conn),
        }
    }

    /// Lists tasks visible to `caller`, newest first.
    pub fn list_tasks(&self, caller: &Caller) -> ServiceResult<Vec<Task>> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Task);
        let tasks = with_store_retry(self.ctx.config, "task_list", || {
            self.tasks.list_tasks(&scope.visibility)
        })?;
        Ok(tasks)
    }

    /// Creates and assigns a task. Admin only.
    pub fn create_task(&self, caller: &Caller, input: NewTask) -> ServiceResult<Task> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Task);
        if !scope.may_create {
            warn!(
                "event=task_create module=task_service status=error code=forbidden actor={}",
                caller.user_id
            );
            return Err(ServiceError::forbidden(ResourceKind::Task, "create"));
        }

        let assignee = input
            .assignee
            .ok_or(ModelValidationError::MissingReference("assignee"))?;
        let now = self.ctx.clock.now_ms();
        let task = Task {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            assignee,
            creator: caller.user_id,
            status: input.status,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        task.validate()?;

        let assignee_exists = with_store_retry(self.ctx.config, "assignee_lookup", || {
            self.users.user_exists(assignee)
        })?;
        if !assignee_exists {
            return Err(ServiceError::NotFound(NotFoundTarget::Assignee(assignee)));
        }

        with_store_retry(self.ctx.config, "task_create", || self.tasks.insert_task(&task))?;
        info!(
            "event=task_create module=task_service status=ok task_id={} assignee={} creator={}",
            task.id, task.assignee, task.creator
        );
        self.ctx.record_activity(caller, ActivityAction::TaskAssigned);
        Ok(task)
    }

    /// Deletes a task. Admin only.
    pub fn delete_task(&self, caller: &Caller, id: TaskId) -> ServiceResult<()> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Task);
        if !scope.may_delete {
            warn!(
                "event=task_delete module=task_service status=error code=forbidden task_id={} actor={}",
                id, caller.user_id
            );
            return Err(ServiceError::forbidden(ResourceKind::Task, "delete"));
        }

        with_store_retry(self.ctx.config, "task_delete", || self.tasks.delete_task(id))
            .map_err(|err| task_error(err, id))?;
        info!(
            "event=task_delete module=task_service status=ok task_id={} actor={}",
            id, caller.user_id
        );
        self.ctx.record_activity(caller, ActivityAction::TaskDeleted);
        Ok(())
    }

    /// Moves a task to `status`.
    pub fn update_task_status(
        &self,
        caller: &Caller,
        id: TaskId,
        status: TaskStatus,
    ) -> ServiceResult<Task> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Task);
        let mut task = with_store_retry(self.ctx.config, "task_get", || self.tasks.get_task(id))?
            .ok_or(ServiceError::NotFound(NotFoundTarget::Task(id)))?;

        if !scope.visibility.permits(&task) {
            return Err(ServiceError::forbidden(ResourceKind::Task, "update_status"));
        }
        if !caller.is_admin() && !task.status.can_advance_to(status) {
            return Err(ServiceError::InvalidInput(format!(
                "task status cannot move from {} to {}",
                task.status.as_str(),
                status.as_str()
            )));
        }

        let now = self.ctx.clock.now_ms();
        with_store_retry(self.ctx.config, "task_status_update", || {
            self.tasks.update_task_status(id, status, now)
        })
        .map_err(|err| task_error(err, id))?;
        info!(
            "event=task_status_update module=task_service status=ok task_id={} from={} to={}",
            id,
            task.status.as_str(),
            status.as_str()
        );
        task.status = status;
        task.updated_at = now;
        self.ctx.record_activity(caller, ActivityAction::TaskStatusUpdated);
        Ok(task)
    }

    /// Lists users a task may be assigned to. Admin only.
    pub fn list_assignable_users(&self, caller: &Caller) -> ServiceResult<Vec<User>> {
        let caller = &self.ctx.authorize(caller)?;
        if !resolve_scope(caller, ResourceKind::Task).may_create {
            return Err(ServiceError::forbidden(
                ResourceKind::Task,
                "list_assignable_users",
            ));
        }
        let users = with_store_retry(self.ctx.config, "user_list", || self.users.list_users())?;
        Ok(users)
    }
}

fn task_error(err: RepoError, id: TaskId) -> ServiceError {
    match err {
        RepoError::NotFound(_) => ServiceError::NotFound(NotFoundTarget::Task(id)),
        other => other.into(),
    }
}
