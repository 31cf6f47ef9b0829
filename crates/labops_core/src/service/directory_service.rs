//! User provisioning for embedding hosts.
//!
//! Provisioning is out of band: there is no caller check here.

use super::{with_store_retry, ServiceContext, ServiceResult};
use crate::model::user::{Role, User};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;
use uuid::Uuid;

pub struct DirectoryService<'a> {
    ctx: ServiceContext<'a>,
    users: SqliteUserRepository<'a>,
}

impl<'a> DirectoryService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            users: SqliteUserRepository::new(ctx.conn),
        }
    }

    pub fn provision_user(&self, display_name: &str, role: Role) -> ServiceResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            display_name: display_name.trim().to_string(),
            role,
            created_at: self.ctx.clock.now_ms(),
        };
        user.validate()?;

        with_store_retry(self.ctx.config, "user_provision", || {
            self.users.insert_user(&user)
        })?;
        info!(
            "event=user_provision module=directory_service status=ok user_id={} role={}",
            user.id,
            user.role.as_str()
        );
        Ok(user)
    }
}
