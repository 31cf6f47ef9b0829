//! Sign-in bookkeeping.

use super::{with_store_retry, NotFoundTarget, ServiceContext, ServiceError, ServiceResult};
use crate::identity::IdentityProvider;
use crate::model::audit::ActivityAction;
use crate::model::user::{Caller, UserId};
use log::info;

pub struct SessionService<'a, P: IdentityProvider> {
    ctx: ServiceContext<'a>,
    identity: P,
}

impl<'a, P: IdentityProvider> SessionService<'a, P> {
    pub fn new(ctx: ServiceContext<'a>, identity: P) -> Self {
        Self { ctx, identity }
    }

    /// Resolves `user_id` to a caller and records the sign-in.
    ///
    /// Credentials are verified upstream; this only binds identity and role.
    pub fn sign_in(&self, user_id: UserId, origin_address: Option<&str>) -> ServiceResult<Caller> {
        let mut caller = with_store_retry(self.ctx.config, "identity_resolve", || {
            self.identity.resolve(user_id)
        })?
        .ok_or(ServiceError::NotFound(NotFoundTarget::User(user_id)))?;
        if let Some(origin) = origin_address {
            caller = caller.with_origin(origin);
        }

        info!(
            "event=sign_in module=session_service status=ok user_id={} role={}",
            caller.user_id,
            caller.role.as_str()
        );
        self.ctx.record_activity(&caller, ActivityAction::SignIn);
        Ok(caller)
    }
}
