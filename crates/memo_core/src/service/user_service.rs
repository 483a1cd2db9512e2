//! User and technician administration.
//!
//! # Invariants
//! - Every profile carries exactly one role.
//! - An admin cannot delete or demote their own account.

use crate::model::session::Session;
use crate::model::user::{Role, UserId, UserProfile};
use crate::repo::user_repo::UserRepository;
use crate::service::access::require_admin;
use crate::service::{Confirmation, ServiceError, ServiceResult};
use log::info;

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds the caller context for an authenticated user.
    pub fn session_for(&self, id: UserId) -> ServiceResult<Session> {
        let user = self.load(id)?;
        Ok(Session::new(user.id, user.role, user.nome))
    }

    /// Same as `session_for`, looked up by login e-mail.
    pub fn session_for_email(&self, email: &str) -> ServiceResult<Session> {
        let user = self
            .repo
            .get_user_by_email(email)?
            .ok_or_else(|| ServiceError::InvalidState(format!("no user with e-mail `{email}`")))?;
        Ok(Session::new(user.id, user.role, user.nome))
    }

    pub fn list_users(&self, session: &Session) -> ServiceResult<Vec<UserProfile>> {
        require_admin(session, "list users")?;
        Ok(self.repo.list_users(None)?)
    }

    /// Operators, i.e. the technicians orders can be assigned to.
    pub fn list_technicians(&self) -> ServiceResult<Vec<UserProfile>> {
        Ok(self.repo.list_users(Some(Role::Operator))?)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<UserProfile> {
        self.load(id)
    }

    pub fn create_user(&self, session: &Session, user: &UserProfile) -> ServiceResult<UserId> {
        require_admin(session, "create user")?;

        let id = self.repo.create_user(user)?;
        info!(
            "event=user_create module=service status=ok user_id={} role={}",
            id,
            user.role.as_str()
        );
        Ok(id)
    }

    pub fn update_user(&self, session: &Session, user: &UserProfile) -> ServiceResult<()> {
        require_admin(session, "update user")?;
        if user.id == session.user_id && user.role != session.role {
            return Err(ServiceError::InvalidState(
                "cannot change the role of the signed-in account".to_string(),
            ));
        }

        self.repo.update_user(user)?;
        info!("event=user_update module=service status=ok user_id={}", user.id);
        Ok(())
    }

    pub fn change_role(&self, session: &Session, id: UserId, role: Role) -> ServiceResult<()> {
        let mut user = self.load(id)?;
        user.role = role;
        self.update_user(session, &user)
    }

    pub fn delete_user(
        &self,
        session: &Session,
        id: UserId,
        confirmation: Confirmation,
    ) -> ServiceResult<()> {
        require_admin(session, "delete user")?;
        confirmation.require("delete user")?;
        if id == session.user_id {
            return Err(ServiceError::InvalidState(
                "cannot delete the signed-in account".to_string(),
            ));
        }

        self.repo.delete_user(id)?;
        info!("event=user_delete module=service status=ok user_id={id}");
        Ok(())
    }

    fn load(&self, id: UserId) -> ServiceResult<UserProfile> {
        self.repo.get_user(id)?.ok_or(ServiceError::NotFound {
            entity: "user",
            id,
        })
    }
}
