//! Portal logins: bootstrap admin, member invites, password checks

use crate::traits::*;
use crate::types::*;
use crate::utils::password;

pub struct UserManager<S: AssociationStorage> {
    storage: S,
}

impl<S: AssociationStorage> UserManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create an administrator unless one exists already
    ///
    /// Returns the new admin, or `None` when the store already had one.
    pub async fn ensure_initial_admin(
        &mut self,
        email: &str,
        password: &str,
    ) -> AssociationResult<Option<User>> {
        if !self.storage.list_users(Some(UserRole::Admin)).await?.is_empty() {
            return Ok(None);
        }

        let user = User::new(email, password::hash_password(password), UserRole::Admin, None);
        self.storage.save_user(&user).await?;

        log::info!("Created initial admin {email}");
        Ok(Some(user))
    }

    /// Create a portal login for a member and mail the password to them
    pub async fn invite_member(
        &mut self,
        member: &Member,
        mailer: &dyn CredentialMailer,
    ) -> AssociationResult<String> {
        let email = member
            .email
            .clone()
            .ok_or_else(|| AssociationError::MemberNotFound(format!("{} has no email", member.id)))?;

        if self.storage.get_user_by_email(&email).await?.is_some() {
            return Err(AssociationError::AlreadyExists(format!(
                "login for {email}"
            )));
        }

        let plain = password::generate_password();
        let user = User::new(
            email.clone(),
            password::hash_password(&plain),
            UserRole::Member,
            Some(member.id),
        );

        // The login is stored only once the password has gone out
        mailer.send_invite(&email, &plain)?;
        self.storage.save_user(&user).await?;
        log::info!("Invited member {} as {email}", member.id);
        Ok(email)
    }

    /// Check a password and return the matching user
    pub async fn authenticate(&self, email: &str, password: &str) -> AssociationResult<User> {
        let user = self
            .storage
            .get_user_by_email(email)
            .await?
            .ok_or(AssociationError::InvalidCredentials)?;

        if password::verify_password(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(AssociationError::InvalidCredentials)
        }
    }
}
