//! User service
//!
//! User creation, credential verification, role assignment, and password
//! updates. Every operation here runs inside a bound tenant scope and goes
//! through the scoped repositories, so rows are stamped and filtered by the
//! chokepoint rather than by ad hoc predicates.

use uuid::Uuid;

use crate::domain::entities::{Role, User, UserRole};
use crate::domain::error::{Error, Result};
use crate::domain::types::{RoleKey, UserStatus};
use crate::infrastructure::password::{hash_password, needs_rehash, verify_password};
use crate::repository::{Records, Repository};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Encapsulates user operations within the bound tenant
#[derive(Clone)]
pub struct UserService {
    users: Repository<User>,
    roles: Repository<Role>,
    user_roles: Repository<UserRole>,
}

impl UserService {
    pub fn new(records: &Records) -> Self {
        Self {
            users: Repository::new("users", records.users.clone()),
            roles: Repository::new("roles", records.roles.clone()),
            user_roles: Repository::new("user_roles", records.user_roles.clone()),
        }
    }

    /// Create a user in the bound tenant, hashing the password and assigning
    /// the given roles. The tenant field is stamped by the repository.
    pub fn create(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        roles: &[RoleKey],
    ) -> Result<User> {
        let email = normalize_email(email);
        let user = User::new(&email, hash_password(password)?, first_name, last_name);
        let user = self.users.insert(user)?;

        self.assign_roles(&user, roles)?;

        Ok(user)
    }

    /// Assign provisioned roles to a user; already-held roles are skipped
    pub fn assign_roles(&self, user: &User, keys: &[RoleKey]) -> Result<()> {
        for key in keys {
            let role = self
                .roles
                .find_one(|r| r.key == *key)?
                .ok_or_else(|| Error::RoleNotProvisioned {
                    key: key.to_string(),
                })?;

            let held = self
                .user_roles
                .find_one(|ur| ur.user_id == user.id && ur.role_id == role.id)?;

            if held.is_none() {
                self.user_roles.insert(UserRole::new(user.id, role.id))?;
            }
        }

        Ok(())
    }

    /// Verify credentials for a user of the bound tenant.
    ///
    /// Unknown email and wrong password both come back as
    /// `InvalidCredentials`; callers can never distinguish them. A bcrypt
    /// hash that verifies is transparently upgraded to Argon2id.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let Some(mut user) = self.get_by_email(email)? else {
            return Err(Error::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).unwrap_or(false) {
            return Err(Error::InvalidCredentials);
        }

        if needs_rehash(&user.password_hash) {
            user.password_hash = hash_password(password)?;
            self.users.update(user.clone())?;
            tracing::info!(user_id = %user.id, "password hash upgraded to argon2id");
        }

        Ok(user)
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        self.users.find_one(|u| u.email == email)
    }

    pub fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        self.users.get(user_id)
    }

    pub fn set_password(&self, user: &mut User, password: &str) -> Result<()> {
        user.password_hash = hash_password(password)?;
        self.users.update(user.clone())
    }

    /// Activate or deactivate an account
    pub fn set_status(&self, user: &mut User, status: UserStatus) -> Result<()> {
        user.status = status;
        self.users.update(user.clone())
    }

    /// Role snapshot for a user of the bound tenant
    pub fn roles_of(&self, user: &User) -> Result<Vec<RoleKey>> {
        let assignments = self.user_roles.find(|ur| ur.user_id == user.id)?;

        let mut keys = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if let Some(role) = self.roles.get(assignment.role_id)? {
                keys.push(role.key);
            }
        }

        keys.sort_by_key(|k| k.as_str());
        Ok(keys)
    }
}
