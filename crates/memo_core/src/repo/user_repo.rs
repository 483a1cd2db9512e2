//! User profile/role repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A profile and its role row are written in one transaction.
//! - Every listed user carries exactly one role.

use crate::model::user::{Role, UserId, UserProfile};
use crate::repo::{
    ensure_connection_ready, map_write_error, parse_enum, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    p.id,
    p.nome,
    p.email,
    p.telefone,
    r.role,
    r.id_dinamics
FROM profiles p
INNER JOIN user_roles r ON r.user_id = p.id";

pub trait UserRepository {
    fn create_user(&self, user: &UserProfile) -> RepoResult<UserId>;
    fn update_user(&self, user: &UserProfile) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserProfile>>;
    /// Lists users, newest first; `role` narrows to one role.
    fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<UserProfile>>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["profiles", "user_roles"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &UserProfile) -> RepoResult<UserId> {
        user.validate()?;

        let email = user.email.trim();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO profiles (id, nome, email, telefone) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.nome.trim(),
                email,
                user.telefone.as_deref(),
            ],
        )
        .map_err(|err| map_write_error(err, "user", email))?;
        tx.execute(
            "INSERT INTO user_roles (id, user_id, role, id_dinamics) VALUES (?1, ?2, ?3, ?4);",
            params![
                Uuid::new_v4().to_string(),
                user.id.to_string(),
                user.role.as_str(),
                user.id_dinamics.as_deref(),
            ],
        )?;
        tx.commit()?;

        Ok(user.id)
    }

    fn update_user(&self, user: &UserProfile) -> RepoResult<()> {
        user.validate()?;

        let email = user.email.trim();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute(
                "UPDATE profiles
                 SET
                    nome = ?1,
                    email = ?2,
                    telefone = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4;",
                params![
                    user.nome.trim(),
                    email,
                    user.telefone.as_deref(),
                    user.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, "user", email))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user.id,
            });
        }
        tx.execute(
            "UPDATE user_roles SET role = ?1, id_dinamics = ?2 WHERE user_id = ?3;",
            params![
                user.role.as_str(),
                user.id_dinamics.as_deref(),
                user.id.to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE p.id = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserProfile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE p.email = ?1 COLLATE NOCASE;"))?;
        stmt.query_row([email.trim()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }

    fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<UserProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE (?1 IS NULL OR r.role = ?1)
             ORDER BY p.created_at DESC, p.nome COLLATE NOCASE ASC;"
        ))?;
        let mut rows = stmt.query([role.map(Role::as_str)])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let id_text: String = row.get("id")?;
    let role_text: String = row.get("role")?;
    Ok(UserProfile {
        id: parse_uuid(&id_text, "profiles.id")?,
        nome: row.get("nome")?,
        email: row.get("email")?,
        telefone: row.get("telefone")?,
        role: parse_enum(&role_text, "user_roles.role", Role::parse)?,
        id_dinamics: row.get("id_dinamics")?,
    })
}
