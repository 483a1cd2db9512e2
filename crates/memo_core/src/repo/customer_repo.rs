//! Customer repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `nome` (case-insensitive), then `id`.
//! - Free-text filtering happens after the fetch with Unicode-aware
//!   lowercasing, since SQLite `lower()` only folds ASCII.

use crate::model::customer::{Customer, CustomerId, CustomerStatus};
use crate::repo::{
    ensure_connection_ready, map_write_error, parse_enum, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    nome,
    razao_social,
    empresa,
    numero_conta,
    telefone_principal,
    cidade,
    contato_primario,
    email_contato,
    email,
    telefone,
    endereco,
    id_dinamics,
    status
FROM customers";

/// Query options for listing customers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerListQuery {
    /// Substring matched against nome, razao_social, email and email_contato.
    pub search: Option<String>,
    pub active_only: bool,
}

pub trait CustomerRepository {
    fn create_customer(&self, customer: &Customer) -> RepoResult<CustomerId>;
    fn update_customer(&self, customer: &Customer) -> RepoResult<()>;
    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>>;
    /// Oldest customer carrying this ERP identifier.
    fn get_customer_by_id_dinamics(&self, id_dinamics: &str) -> RepoResult<Option<Customer>>;
    fn list_customers(&self, query: &CustomerListQuery) -> RepoResult<Vec<Customer>>;
    fn delete_customer(&self, id: CustomerId) -> RepoResult<()>;
}

pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["customers"])?;
        Ok(Self { conn })
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn create_customer(&self, customer: &Customer) -> RepoResult<CustomerId> {
        customer.validate()?;

        self.conn
            .execute(
                "INSERT INTO customers (
                    id,
                    nome,
                    razao_social,
                    empresa,
                    numero_conta,
                    telefone_principal,
                    cidade,
                    contato_primario,
                    email_contato,
                    email,
                    telefone,
                    endereco,
                    id_dinamics,
                    status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
                params![
                    customer.id.to_string(),
                    customer.nome.trim(),
                    customer.razao_social.as_deref(),
                    customer.empresa.as_deref(),
                    customer.numero_conta.as_deref(),
                    customer.telefone_principal.as_deref(),
                    customer.cidade.as_deref(),
                    customer.contato_primario.as_deref(),
                    customer.email_contato.as_deref(),
                    customer.email.as_deref(),
                    customer.telefone.as_deref(),
                    customer.endereco.as_deref(),
                    customer.id_dinamics.as_deref(),
                    customer.status.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, "customer", customer.id.to_string()))?;

        Ok(customer.id)
    }

    fn update_customer(&self, customer: &Customer) -> RepoResult<()> {
        customer.validate()?;

        let changed = self.conn.execute(
            "UPDATE customers
             SET
                nome = ?1,
                razao_social = ?2,
                empresa = ?3,
                numero_conta = ?4,
                telefone_principal = ?5,
                cidade = ?6,
                contato_primario = ?7,
                email_contato = ?8,
                email = ?9,
                telefone = ?10,
                endereco = ?11,
                id_dinamics = ?12,
                status = ?13,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?14;",
            params![
                customer.nome.trim(),
                customer.razao_social.as_deref(),
                customer.empresa.as_deref(),
                customer.numero_conta.as_deref(),
                customer.telefone_principal.as_deref(),
                customer.cidade.as_deref(),
                customer.contato_primario.as_deref(),
                customer.email_contato.as_deref(),
                customer.email.as_deref(),
                customer.telefone.as_deref(),
                customer.endereco.as_deref(),
                customer.id_dinamics.as_deref(),
                customer.status.as_str(),
                customer.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "customer",
                id: customer.id,
            });
        }

        Ok(())
    }

    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_customer_row(row)))
            .optional()?;
        row.transpose()
    }

    fn get_customer_by_id_dinamics(&self, id_dinamics: &str) -> RepoResult<Option<Customer>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CUSTOMER_SELECT_SQL}
             WHERE id_dinamics = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1;"
        ))?;
        stmt.query_row([id_dinamics.trim()], |row| Ok(parse_customer_row(row)))
            .optional()?
            .transpose()
    }

    fn list_customers(&self, query: &CustomerListQuery) -> RepoResult<Vec<Customer>> {
        let mut sql = format!("{CUSTOMER_SELECT_SQL} WHERE 1 = 1");
        if query.active_only {
            sql.push_str(" AND status = 'Ativa'");
        }
        sql.push_str(" ORDER BY nome COLLATE NOCASE ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            let customer = parse_customer_row(row)?;
            let keep = query
                .search
                .as_deref()
                .map_or(true, |term| customer.matches_search(term));
            if keep {
                customers.push(customer);
            }
        }

        Ok(customers)
    }

    fn delete_customer(&self, id: CustomerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id.to_string()])
            .map_err(|err| map_write_error(err, "customer", id.to_string()))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "customer",
                id,
            });
        }

        Ok(())
    }
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;

    let customer = Customer {
        id: parse_uuid(&id_text, "customers.id")?,
        nome: row.get("nome")?,
        razao_social: row.get("razao_social")?,
        empresa: row.get("empresa")?,
        numero_conta: row.get("numero_conta")?,
        telefone_principal: row.get("telefone_principal")?,
        cidade: row.get("cidade")?,
        contato_primario: row.get("contato_primario")?,
        email_contato: row.get("email_contato")?,
        email: row.get("email")?,
        telefone: row.get("telefone")?,
        endereco: row.get("endereco")?,
        id_dinamics: row.get("id_dinamics")?,
        status: parse_enum(&status_text, "customers.status", CustomerStatus::parse)?,
    };
    customer.validate()?;
    Ok(customer)
}
