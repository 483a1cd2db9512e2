//! Service-order repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist orders, quotation lines and the status-change audit log.
//! - Provide joined read models for boards, lists and exports.
//!
//! # Invariants
//! - A status transition is a guarded update (`WHERE status_atual = from`)
//!   plus exactly one `status_changes` row, in one transaction.
//! - `status_changes` rows are never updated or deleted here.

use crate::model::classification::{Origin, PaymentTerms, Priority, WarrantyStatus};
use crate::model::customer::display_name_of;
use crate::model::order::{OrderId, OrderItem, OrderItemId, ServiceOrder, StatusChange};
use crate::model::status::OrderStatus;
use crate::model::user::UserId;
use crate::repo::{
    ensure_connection_ready, map_write_error, parse_enum, parse_optional_uuid, parse_uuid,
    RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use uuid::Uuid;

const PRAZO_FORMAT: &str = "%Y-%m-%d";

const ORDER_COLUMNS_SQL: &str = "
    o.id,
    o.numero,
    o.id_cliente,
    o.id_tecnico_principal,
    o.id_ocorrencia,
    o.origem,
    o.situacao_garantia,
    o.prioridade,
    o.condicao_pagamento,
    o.status_atual,
    o.laudo,
    o.motivo_cancelamento,
    o.prazo,
    o.data_inicio_execucao,
    o.data_fim_execucao,
    o.id_dinamics_os,
    o.created_by";

/// Filter for order listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    /// Restrict to orders whose principal technician is this user.
    pub technician: Option<UserId>,
    /// Restrict to these statuses; empty means all.
    pub statuses: Vec<OrderStatus>,
    /// Newest-first page size.
    pub limit: Option<u32>,
}

/// Order joined with customer and technician display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: ServiceOrder,
    pub customer_nome: String,
    pub customer_razao_social: Option<String>,
    pub customer_id_dinamics: Option<String>,
    pub technician_nome: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl OrderSummary {
    pub fn customer_display_name(&self) -> &str {
        display_name_of(self.customer_razao_social.as_deref(), &self.customer_nome)
    }
}

/// Quotation line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemLine {
    pub item: OrderItem,
    pub product_codigo: String,
    pub product_nome: String,
}

/// One guarded status update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: Option<UserId>,
    /// Epoch milliseconds; also used for execution start/end stamps.
    pub changed_at: i64,
    /// Set together with the status (quotation approval).
    pub payment_terms: Option<PaymentTerms>,
}

pub trait OrderRepository {
    fn count_orders(&self) -> RepoResult<u64>;
    fn order_number_exists(&self, numero: &str) -> RepoResult<bool>;
    fn create_order(&self, order: &ServiceOrder) -> RepoResult<OrderId>;
    /// Updates every mutable field except `status` (see `transition_status`).
    fn update_order(&self, order: &ServiceOrder) -> RepoResult<()>;
    fn get_order(&self, id: OrderId) -> RepoResult<Option<ServiceOrder>>;
    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<OrderSummary>>;
    fn transition_status(&self, transition: &StatusTransition) -> RepoResult<()>;
    fn list_status_changes(&self, order_id: OrderId) -> RepoResult<Vec<StatusChange>>;
    fn delete_order(&self, id: OrderId) -> RepoResult<()>;
    fn add_item(&self, item: &OrderItem) -> RepoResult<OrderItemId>;
    fn remove_item(&self, item_id: OrderItemId) -> RepoResult<()>;
    fn list_items(&self, order_id: OrderId) -> RepoResult<Vec<OrderItemLine>>;
}

pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["service_orders", "order_items", "status_changes"])?;
        Ok(Self { conn })
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn count_orders(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM service_orders;", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn order_number_exists(&self, numero: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM service_orders WHERE numero = ?1);",
            [numero.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_order(&self, order: &ServiceOrder) -> RepoResult<OrderId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_order(&tx, order)?;
        tx.commit()?;
        Ok(order.id)
    }

    fn update_order(&self, order: &ServiceOrder) -> RepoResult<()> {
        order.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE service_orders
                 SET
                    numero = ?1,
                    id_cliente = ?2,
                    id_tecnico_principal = ?3,
                    origem = ?4,
                    situacao_garantia = ?5,
                    prioridade = ?6,
                    condicao_pagamento = ?7,
                    laudo = ?8,
                    motivo_cancelamento = ?9,
                    prazo = ?10,
                    data_inicio_execucao = ?11,
                    data_fim_execucao = ?12,
                    id_dinamics_os = ?13,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?14;",
                params![
                    order.numero.trim(),
                    order.id_cliente.to_string(),
                    order.id_tecnico_principal.map(|id| id.to_string()),
                    order.origem.as_str(),
                    order.situacao_garantia.as_str(),
                    order.prioridade.map(Priority::as_str),
                    order.condicao_pagamento.map(PaymentTerms::as_str),
                    order.laudo.as_deref(),
                    order.motivo_cancelamento.as_deref(),
                    order.prazo.map(|date| date.format(PRAZO_FORMAT).to_string()),
                    order.data_inicio_execucao,
                    order.data_fim_execucao,
                    order.id_dinamics_os.as_deref(),
                    order.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, "service order", order.numero.trim()))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "service order",
                id: order.id,
            });
        }

        Ok(())
    }

    fn get_order(&self, id: OrderId) -> RepoResult<Option<ServiceOrder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS_SQL} FROM service_orders o WHERE o.id = ?1;"
        ))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_order_row(row)))
            .optional()?
            .transpose()
    }

    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<OrderSummary>> {
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS_SQL},
                o.created_at,
                c.nome AS customer_nome,
                c.razao_social AS customer_razao_social,
                c.id_dinamics AS customer_id_dinamics,
                p.nome AS technician_nome
             FROM service_orders o
             INNER JOIN customers c ON c.id = o.id_cliente
             LEFT JOIN profiles p ON p.id = o.id_tecnico_principal
             WHERE 1 = 1"
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(technician) = query.technician {
            sql.push_str(" AND o.id_tecnico_principal = ?");
            bind_values.push(Value::Text(technician.to_string()));
        }

        if !query.statuses.is_empty() {
            let placeholders = vec!["?"; query.statuses.len()].join(", ");
            sql.push_str(&format!(" AND o.status_atual IN ({placeholders})"));
            for status in &query.statuses {
                bind_values.push(Value::Text(status.as_str().to_string()));
            }
        }

        sql.push_str(" ORDER BY o.created_at DESC, o.rowid DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(OrderSummary {
                order: parse_order_row(row)?,
                customer_nome: row.get("customer_nome")?,
                customer_razao_social: row.get("customer_razao_social")?,
                customer_id_dinamics: row.get("customer_id_dinamics")?,
                technician_nome: row.get("technician_nome")?,
                created_at: row.get("created_at")?,
            });
        }

        Ok(orders)
    }

    fn transition_status(&self, transition: &StatusTransition) -> RepoResult<()> {
        let order_id = transition.order_id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE service_orders
             SET
                status_atual = ?1,
                condicao_pagamento = COALESCE(?2, condicao_pagamento),
                data_inicio_execucao = CASE
                    WHEN ?1 = 'em_execucao' AND data_inicio_execucao IS NULL THEN ?3
                    ELSE data_inicio_execucao
                END,
                data_fim_execucao = CASE
                    WHEN ?1 = 'finalizada' THEN ?3
                    ELSE data_fim_execucao
                END,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4
               AND status_atual = ?5;",
            params![
                transition.to.as_str(),
                transition.payment_terms.map(PaymentTerms::as_str),
                transition.changed_at,
                order_id.as_str(),
                transition.from.as_str(),
            ],
        )?;

        if changed == 0 {
            let current: Option<String> = tx
                .query_row(
                    "SELECT status_atual FROM service_orders WHERE id = ?1;",
                    [order_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match current {
                None => RepoError::NotFound {
                    entity: "service order",
                    id: transition.order_id,
                },
                Some(status) => RepoError::Conflict(format!(
                    "order {} is `{status}`, expected `{}`",
                    transition.order_id,
                    transition.from.as_str()
                )),
            });
        }

        tx.execute(
            "INSERT INTO status_changes (
                id,
                id_os,
                status_anterior,
                status_novo,
                changed_by,
                changed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                Uuid::new_v4().to_string(),
                order_id.as_str(),
                transition.from.as_str(),
                transition.to.as_str(),
                transition.changed_by.map(|id| id.to_string()),
                transition.changed_at,
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn list_status_changes(&self, order_id: OrderId) -> RepoResult<Vec<StatusChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, id_os, status_anterior, status_novo, changed_by, changed_at
             FROM status_changes
             WHERE id_os = ?1
             ORDER BY changed_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([order_id.to_string()])?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let order_text: String = row.get("id_os")?;
            let previous = row
                .get::<_, Option<String>>("status_anterior")?
                .map(|value| {
                    parse_enum(&value, "status_changes.status_anterior", OrderStatus::parse)
                })
                .transpose()?;
            let next_text: String = row.get("status_novo")?;
            changes.push(StatusChange {
                id: parse_uuid(&id_text, "status_changes.id")?,
                id_os: parse_uuid(&order_text, "status_changes.id_os")?,
                status_anterior: previous,
                status_novo: parse_enum(
                    &next_text,
                    "status_changes.status_novo",
                    OrderStatus::parse,
                )?,
                changed_by: parse_optional_uuid(
                    row.get("changed_by")?,
                    "status_changes.changed_by",
                )?,
                changed_at: row.get("changed_at")?,
            });
        }
        Ok(changes)
    }

    fn delete_order(&self, id: OrderId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM service_orders WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "service order",
                id,
            });
        }
        Ok(())
    }

    fn add_item(&self, item: &OrderItem) -> RepoResult<OrderItemId> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO order_items (id, id_os, id_produto, quantidade) VALUES (?1, ?2, ?3, ?4);",
            params![
                item.id.to_string(),
                item.id_os.to_string(),
                item.id_produto.to_string(),
                item.quantidade,
            ],
        )
        .map_err(|err| map_write_error(err, "order item", item.id_produto.to_string()))?;

        Ok(item.id)
    }

    fn remove_item(&self, item_id: OrderItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM order_items WHERE id = ?1;", [item_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "order item",
                id: item_id,
            });
        }
        Ok(())
    }

    fn list_items(&self, order_id: OrderId) -> RepoResult<Vec<OrderItemLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                i.id,
                i.id_os,
                i.id_produto,
                i.quantidade,
                p.codigo,
                p.nome
             FROM order_items i
             INNER JOIN products p ON p.id = i.id_produto
             WHERE i.id_os = ?1
             ORDER BY i.created_at ASC, p.codigo ASC;",
        )?;
        let mut rows = stmt.query([order_id.to_string()])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let order_text: String = row.get("id_os")?;
            let product_text: String = row.get("id_produto")?;
            let item = OrderItem {
                id: parse_uuid(&id_text, "order_items.id")?,
                id_os: parse_uuid(&order_text, "order_items.id_os")?,
                id_produto: parse_uuid(&product_text, "order_items.id_produto")?,
                quantidade: row.get("quantidade")?,
            };
            item.validate()?;
            lines.push(OrderItemLine {
                item,
                product_codigo: row.get("codigo")?,
                product_nome: row.get("nome")?,
            });
        }
        Ok(lines)
    }
}

/// Inserts one order row plus its opening audit entry.
///
/// Callers own the surrounding transaction; occurrence conversion reuses
/// this inside its own.
pub(crate) fn insert_order(conn: &Connection, order: &ServiceOrder) -> RepoResult<()> {
    order.validate()?;

    let numero = order.numero.trim();
    conn.execute(
        "INSERT INTO service_orders (
            id,
            numero,
            id_cliente,
            id_tecnico_principal,
            id_ocorrencia,
            origem,
            situacao_garantia,
            prioridade,
            condicao_pagamento,
            status_atual,
            laudo,
            motivo_cancelamento,
            prazo,
            data_inicio_execucao,
            data_fim_execucao,
            id_dinamics_os,
            created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
        params![
            order.id.to_string(),
            numero,
            order.id_cliente.to_string(),
            order.id_tecnico_principal.map(|id| id.to_string()),
            order.id_ocorrencia.map(|id| id.to_string()),
            order.origem.as_str(),
            order.situacao_garantia.as_str(),
            order.prioridade.map(Priority::as_str),
            order.condicao_pagamento.map(PaymentTerms::as_str),
            order.status.as_str(),
            order.laudo.as_deref(),
            order.motivo_cancelamento.as_deref(),
            order.prazo.map(|date| date.format(PRAZO_FORMAT).to_string()),
            order.data_inicio_execucao,
            order.data_fim_execucao,
            order.id_dinamics_os.as_deref(),
            order.created_by.map(|id| id.to_string()),
        ],
    )
    .map_err(|err| map_write_error(err, "service order", numero))?;

    conn.execute(
        "INSERT INTO status_changes (
            id,
            id_os,
            status_anterior,
            status_novo,
            changed_by,
            changed_at
        ) VALUES (?1, ?2, NULL, ?3, ?4, (strftime('%s', 'now') * 1000));",
        params![
            Uuid::new_v4().to_string(),
            order.id.to_string(),
            order.status.as_str(),
            order.created_by.map(|id| id.to_string()),
        ],
    )?;

    Ok(())
}

fn parse_order_row(row: &Row<'_>) -> RepoResult<ServiceOrder> {
    let id_text: String = row.get("id")?;
    let customer_text: String = row.get("id_cliente")?;
    let origem_text: String = row.get("origem")?;
    let garantia_text: String = row.get("situacao_garantia")?;
    let status_text: String = row.get("status_atual")?;

    let prioridade = row
        .get::<_, Option<String>>("prioridade")?
        .map(|value| parse_enum(&value, "service_orders.prioridade", Priority::parse))
        .transpose()?;
    let condicao_pagamento = row
        .get::<_, Option<String>>("condicao_pagamento")?
        .map(|value| {
            parse_enum(
                &value,
                "service_orders.condicao_pagamento",
                PaymentTerms::parse,
            )
        })
        .transpose()?;
    let prazo = row
        .get::<_, Option<String>>("prazo")?
        .map(|value| {
            NaiveDate::parse_from_str(&value, PRAZO_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid date `{value}` in service_orders.prazo"
                ))
            })
        })
        .transpose()?;

    let order = ServiceOrder {
        id: parse_uuid(&id_text, "service_orders.id")?,
        numero: row.get("numero")?,
        id_cliente: parse_uuid(&customer_text, "service_orders.id_cliente")?,
        id_tecnico_principal: parse_optional_uuid(
            row.get("id_tecnico_principal")?,
            "service_orders.id_tecnico_principal",
        )?,
        id_ocorrencia: parse_optional_uuid(
            row.get("id_ocorrencia")?,
            "service_orders.id_ocorrencia",
        )?,
        origem: parse_enum(&origem_text, "service_orders.origem", Origin::parse)?,
        situacao_garantia: parse_enum(
            &garantia_text,
            "service_orders.situacao_garantia",
            WarrantyStatus::parse,
        )?,
        prioridade,
        condicao_pagamento,
        status: parse_enum(&status_text, "service_orders.status_atual", OrderStatus::parse)?,
        laudo: row.get("laudo")?,
        motivo_cancelamento: row.get("motivo_cancelamento")?,
        prazo,
        data_inicio_execucao: row.get("data_inicio_execucao")?,
        data_fim_execucao: row.get("data_fim_execucao")?,
        id_dinamics_os: row.get("id_dinamics_os")?,
        created_by: parse_optional_uuid(row.get("created_by")?, "service_orders.created_by")?,
    };
    order.validate()?;
    Ok(order)
}
