//! CSV exchange with the ERP (Dynamics).
//!
//! # Responsibility
//! - Import ERP customer and product extracts.
//! - Export service orders with ERP identifiers for the reverse sync.
//!
//! # Invariants
//! - Imported customers carrying `id_dinamics` get a De-Para mapping;
//!   an ERP id that is already mapped skips the row as a duplicate.
//! - A customer already carrying the ERP id is linked, never re-created.
//! - Export timestamps are RFC 3339 in UTC.

use crate::import::batch::{ensure_admin, log_report, prepare, BatchImporter};
use crate::import::sheet::SheetRow;
use crate::import::{ImportError, ImportReport};
use crate::model::customer::Customer;
use crate::model::mapping::{ExternalMapping, MappedEntity};
use crate::model::product::Product;
use crate::model::session::Session;
use crate::repo::customer_repo::CustomerRepository;
use crate::repo::mapping_repo::MappingRepository;
use crate::repo::order_repo::{OrderListQuery, OrderRepository};
use crate::repo::product_repo::ProductRepository;
use crate::repo::RepoError;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::io::{Read, Write};

pub const ORDER_EXPORT_HEADERS: [&str; 9] = [
    "id_dinamics_os",
    "numero",
    "cliente_dinamics",
    "tecnico",
    "status",
    "laudo",
    "data_inicio",
    "data_fim",
    "produtos",
];

/// Reads a headed ERP CSV; fails when a required column is absent.
fn read_erp_csv<R: Read>(
    reader: R,
    required: &[&'static str],
) -> Result<Vec<SheetRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(ImportError::MissingColumn(*column));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let row = SheetRow::from_pairs(index + 1, headers.iter().zip(record?.iter()));
        if !row.is_blank() {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

/// Imports `id_dinamics,nome,email,telefone,endereco` rows.
pub fn import_customers_csv<R, C, M>(
    session: &Session,
    reader: R,
    customers: &C,
    mappings: &M,
    importer: &BatchImporter,
    progress: impl FnMut(u8),
) -> Result<ImportReport, ImportError>
where
    R: Read,
    C: CustomerRepository,
    M: MappingRepository,
{
    ensure_admin(session)?;
    let rows = read_erp_csv(reader, &["nome"])?;

    let (candidates, excluded) = prepare(&rows, |row| {
        let nome = row.get("nome")?;
        let mut customer = Customer::new(nome);
        customer.id_dinamics = row.first_of(&["id_dinamics"]);
        customer.email = row.first_of(&["email"]);
        customer.telefone = row.first_of(&["telefone"]);
        customer.endereco = row.first_of(&["endereco"]);
        let key = customer
            .id_dinamics
            .clone()
            .unwrap_or_else(|| customer.nome.clone());
        Some((key, customer))
    });
    if candidates.is_empty() {
        return Err(ImportError::NoValidRows {
            excluded: excluded.len(),
        });
    }

    let report = importer.run(
        candidates,
        excluded,
        |customer| {
            let id_dinamics = customer.id_dinamics.as_deref();
            if let Some(erp_id) = id_dinamics {
                if mappings.resolve(MappedEntity::Customer, erp_id)?.is_some() {
                    return Err(RepoError::Duplicate {
                        entity: "mapping",
                        key: format!("cliente:{erp_id}"),
                    });
                }
                // Registered before the De-Para existed: link it and skip the row.
                if let Some(existing) = customers.get_customer_by_id_dinamics(erp_id)? {
                    mappings.create_mapping(&ExternalMapping::new(
                        MappedEntity::Customer,
                        erp_id,
                        existing.id,
                    ))?;
                    return Err(RepoError::Duplicate {
                        entity: "customer",
                        key: format!("id_dinamics:{erp_id}"),
                    });
                }
            }
            let id = customers.create_customer(customer)?;
            if let Some(erp_id) = id_dinamics {
                mappings.create_mapping(&ExternalMapping::new(
                    MappedEntity::Customer,
                    erp_id,
                    id,
                ))?;
            }
            Ok(())
        },
        progress,
    );
    log_report("import_customers_csv", &report);
    Ok(report)
}

/// Imports `codigo,nome,descricao` rows keyed by `codigo`.
pub fn import_products_csv<R: Read, P: ProductRepository>(
    session: &Session,
    reader: R,
    products: &P,
    importer: &BatchImporter,
    progress: impl FnMut(u8),
) -> Result<ImportReport, ImportError> {
    ensure_admin(session)?;
    let rows = read_erp_csv(reader, &["codigo"])?;

    let (candidates, excluded) = prepare(&rows, |row| {
        let codigo = row.get("codigo")?.to_string();
        let nome = row.first_of(&["nome"]).unwrap_or_else(|| codigo.clone());
        let mut product = Product::new(codigo.clone(), nome);
        product.descricao = row.first_of(&["descricao"]);
        Some((codigo, product))
    });
    if candidates.is_empty() {
        return Err(ImportError::NoValidRows {
            excluded: excluded.len(),
        });
    }

    let report = importer.run(
        candidates,
        excluded,
        |product| {
            if products.get_product_by_code(&product.codigo)?.is_some() {
                return Err(RepoError::Duplicate {
                    entity: "product",
                    key: product.codigo.clone(),
                });
            }
            products.create_product(product).map(|_| ())
        },
        progress,
    );
    log_report("import_products_csv", &report);
    Ok(report)
}

/// Writes every service order in the ERP layout; returns the row count.
pub fn export_orders_csv<R: OrderRepository, W: Write>(
    session: &Session,
    orders: &R,
    writer: W,
) -> Result<usize, ImportError> {
    ensure_admin(session)?;

    let summaries = orders.list_orders(&OrderListQuery::default())?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(ORDER_EXPORT_HEADERS)?;

    for summary in &summaries {
        let order = &summary.order;
        let produtos = orders
            .list_items(order.id)?
            .iter()
            .map(|line| format!("{}:{}", line.product_codigo, line.item.quantidade))
            .collect::<Vec<_>>()
            .join(";");

        csv_writer.write_record([
            order.id_dinamics_os.clone().unwrap_or_default(),
            order.numero.clone(),
            summary.customer_id_dinamics.clone().unwrap_or_default(),
            summary.technician_nome.clone().unwrap_or_default(),
            order.status.as_str().to_string(),
            order.laudo.clone().unwrap_or_default(),
            rfc3339_or_blank(order.data_inicio_execucao),
            rfc3339_or_blank(order.data_fim_execucao),
            produtos,
        ])?;
    }
    csv_writer.flush()?;

    info!(
        "event=export_orders_csv module=import status=ok rows={}",
        summaries.len()
    );
    Ok(summaries.len())
}

/// Download name for an export produced on `day`.
pub fn export_file_name(day: NaiveDate) -> String {
    format!("export_os_{}.csv", day.format("%Y-%m-%d"))
}

fn rfc3339_or_blank(epoch_ms: Option<i64>) -> String {
    epoch_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{export_file_name, rfc3339_or_blank};
    use chrono::NaiveDate;

    #[test]
    fn export_name_uses_iso_date() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(export_file_name(day), "export_os_2026-03-10.csv");
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        assert_eq!(rfc3339_or_blank(None), "");
        assert_eq!(
            rfc3339_or_blank(Some(1_773_100_800_000)),
            "2026-03-10T00:00:00+00:00"
        );
    }
}
