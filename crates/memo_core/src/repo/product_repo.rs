//! Product catalog repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `codigo` is unique; a second insert with the same code yields
//!   `RepoError::Duplicate` and writes nothing.

use crate::model::product::{Product, ProductId};
use crate::repo::{ensure_connection_ready, map_write_error, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRODUCT_SELECT_SQL: &str = "SELECT id, codigo, nome, descricao FROM products";

pub trait ProductRepository {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId>;
    fn update_product(&self, product: &Product) -> RepoResult<()>;
    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>>;
    fn get_product_by_code(&self, codigo: &str) -> RepoResult<Option<Product>>;
    /// Lists products ordered by name, optionally filtered by code/name.
    fn list_products(&self, search: Option<&str>) -> RepoResult<Vec<Product>>;
    fn delete_product(&self, id: ProductId) -> RepoResult<()>;
}

pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["products"])?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId> {
        product.validate()?;

        let codigo = product.codigo.trim();
        self.conn
            .execute(
                "INSERT INTO products (id, codigo, nome, descricao) VALUES (?1, ?2, ?3, ?4);",
                params![
                    product.id.to_string(),
                    codigo,
                    product.nome.trim(),
                    product.descricao.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, "product", codigo))?;

        Ok(product.id)
    }

    fn update_product(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;

        let codigo = product.codigo.trim();
        let changed = self
            .conn
            .execute(
                "UPDATE products
                 SET
                    codigo = ?1,
                    nome = ?2,
                    descricao = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4;",
                params![
                    codigo,
                    product.nome.trim(),
                    product.descricao.as_deref(),
                    product.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, "product", codigo))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "product",
                id: product.id,
            });
        }

        Ok(())
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_product_row(row)))
            .optional()?
            .transpose()
    }

    fn get_product_by_code(&self, codigo: &str) -> RepoResult<Option<Product>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRODUCT_SELECT_SQL} WHERE codigo = ?1;"))?;
        stmt.query_row([codigo.trim()], |row| Ok(parse_product_row(row)))
            .optional()?
            .transpose()
    }

    fn list_products(&self, search: Option<&str>) -> RepoResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PRODUCT_SELECT_SQL} ORDER BY nome COLLATE NOCASE ASC, codigo ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            let product = parse_product_row(row)?;
            if search.map_or(true, |term| product.matches_search(term)) {
                products.push(product);
            }
        }
        Ok(products)
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1;", [id.to_string()])
            .map_err(|err| map_write_error(err, "product", id.to_string()))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "product",
                id,
            });
        }
        Ok(())
    }
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let id_text: String = row.get("id")?;
    let product = Product {
        id: parse_uuid(&id_text, "products.id")?,
        codigo: row.get("codigo")?,
        nome: row.get("nome")?,
        descricao: row.get("descricao")?,
    };
    product.validate()?;
    Ok(product)
}
