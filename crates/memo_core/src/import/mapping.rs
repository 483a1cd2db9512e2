//! Spreadsheet column aliases, row-to-record mapping and templates.
//!
//! Each field reads the first non-blank value among its aliases: the
//! ERP's human headers first, then the storage column name.

use crate::import::sheet::SheetRow;
use crate::import::ImportError;
use crate::model::customer::{Customer, CustomerStatus};
use crate::model::product::Product;
use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;

pub const CUSTOMER_RAZAO_SOCIAL: &[&str] = &["Razão Social", "razao_social"];
pub const CUSTOMER_NOME: &[&str] = &["Razão Social", "razao_social", "nome"];
pub const CUSTOMER_EMPRESA: &[&str] = &["Empresa", "empresa"];
pub const CUSTOMER_NUMERO_CONTA: &[&str] = &["Número da Conta", "numero_conta"];
pub const CUSTOMER_TELEFONE_PRINCIPAL: &[&str] = &["Telefone Principal", "telefone_principal"];
pub const CUSTOMER_CIDADE: &[&str] = &["Cidade", "cidade"];
pub const CUSTOMER_CONTATO_PRIMARIO: &[&str] = &["Contato Primário", "contato_primario"];
pub const CUSTOMER_EMAIL_CONTATO: &[&str] =
    &["Email (Contato Primário) (Contato)", "email_contato"];
pub const CUSTOMER_STATUS: &[&str] = &["Status", "status"];

pub const PRODUCT_CODIGO: &[&str] = &["Número do Produto (Produto) (Produto)", "codigo"];
pub const PRODUCT_NOME: &[&str] = &["Produto", "nome"];
pub const PRODUCT_DESCRICAO: &[&str] = &["Descrição", "descricao"];

/// Customer record for a row, or `None` when no name can be derived.
///
/// Unknown status text falls back to `Ativa`.
pub fn customer_from_row(row: &SheetRow) -> Option<Customer> {
    let nome = row.first_of(CUSTOMER_NOME)?;

    let mut customer = Customer::new(nome);
    customer.razao_social = row.first_of(CUSTOMER_RAZAO_SOCIAL);
    customer.empresa = row.first_of(CUSTOMER_EMPRESA);
    customer.numero_conta = row.first_of(CUSTOMER_NUMERO_CONTA);
    customer.telefone_principal = row.first_of(CUSTOMER_TELEFONE_PRINCIPAL);
    customer.cidade = row.first_of(CUSTOMER_CIDADE);
    customer.contato_primario = row.first_of(CUSTOMER_CONTATO_PRIMARIO);
    customer.email_contato = row.first_of(CUSTOMER_EMAIL_CONTATO);
    customer.status = row
        .first_of(CUSTOMER_STATUS)
        .and_then(|value| CustomerStatus::parse_lenient(&value))
        .unwrap_or_default();
    Some(customer)
}

/// Product record for a row, or `None` when `codigo` is blank.
///
/// A missing name falls back to the code.
pub fn product_from_row(row: &SheetRow) -> Option<Product> {
    let codigo = row.first_of(PRODUCT_CODIGO)?;
    let nome = row.first_of(PRODUCT_NOME).unwrap_or_else(|| codigo.clone());

    let mut product = Product::new(codigo, nome);
    product.descricao = row.first_of(PRODUCT_DESCRICAO);
    Some(product)
}

/// Downloadable import template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Customers,
    Products,
}

impl Template {
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Customers => &[
                "Razão Social",
                "Empresa",
                "Número da Conta",
                "Telefone Principal",
                "Cidade",
                "Contato Primário",
                "Email (Contato Primário) (Contato)",
                "Status",
            ],
            Self::Products => &["Número do Produto (Produto) (Produto)", "Produto", "Descrição"],
        }
    }

    pub fn example_row(self) -> &'static [&'static str] {
        match self {
            Self::Customers => &[
                "EXEMPLO LTDA",
                "E001",
                "C123456",
                "16999999999",
                "São Paulo",
                "João Silva",
                "contato@exemplo.com",
                "Ativa",
            ],
            Self::Products => &["123456", "EXEMPLO DE PRODUTO", "Descrição do produto exemplo"],
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Customers => "Clientes",
            Self::Products => "Produtos",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Customers => "template_clientes",
            Self::Products => "template_produtos",
        }
    }

    /// Header row plus one example row as an xlsx workbook.
    pub fn to_xlsx(self) -> Result<Vec<u8>, ImportError> {
        let xlsx_err = |err: rust_xlsxwriter::XlsxError| ImportError::Workbook(err.to_string());

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.sheet_name()).map_err(xlsx_err)?;

        let bold = Format::new().set_bold();
        for (col, header) in self.headers().iter().enumerate() {
            let col = u16::try_from(col).unwrap_or(u16::MAX);
            worksheet
                .write_string_with_format(0, col, *header, &bold)
                .map_err(xlsx_err)?;
        }
        for (col, value) in self.example_row().iter().enumerate() {
            let col = u16::try_from(col).unwrap_or(u16::MAX);
            worksheet.write_string(1, col, *value).map_err(xlsx_err)?;
        }

        workbook.save_to_buffer().map_err(xlsx_err)
    }

    /// Same content as `to_xlsx`, as CSV.
    pub fn write_csv<W: Write>(self, writer: W) -> Result<(), ImportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.headers())?;
        csv_writer.write_record(self.example_row())?;
        csv_writer.flush()?;
        Ok(())
    }
}
