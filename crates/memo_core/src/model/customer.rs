//! Customer domain model.
//!
//! # Invariants
//! - `nome` is always non-blank.
//! - Display name falls back from `razao_social` to `nome`.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CustomerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Ativa",
            Self::Inactive => "Inativa",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Ativa" => Some(Self::Active),
            "Inativa" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Lenient parse for spreadsheet cells (`ativa`, ` Inativa `, ...).
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ativa" | "ativo" | "active" => Some(Self::Active),
            "inativa" | "inativo" | "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub nome: String,
    /// Legal company name; preferred for display when present.
    pub razao_social: Option<String>,
    pub empresa: Option<String>,
    pub numero_conta: Option<String>,
    pub telefone_principal: Option<String>,
    pub cidade: Option<String>,
    pub contato_primario: Option<String>,
    pub email_contato: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub id_dinamics: Option<String>,
    pub status: CustomerStatus,
}

impl Customer {
    /// Creates an active customer with a generated ID and no optional data.
    pub fn new(nome: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nome: nome.into(),
            razao_social: None,
            empresa: None,
            numero_conta: None,
            telefone_principal: None,
            cidade: None,
            contato_primario: None,
            email_contato: None,
            email: None,
            telefone: None,
            endereco: None,
            id_dinamics: None,
            status: CustomerStatus::Active,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("nome", &self.nome)
    }

    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }

    /// Name shown in lists: `razao_social` when non-blank, else `nome`.
    pub fn display_name(&self) -> &str {
        display_name_of(self.razao_social.as_deref(), &self.nome)
    }

    /// Display name followed by ` - {numero_conta}` when an account exists.
    pub fn display_label(&self) -> String {
        display_label_of(
            self.razao_social.as_deref(),
            &self.nome,
            self.numero_conta.as_deref(),
        )
    }

    /// Case-insensitive substring match over name, legal name and e-mails.
    ///
    /// A blank term matches every customer.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.nome.as_str()),
            self.razao_social.as_deref(),
            self.email.as_deref(),
            self.email_contato.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Display fallback shared with joined read models.
pub fn display_name_of<'a>(razao_social: Option<&'a str>, nome: &'a str) -> &'a str {
    match razao_social {
        Some(value) if !value.trim().is_empty() => value,
        _ => nome,
    }
}

pub fn display_label_of(
    razao_social: Option<&str>,
    nome: &str,
    numero_conta: Option<&str>,
) -> String {
    let name = display_name_of(razao_social, nome);
    match numero_conta {
        Some(account) if !account.trim().is_empty() => format!("{name} - {account}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Customer, CustomerStatus};

    #[test]
    fn display_name_prefers_razao_social_then_nome() {
        let mut customer = Customer::new("Oficina do Zé");
        assert_eq!(customer.display_name(), "Oficina do Zé");

        customer.razao_social = Some("   ".to_string());
        assert_eq!(customer.display_name(), "Oficina do Zé");

        customer.razao_social = Some("ZE REPAROS LTDA".to_string());
        assert_eq!(customer.display_name(), "ZE REPAROS LTDA");
    }

    #[test]
    fn display_label_appends_account_number() {
        let mut customer = Customer::new("ACME");
        assert_eq!(customer.display_label(), "ACME");
        customer.numero_conta = Some("C123".to_string());
        assert_eq!(customer.display_label(), "ACME - C123");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut customer = Customer::new("Ana");
        customer.email_contato = Some("Compras@Fazenda.com.br".to_string());
        assert!(customer.matches_search("fazenda"));
        assert!(customer.matches_search("ANA"));
        assert!(customer.matches_search(""));
        assert!(!customer.matches_search("usina"));
    }

    #[test]
    fn lenient_status_parse_accepts_sheet_variants() {
        assert_eq!(
            CustomerStatus::parse_lenient(" inativa "),
            Some(CustomerStatus::Inactive)
        );
        assert_eq!(CustomerStatus::parse_lenient("??"), None);
    }
}
