//! Classification enums shared by occurrences and service orders.
//!
//! Storage strings match the values used by the intake forms and the ERP
//! export, so they must never be renamed.

use serde::{Deserialize, Serialize};

/// Urgency of an occurrence or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "baixa",
            Self::Medium => "media",
            Self::High => "alta",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "baixa" => Some(Self::Low),
            "media" => Some(Self::Medium),
            "alta" => Some(Self::High),
            _ => None,
        }
    }
}

/// Where the work is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// In the repair shop.
    #[default]
    Workshop,
    /// At the customer site.
    Field,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workshop => "oficina",
            Self::Field => "campo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "oficina" => Some(Self::Workshop),
            "campo" => Some(Self::Field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    UnderWarranty,
    #[default]
    OutOfWarranty,
}

impl WarrantyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnderWarranty => "garantia",
            Self::OutOfWarranty => "fora_garantia",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "garantia" => Some(Self::UnderWarranty),
            "fora_garantia" => Some(Self::OutOfWarranty),
            _ => None,
        }
    }

    /// Human-readable label used in occurrence details.
    pub fn label(self) -> &'static str {
        match self {
            Self::UnderWarranty => "Em Garantia",
            Self::OutOfWarranty => "Fora de Garantia",
        }
    }
}

/// Payment terms chosen when a quotation is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    Cash,
    Installments,
    BankSlip,
    Card,
}

impl PaymentTerms {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "a_vista",
            Self::Installments => "parcelado",
            Self::BankSlip => "boleto",
            Self::Card => "cartao",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "a_vista" => Some(Self::Cash),
            "parcelado" => Some(Self::Installments),
            "boleto" => Some(Self::BankSlip),
            "cartao" => Some(Self::Card),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Origin, PaymentTerms, Priority, WarrantyStatus};

    #[test]
    fn defaults_match_intake_form() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Origin::default(), Origin::Workshop);
        assert_eq!(WarrantyStatus::default(), WarrantyStatus::OutOfWarranty);
    }

    #[test]
    fn parse_rejects_unknown_storage_values() {
        assert_eq!(Priority::parse("urgente"), None);
        assert_eq!(Origin::parse("Campo"), None);
        assert_eq!(PaymentTerms::parse("pix"), None);
        assert_eq!(PaymentTerms::parse("boleto"), Some(PaymentTerms::BankSlip));
    }
}
