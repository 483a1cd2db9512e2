//! Technician schedule reservation model.

use crate::model::order::OrderId;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReservationId = Uuid;

/// Blocks a technician's time for one service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub id_os: OrderId,
    pub id_tecnico: UserId,
    pub titulo: String,
    pub descricao: Option<String>,
    /// Epoch milliseconds.
    pub data_inicio: i64,
    /// Epoch milliseconds, strictly after `data_inicio`.
    pub data_fim: i64,
}

impl Reservation {
    pub fn new(
        id_os: OrderId,
        id_tecnico: UserId,
        titulo: impl Into<String>,
        data_inicio: i64,
        data_fim: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            id_os,
            id_tecnico,
            titulo: titulo.into(),
            descricao: None,
            data_inicio,
            data_fim,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id_os.is_nil() {
            return Err(ValidationError::MissingField("id_os"));
        }
        if self.id_tecnico.is_nil() {
            return Err(ValidationError::MissingField("id_tecnico"));
        }
        require_text("titulo", &self.titulo)?;
        if self.data_fim <= self.data_inicio {
            return Err(ValidationError::InvalidInterval {
                start: self.data_inicio,
                end: self.data_fim,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Reservation;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn end_must_be_strictly_after_start() {
        let reservation = Reservation::new(Uuid::new_v4(), Uuid::new_v4(), "Visita", 100, 100);
        assert_eq!(
            reservation.validate(),
            Err(ValidationError::InvalidInterval {
                start: 100,
                end: 100
            })
        );
    }
}
