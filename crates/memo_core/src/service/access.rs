//! Role gating for application sections and actions.
//!
//! # Invariants
//! - Operators never receive create/update/delete on admin-only sections.
//! - Catalog writes (customers, products) are admin-only.

use crate::model::session::Session;
use crate::service::{ServiceError, ServiceResult};
use log::warn;

/// Navigable application area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Dashboard,
    Occurrences,
    Kanban,
    Diagnosis,
    Agenda,
    Approval,
    Customers,
    Technicians,
    Users,
    Products,
    Mappings,
    ImportExport,
}

impl Section {
    pub const ALL: [Section; 12] = [
        Section::Dashboard,
        Section::Occurrences,
        Section::Kanban,
        Section::Diagnosis,
        Section::Agenda,
        Section::Approval,
        Section::Customers,
        Section::Technicians,
        Section::Users,
        Section::Products,
        Section::Mappings,
        Section::ImportExport,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Occurrences => "ocorrencias",
            Self::Kanban => "kanban",
            Self::Diagnosis => "diagnostico",
            Self::Agenda => "agenda",
            Self::Approval => "aprovacao",
            Self::Customers => "clientes",
            Self::Technicians => "tecnicos",
            Self::Users => "usuarios",
            Self::Products => "produtos",
            Self::Mappings => "mapeamento",
            Self::ImportExport => "import-export",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Occurrences => "Ocorrências",
            Self::Kanban => "Kanban",
            Self::Diagnosis => "Diagnóstico",
            Self::Agenda => "Agenda",
            Self::Approval => "Aprovação",
            Self::Customers => "Clientes",
            Self::Technicians => "Técnicos",
            Self::Users => "Usuários",
            Self::Products => "Produtos",
            Self::Mappings => "Mapeamento",
            Self::ImportExport => "Importar/Exportar",
        }
    }

    pub fn admin_only(self) -> bool {
        matches!(
            self,
            Self::Approval | Self::Technicians | Self::Users | Self::Mappings | Self::ImportExport
        )
    }
}

/// Write affordances a caller gets on one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Affordances {
    const NONE: Affordances = Affordances {
        create: false,
        update: false,
        delete: false,
    };
    const FULL: Affordances = Affordances {
        create: true,
        update: true,
        delete: true,
    };

    pub fn any(self) -> bool {
        self.create || self.update || self.delete
    }
}

/// Sections shown to the caller, in navigation order.
pub fn visible_sections(session: &Session) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| session.is_admin() || !section.admin_only())
        .collect()
}

pub fn affordances(session: &Session, section: Section) -> Affordances {
    if section == Section::Dashboard {
        return Affordances::NONE;
    }
    if session.is_admin() {
        return Affordances::FULL;
    }
    if section.admin_only() {
        return Affordances::NONE;
    }

    match section {
        Section::Occurrences => Affordances {
            create: true,
            update: true,
            delete: false,
        },
        // Own orders only; enforced again by the services.
        Section::Kanban | Section::Diagnosis => Affordances {
            create: false,
            update: true,
            delete: false,
        },
        _ => Affordances::NONE,
    }
}

/// Fails with `Forbidden` unless the caller is an admin.
pub fn require_admin(session: &Session, action: &'static str) -> ServiceResult<()> {
    if session.is_admin() {
        return Ok(());
    }
    warn!(
        "event=access_check module=service status=rejected user_id={} action=\"{}\"",
        session.user_id, action
    );
    Err(ServiceError::Forbidden { action })
}
