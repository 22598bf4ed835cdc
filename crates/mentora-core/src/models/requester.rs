use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::report::Report;

/// Tiered role, supplied by the external auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    InstitutionAdmin,
    SuperAdmin,
}

impl Role {
    /// Roles allowed to submit and list reports.
    pub fn can_manage_reports(&self) -> bool {
        matches!(self, Role::InstitutionAdmin | Role::SuperAdmin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "institution_admin" => Ok(Role::InstitutionAdmin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated principal a gateway request acts as.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub id: Uuid,
    pub role: Role,
}

impl Requester {
    /// Per-report visibility: the owner or a super admin. Applied uniformly
    /// to get, progress, and download.
    pub fn can_view(&self, report: &Report) -> bool {
        self.role == Role::SuperAdmin || report.created_by == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{Report, ReportFormat, ReportParameters, ReportStatus, ReportType};
    use jiff::Timestamp;

    fn report_owned_by(owner: Uuid) -> Report {
        Report {
            id: Uuid::new_v4(),
            report_type: ReportType::UserProgress,
            title: "User Progress Report".to_string(),
            format: ReportFormat::Csv,
            status: ReportStatus::Pending,
            parameters: ReportParameters::default(),
            file_path: None,
            file_size: None,
            error_message: None,
            created_by: owner,
            created_at: Timestamp::UNIX_EPOCH,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn owner_and_super_admin_can_view() {
        let owner = Uuid::new_v4();
        let report = report_owned_by(owner);

        let as_owner = Requester {
            id: owner,
            role: Role::InstitutionAdmin,
        };
        assert!(as_owner.can_view(&report));

        let as_super = Requester {
            id: Uuid::new_v4(),
            role: Role::SuperAdmin,
        };
        assert!(as_super.can_view(&report));
    }

    #[test]
    fn other_requesters_cannot_view() {
        let report = report_owned_by(Uuid::new_v4());
        for role in [Role::User, Role::InstitutionAdmin] {
            let other = Requester {
                id: Uuid::new_v4(),
                role,
            };
            assert!(!other.can_view(&report));
        }
    }

    #[test]
    fn report_management_is_admin_only() {
        assert!(!Role::User.can_manage_reports());
        assert!(Role::InstitutionAdmin.can_manage_reports());
        assert!(Role::SuperAdmin.can_manage_reports());
    }
}
