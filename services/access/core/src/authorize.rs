use uuid::Uuid;

use crate::domains::identity::model::Role;
use crate::engine_error::EngineError;

/// Identity of the caller performing an authorization check: the claims an
/// access token carries, nothing more.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub building_id: Option<Uuid>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::BuildingAdmin)
    }

    fn same_building(&self, building: Uuid) -> bool {
        self.role == Role::SuperAdmin || self.building_id == Some(building)
    }
}

/// The capabilities named in the authorization matrix (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateVisit,
    UpdateCancelVisit,
    ScanQr,
    ManageBan,
    ReadBuildingBans,
    ApproveRegistrations,
    SystemDashboard,
}

impl Capability {
    fn required_roles(self) -> &'static str {
        match self {
            Capability::CreateVisit => "resident, building_admin, or super_admin",
            Capability::UpdateCancelVisit => "host, building_admin, or super_admin",
            Capability::ScanQr => "security, building_admin, or super_admin",
            Capability::ManageBan => "super_admin, building_admin, resident, or security",
            Capability::ReadBuildingBans => "super_admin, building_admin, resident, or security",
            Capability::ApproveRegistrations => "building_admin or super_admin",
            Capability::SystemDashboard => "super_admin",
        }
    }
}

/// Per-capability scope data, matching the "scope predicate" column of the
/// authorization matrix.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    /// `create visit`: the building the visit would be created in.
    Building(Uuid),
    /// `update/cancel visit`, `scan`: the visit's host and building.
    Visit { host: Uuid, building: Uuid },
    /// `ban/unban` personal operations: the ban's owner.
    BanOwner(Uuid),
    /// Capabilities with no further scope predicate beyond role membership.
    None,
}

/// Pure predicate over `(role, capability, scope)`. Never touches storage;
/// callers resolve the scope's ids beforehand.
pub fn authorize(ctx: &AuthContext, capability: Capability, scope: Scope) -> Result<(), EngineError> {
    let granted = match (capability, scope) {
        (Capability::CreateVisit, Scope::Building(building)) => match ctx.role {
            Role::SuperAdmin => true,
            Role::BuildingAdmin | Role::Resident => ctx.same_building(building),
            _ => false,
        },
        (Capability::UpdateCancelVisit, Scope::Visit { host, building }) => match ctx.role {
            Role::SuperAdmin => true,
            Role::BuildingAdmin => ctx.same_building(building),
            Role::Resident => ctx.user_id == host,
            _ => false,
        },
        (Capability::ScanQr, Scope::Visit { building, .. }) => match ctx.role {
            Role::SuperAdmin => true,
            Role::BuildingAdmin | Role::Security => ctx.same_building(building),
            _ => false,
        },
        (Capability::ManageBan, Scope::BanOwner(owner)) => match ctx.role {
            Role::SuperAdmin | Role::BuildingAdmin | Role::Resident | Role::Security => {
                ctx.user_id == owner || ctx.is_admin()
            },
            _ => false,
        },
        (Capability::ReadBuildingBans, Scope::Building(building)) => match ctx.role {
            Role::SuperAdmin | Role::BuildingAdmin | Role::Resident | Role::Security => {
                ctx.same_building(building)
            },
            _ => false,
        },
        (Capability::ApproveRegistrations, Scope::Building(building)) => match ctx.role {
            Role::SuperAdmin => true,
            Role::BuildingAdmin => ctx.same_building(building),
            _ => false,
        },
        (Capability::SystemDashboard, Scope::None) => ctx.role == Role::SuperAdmin,
        _ => false,
    };

    if granted {
        Ok(())
    } else {
        Err(EngineError::AuthorizationDenied { required: capability.required_roles().to_string() })
    }
}
