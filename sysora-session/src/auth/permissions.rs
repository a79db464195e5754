//! Permission checks
//!
//! Two independent grants give full access: the owner role and the `"all"`
//! wildcard entry. Both are honoured; neither implies the other.

use super::identity::UserRecord;
use serde::{Deserialize, Serialize};

/// Permission entry granting every check
pub const PERMISSION_WILDCARD: &str = "all";

/// Whether `user` holds `permission`
pub fn grants(user: &UserRecord, permission: &str) -> bool {
    if user.role.is_owner() {
        return true;
    }

    user.permissions.contains(permission) || user.permissions.contains(PERMISSION_WILDCARD)
}

/// Permission names issued by the backend
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownPermission {
    ManageHotel,
    ManageUsers,
    ManageRooms,
    ManageReservations,
    ManageGuests,
    ManagePayments,
    ManageServices,
    ViewReports,
    ManageSettings,
    CheckInOut,
    RoomCleaning,
    RoomMaintenance,
    ViewDashboard,
}

impl KnownPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownPermission::ManageHotel => "manage_hotel",
            KnownPermission::ManageUsers => "manage_users",
            KnownPermission::ManageRooms => "manage_rooms",
            KnownPermission::ManageReservations => "manage_reservations",
            KnownPermission::ManageGuests => "manage_guests",
            KnownPermission::ManagePayments => "manage_payments",
            KnownPermission::ManageServices => "manage_services",
            KnownPermission::ViewReports => "view_reports",
            KnownPermission::ManageSettings => "manage_settings",
            KnownPermission::CheckInOut => "check_in_out",
            KnownPermission::RoomCleaning => "room_cleaning",
            KnownPermission::RoomMaintenance => "room_maintenance",
            KnownPermission::ViewDashboard => "view_dashboard",
        }
    }
}

impl AsRef<str> for KnownPermission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for KnownPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KnownPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use KnownPermission::*;

        [
            ManageHotel,
            ManageUsers,
            ManageRooms,
            ManageReservations,
            ManageGuests,
            ManagePayments,
            ManageServices,
            ViewReports,
            ManageSettings,
            CheckInOut,
            RoomCleaning,
            RoomMaintenance,
            ViewDashboard,
        ]
        .into_iter()
        .find(|p| p.as_str() == s)
        .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_owner_holds_everything_without_entries() {
        let owner = UserRecord::new(Role::Owner);
        assert!(grants(&owner, "anything"));
        assert!(grants(&owner, KnownPermission::ManagePayments.as_str()));
    }

    #[test]
    fn test_staff_only_holds_listed_permissions() {
        let staff = UserRecord::new(Role::Staff).with_permissions(["view_rooms"]);
        assert!(grants(&staff, "view_rooms"));
        assert!(!grants(&staff, "edit_billing"));
    }

    #[test]
    fn test_wildcard_is_independent_of_role() {
        let manager = UserRecord::new(Role::Manager).with_permissions([PERMISSION_WILDCARD]);
        assert!(grants(&manager, "edit_billing"));
        assert!(!manager.role.is_owner());
    }

    #[test]
    fn test_permission_names_parse() {
        assert_eq!(
            "room_cleaning".parse::<KnownPermission>(),
            Ok(KnownPermission::RoomCleaning)
        );
        assert!("fly".parse::<KnownPermission>().is_err());
        assert_eq!(KnownPermission::CheckInOut.to_string(), "check_in_out");
    }
}
