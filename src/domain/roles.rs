//! Roles and the capabilities they grant.
//!
//! A role is resolved into a capability set once per request; handlers only
//! ever ask `Role::allows(Permission)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Editor,
    /// Read-only role, stored as `Vizualizator`
    #[serde(rename = "Vizualizator", alias = "Viewer")]
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewInventory,
    EditInventory,
    DeleteRecords,
    ManageUsers,
    ViewAudit,
}

/// Top-level screens of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Suppliers,
    Products,
    Documents,
    UserManagement,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ViewInventory,
    Permission::EditInventory,
    Permission::DeleteRecords,
    Permission::ManageUsers,
    Permission::ViewAudit,
];
const EDITOR_PERMISSIONS: &[Permission] = &[Permission::ViewInventory, Permission::EditInventory];
const VIEWER_PERMISSIONS: &[Permission] = &[Permission::ViewInventory];

const ALL_PAGES: &[Page] = &[
    Page::Dashboard,
    Page::Suppliers,
    Page::Products,
    Page::Documents,
    Page::UserManagement,
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Vizualizator",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Editor => EDITOR_PERMISSIONS,
            Role::Viewer => VIEWER_PERMISSIONS,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Screens this role can navigate to.
    pub fn pages(&self) -> Vec<Page> {
        ALL_PAGES
            .iter()
            .copied()
            .filter(|page| match page {
                Page::UserManagement => self.allows(Permission::ManageUsers),
                _ => self.allows(Permission::ViewInventory),
            })
            .collect()
    }
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewInventory => "view_inventory",
            Permission::EditInventory => "edit_inventory",
            Permission::DeleteRecords => "delete_records",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAudit => "view_audit",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "vizualizator" | "viewer" => Ok(Role::Viewer),
            other => Err(DomainError::Validation(format!("Unknown role: {}", other))),
        }
    }
}
