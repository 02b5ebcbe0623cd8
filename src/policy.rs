use std::fmt;

use serde::Serialize;

use crate::error::{Violation, ViolationKind};
use crate::session::Principal;
use crate::storage::{Record, RecordExt};

/// Message shown when an edit is refused.
pub const EDIT_DENIED: &str = "You do not have the permissions to edit this user!";

/// Account permission tier, stored in `users.permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Permission {
    /// Regular account (0)
    User,
    /// Administrator (1)
    Admin,
    /// System administrator (2)
    Sysadmin,
}

impl Permission {
    /// Stored integer tier.
    pub fn tier(self) -> i64 {
        match self {
            Permission::User => 0,
            Permission::Admin => 1,
            Permission::Sysadmin => 2,
        }
    }

    /// Role name shown in user listings.
    pub fn label(self) -> &'static str {
        match self {
            Permission::User => "User",
            Permission::Admin => "Admin",
            Permission::Sysadmin => "Sys Admin",
        }
    }
}

impl TryFrom<i64> for Permission {
    type Error = i64;

    fn try_from(tier: i64) -> Result<Self, Self::Error> {
        match tier {
            0 => Ok(Permission::User),
            1 => Ok(Permission::Admin),
            2 => Ok(Permission::Sysadmin),
            other => Err(other),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A policy requirement that must be satisfied.
///
/// Requirements are evaluated in order by `PolicyGate::build()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires a logged-in user
    Authenticated,
    /// Requires a logged-in user at or above a tier
    Authorized {
        /// Lowest accepted tier
        minimum: Permission,
    },
}

/// Policy requiring a logged-in user.
pub struct Authenticated;

/// Policy requiring a minimum permission tier.
pub struct Authorized {
    minimum: Permission,
}

impl Authorized {
    /// Requires at least `minimum`.
    pub fn at_least(minimum: Permission) -> Self {
        Self { minimum }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<Authorized> for PolicyReq {
    fn from(auth: Authorized) -> Self {
        PolicyReq::Authorized {
            minimum: auth.minimum,
        }
    }
}

/// Decides whether `actor` may edit the user row `target`.
///
/// Users may always edit themselves (matched by uid or username). A
/// sysadmin may edit anyone; an admin may edit regular users only.
///
/// # Examples
///
/// ```
/// use newsdesk::{authorize_edit, record, Permission, Principal};
///
/// let admin = Principal { uid: 1, username: "ada".into(), permission: Permission::Admin };
/// let user = record([("uid", 2.into()), ("username", "bob".into()), ("permissions", 0.into())]);
/// let sysadmin = record([("uid", 3.into()), ("username", "root".into()), ("permissions", 2.into())]);
///
/// assert!(authorize_edit(&admin, &user).is_ok());
/// assert!(authorize_edit(&admin, &sysadmin).is_err());
/// ```
pub fn authorize_edit(actor: &Principal, target: &Record) -> Result<(), Violation> {
    let own = target.integer("uid") == Some(actor.uid)
        || target.text("username") == Some(actor.username.as_str());
    let target_tier = target
        .integer("permissions")
        .and_then(|t| Permission::try_from(t).ok())
        .unwrap_or(Permission::User);

    let allowed = own
        || match actor.permission {
            Permission::Sysadmin => true,
            Permission::Admin => target_tier == Permission::User,
            Permission::User => false,
        };

    if allowed {
        Ok(())
    } else {
        Err(Violation::new(ViolationKind::InsufficientPermission, EDIT_DENIED))
    }
}
