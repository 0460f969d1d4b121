//! Enumerated permissions gating the admin surface. Every protected route
//! names one of these constants; handlers never test roles directly.

use crate::entities::user::UserRole;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Permission string constants for compile-time safety.
pub mod consts {
    pub const PRODUCTS_MANAGE: &str = "products:manage";
    pub const CATEGORIES_MANAGE: &str = "categories:manage";
    pub const COUPONS_MANAGE: &str = "coupons:manage";
    pub const REVIEWS_MODERATE: &str = "reviews:moderate";
    pub const ORDERS_MANAGE: &str = "orders:manage";
    pub const OFFLINE_ORDERS_MANAGE: &str = "offline-orders:manage";
    pub const USERS_MANAGE: &str = "users:manage";
    pub const HOMEPAGE_MANAGE: &str = "homepage:manage";
}

/// Every defined permission, in stable order.
pub const ALL_PERMISSIONS: [&str; 8] = [
    consts::PRODUCTS_MANAGE,
    consts::CATEGORIES_MANAGE,
    consts::COUPONS_MANAGE,
    consts::REVIEWS_MODERATE,
    consts::ORDERS_MANAGE,
    consts::OFFLINE_ORDERS_MANAGE,
    consts::USERS_MANAGE,
    consts::HOMEPAGE_MANAGE,
];

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert("admin", ALL_PERMISSIONS.to_vec());
        // Signed-in users get no named permissions; ownership checks in the
        // services cover everything they may touch.
        map.insert("user", Vec::new());
        map
    };
}

/// Resolves the permission set for a role. The admin-email override grants
/// the full set regardless of the stored role.
pub fn permissions_for(role: UserRole, admin_override: bool) -> Vec<String> {
    if admin_override {
        return ALL_PERMISSIONS.iter().map(|p| p.to_string()).collect();
    }
    ROLE_PERMISSIONS
        .get(role.as_str())
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_holds_every_permission() {
        let perms = permissions_for(UserRole::Admin, false);
        for p in ALL_PERMISSIONS {
            assert!(perms.contains(&p.to_string()), "missing {}", p);
        }
    }

    #[test]
    fn plain_user_holds_no_named_permissions() {
        assert!(permissions_for(UserRole::User, false).is_empty());
    }

    #[test]
    fn admin_email_override_grants_full_set() {
        let perms = permissions_for(UserRole::User, true);
        assert_eq!(perms.len(), ALL_PERMISSIONS.len());
    }
}
