//! Permission registry.
//!
//! Permission keys are declared once, up front. Grant paths validate keys
//! against the registry; the check path never consults it, so an undeclared
//! key at check time simply resolves to deny.

use std::sync::Arc;

use crate::error::AuthzError;
use crate::models::Permission;
use crate::store::Store;

#[derive(Clone)]
pub struct PermissionRegistry {
    store: Arc<dyn Store>,
}

impl PermissionRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Declare a permission key with a human label.
    pub async fn declare(&self, permission_key: &str, label: &str) -> Result<Permission, AuthzError> {
        if permission_key.trim().is_empty() {
            return Err(AuthzError::invalid_input("permission key must not be empty"));
        }

        let permission = Permission::new(permission_key.to_string(), label.to_string());
        if !self.store.insert_permission(&permission).await? {
            return Err(AuthzError::Conflict(format!(
                "permission '{}' is already declared",
                permission_key
            )));
        }
        Ok(permission)
    }

    pub async fn get(&self, permission_key: &str) -> Result<Option<Permission>, AuthzError> {
        self.store.find_permission(permission_key).await
    }

    /// Grant-time validation: the key must have been declared.
    pub async fn require_declared(&self, permission_key: &str) -> Result<(), AuthzError> {
        match self.store.find_permission(permission_key).await? {
            Some(_) => Ok(()),
            None => Err(AuthzError::NotFound(format!(
                "permission '{}' is not declared",
                permission_key
            ))),
        }
    }
}
