// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Ownership enforcement for per-user rows.
//!
//! Rows are fetched by id and then checked against the session's user before
//! any mutation. A row owned by someone else is a permission error, never a
//! silent no-op.

use crate::models::WorkoutLog;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID, if the row has one.
    fn owner_user_id(&self) -> Option<&str>;

    /// Label used in permission errors.
    fn resource_label(&self) -> String;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the user doesn't own the resource.
    fn verify_ownership(&self, user_id: &str) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user_id: &str) -> StorageResult<()> {
        if self.owner_user_id() == Some(user_id) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user_id.to_string(),
                resource: self.resource_label(),
            })
        }
    }
}

impl OwnedResource for WorkoutLog {
    fn owner_user_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    fn resource_label(&self) -> String {
        format!("workout log {}", self.id)
    }
}
