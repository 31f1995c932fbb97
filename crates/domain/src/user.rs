//! User entity.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A registered user. Immutable once created except for the `active` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active user, validating the email shape.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let email = email.into();
        let name = name.into();

        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(DomainError::InvalidEmail(email));
        }
        if name.trim().is_empty() {
            return Err(DomainError::Validation("user name must not be empty".into()));
        }

        Ok(Self {
            id: UserId::new(),
            email,
            name,
            active: true,
            created_at: Utc::now(),
        })
    }
}
