//! User directory: who may receive alerts.
//!
//! A user is a `(username, phone)` pair where both halves are unique across
//! the directory. Only the lookup and insert contract lives here; where the
//! records are kept is up to the implementation.

use std::sync::RwLock;

use thiserror::Error;

use crate::logging::{self, DataSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Username and phone number are required")]
    MissingField,
    #[error("Username or phone number already exists")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User directory unavailable: {0}")]
    Backend(String),
}

pub trait UserDirectory: Send + Sync {
    /// Any user holding either `username` or `phone_number`.
    fn find_conflict(&self, username: &str, phone_number: &str) -> Result<Option<User>, DirectoryError>;

    /// The user holding exactly this pair.
    fn find_exact(&self, username: &str, phone_number: &str) -> Result<Option<User>, DirectoryError>;

    fn insert(&self, user: User) -> Result<(), DirectoryError>;
}

fn required(username: &str, phone_number: &str) -> Result<(String, String), DirectoryError> {
    let username = username.trim();
    let phone_number = phone_number.trim();
    if username.is_empty() || phone_number.is_empty() {
        return Err(DirectoryError::MissingField);
    }
    Ok((username.to_string(), phone_number.to_string()))
}

/// Add a new user. Fails if either the username or the phone number is
/// already registered.
pub fn register(
    directory: &dyn UserDirectory,
    username: &str,
    phone_number: &str,
) -> Result<User, DirectoryError> {
    let (username, phone_number) = required(username, phone_number)?;

    if directory.find_conflict(&username, &phone_number)?.is_some() {
        logging::warn(
            DataSource::Directory,
            Some(&username),
            "Registration rejected: username or phone number already exists",
        );
        return Err(DirectoryError::AlreadyExists);
    }

    let user = User {
        username,
        phone_number,
    };
    directory.insert(user.clone())?;
    logging::info(DataSource::Directory, Some(&user.username), "User registered");
    Ok(user)
}

/// Check that the pair belongs to a registered user.
pub fn login(
    directory: &dyn UserDirectory,
    username: &str,
    phone_number: &str,
) -> Result<User, DirectoryError> {
    let (username, phone_number) = required(username, phone_number)?;
    directory
        .find_exact(&username, &phone_number)?
        .ok_or(DirectoryError::InvalidCredentials)
}

// ---------------------------------------------------------------------------
// In-memory directory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> DirectoryError {
    DirectoryError::Backend("directory lock poisoned".to_string())
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_conflict(&self, username: &str, phone_number: &str) -> Result<Option<User>, DirectoryError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .find(|u| u.username == username || u.phone_number == phone_number)
            .cloned())
    }

    fn find_exact(&self, username: &str, phone_number: &str) -> Result<Option<User>, DirectoryError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .find(|u| u.username == username && u.phone_number == phone_number)
            .cloned())
    }

    fn insert(&self, user: User) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(poisoned)?;
        // Re-check under the write lock so two concurrent registrations
        // cannot both succeed.
        if users
            .iter()
            .any(|u| u.username == user.username || u.phone_number == user.phone_number)
        {
            return Err(DirectoryError::AlreadyExists);
        }
        users.push(user);
        Ok(())
    }
}
