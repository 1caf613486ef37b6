pub mod auth;
pub mod user;

pub use auth::{LoginCredentials, LoginResponse};
pub use user::{DraftFields, User, UserUpdate, UsersPage};
