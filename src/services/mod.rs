pub mod api_client;
pub mod users_service;

pub use api_client::{ApiError, ReqresClient, UsersApi};
pub use users_service::UsersService;
