pub mod notification;
pub mod registry;
pub mod users;

pub use notification::{Notification, NotificationKind};
pub use registry::ViewRegistry;
pub use users::{Direction, FetchTicket, RowState, UsersView, ViewError};
