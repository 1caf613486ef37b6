pub mod users_handlers;

pub use users_handlers::{
    cancel_delete_handler, cancel_edit_handler, change_page_handler, confirm_delete_handler,
    reload_handler, request_delete_handler, save_user_handler, start_edit_handler, users_page,
};
