//! The user directory: logging in by name and the admin's user management page.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod increment_age_endpoint;
mod users_page;

pub use core::log_in;
pub use create_endpoint::create_user_endpoint;
pub use delete_endpoint::delete_user_endpoint;
pub use increment_age_endpoint::increment_age_endpoint;
pub use users_page::get_users_page;
