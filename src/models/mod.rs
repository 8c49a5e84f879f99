pub mod user;

pub use user::{PLACEHOLDER, UserRecord, render_user_panel};
