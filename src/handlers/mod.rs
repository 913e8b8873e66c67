pub mod answers;
pub mod questions;
pub mod super_admin;
pub mod users;
