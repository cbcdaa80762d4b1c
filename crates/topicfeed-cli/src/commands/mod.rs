pub mod fetch;
pub mod list;
