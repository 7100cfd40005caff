pub mod guard;
pub mod pagination;
pub mod services;
