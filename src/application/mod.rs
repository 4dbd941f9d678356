pub mod auth;
pub mod catalog;
pub mod comments;
pub mod editor;
pub mod error;
pub mod pagination;
pub mod repos;
