pub mod app;
pub mod auth;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod contact;
pub mod error;
pub mod images;
pub mod orders;
pub mod state;
pub mod storage;
