//! Business-logic layer shared by every front end.

pub mod chat_service;

pub use chat_service::ProfileChatService;
