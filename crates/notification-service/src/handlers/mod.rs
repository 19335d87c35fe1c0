//! HTTP 处理器

pub mod health;
pub mod notification;
pub mod preferences;
pub mod push_token;
