pub mod catalog_service;
pub mod comment_service;
pub mod follow_service;
pub mod list_service;
pub mod notification_service;
pub mod relationship;
pub mod series_service;
pub mod user_service;
