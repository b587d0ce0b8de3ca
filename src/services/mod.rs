pub mod api;
pub mod auth;
pub mod ballot;
pub mod home;
pub mod navigation;
pub mod reconciler;
pub mod results;
pub mod session;
pub mod validation;
pub mod wakeup;
