pub mod images;
pub mod logging;
pub mod task;
