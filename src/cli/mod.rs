pub mod charts;
pub mod dashboard;
pub mod session;
pub mod setup;
pub mod tables;
pub mod ui;
pub mod valuate;
