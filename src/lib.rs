pub mod app;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod history;
pub mod media;
pub mod model;
pub mod ui;
