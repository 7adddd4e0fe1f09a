pub mod history;
pub mod score;
pub mod screen;
pub mod setup;
pub mod ui;
