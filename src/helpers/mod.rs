pub mod browser;
pub mod download;
pub mod pdf;
pub mod sheet;
