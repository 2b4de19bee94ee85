pub mod image;
pub mod report;
pub mod video;
