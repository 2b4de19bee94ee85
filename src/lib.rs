pub mod detect;
pub mod encode;
pub mod media;
pub mod pipeline;
pub mod video;
