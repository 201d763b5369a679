pub mod audio;
pub mod endings;
pub mod images;
pub mod scripts;
pub mod videos;
