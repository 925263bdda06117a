pub mod angle;
pub mod config;
pub mod exercise;
pub mod feedback;
pub mod rep_counter;

// Frame-ordered session driver
pub mod session;
