pub mod common;
pub mod import;
pub mod movement;
pub mod rate;
pub mod report;
pub mod summary;
