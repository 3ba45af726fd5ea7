pub mod attendance;
pub mod stats;
pub mod status;
pub mod student;
