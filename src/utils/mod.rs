pub mod clock;
pub mod student_cache;
pub mod validate;
