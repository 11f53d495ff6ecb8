pub mod draw;
pub mod schedule;
pub mod validate;
