pub mod clear;
pub mod list;
