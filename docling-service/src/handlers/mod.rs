pub mod convert;
pub mod health;
pub mod jobs;
pub mod status;

pub mod utils;
