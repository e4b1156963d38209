pub mod model;
pub mod prompt;
pub mod result;
pub mod setting;
