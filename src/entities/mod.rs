pub mod prelude;

pub mod models;
pub mod prompts;
pub mod results;
pub mod settings;
