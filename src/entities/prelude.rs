pub use super::models::Entity as Models;
pub use super::prompts::Entity as Prompts;
pub use super::results::Entity as Results;
pub use super::settings::Entity as Settings;
