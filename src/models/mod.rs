pub mod model;
pub mod prompt;
pub mod result;
pub mod setting;

pub use model::{LanguageModel, ModelUpdate, NewModel, ProviderKind};
pub use prompt::{Prompt, PromptSort};
pub use result::{PersistMode, ResultFilter, ResultSort, SavedResult};
pub use setting::Setting;
