mod init;
mod model;
mod prompt;
mod result;
mod send;
mod setting;

pub use init::cmd_init;
pub use model::{
    cmd_model_add, cmd_model_delete, cmd_model_list, cmd_model_search, cmd_model_set_active,
    cmd_model_update,
};
pub use prompt::{
    cmd_prompt_add, cmd_prompt_delete, cmd_prompt_list, cmd_prompt_search, cmd_prompt_tag,
};
pub use result::{cmd_result_delete, cmd_result_list, cmd_result_search, cmd_result_show};
pub use send::{SendArgs, cmd_send};
pub use setting::{cmd_setting_get, cmd_setting_list, cmd_setting_set, cmd_setting_unset};

/// First line of `text`, cut to `max` characters.
fn snippet(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    let mut cut: String = line.chars().take(max).collect();
    if line.chars().count() > max || text.trim().lines().count() > 1 {
        cut.push('…');
    }
    cut
}
