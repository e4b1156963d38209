//! Model endpoint command handlers

use crate::db::Store;
use crate::models::{LanguageModel, ModelUpdate, NewModel, ProviderKind};

fn print_model(model: &LanguageModel) {
    let status = if model.is_active { "✓" } else { "✗" };
    let provider = model
        .provider
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);

    println!("{} [{}] {}", status, model.id, model.name);
    println!(
        "  Provider: {} | Key: {} | URL: {}",
        provider, model.credential_ref, model.api_url
    );
}

pub async fn cmd_model_add(
    store: &Store,
    name: &str,
    url: &str,
    credential: &str,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let mut new = NewModel::new(name, url, credential);
    if let Some(kind) = provider.and_then(ProviderKind::parse) {
        new = new.with_provider(kind);
    }
    let model = store.create_model(&new).await?;

    println!("Added model:");
    print_model(&model);
    Ok(())
}

pub async fn cmd_model_list(store: &Store, include_inactive: bool) -> anyhow::Result<()> {
    let models = store.list_models(include_inactive).await?;

    if models.is_empty() {
        println!("No models configured.");
        println!();
        println!("Add one with: chatlist model add <name> <url> <ENV_VAR_WITH_KEY>");
        return Ok(());
    }

    println!("Models ({} total)", models.len());
    println!("{:-<70}", "");
    for model in &models {
        print_model(model);
    }
    println!();
    println!("Legend: ✓ Active | ✗ Inactive");

    Ok(())
}

pub async fn cmd_model_search(store: &Store, query: &str) -> anyhow::Result<()> {
    let models = store.search_models(query).await?;
    if models.is_empty() {
        println!("No models match '{query}'.");
    }
    for model in &models {
        print_model(model);
    }
    Ok(())
}

pub async fn cmd_model_update(
    store: &Store,
    id: i32,
    name: Option<String>,
    url: Option<String>,
    credential: Option<String>,
    provider: Option<String>,
) -> anyhow::Result<()> {
    let update = ModelUpdate {
        name,
        api_url: url,
        credential_ref: credential,
        provider: provider.map(|p| ProviderKind::parse(&p)),
        is_active: None,
    };

    if update.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let model = store.update_model(id, &update).await?;
    println!("Updated model:");
    print_model(&model);
    Ok(())
}

pub async fn cmd_model_set_active(store: &Store, id: i32, active: bool) -> anyhow::Result<()> {
    let model = store.set_model_active(id, active).await?;
    let state = if model.is_active { "enabled" } else { "disabled" };
    println!("Model {} {}", model.name, state);
    Ok(())
}

pub async fn cmd_model_delete(store: &Store, id: i32) -> anyhow::Result<()> {
    let removed = store.delete_model(id).await?;
    println!("Deleted model {id} and {removed} saved response(s)");
    Ok(())
}
