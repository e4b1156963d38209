//! Saved response command handlers

use super::snippet;
use crate::db::Store;
use crate::models::{ResultFilter, ResultSort, SavedResult};
use std::collections::HashMap;

async fn model_names(store: &Store) -> anyhow::Result<HashMap<i32, String>> {
    Ok(store
        .list_models(true)
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect())
}

fn print_result(result: &SavedResult, names: &HashMap<i32, String>) {
    let model = names.get(&result.model_id).map_or("?", String::as_str);
    println!(
        "[{}] prompt {} | {} | {}",
        result.id, result.prompt_id, model, result.saved_at
    );
    println!("  {}", snippet(&result.response, 66));
    if let Some(note) = &result.note {
        println!("  Note: {note}");
    }
}

pub async fn cmd_result_list(
    store: &Store,
    prompt_id: Option<i32>,
    model_id: Option<i32>,
) -> anyhow::Result<()> {
    let filter = ResultFilter {
        prompt_id,
        model_id,
    };
    let results = store.list_results(filter, ResultSort::NewestFirst).await?;

    if results.is_empty() {
        println!("No saved responses.");
        return Ok(());
    }

    let names = model_names(store).await?;
    println!("Saved responses ({} total)", results.len());
    println!("{:-<70}", "");
    for result in &results {
        print_result(result, &names);
    }
    Ok(())
}

pub async fn cmd_result_show(store: &Store, id: i32) -> anyhow::Result<()> {
    let result = store
        .get_result(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Result {id} not found"))?;
    let prompt = store.get_prompt(result.prompt_id).await?;
    let names = model_names(store).await?;

    if let Some(prompt) = prompt {
        println!("Prompt [{}]: {}", prompt.id, prompt.text);
        println!();
    }
    let model = names.get(&result.model_id).map_or("?", String::as_str);
    println!("{} ({})", model, result.saved_at);
    println!("{:-<70}", "");
    println!("{}", result.response);
    if let Some(note) = &result.note {
        println!();
        println!("Note: {note}");
    }
    Ok(())
}

pub async fn cmd_result_search(store: &Store, query: &str) -> anyhow::Result<()> {
    let results = store.search_results(query).await?;
    if results.is_empty() {
        println!("No saved responses match '{query}'.");
        return Ok(());
    }

    let names = model_names(store).await?;
    for result in &results {
        print_result(result, &names);
    }
    Ok(())
}

pub async fn cmd_result_delete(store: &Store, id: i32) -> anyhow::Result<()> {
    store.delete_result(id).await?;
    println!("Deleted result {id}");
    Ok(())
}
