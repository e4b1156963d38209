//! Prompt command handlers

use super::snippet;
use crate::db::Store;
use crate::models::prompt::{PromptSort, parse_tag_list};

pub async fn cmd_prompt_add(store: &Store, text: &str, tags: Option<&str>) -> anyhow::Result<()> {
    let tags = tags.map(parse_tag_list).unwrap_or_default();
    let prompt = store.create_prompt(text, &tags).await?;
    println!("Saved prompt {} ({})", prompt.id, prompt.created_at);
    Ok(())
}

pub async fn cmd_prompt_list(store: &Store, oldest_first: bool) -> anyhow::Result<()> {
    let sort = if oldest_first {
        PromptSort::OldestFirst
    } else {
        PromptSort::NewestFirst
    };
    let prompts = store.list_prompts(sort).await?;

    if prompts.is_empty() {
        println!("No prompts saved.");
        println!();
        println!("Send one with: chatlist send \"your question\"");
        return Ok(());
    }

    println!("Prompts ({} total)", prompts.len());
    println!("{:-<70}", "");
    for prompt in prompts {
        println!("[{}] {}", prompt.id, snippet(&prompt.text, 60));
        if prompt.tags.is_empty() {
            println!("  {}", prompt.created_at);
        } else {
            println!("  {} | tags: {}", prompt.created_at, prompt.tags.join(", "));
        }
    }

    Ok(())
}

pub async fn cmd_prompt_search(store: &Store, query: &str, tags_only: bool) -> anyhow::Result<()> {
    let prompts = if tags_only {
        store.search_prompts_by_tags(&parse_tag_list(query)).await?
    } else {
        store.search_prompts(query, true).await?
    };

    if prompts.is_empty() {
        println!("No prompts match '{query}'.");
        return Ok(());
    }

    for prompt in prompts {
        println!("[{}] {}", prompt.id, snippet(&prompt.text, 60));
    }
    Ok(())
}

pub async fn cmd_prompt_tag(store: &Store, id: i32, tags: &str) -> anyhow::Result<()> {
    let prompt = store.update_prompt_tags(id, &parse_tag_list(tags)).await?;
    if prompt.tags.is_empty() {
        println!("Cleared tags of prompt {id}");
    } else {
        println!("Prompt {id} tags: {}", prompt.tags.join(", "));
    }
    Ok(())
}

pub async fn cmd_prompt_delete(store: &Store, id: i32) -> anyhow::Result<()> {
    let removed = store.delete_prompt(id).await?;
    println!("Deleted prompt {id} and {removed} saved response(s)");
    Ok(())
}
