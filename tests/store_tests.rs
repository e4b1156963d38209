//! Store behaviour against a real SQLite file.

use chatlist::db::Store;
use chatlist::error::StoreError;
use chatlist::models::setting::AUTO_SAVE;
use chatlist::models::{
    ModelUpdate, NewModel, PersistMode, PromptSort, ProviderKind, ResultFilter, ResultSort,
};
use std::path::PathBuf;

fn temp_db() -> (PathBuf, String) {
    let path =
        std::env::temp_dir().join(format!("chatlist-store-test-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite:{}", path.display());
    (path, url)
}

async fn open_store() -> Store {
    let (_, url) = temp_db();
    Store::open(&url).await.expect("failed to open store")
}

fn gpt() -> NewModel {
    NewModel::new(
        "gpt-4o-mini",
        "https://api.openai.com/v1/chat/completions",
        "OPENAI_API_KEY",
    )
}

fn llama() -> NewModel {
    NewModel::new(
        "meta-llama/llama-3.3-70b-instruct",
        "https://openrouter.ai/api/v1/chat/completions",
        "OPENROUTER_API_KEY",
    )
    .with_provider(ProviderKind::OpenRouter)
}

#[tokio::test]
async fn test_create_model_defaults() {
    let store = open_store().await;

    let created = store.create_model(&llama()).await.unwrap();
    assert!(created.is_active);
    assert_eq!(created.provider, Some(ProviderKind::OpenRouter));
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store.get_model(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_model_name_rejected() {
    let store = open_store().await;

    let first = store.create_model(&gpt()).await.unwrap();
    let mut again = gpt();
    again.api_url = "https://example.com/v1/chat/completions".to_string();

    let err = store.create_model(&again).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref name) if name == "gpt-4o-mini"));

    let models = store.list_models(true).await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].api_url, first.api_url);
}

#[tokio::test]
async fn test_model_validation_happens_before_io() {
    let store = open_store().await;

    let blank_name = NewModel::new("  ", "https://x.test/v1", "KEY");
    assert!(matches!(
        store.create_model(&blank_name).await,
        Err(StoreError::InvalidArgument(_))
    ));

    let bad_url = NewModel::new("m", "ftp://x.test", "KEY");
    assert!(matches!(
        store.create_model(&bad_url).await,
        Err(StoreError::InvalidArgument(_))
    ));

    assert!(store.list_models(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_active_models_sorted_and_filtered() {
    let store = open_store().await;

    let llama = store.create_model(&llama()).await.unwrap();
    let gpt = store.create_model(&gpt()).await.unwrap();
    let deepseek = store
        .create_model(&NewModel::new(
            "deepseek-chat",
            "https://api.deepseek.com/chat/completions",
            "DEEPSEEK_API_KEY",
        ))
        .await
        .unwrap();

    store.set_model_active(gpt.id, false).await.unwrap();

    let active: Vec<_> = store
        .list_active_models()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(active, [deepseek.id, llama.id]);
    assert_eq!(store.list_models(true).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_model() {
    let store = open_store().await;
    let gpt = store.create_model(&gpt()).await.unwrap();
    let other = store.create_model(&llama()).await.unwrap();

    let update = ModelUpdate {
        credential_ref: Some("OTHER_KEY".to_string()),
        provider: Some(Some(ProviderKind::OpenAi)),
        ..Default::default()
    };
    let updated = store.update_model(gpt.id, &update).await.unwrap();
    assert_eq!(updated.credential_ref, "OTHER_KEY");
    assert_eq!(updated.provider, Some(ProviderKind::OpenAi));
    assert!(updated.updated_at > gpt.updated_at);

    let rename = ModelUpdate {
        name: Some(other.name.clone()),
        ..Default::default()
    };
    assert!(matches!(
        store.update_model(gpt.id, &rename).await,
        Err(StoreError::DuplicateName(_))
    ));
    assert!(
        store
            .update_model(9999, &update)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let store = open_store().await;
    assert!(matches!(
        store.create_prompt("   \n", &[]).await,
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(store.list_prompts(PromptSort::Id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_prompt_timestamps_are_monotonic() {
    let store = open_store().await;

    let mut ids = Vec::new();
    let mut stamps = Vec::new();
    for i in 0..20 {
        let prompt = store.create_prompt(&format!("prompt {i}"), &[]).await.unwrap();
        ids.push(prompt.id);
        stamps.push(prompt.created_at);
    }

    assert!(stamps.windows(2).all(|w| w[0] < w[1]));

    let newest: Vec<_> = store
        .list_prompts(PromptSort::NewestFirst)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    ids.reverse();
    assert_eq!(newest, ids);
}

#[tokio::test]
async fn test_prompt_tags_and_search() {
    let store = open_store().await;

    let rust = store
        .create_prompt(
            "Explain ownership",
            &["rust".to_string(), " lang ".to_string(), "rust".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(rust.tags, ["rust", "lang"]);

    let other = store
        .create_prompt("Explain rustling leaves", &["nature".to_string()])
        .await
        .unwrap();

    let by_tag = store
        .search_prompts_by_tags(&["rust".to_string()])
        .await
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, rust.id);

    let by_text = store.search_prompts("rustling", false).await.unwrap();
    assert_eq!(by_text.len(), 1);
    assert_eq!(by_text[0].id, other.id);

    let retagged = store
        .update_prompt_tags(other.id, &["rust".to_string()])
        .await
        .unwrap();
    assert_eq!(retagged.tags, ["rust"]);
    assert_eq!(
        store
            .search_prompts_by_tags(&["rust".to_string()])
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_persist_reject_then_replace() {
    let store = open_store().await;
    let prompt = store.create_prompt("What is 2+2?", &[]).await.unwrap();
    let model = store.create_model(&gpt()).await.unwrap();

    let first = store
        .persist_result(prompt.id, model.id, "4", None, PersistMode::Reject)
        .await
        .unwrap();

    let err = store
        .persist_result(prompt.id, model.id, "four", None, PersistMode::Reject)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateResult { prompt_id, model_id }
            if prompt_id == prompt.id && model_id == model.id
    ));

    let kept = store.get_result_for(prompt.id, model.id).await.unwrap().unwrap();
    assert_eq!(kept.response, "4");

    let replaced = store
        .persist_result(
            prompt.id,
            model.id,
            "Four.",
            Some(" checked "),
            PersistMode::Replace,
        )
        .await
        .unwrap();
    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.response, "Four.");
    assert_eq!(replaced.note.as_deref(), Some("checked"));
    assert!(replaced.saved_at > first.saved_at);

    let all = store
        .list_results(ResultFilter::for_prompt(prompt.id), ResultSort::Id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_persist_requires_existing_parents() {
    let store = open_store().await;
    let prompt = store.create_prompt("hello", &[]).await.unwrap();
    let model = store.create_model(&gpt()).await.unwrap();

    let err = store
        .persist_result(prompt.id, 404, "text", None, PersistMode::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "Model", .. }));

    let err = store
        .persist_result(404, model.id, "text", None, PersistMode::Replace)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "Prompt", .. }));

    let err = store
        .persist_result(prompt.id, model.id, "  ", None, PersistMode::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_concurrent_persist_only_one_wins() {
    let store = open_store().await;
    let prompt = store.create_prompt("race", &[]).await.unwrap();
    let model = store.create_model(&gpt()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .persist_result(
                    prompt.id,
                    model.id,
                    &format!("answer {i}"),
                    None,
                    PersistMode::Reject,
                )
                .await
        }));
    }

    let mut saved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => saved += 1,
            Err(StoreError::DuplicateResult { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(saved, 1);
}

#[tokio::test]
async fn test_delete_prompt_cascades() {
    let store = open_store().await;
    let keep = store.create_prompt("keep me", &[]).await.unwrap();
    let doomed = store.create_prompt("delete me", &[]).await.unwrap();
    let a = store.create_model(&gpt()).await.unwrap();
    let b = store.create_model(&llama()).await.unwrap();

    for model in [a.id, b.id] {
        store
            .persist_result(doomed.id, model, "bye", None, PersistMode::Reject)
            .await
            .unwrap();
    }
    store
        .persist_result(keep.id, a.id, "stay", None, PersistMode::Reject)
        .await
        .unwrap();

    assert_eq!(store.delete_prompt(doomed.id).await.unwrap(), 2);
    assert!(store.get_prompt(doomed.id).await.unwrap().is_none());

    let remaining = store
        .list_results(ResultFilter::default(), ResultSort::Id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].prompt_id, keep.id);

    assert!(store.delete_prompt(doomed.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_model_removes_only_its_results() {
    let store = open_store().await;
    let prompt = store.create_prompt("compare", &[]).await.unwrap();
    let a = store.create_model(&gpt()).await.unwrap();
    let b = store.create_model(&llama()).await.unwrap();

    for model in [a.id, b.id] {
        store
            .persist_result(prompt.id, model, "answer", None, PersistMode::Reject)
            .await
            .unwrap();
    }

    assert_eq!(store.delete_model(a.id).await.unwrap(), 1);
    assert!(store.get_prompt(prompt.id).await.unwrap().is_some());

    let left = store
        .list_results(ResultFilter::for_prompt(prompt.id), ResultSort::Id)
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].model_id, b.id);

    assert!(store.delete_model(a.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_result_search_and_delete() {
    let store = open_store().await;
    let prompt = store.create_prompt("colors", &[]).await.unwrap();
    let a = store.create_model(&gpt()).await.unwrap();

    let saved = store
        .persist_result(
            prompt.id,
            a.id,
            "The sky is blue",
            Some("nice"),
            PersistMode::Reject,
        )
        .await
        .unwrap();

    assert_eq!(store.search_results("blue").await.unwrap().len(), 1);
    assert_eq!(store.search_results("nice").await.unwrap().len(), 1);
    assert!(store.search_results("green").await.unwrap().is_empty());

    store.delete_result(saved.id).await.unwrap();
    assert!(store.get_result(saved.id).await.unwrap().is_none());
    assert!(store.delete_result(saved.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_settings_round_trip() {
    let store = open_store().await;

    assert!(store.get_setting(AUTO_SAVE).await.unwrap().is_none());

    let first = store.set_setting(AUTO_SAVE, Some("true")).await.unwrap();
    assert_eq!(store.setting_bool(AUTO_SAVE).await.unwrap(), Some(true));

    let second = store.set_setting(AUTO_SAVE, Some("off")).await.unwrap();
    assert!(second.updated_at > first.updated_at);
    assert_eq!(store.setting_bool(AUTO_SAVE).await.unwrap(), Some(false));

    store.set_setting("note", None).await.unwrap();
    let note = store.get_setting("note").await.unwrap().unwrap();
    assert_eq!(note.value, None);

    store.set_setting("request_timeout_seconds", Some("abc")).await.unwrap();
    assert_eq!(
        store.setting_u64("request_timeout_seconds").await.unwrap(),
        None
    );

    let keys: Vec<_> = store
        .list_settings()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.key)
        .collect();
    assert_eq!(keys, [AUTO_SAVE, "note", "request_timeout_seconds"]);

    store.delete_setting("note").await.unwrap();
    assert!(store.delete_setting("note").await.unwrap_err().is_not_found());
    assert!(matches!(
        store.set_setting(" ", Some("x")).await,
        Err(StoreError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_reopen_keeps_data() {
    let (path, url) = temp_db();

    let store = Store::open(&url).await.unwrap();
    let prompt = store.create_prompt("persisted", &[]).await.unwrap();
    store.ensure_schema().await.unwrap();
    store.close().await.unwrap();

    let reopened = Store::open(&url).await.unwrap();
    reopened.ensure_schema().await.unwrap();
    let fetched = reopened.get_prompt(prompt.id).await.unwrap().unwrap();
    assert_eq!(fetched.text, "persisted");
    reopened.ping().await.unwrap();
    reopened.close().await.unwrap();

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = Store::open("sqlite::memory:").await.unwrap();
    let prompt = store.create_prompt("ephemeral", &[]).await.unwrap();
    assert!(store.get_prompt(prompt.id).await.unwrap().is_some());
}
