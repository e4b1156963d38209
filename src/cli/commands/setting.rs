use crate::db::Store;

pub async fn cmd_setting_get(store: &Store, key: &str) -> anyhow::Result<()> {
    match store.get_setting(key).await? {
        Some(setting) => println!("{} = {}", setting.key, setting.value.unwrap_or_default()),
        None => println!("{key} is not set"),
    }
    Ok(())
}

pub async fn cmd_setting_set(store: &Store, key: &str, value: &str) -> anyhow::Result<()> {
    let setting = store.set_setting(key, Some(value)).await?;
    println!(
        "{} = {}",
        setting.key,
        setting.value.as_deref().unwrap_or_default()
    );
    Ok(())
}

pub async fn cmd_setting_unset(store: &Store, key: &str) -> anyhow::Result<()> {
    store.delete_setting(key).await?;
    println!("Cleared {key}");
    Ok(())
}

pub async fn cmd_setting_list(store: &Store) -> anyhow::Result<()> {
    let settings = store.list_settings().await?;
    if settings.is_empty() {
        println!("No settings stored.");
        return Ok(());
    }

    for setting in settings {
        println!(
            "{} = {}  ({})",
            setting.key,
            setting.value.unwrap_or_default(),
            setting.updated_at
        );
    }
    Ok(())
}
