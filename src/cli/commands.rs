use anyhow::Context;

use crate::config::Config;
use crate::db::Store;

pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    // Secret fields are skip_serializing, so nothing sensitive leaks here.
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

pub async fn cmd_admin_reset_password(
    config: &Config,
    email: &str,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;

    let user = store
        .get_user_by_email(email)
        .await?
        .with_context(|| format!("No account with email {email}"))?;

    let generated;
    let new_password = match password {
        Some(p) => p,
        None => {
            generated = uuid::Uuid::new_v4().to_string();
            &generated
        }
    };

    store
        .update_user_password(&user.id, new_password, &config.security)
        .await?;

    println!("Password reset for {email} (user {})", user.id);
    if password.is_none() {
        println!("Generated password: {new_password}");
    }

    Ok(())
}
