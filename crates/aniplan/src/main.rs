use std::sync::Arc;

use aniplan_anilist::AniListClient;

use aniplan_core::{config::Config, source::AnimeSource};

#[tokio::main]
async fn main() -> Result<(), aniplan_core::Error> {
    aniplan_core::logging::init("aniplan")?;

    let cfg = Arc::new(Config::load()?);

    let source: Arc<dyn AnimeSource> = Arc::new(AniListClient::new(
        cfg.anilist_api_url.clone(),
        cfg.anilist_timeout,
    )?);

    aniplan_telegram::router::run_polling(cfg, source)
        .await
        .map_err(|e| aniplan_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
