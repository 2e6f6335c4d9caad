//! In-memory fakes for the ports, shared by unit tests.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    anime::{AnimeStatistics, MediaTitle, PlanningEntry, UserPlanningList},
    config::Config,
    domain::{ChatId, Username},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    source::{AnimeSource, RemoteResult},
    Result,
};

pub fn tmp_path(prefix: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
}

pub fn test_config(prefix: &str) -> Arc<Config> {
    let dir = tmp_path(prefix);
    std::fs::create_dir_all(&dir).unwrap();
    Arc::new(Config {
        telegram_bot_token: "x".to_string(),
        registry_file: dir.join("users.json"),
        anilist_api_url: "http://127.0.0.1:9/graphql".to_string(),
        anilist_timeout: Some(Duration::from_secs(1)),
        common_max_users: 5,
        telegram_safe_limit: 4000,
        audit_log_path: dir.join("audit.log"),
        audit_log_json: true,
    })
}

pub fn cleanup(cfg: &Config) {
    if let Some(dir) = cfg.registry_file.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

pub fn entry(id: u64) -> PlanningEntry {
    PlanningEntry {
        id,
        title: MediaTitle {
            romaji: Some(format!("Anime {id}")),
            english: None,
            native: None,
        },
        genres: vec!["Action".to_string()],
        cover_image: Some(format!("https://img.example/{id}.jpg")),
        average_score: Some(70),
    }
}

pub fn planning(user: &str, ids: &[u64]) -> UserPlanningList {
    UserPlanningList::new(
        Username::from(user),
        ids.iter().copied().map(entry).collect(),
    )
}

#[derive(Clone, Debug)]
pub enum FakePlanning {
    List(Vec<u64>),
    NoLists,
    Failure(String),
    Transport(String),
}

#[derive(Default)]
pub struct FakeSource {
    planning: Mutex<HashMap<String, FakePlanning>>,
    stats: Mutex<HashMap<String, RemoteResult<AnimeStatistics>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_planning(self, user: &str, p: FakePlanning) -> Self {
        self.planning.lock().unwrap().insert(user.to_string(), p);
        self
    }

    pub fn with_stats(self, user: &str, r: RemoteResult<AnimeStatistics>) -> Self {
        self.stats.lock().unwrap().insert(user.to_string(), r);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnimeSource for FakeSource {
    async fn planning_list(
        &self,
        username: &Username,
    ) -> Result<RemoteResult<Option<UserPlanningList>>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("planning:{username}"));
        let p = self
            .planning
            .lock()
            .unwrap()
            .get(username.as_str())
            .cloned()
            .unwrap_or(FakePlanning::NoLists);
        match p {
            FakePlanning::List(ids) => Ok(RemoteResult::Success(Some(planning(
                username.as_str(),
                &ids,
            )))),
            FakePlanning::NoLists => Ok(RemoteResult::Success(None)),
            FakePlanning::Failure(d) => Ok(RemoteResult::Failure(d)),
            FakePlanning::Transport(d) => Err(Error::External(d)),
        }
    }

    async fn statistics(&self, username: &Username) -> Result<RemoteResult<AnimeStatistics>> {
        self.calls.lock().unwrap().push(format!("stats:{username}"));
        Ok(self
            .stats
            .lock()
            .unwrap()
            .get(username.as_str())
            .cloned()
            .unwrap_or_else(|| RemoteResult::Failure("User not found".to_string())))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Html(String),
    Photo { url: String, caption: Option<String> },
    Action(ChatAction),
}

#[derive(Default)]
pub struct FakeMessenger {
    caption_limit: Option<usize>,
    sent: Mutex<Vec<Sent>>,
}

impl FakeMessenger {
    pub fn with_caption_limit(limit: usize) -> Self {
        Self {
            caption_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn html(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Html(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Photo { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_photos: true,
            max_message_len: 4096,
            max_caption_len: self.caption_limit.unwrap_or(1024),
        }
    }

    async fn send_html(&self, _chat_id: ChatId, html: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Html(html.to_string()));
        Ok(())
    }

    async fn send_photo(
        &self,
        _chat_id: ChatId,
        url: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Photo {
            url: url.to_string(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn send_chat_action(&self, _chat_id: ChatId, action: ChatAction) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Action(action));
        Ok(())
    }
}
