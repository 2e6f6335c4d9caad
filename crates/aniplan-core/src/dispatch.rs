//! Command dispatcher: parses a chat command, runs it, replies through the
//! messaging port. Every outcome, including failures, ends as chat text.

use std::sync::Arc;

use crate::{
    audit::{AuditEvent, AuditLogger},
    domain::{join_usernames, ChatId, Username},
    errors::Error,
    formatting::{
        escape_html, render_common, render_help, render_registered, render_stats,
        split_html_chunks,
    },
    messaging::{
        port::MessagingPort,
        types::{ChatAction, Command},
    },
    registry::{RegisterOutcome, RemoveOutcome},
    service::PlanService,
    Result,
};

pub struct CommandDispatcher {
    service: PlanService,
    messenger: Arc<dyn MessagingPort>,
    audit: AuditLogger,
}

impl CommandDispatcher {
    pub fn new(service: PlanService, messenger: Arc<dyn MessagingPort>, audit: AuditLogger) -> Self {
        Self {
            service,
            messenger,
            audit,
        }
    }

    pub fn service(&self) -> &PlanService {
        &self.service
    }

    /// Run one command. Only messenger failures are returned.
    pub async fn handle(&self, cmd: &Command) -> Result<()> {
        self.audit.record(AuditEvent::command(
            cmd.chat_id.0,
            cmd.user_id,
            cmd.sender.as_deref(),
            &cmd.name,
            &cmd.args,
        ));
        tracing::info!(chat_id = cmd.chat_id.0, command = %cmd.name, args = cmd.args.len(), "command received");

        let outcome = match cmd.name.as_str() {
            "start" | "help" => self.send(cmd.chat_id, &render_help()).await,
            "register" => self.register(cmd).await,
            "remove" => self.remove(cmd).await,
            "list" => self.list(cmd).await,
            "common" => self.common(cmd).await,
            "stats" => self.stats(cmd).await,
            other => {
                self.send(
                    cmd.chat_id,
                    &format!("Unknown command: /{}", escape_html(other)),
                )
                .await
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => self.report_error(cmd, e).await,
        }
    }

    async fn register(&self, cmd: &Command) -> Result<()> {
        let Some(username) = single_arg(cmd) else {
            return self
                .send(cmd.chat_id, "Usage: /register &lt;anilist-username&gt;")
                .await;
        };
        let outcome = self.service.register(&username)?;
        let name = escape_html(username.as_str());
        let (label, text) = match outcome {
            RegisterOutcome::Added => ("added", format!("Successfully registered {name}!")),
            RegisterOutcome::AlreadyRegistered => (
                "duplicate",
                format!("Username {name} is already registered!"),
            ),
        };
        self.audit.record(AuditEvent::registry(
            cmd.chat_id.0,
            "register",
            username.as_str(),
            label,
        ));
        self.send(cmd.chat_id, &text).await
    }

    async fn remove(&self, cmd: &Command) -> Result<()> {
        let Some(username) = single_arg(cmd) else {
            return self
                .send(cmd.chat_id, "Usage: /remove &lt;anilist-username&gt;")
                .await;
        };
        let outcome = self.service.remove(&username)?;
        let name = escape_html(username.as_str());
        let (label, text) = match outcome {
            RemoveOutcome::Removed => ("removed", format!("Successfully removed {name}!")),
            RemoveOutcome::NotRegistered => (
                "not_registered",
                format!("Username {name} is not registered!"),
            ),
        };
        self.audit.record(AuditEvent::registry(
            cmd.chat_id.0,
            "remove",
            username.as_str(),
            label,
        ));
        self.send(cmd.chat_id, &text).await
    }

    async fn list(&self, cmd: &Command) -> Result<()> {
        let users = self.service.registered()?;
        self.send(cmd.chat_id, &render_registered(&users)).await
    }

    async fn common(&self, cmd: &Command) -> Result<()> {
        let requested: Vec<Username> = cmd.args.iter().map(|a| Username::new(a.as_str())).collect();
        let users = self.service.resolve_identities(&requested)?;

        self.send(
            cmd.chat_id,
            &format!(
                "Looking for common anime between: {}...",
                escape_html(&join_usernames(&users))
            ),
        )
        .await?;
        self.typing(cmd.chat_id).await;

        let report = self.service.find_common(&users).await?;
        if report.common.is_empty() {
            return self
                .send(cmd.chat_id, "No common anime found in planning lists!")
                .await;
        }

        let mut html = render_common(&report.users, &report.common);
        if !report.skipped.is_empty() {
            html.push_str(&format!(
                "\n\n<i>Skipped (no planning list): {}</i>",
                escape_html(&join_usernames(&report.skipped))
            ));
        }
        self.send(cmd.chat_id, &html).await?;

        if let Some(url) = report.common.cover_image() {
            self.send_cover(cmd.chat_id, url, &report.common.items[0].display_title())
                .await;
        }
        Ok(())
    }

    async fn stats(&self, cmd: &Command) -> Result<()> {
        let Some(username) = single_arg(cmd) else {
            return self
                .send(cmd.chat_id, "Usage: /stats &lt;anilist-username&gt;")
                .await;
        };

        self.send(
            cmd.chat_id,
            &format!("Fetching stats for {}...", escape_html(username.as_str())),
        )
        .await?;
        self.typing(cmd.chat_id).await;

        let view = self.service.fetch_stats(&username).await?;
        self.send(cmd.chat_id, &render_stats(&username, &view)).await
    }

    async fn report_error(&self, cmd: &Command, err: Error) -> Result<()> {
        let text = match &err {
            Error::InsufficientIdentities { .. } => {
                "Need at least 2 users to find common anime!".to_string()
            }
            Error::TooManyIdentities { max, .. } => {
                format!("You can compare at most {max} users at once.")
            }
            Error::Remote { username, detail } => format!(
                "Error fetching data for user {}: {}",
                escape_html(username),
                escape_html(detail)
            ),
            other => {
                tracing::error!(chat_id = cmd.chat_id.0, command = %cmd.name, error = %other, "command failed");
                format!("❌ Something went wrong: {}", escape_html(&other.to_string()))
            }
        };
        self.audit
            .record(AuditEvent::error(cmd.chat_id.0, &cmd.name, &err.to_string()));
        self.send(cmd.chat_id, &text).await
    }

    /// Send HTML, split into several messages when it exceeds the safe limit.
    async fn send(&self, chat_id: ChatId, html: &str) -> Result<()> {
        let limit = self
            .service
            .config()
            .telegram_safe_limit
            .min(self.messenger.capabilities().max_message_len)
            .max(200);
        for chunk in split_html_chunks(html, limit) {
            self.messenger.send_html(chat_id, &chunk).await?;
        }
        Ok(())
    }

    async fn typing(&self, chat_id: ChatId) {
        self.chat_action(chat_id, ChatAction::Typing).await;
    }

    async fn chat_action(&self, chat_id: ChatId, action: ChatAction) {
        if let Err(e) = self.messenger.send_chat_action(chat_id, action).await {
            tracing::debug!(?action, error = %e, "chat action failed");
        }
    }

    async fn send_cover(&self, chat_id: ChatId, url: &str, title: &str) {
        let caps = self.messenger.capabilities();
        if !caps.supports_photos {
            return;
        }
        // Cut before escaping so an entity is never split.
        let caption = escape_html(&cap_escaped_len(title, caps.max_caption_len));
        self.chat_action(chat_id, ChatAction::UploadPhoto).await;
        if let Err(e) = self.messenger.send_photo(chat_id, url, Some(&caption)).await {
            tracing::warn!(%url, error = %e, "failed to send cover image");
        }
    }
}

/// The one username argument of `register`/`remove`/`stats`; none or several is a usage error.
/// Longest prefix of `text` whose escaped form fits in `limit` chars.
fn cap_escaped_len(text: &str, limit: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let cost = match ch {
            '&' => 5,
            '"' => 6,
            '<' | '>' => 4,
            _ => 1,
        };
        if used + cost > limit {
            break;
        }
        used += cost;
        out.push(ch);
    }
    out
}

fn single_arg(cmd: &Command) -> Option<Username> {
    match cmd.args.as_slice() {
        [name] => Some(Username::new(name.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anime::{AnimeStatistics, GenreStat};
    use crate::source::RemoteResult;
    use crate::testing::{cleanup, test_config, FakeMessenger, FakePlanning, FakeSource, Sent};

    struct Harness {
        dispatcher: CommandDispatcher,
        messenger: Arc<FakeMessenger>,
        source: Arc<FakeSource>,
    }

    fn harness(prefix: &str, source: FakeSource) -> Harness {
        harness_with(prefix, source, FakeMessenger::default())
    }

    fn harness_with(prefix: &str, source: FakeSource, messenger: FakeMessenger) -> Harness {
        let cfg = test_config(prefix);
        let source = Arc::new(source);
        let messenger = Arc::new(messenger);
        let audit = AuditLogger::new(cfg.audit_log_path.clone(), cfg.audit_log_json);
        let service = PlanService::new(cfg, source.clone());
        Harness {
            dispatcher: CommandDispatcher::new(service, messenger.clone(), audit),
            messenger,
            source,
        }
    }

    impl Harness {
        async fn run(&self, text: &str) {
            let cmd = Command::parse(ChatId(10), Some(20), Some("tester".into()), text).unwrap();
            self.dispatcher.handle(&cmd).await.unwrap();
        }

        fn last_html(&self) -> String {
            self.messenger.html().last().cloned().unwrap_or_default()
        }

        fn done(self) {
            cleanup(self.dispatcher.service().config());
        }
    }

    #[tokio::test]
    async fn register_remove_round_trip_messages() {
        let h = harness("aniplan-dispatch-register", FakeSource::default());

        h.run("/register alice").await;
        assert_eq!(h.last_html(), "Successfully registered alice!");
        h.run("/register alice").await;
        assert_eq!(h.last_html(), "Username alice is already registered!");
        h.run("/remove bob").await;
        assert_eq!(h.last_html(), "Username bob is not registered!");
        h.run("/remove alice").await;
        assert_eq!(h.last_html(), "Successfully removed alice!");
        h.run("/register").await;
        assert!(h.last_html().starts_with("Usage: /register"));
        h.done();
    }

    #[tokio::test]
    async fn registry_mutations_are_audited() {
        let h = harness("aniplan-dispatch-audit", FakeSource::default());
        h.run("/register alice").await;
        let log = std::fs::read_to_string(&h.dispatcher.service().config().audit_log_path).unwrap();
        assert!(log.contains("\"event\":\"command\""));
        assert!(log.contains("\"outcome\":\"added\""));
        h.done();
    }

    #[tokio::test]
    async fn common_with_too_few_users_fetches_nothing() {
        let h = harness("aniplan-dispatch-few", FakeSource::default());
        h.run("/register solo").await;
        h.run("/common").await;
        assert_eq!(h.last_html(), "Need at least 2 users to find common anime!");
        assert!(h.source.calls().is_empty());
        h.done();
    }

    #[tokio::test]
    async fn common_uses_registry_and_sends_listing_and_cover() {
        let h = harness(
            "aniplan-dispatch-common",
            FakeSource::default()
                .with_planning("a", FakePlanning::List(vec![1, 2, 3]))
                .with_planning("b", FakePlanning::List(vec![3, 2])),
        );
        h.run("/register a").await;
        h.run("/register b").await;
        h.run("/common").await;

        let html = h.messenger.html();
        assert!(html.contains(&"Looking for common anime between: a, b...".to_string()));
        let listing = h.last_html();
        assert!(listing.contains("Found 2 anime in common between a, b"));
        assert!(listing.find("Anime 2").unwrap() < listing.find("Anime 3").unwrap());
        assert_eq!(h.messenger.photos(), vec!["https://img.example/2.jpg"]);
        assert!(h
            .messenger
            .sent()
            .contains(&Sent::Action(ChatAction::Typing)));
        h.done();
    }

    #[tokio::test]
    async fn common_without_overlap_reports_no_results() {
        let h = harness(
            "aniplan-dispatch-none",
            FakeSource::default()
                .with_planning("a", FakePlanning::List(vec![1, 2]))
                .with_planning("b", FakePlanning::List(vec![3, 4])),
        );
        h.run("/common a b").await;
        assert_eq!(h.last_html(), "No common anime found in planning lists!");
        assert!(h.messenger.photos().is_empty());
        h.done();
    }

    #[tokio::test]
    async fn common_reports_skipped_users() {
        let h = harness(
            "aniplan-dispatch-skip",
            FakeSource::default()
                .with_planning("a", FakePlanning::NoLists)
                .with_planning("b", FakePlanning::List(vec![1, 2])),
        );
        h.run("/common a b").await;
        let listing = h.last_html();
        assert!(listing.contains("Found 2 anime in common"));
        assert!(listing.contains("Skipped (no planning list): a"));
        h.done();
    }

    #[tokio::test]
    async fn common_remote_error_names_user_and_shows_no_partial_result() {
        let h = harness(
            "aniplan-dispatch-remote",
            FakeSource::default()
                .with_planning("a", FakePlanning::List(vec![1]))
                .with_planning("b", FakePlanning::Failure("Not Found.".into())),
        );
        h.run("/common a b").await;
        let html = h.messenger.html();
        assert_eq!(html.len(), 2);
        assert_eq!(html[1], "Error fetching data for user b: Not Found.");
        h.done();
    }

    #[tokio::test]
    async fn transport_failure_is_a_generic_message() {
        let h = harness(
            "aniplan-dispatch-transport",
            FakeSource::default()
                .with_planning("a", FakePlanning::Transport("connection refused".into())),
        );
        h.run("/common a b").await;
        assert!(h.last_html().starts_with("❌ Something went wrong:"));
        assert!(h.last_html().contains("connection refused"));
        h.done();
    }

    #[tokio::test]
    async fn common_rejects_more_than_five_names() {
        let h = harness("aniplan-dispatch-many", FakeSource::default());
        h.run("/common a b c d e f").await;
        assert_eq!(h.last_html(), "You can compare at most 5 users at once.");
        assert!(h.source.calls().is_empty());
        h.done();
    }

    #[tokio::test]
    async fn stats_sends_ack_then_blocks() {
        let stats = AnimeStatistics {
            mean_score: Some(81.5),
            count: 40,
            episodes_watched: 500,
            minutes_watched: 1505,
            genres: vec![GenreStat {
                genre: "Romance".to_string(),
                count: 7,
                mean_score: None,
            }],
        };
        let h = harness(
            "aniplan-dispatch-stats",
            FakeSource::default().with_stats("alice", RemoteResult::Success(stats)),
        );
        h.run("/stats alice").await;
        let html = h.messenger.html();
        assert_eq!(html[0], "Fetching stats for alice...");
        assert!(html[1].contains("Mean Score: <b>81.5</b>"));
        assert!(html[1].contains("Time Watched: <b>1d 1h 5m</b>"));
        assert!(html[1].contains("<b>Romance</b>: Count: <b>7</b> | Mean Score: <b>N/A</b>"));

        h.run("/stats ghost").await;
        assert_eq!(
            h.last_html(),
            "Error fetching data for user ghost: User not found"
        );
        h.done();
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let h = harness("aniplan-dispatch-unknown", FakeSource::default());
        h.run("/frobnicate").await;
        assert_eq!(h.last_html(), "Unknown command: /frobnicate");
        h.run("/help").await;
        assert!(h.last_html().contains("/common"));
        h.done();
    }

    #[tokio::test]
    async fn extra_arguments_get_the_usage_reply() {
        let h = harness("aniplan-dispatch-extra-args", FakeSource::default());

        h.run("/register alice bob").await;
        assert_eq!(h.last_html(), "Usage: /register &lt;anilist-username&gt;");
        assert!(h.dispatcher.service().registered().unwrap().is_empty());

        h.run("/stats alice bob").await;
        assert_eq!(h.last_html(), "Usage: /stats &lt;anilist-username&gt;");
        assert!(h.source.calls().is_empty());
        h.done();
    }

    #[test]
    fn caption_cut_never_splits_an_entity() {
        assert_eq!(cap_escaped_len("Tom & Jerry", 6), "Tom ");
        assert_eq!(cap_escaped_len("Tom & Jerry", 9), "Tom &");
        assert_eq!(cap_escaped_len("<b>", 100), "<b>");
        assert_eq!(escape_html(&cap_escaped_len("a&b", 5)), "a");
    }

    #[tokio::test]
    async fn cover_caption_respects_messenger_limit() {
        let h = harness_with(
            "aniplan-dispatch-caption",
            FakeSource::default()
                .with_planning("a", FakePlanning::List(vec![5]))
                .with_planning("b", FakePlanning::List(vec![5])),
            FakeMessenger::with_caption_limit(3),
        );
        h.run("/common a b").await;
        let captions: Vec<_> = h
            .messenger
            .sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Photo { caption, .. } => caption,
                _ => None,
            })
            .collect();
        assert_eq!(captions, vec!["Ani".to_string()]);
        h.done();
    }
}
