//! HTML rendering for Telegram (parse mode `HTML`) and message splitting.

use crate::{
    common::{display_genres, display_score, CommonSet},
    domain::{join_usernames, Username},
    stats::StatsView,
};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_help() -> String {
    "📺 <b>AniList Planning Bot</b>\n\n\
<b>📋 Commands:</b>\n\
/register &lt;username&gt; - Register your AniList username\n\
/remove &lt;username&gt; - Remove a registered AniList username\n\
/list - Show registered usernames\n\
/common [user1 … user5] - Find common planned anime (all registered users if none given)\n\
/stats &lt;username&gt; - Show detailed anime statistics for a user"
        .to_string()
}

pub fn render_registered(users: &[Username]) -> String {
    if users.is_empty() {
        return "No users registered yet. Use /register &lt;username&gt;.".to_string();
    }
    let mut lines = vec![format!("👥 <b>Registered users</b> ({})\n", users.len())];
    for u in users {
        lines.push(format!("• {}", escape_html(u.as_str())));
    }
    lines.join("\n")
}

pub fn render_common(users: &[Username], set: &CommonSet) -> String {
    let mut lines = vec![
        "🎬 <b>Common Planned Anime</b>".to_string(),
        format!(
            "Found {} anime in common between {}\n",
            set.len(),
            escape_html(&join_usernames(users))
        ),
    ];
    for item in &set.items {
        lines.push(format!("<b>{}</b>", escape_html(&item.display_title())));
        lines.push(format!(
            "Genres: {}\nScore: {}\n",
            escape_html(&display_genres(item)),
            display_score(item)
        ));
    }
    lines.join("\n").trim_end().to_string()
}

pub fn render_stats(username: &Username, view: &StatsView) -> String {
    let mut lines = vec![
        format!(
            "📊 <b>Anime Statistics for {}</b>\n",
            escape_html(username.as_str())
        ),
        "📈 <b>Overview</b>".to_string(),
        format!("Mean Score: <b>{}</b>", view.mean_score),
        format!("Total Anime: <b>{}</b>", view.count),
        format!("Episodes Watched: <b>{}</b>", view.episodes_watched),
        format!("Time Watched: <b>{}</b>", view.watch_time),
        "\n🎭 <b>Genre Distribution</b>".to_string(),
    ];
    if view.top_genres.is_empty() {
        lines.push("<i>No genre data</i>".to_string());
    }
    for g in &view.top_genres {
        lines.push(format!(
            "<b>{}</b>: Count: <b>{}</b> | Mean Score: <b>{}</b>",
            escape_html(&g.genre),
            g.count,
            g.mean_score
        ));
    }
    lines.join("\n")
}

// ============== Message Splitting ==============

#[derive(Clone, Debug)]
struct HtmlTag {
    name: String,
    open: String,
    close: String,
}

#[derive(Clone, Debug)]
enum HtmlToken<'a> {
    Tag(&'a str),
    Text(&'a str),
}

#[derive(Clone, Debug)]
enum TagAction {
    Open(HtmlTag),
    Close(String),
    Noop,
}

/// Split `html` into chunks of at most `limit` bytes.
///
/// Prefers line boundaries. Tags still open at a cut are closed at the end of
/// the chunk and reopened at the start of the next one.
pub fn split_html_chunks(html: &str, limit: usize) -> Vec<String> {
    if html.len() <= limit {
        return vec![html.to_string()];
    }

    let mut out: Vec<String> = Vec::new();
    let mut stack: Vec<HtmlTag> = Vec::new();
    let mut chunk = String::new();

    for token in tokenize_html(html) {
        match token {
            HtmlToken::Tag(t) => push_tag(&mut out, &mut chunk, &mut stack, t, limit),
            HtmlToken::Text(t) => {
                for line in t.split_inclusive('\n') {
                    push_text(&mut out, &mut chunk, &stack, line, limit);
                }
            }
        }
    }

    flush_chunk(&mut out, &mut chunk, &stack, limit);
    out
}

fn tokenize_html(mut s: &str) -> Vec<HtmlToken<'_>> {
    let mut out = Vec::new();
    while !s.is_empty() {
        let Some(start) = s.find('<') else {
            out.push(HtmlToken::Text(s));
            break;
        };
        if start > 0 {
            out.push(HtmlToken::Text(&s[..start]));
            s = &s[start..];
        }
        let Some(end) = s.find('>') else {
            out.push(HtmlToken::Text(s));
            break;
        };
        out.push(HtmlToken::Tag(&s[..=end]));
        s = &s[end + 1..];
    }
    out
}

fn push_tag(
    out: &mut Vec<String>,
    chunk: &mut String,
    stack: &mut Vec<HtmlTag>,
    tag: &str,
    limit: usize,
) {
    let action = parse_tag_action(tag);
    let mut after = stack.clone();
    apply_tag_action(&mut after, action.clone());

    if chunk.len() + tag.len() + close_len(&after) > limit && chunk.len() > open_len(stack) {
        flush_chunk(out, chunk, stack, limit);
        reopen_tags(chunk, stack);
    }
    if chunk.len() + tag.len() + close_len(&after) > limit {
        // Cannot fit even in a fresh chunk; drop the tag rather than loop.
        return;
    }

    chunk.push_str(tag);
    *stack = after;
}

fn push_text(
    out: &mut Vec<String>,
    chunk: &mut String,
    stack: &[HtmlTag],
    mut text: &str,
    limit: usize,
) {
    let available = limit.saturating_sub(close_len(stack));
    if available <= open_len(stack) {
        return;
    }

    // Start a new chunk at a line boundary when the whole line would not fit.
    if chunk.len() + text.len() > available
        && text.len() <= available - open_len(stack)
        && chunk.len() > open_len(stack)
    {
        flush_chunk(out, chunk, stack, limit);
        reopen_tags(chunk, stack);
    }

    while !text.is_empty() {
        if chunk.len() >= available {
            flush_chunk(out, chunk, stack, limit);
            reopen_tags(chunk, stack);
            continue;
        }
        let (head, tail) = split_utf8_prefix(text, available - chunk.len());
        chunk.push_str(head);
        text = tail;
        if !text.is_empty() {
            flush_chunk(out, chunk, stack, limit);
            reopen_tags(chunk, stack);
        }
    }
}

fn flush_chunk(out: &mut Vec<String>, chunk: &mut String, stack: &[HtmlTag], limit: usize) {
    if chunk.len() <= open_len(stack) || chunk.trim().is_empty() {
        chunk.clear();
        return;
    }

    let mut msg = String::with_capacity(chunk.len() + close_len(stack));
    msg.push_str(chunk.trim_end_matches('\n'));
    for t in stack.iter().rev() {
        msg.push_str(&t.close);
    }
    if msg.len() > limit {
        let (head, _) = split_utf8_prefix(&msg, limit);
        msg = head.to_string();
    }

    out.push(msg);
    chunk.clear();
}

fn reopen_tags(chunk: &mut String, stack: &[HtmlTag]) {
    for t in stack {
        chunk.push_str(&t.open);
    }
}

fn open_len(stack: &[HtmlTag]) -> usize {
    stack.iter().map(|t| t.open.len()).sum()
}

fn close_len(stack: &[HtmlTag]) -> usize {
    stack.iter().map(|t| t.close.len()).sum()
}

fn parse_tag_action(tag: &str) -> TagAction {
    let t = tag.trim();
    if !t.starts_with('<') || !t.ends_with('>') || t.ends_with("/>") {
        return TagAction::Noop;
    }

    if let Some(rest) = t.strip_prefix("</") {
        let name = parse_tag_name(rest);
        return if name.is_empty() {
            TagAction::Noop
        } else {
            TagAction::Close(name)
        };
    }

    let name = parse_tag_name(&t[1..]);
    if name.is_empty() {
        return TagAction::Noop;
    }
    TagAction::Open(HtmlTag {
        close: format!("</{name}>"),
        name,
        open: t.to_string(),
    })
}

fn parse_tag_name(after_lt: &str) -> String {
    after_lt
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn apply_tag_action(stack: &mut Vec<HtmlTag>, action: TagAction) {
    match action {
        TagAction::Open(t) => stack.push(t),
        TagAction::Close(name) => {
            while let Some(last) = stack.pop() {
                if last.name == name {
                    break;
                }
            }
        }
        TagAction::Noop => {}
    }
}

fn split_utf8_prefix(s: &str, max_bytes: usize) -> (&str, &str) {
    if s.len() <= max_bytes {
        return (s, "");
    }
    let mut idx = max_bytes;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        // Always make progress, even if one char exceeds the budget.
        let next = s.char_indices().nth(1).map(|(i, _)| i).unwrap_or(s.len());
        return (&s[..next], &s[next..]);
    }
    (&s[..idx], &s[idx..])
}
