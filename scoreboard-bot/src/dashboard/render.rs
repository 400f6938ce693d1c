//! HTML rendering for the web leaderboard. Pure functions over a snapshot.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use scoreboard_ledger::{LeaderboardSnapshot, ParticipantSummary, ScoringPolicy};

const STYLESHEET: &str = include_str!("../../static/scoreboard.css");

/// Page reload interval, milliseconds
const REFRESH_MS: u32 = 30_000;

/// Escape text for HTML element and attribute content
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn rank_class(rank: u32) -> &'static str {
    match rank {
        1 => "rank-1",
        2 => "rank-2",
        3 => "rank-3",
        _ => "",
    }
}

fn render_row(out: &mut String, entry: &ParticipantSummary) {
    let _ = write!(
        out,
        r#"
<tr>
    <td class="{class}">{rank}</td>
    <td><strong dir="auto">{name}</strong><br><small class="handle">@{handle}</small></td>
    <td><span class="score">{score}</span></td>
    <td>{total}</td>
    <td>{last}</td>
</tr>"#,
        class = rank_class(entry.rank),
        rank = entry.rank,
        name = escape_html(&entry.display_name),
        handle = escape_html(&entry.handle),
        score = entry.score,
        total = entry.total_submissions,
        last = escape_html(entry.last_submission_label()),
    );
}

/// Full leaderboard page
pub fn render_leaderboard(
    snapshot: &LeaderboardSnapshot,
    policy: &ScoringPolicy,
    generated_at: DateTime<Utc>,
) -> String {
    let mut rows = String::new();
    for entry in &snapshot.entries {
        render_row(&mut rows, entry);
    }

    let body = if snapshot.entries.is_empty() {
        r#"<div class="empty">No reports have been recorded yet.</div>"#.to_string()
    } else {
        format!(
            r#"<table>
<thead>
<tr>
    <th width="80">Rank</th>
    <th>Mentor</th>
    <th width="100">Score</th>
    <th width="100">Reports</th>
    <th width="120">Last report</th>
</tr>
</thead>
<tbody>{rows}
</tbody>
</table>"#
        )
    };

    let marker = escape_html(&policy.marker);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>🏆 Mentoring Scoreboard</title>
<style>
{STYLESHEET}
</style>
</head>
<body>
<div class="container">
<div class="header">
    <h1>🏆 Mentoring Scoreboard</h1>
    <p>Every report tagged <bdi dir="auto">{marker}</bdi> = {award} point(s)</p>
</div>
<div class="stats">
    <div class="stat-box"><div class="stat-number">{participants}</div><div>Mentors</div></div>
    <div class="stat-box"><div class="stat-number">{reports}</div><div>Reports</div></div>
    <div class="stat-box"><div class="stat-number">{points}</div><div>Total points</div></div>
</div>
{body}
<div class="footer">
    <p>🔄 Last updated: {updated}</p>
    <p>🤖 Automatic report bot | each report = {award} point(s)</p>
</div>
</div>
<script>
setTimeout(() => location.reload(), {REFRESH_MS});
</script>
</body>
</html>
"#,
        award = policy.award,
        participants = snapshot.stats.participant_count,
        reports = snapshot.stats.total_submissions,
        points = snapshot.stats.total_score,
        updated = generated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Generic fragment served when the ledger cannot be read
pub fn render_error_page() -> String {
    "<h1>Failed to load the scoreboard</h1><p>Please try again in a moment.</p>"
        .to_string()
}
