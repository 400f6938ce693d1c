//! Ledger behaviour through the public API: accumulation, ranking,
//! truncation and concurrent writers against a file-backed database.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use scoreboard_ledger::db::MAX_CONTENT_CHARS;
use scoreboard_ledger::{
    Leaderboard, LedgerDb, ScoringEngine, ScoringEvent, ScoringOutcome, ScoringPolicy,
};
use tempfile::TempDir;

const MARKER: &str = "#weekly";

fn policy() -> ScoringPolicy {
    ScoringPolicy {
        marker: MARKER.to_string(),
        award: 1,
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 7, 30, 0).unwrap()
}

fn event(handle: &str, text: &str, offset_minutes: i64) -> ScoringEvent {
    ScoringEvent {
        sender_handle: handle.to_string(),
        sender_display_name: format!("{} display", handle),
        text: text.to_string(),
        timestamp: base_time() + Duration::minutes(offset_minutes),
    }
}

fn in_memory() -> (Arc<LedgerDb>, ScoringEngine, Leaderboard) {
    let db = Arc::new(LedgerDb::open_in_memory().unwrap());
    let engine = ScoringEngine::new(db.clone(), policy());
    let board = Leaderboard::new(db.clone());
    (db, engine, board)
}

/// Helper to open a file-backed ledger with pooled readers
fn on_disk(readers: usize) -> (Arc<LedgerDb>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = LedgerDb::open(&temp_dir.path().join("scoreboard.db"), readers).unwrap();
    (Arc::new(db), temp_dir)
}

#[test]
fn test_alice_two_reports() {
    let (_db, engine, board) = in_memory();

    let first = engine.score(&event("alice", &format!("{} hello", MARKER), 0)).unwrap();
    match first {
        ScoringOutcome::Recorded(receipt) => {
            assert_eq!(receipt.participant.score, 1);
            assert_eq!(receipt.participant.total_submissions, 1);
        }
        ScoringOutcome::Skipped => panic!("first report should be recorded"),
    }

    engine.score(&event("alice", &format!("{} hello", MARKER), 60)).unwrap();

    let top = board.top_n(1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].handle, "alice");
    assert_eq!(top[0].score, 2);
    assert_eq!(top[0].total_submissions, 2);
    assert_eq!(board.full().unwrap().stats.total_score, 2);
}

#[test]
fn test_bob_outranks_alice() {
    let (_db, engine, board) = in_memory();

    for i in 0..3 {
        engine.score(&event("alice", MARKER, i)).unwrap();
    }
    for i in 0..5 {
        engine.score(&event("bob", MARKER, 10 + i)).unwrap();
    }

    let top = board.top_n(2).unwrap();
    assert_eq!((top[0].rank, top[0].handle.as_str(), top[0].score), (1, "bob", 5));
    assert_eq!((top[1].rank, top[1].handle.as_str(), top[1].score), (2, "alice", 3));
}

#[test]
fn test_display_name_follows_latest_submission() {
    let (db, engine, _board) = in_memory();

    engine.score(&event("carol", MARKER, 0)).unwrap();
    let mut renamed = event("carol", MARKER, 5);
    renamed.sender_display_name = "Carol R.".to_string();
    engine.score(&renamed).unwrap();

    assert_eq!(db.get_participant("carol").unwrap().unwrap().display_name, "Carol R.");
}

#[test]
fn test_file_backed_reads_see_committed_writes() {
    let (db, _temp) = on_disk(2);
    let engine = ScoringEngine::new(db.clone(), policy());

    engine.score(&event("dave", MARKER, 0)).unwrap();

    // Served from a reader connection, not the writer
    let dave = db.get_participant("dave").unwrap().unwrap();
    assert_eq!(dave.score, 1);
    assert_eq!(Leaderboard::new(db).top_n(5).unwrap()[0].handle, "dave");
}

#[test]
fn test_reopen_keeps_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scoreboard.db");

    {
        let db = Arc::new(LedgerDb::open(&path, 1).unwrap());
        let engine = ScoringEngine::new(db, policy());
        engine.score(&event("erin", MARKER, 0)).unwrap();
        engine.score(&event("erin", MARKER, 1)).unwrap();
    }

    let db = LedgerDb::open(&path, 1).unwrap();
    let erin = db.get_participant("erin").unwrap().unwrap();
    assert_eq!(erin.score, 2);
    assert_eq!(db.count_submissions("erin").unwrap(), 2);
}

#[test]
fn test_concurrent_reports_lose_no_updates() {
    const WRITERS: usize = 24;
    const READS_PER_READER: usize = 50;

    let (db, _temp) = on_disk(4);
    let engine = Arc::new(ScoringEngine::new(db.clone(), policy()));

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            engine
                .score(&event("frank", &format!("{} report {}", MARKER, i), i as i64))
                .unwrap();
        }));
    }

    // Readers must only ever see whole updates: score == count with award 1
    let mut readers = Vec::new();
    for _ in 0..3 {
        let board = Leaderboard::new(db.clone());
        readers.push(thread::spawn(move || {
            for _ in 0..READS_PER_READER {
                let snapshot = board.full().unwrap();
                for entry in &snapshot.entries {
                    assert_eq!(entry.score, entry.total_submissions);
                }
                assert_eq!(snapshot.stats.total_score, snapshot.stats.total_submissions);
            }
        }));
    }

    for handle in handles.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let frank = db.get_participant("frank").unwrap().unwrap();
    assert_eq!(frank.score, WRITERS as u64);
    assert_eq!(frank.total_submissions, WRITERS as u64);
    assert_eq!(db.count_submissions("frank").unwrap(), WRITERS as u64);
    assert!(db.check_consistency(1).unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_k_reports_give_k_points(k in 1usize..20) {
        let (db, engine, _board) = in_memory();
        for i in 0..k {
            engine.score(&event("henry", MARKER, i as i64)).unwrap();
        }

        let henry = db.get_participant("henry").unwrap().unwrap();
        prop_assert_eq!(henry.score, k as u64);
        prop_assert_eq!(henry.total_submissions, k as u64);
        prop_assert_eq!(db.count_submissions("henry").unwrap(), k as u64);
    }

    #[test]
    fn prop_unmarked_text_changes_nothing(text in "[a-zA-Z0-9 #_]{0,60}") {
        prop_assume!(!text.contains(MARKER));
        let (db, engine, _board) = in_memory();

        let outcome = engine.score(&event("ivy", &text, 0)).unwrap();
        prop_assert!(matches!(outcome, ScoringOutcome::Skipped));
        prop_assert!(db.get_participant("ivy").unwrap().is_none());
        prop_assert_eq!(db.stats().unwrap().submission_count, 0);
    }

    #[test]
    fn prop_stored_content_is_prefix(body in "\\PC{0,700}") {
        let (db, engine, _board) = in_memory();
        let text = format!("{}{}", MARKER, body);

        engine.score(&event("jack", &text, 0)).unwrap();

        let stored = &db.list_submissions("jack").unwrap()[0].content;
        let expected: String = text.chars().take(MAX_CONTENT_CHARS).collect();
        prop_assert_eq!(stored, &expected);
        if text.chars().count() <= MAX_CONTENT_CHARS {
            prop_assert_eq!(stored, &text);
        }
    }

    #[test]
    fn prop_ranking_is_score_desc_then_first_seen(
        senders in proptest::collection::vec(0usize..6, 1..40)
    ) {
        let (_db, engine, board) = in_memory();

        let mut first_seen: Vec<usize> = Vec::new();
        let mut counts = [0u64; 6];
        for (i, sender) in senders.iter().enumerate() {
            engine.score(&event(&format!("p{}", sender), MARKER, i as i64)).unwrap();
            if !first_seen.contains(sender) {
                first_seen.push(*sender);
            }
            counts[*sender] += 1;
        }

        // Stable sort keeps first-seen order among equal scores
        let mut expected = first_seen.clone();
        expected.sort_by(|a, b| counts[*b].cmp(&counts[*a]));
        let expected: Vec<String> = expected.iter().map(|s| format!("p{}", s)).collect();

        let entries = board.full().unwrap().entries;
        let actual: Vec<String> = entries.iter().map(|e| e.handle.clone()).collect();
        prop_assert_eq!(actual, expected);

        for (i, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.rank as usize, i + 1);
        }
    }
}
