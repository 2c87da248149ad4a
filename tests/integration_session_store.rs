use tempfile::tempdir;

use typometer::config::{Difficulty, Mode, TestConfig};
use typometer::results::{HistoryLog, MemorySink, MultiSink};
use typometer::session::{Phase, Session};
use typometer::store::ResultStore;

// End-to-end checks that a finished session emits exactly one result and
// that the result lands in every configured destination.

fn type_through(session: &mut Session, text: &str) {
    let mut typed = String::new();
    for c in text.chars() {
        typed.push(c);
        session.update_input(&typed);
    }
}

#[test]
fn completed_session_lands_in_csv_and_sqlite() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("history.csv");
    let db_path = dir.path().join("results.db");

    let mut sink = MultiSink::new();
    sink.push(Box::new(HistoryLog::with_path(&csv_path)));
    sink.push(Box::new(ResultStore::open(&db_path).unwrap()));

    let mut session = Session::with_reference(
        TestConfig::words(3, Difficulty::Medium),
        "the cat sat".to_string(),
    )
    .unwrap()
    .with_sink(Box::new(sink));

    type_through(&mut session, "the cat s");
    assert_eq!(session.phase(), Phase::Completed);

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.lines().next().unwrap().starts_with("date,mode"));

    let store = ResultStore::open(&db_path).unwrap();
    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].config.mode, Mode::Words);
    assert_eq!(recent[0].stats.accuracy, 100);
    assert_eq!(recent[0].text, "the cat sat");
}

#[test]
fn a_session_is_saved_exactly_once() {
    let observer = MemorySink::new();
    let mut session = Session::with_reference(
        TestConfig::timed(1, Difficulty::Easy),
        "hello world".to_string(),
    )
    .unwrap()
    .with_sink(Box::new(observer.clone()));

    type_through(&mut session, "hello");
    session.tick();
    assert_eq!(session.phase(), Phase::Completed);

    // Events after completion change nothing.
    session.tick();
    session.update_input("hello world");

    assert_eq!(observer.len(), 1);
    let result = &observer.results()[0];
    assert_eq!(result.stats.correct_chars, 5);
    assert_eq!(result.time_spent_secs, 1.0);
}

#[test]
fn timed_session_reports_the_classic_numbers() {
    let observer = MemorySink::new();
    let mut session = Session::with_reference(
        TestConfig::timed(6, Difficulty::Easy),
        "the cat sat".to_string(),
    )
    .unwrap()
    .with_sink(Box::new(observer.clone()));

    type_through(&mut session, "the cat sag");
    for _ in 0..6 {
        session.tick();
    }
    assert_eq!(session.phase(), Phase::Completed);

    let result = &observer.results()[0];
    assert_eq!(result.stats.correct_chars, 10);
    assert_eq!(result.stats.incorrect_chars, 1);
    assert_eq!(result.stats.total_chars, 11);
    assert_eq!(result.stats.accuracy, 91);
    assert_eq!(result.stats.wpm, 30);
    assert_eq!(result.time_spent_secs, 6.0);
}

#[test]
fn recent_results_come_back_newest_first() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("results.db");

    for (text, typed) in [("hi yo", "hi y"), ("go on", "go o")] {
        let store = ResultStore::open(&db_path).unwrap();
        let mut session =
            Session::with_reference(TestConfig::words(2, Difficulty::Easy), text.to_string())
                .unwrap()
                .with_sink(Box::new(store));
        type_through(&mut session, typed);
        assert_eq!(session.phase(), Phase::Completed);
    }

    let store = ResultStore::open(&db_path).unwrap();
    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].text, "go on");
    assert_eq!(recent[1].text, "hi yo");
}
