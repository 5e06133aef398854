//! End-to-end sessions across several tabs of one host

use std::rc::Rc;

use pretty_assertions::assert_eq;
use quizcast::{
    Environment, Event, Tab,
    event::LeaderboardEntry,
    lecturer::{self, LecturerSession},
    question::AnswerKey,
    student::{JoinRequest, Outcome, StudentSession, View},
};

fn pump_all(tabs: &[&Tab]) {
    // Each pump can publish more events, so repeat until quiet.
    while tabs.iter().map(|tab| tab.pump()).sum::<usize>() > 0 {}
}

fn join(tab: &Tab, code: &str, name: &str, key: &AnswerKey) -> StudentSession {
    JoinRequest::new(code, name).submit(tab.storage()).unwrap();
    StudentSession::resume(Rc::clone(tab.relay()), tab.storage(), Box::new(key.clone())).unwrap()
}

fn run_classroom(env: &Environment) {
    let lecturer_tab = env.open_tab();
    let alex_tab = env.open_tab();
    let kim_tab = env.open_tab();
    let stranger_tab = env.open_tab();

    let mut lecturer = LecturerSession::start(
        Rc::clone(lecturer_tab.relay()),
        "AB12",
        lecturer::Options::default(),
    )
    .unwrap();
    let key = lecturer.answer_key();

    let alex = join(&alex_tab, "ab12", "Alex", &key);
    let kim = join(&kim_tab, "AB12", "Kim", &key);
    let stranger = join(&stranger_tab, "ZZ99", "Sam", &key);
    let tabs = [&lecturer_tab, &alex_tab, &kim_tab, &stranger_tab];

    lecturer.approve("m1").unwrap();
    pump_all(&tabs);

    assert!(matches!(alex.view(), View::Answering { .. }));
    assert!(matches!(kim.view(), View::Answering { .. }));
    assert_eq!(stranger.view(), View::Waiting);

    assert_eq!(alex.submit("a"), Ok(Outcome::Correct));
    pump_all(&tabs);
    assert_eq!(kim.submit("b"), Ok(Outcome::Wrong));
    pump_all(&tabs);

    let expected = vec![
        LeaderboardEntry {
            name: "Alex".to_owned(),
            score: 10,
        },
        LeaderboardEntry {
            name: "Kim".to_owned(),
            score: 0,
        },
    ];
    assert_eq!(lecturer.top(), expected);
    assert_eq!(alex.leaderboard(), expected);
    assert_eq!(kim.leaderboard(), expected);
    assert!(stranger.leaderboard().is_empty());

    lecturer.end();
    pump_all(&tabs);

    assert_eq!(alex.view(), View::Ended);
    assert_eq!(kim.view(), View::Ended);
    assert_eq!(stranger.view(), View::Waiting);
}

#[test]
fn test_classroom_over_broadcast() {
    run_classroom(&Environment::browser());
}

#[test]
fn test_classroom_over_storage_fallback() {
    run_classroom(&Environment::without_broadcast());
}

#[test]
fn test_headless_tabs_are_isolated() {
    let env = Environment::headless();
    let lecturer_tab = env.open_tab();
    let student_tab = env.open_tab();

    let mut lecturer = LecturerSession::start(
        Rc::clone(lecturer_tab.relay()),
        "AB12",
        lecturer::Options::default(),
    )
    .unwrap();
    let student = join(&student_tab, "AB12", "Alex", &lecturer.answer_key());

    lecturer.approve("m1").unwrap();
    pump_all(&[&lecturer_tab, &student_tab]);

    assert_eq!(student.view(), View::Waiting);
}

#[test]
fn test_same_tab_lecturer_and_student() {
    let tab = Environment::browser().open_tab();
    let mut lecturer =
        LecturerSession::start(Rc::clone(tab.relay()), "AB12", lecturer::Options::default())
            .unwrap();
    let student = join(&tab, "AB12", "Alex", &lecturer.answer_key());

    lecturer.approve("m2").unwrap();
    assert_eq!(student.submit("a"), Ok(Outcome::Correct));

    assert_eq!(lecturer.top()[0].score, 10);
    assert_eq!(student.leaderboard()[0].name, "Alex");
}

#[test]
fn test_foreign_producer_over_storage() {
    let env = Environment::without_broadcast();
    let tab = env.open_tab();
    let student = join(&tab, "AB12", "Alex", &AnswerKey::default());

    let store = env.storage().unwrap();
    store.set_item(
        quizcast::environment::ContextId::new(),
        &env.config().storage_key,
        r#"{"type":"mcq_published","code":"AB12","mcq":{"mcqId":"x1","question":"Q?","options":[{"id":"a","text":"A"},{"id":"b","text":"B"}]}}"#,
    );
    tab.pump();

    assert_eq!(student.submit("a"), Ok(Outcome::Wrong));
    assert!(matches!(
        Event::from_message(&store.get_item(&env.config().storage_key).unwrap()),
        Ok(Event::AnswerSubmitted { correct: false, .. })
    ));
}
