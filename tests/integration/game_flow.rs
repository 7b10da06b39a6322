//! Game sessions across connectivity changes

use crate::common::{client_for, medium_question, mount_status, public_copy};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use trivia_offline::client::game::{
    GameError, GamePhase, GameSettings, GradingPath, QuestionSource,
};
use trivia_offline::client::offline::LedgerSnapshot;
use trivia_offline::shared::Difficulty;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn hard_game_falls_back_to_cache_when_fetch_fails() {
    let server = MockServer::start().await;
    mount_status(&server, "GET", "/api/questions", 500).await;

    let client = client_for(&server).await;
    let mut game = client.game();
    let session = game
        .start_game(GameSettings::new(Difficulty::Hard, 10))
        .await
        .unwrap();

    assert_eq!(session.source, QuestionSource::LocalCache);
    assert!(session.total_questions() >= 1);
    assert!(session
        .questions
        .iter()
        .all(|q| q.difficulty == Difficulty::Hard));
}

#[tokio::test]
async fn failing_checker_grades_locally_and_records() {
    let server = MockServer::start().await;
    mount_status(&server, "GET", "/api/questions", 503).await;
    mount_status(&server, "POST", "/api/check-answer", 503).await;

    let client = client_for(&server).await;
    let mut game = client.game();
    game.start_game(GameSettings::new(Difficulty::Master, 1))
        .await
        .unwrap();

    // A 503 on the question fetch already marks the client offline
    assert!(client.connectivity.is_offline());

    let feedback = game.submit_answer("Mint Cake").await.unwrap();
    assert_eq!(feedback.grading, GradingPath::Local);
    assert!(feedback.is_correct);
    assert_eq!(feedback.xp_gained, 500);

    let ledger = client.ledger.read().await.unwrap();
    assert_eq!(
        ledger,
        LedgerSnapshot {
            questions_answered: 1,
            correct_answers: 1,
            xp: 500,
            pending_sync: true,
        }
    );
}

#[tokio::test]
async fn no_matching_questions_surfaces_an_error() {
    let server = MockServer::start().await;
    mount_status(&server, "GET", "/api/questions", 500).await;

    let client = client_for(&server).await;
    let mut game = client.game();
    let result = game
        .start_game(GameSettings::new(Difficulty::Elite, 5).with_category("Minigames"))
        .await;
    assert_matches!(result, Err(GameError::NoQuestions { .. }));
}

#[tokio::test]
async fn connectivity_flip_mid_quiz_keeps_progress() {
    let server = MockServer::start().await;
    let questions: Vec<Value> = (1..=10).map(medium_question).collect();

    Mock::given(method("GET"))
        .and(path("/api/offline-questions"))
        .and(query_param("difficulty", "Medium"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&questions))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/offline-questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/questions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(questions.iter().map(public_copy).collect::<Vec<_>>()),
        )
        .mount(&server)
        .await;
    // Only the seven online answers reach the checker
    Mock::given(method("POST"))
        .and(path("/api/check-answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isCorrect": true, "correctAnswer": null, "explanation": "Nice.", "xpGained": 50
        })))
        .expect(7)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .cache
        .refresh_snapshot(&client.api, "tok", 10)
        .await
        .unwrap();

    let mut game = client.game();
    let session = game
        .start_game(GameSettings::new(Difficulty::Medium, 10))
        .await
        .unwrap();
    assert_eq!(session.source, QuestionSource::Remote);
    assert_eq!(session.total_questions(), 10);

    for step in 0..10 {
        if step == 3 {
            client.connectivity.report_network(false);
        }
        if step == 6 {
            client.connectivity.report_network(true);
        }

        let session = game.session().unwrap();
        assert_eq!(session.current_index, step);
        assert_eq!(session.score as usize, step);
        assert_eq!(session.streak as usize, step);

        let id = &session.current_question().unwrap().id;
        let answer = format!("right {}", &id[1..]);
        let feedback = game.submit_answer(&answer).await.unwrap();
        assert!(feedback.is_correct);
        let expected = if (3..6).contains(&step) {
            GradingPath::Local
        } else {
            GradingPath::Remote
        };
        assert_eq!(feedback.grading, expected);

        game.next_question().await.unwrap();
    }

    let results = assert_matches!(game.phase(), GamePhase::Results(results) => results.clone());
    assert_eq!((results.score, results.total), (10, 10));
    assert_eq!(results.xp_gained, 500);

    let ledger = client.ledger.read().await.unwrap();
    assert_eq!((ledger.questions_answered, ledger.correct_answers, ledger.xp), (3, 3, 150));
}
