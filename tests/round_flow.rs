use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{State, ws::Message},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::sync::mpsc;

use trivia_race_back::{
    config::AppConfig,
    dao::{
        lock_store::InMemoryLockStore, models::NewQuestionEntity,
        question_store::InMemoryQuestionStore,
    },
    dto::question::{CreateQuestionRequest, QuestionResponse},
    routes::questions,
    services::{
        arbitration::{self, Submission, Verdict},
        round_service,
    },
    state::{AppState, PlayerConnection, SharedState},
};

fn question(prompt: &str, answer: &str) -> NewQuestionEntity {
    NewQuestionEntity {
        question: prompt.into(),
        answer: answer.into(),
    }
}

async fn game(locks: InMemoryLockStore, bank: Vec<NewQuestionEntity>) -> SharedState {
    let state = AppState::new(AppConfig::default(), Arc::new(locks));
    state
        .install_question_store(Arc::new(InMemoryQuestionStore::seeded(bank)))
        .await;
    round_service::start_round(&state).await;
    state
}

fn join(state: &SharedState, peer: &str) -> (PlayerConnection, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = PlayerConnection::new(peer, tx);
    state.connections().register(connection.clone());
    (connection, rx)
}

fn received(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let Message::Text(text) = message {
            out.push(text.as_str().to_owned());
        }
    }
    out
}

const WINNER_TEXT: &str = "Correct! You answered first.";
const ANNOUNCE_TEXT: &str =
    "Someone has answered the question correctly! Moving to the next question.";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_correct_answers_produce_a_single_winner() {
    let state = game(
        InMemoryLockStore::new(),
        vec![question("2+2?", "4"), question("Capital of France?", "Paris")],
    )
    .await;
    let first = state.round().current().await.expect("round open");

    let mut players = Vec::new();
    for n in 0..16 {
        players.push(join(&state, &format!("10.0.0.{n}")));
    }

    let handles: Vec<_> = players
        .iter()
        .map(|(connection, _)| {
            let state = state.clone();
            let connection = connection.clone();
            let answer = first.answer.clone();
            tokio::spawn(async move {
                round_service::handle_submission(&state, &connection, &answer).await
            })
        })
        .collect();

    let mut verdicts = Vec::new();
    for handle in handles {
        verdicts.push(handle.await.expect("submission task"));
    }

    let winners = verdicts
        .iter()
        .filter(|verdict| matches!(verdict, Verdict::Correct(_)))
        .count();
    assert_eq!(winners, 1);
    assert!(verdicts.iter().all(|verdict| matches!(
        verdict,
        Verdict::Correct(_) | Verdict::AlreadyAnswered | Verdict::Wrong
    )));

    let mut winner_texts = 0;
    for (_, rx) in players.iter_mut() {
        let texts = received(rx);
        winner_texts += texts.iter().filter(|text| *text == WINNER_TEXT).count();
        assert_eq!(
            texts.iter().filter(|text| *text == ANNOUNCE_TEXT).count(),
            1,
            "every player hears about the winner exactly once"
        );
    }
    assert_eq!(winner_texts, 1);

    let next = state.round().current().await.expect("next round");
    assert_ne!(next.id, first.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn two_plus_two_has_exactly_one_winner() {
    let state = game(
        InMemoryLockStore::new(),
        vec![question("2+2?", "4"), question("Capital of France?", "Paris")],
    )
    .await;
    let first = state.round().current().await.expect("round open");
    if first.answer != "4" {
        round_service::advance_round(&state, first.id).await;
    }
    assert_eq!(state.round().current().await.map(|q| q.answer), Some("4".to_owned()));

    let (a, _rx_a) = join(&state, "10.0.0.1");
    let (b, _rx_b) = join(&state, "10.0.0.2");
    let (c, _rx_c) = join(&state, "10.0.0.3");

    let submit = |connection: PlayerConnection, answer: &'static str| {
        let state = state.clone();
        tokio::spawn(async move {
            round_service::handle_submission(&state, &connection, answer).await
        })
    };
    let a = submit(a, "4");
    let b = submit(b, "four");
    let c = submit(c, "4");

    let a = a.await.expect("a");
    let b = b.await.expect("b");
    let c = c.await.expect("c");

    let correct = [&a, &c]
        .iter()
        .filter(|verdict| matches!(verdict, Verdict::Correct(_)))
        .count();
    assert!(correct <= 1);
    assert!(matches!(b, Verdict::Wrong | Verdict::AlreadyAnswered));
    // "four" holding the claim is the only way neither "4" wins.
    if correct == 0 {
        assert_eq!(b, Verdict::Wrong);
    }
}

#[tokio::test(start_paused = true)]
async fn expired_claim_lets_another_player_answer() {
    let state = game(InMemoryLockStore::new(), vec![question("2+2?", "4")]).await;
    let (a, mut rx_a) = join(&state, "10.0.0.1");
    let (b, mut rx_b) = join(&state, "10.0.0.2");

    assert_eq!(round_service::handle_submission(&state, &a, "5").await, Verdict::Wrong);
    assert_eq!(
        round_service::handle_submission(&state, &b, "4").await,
        Verdict::AlreadyAnswered
    );

    tokio::time::advance(Duration::from_secs(5)).await;

    let verdict = round_service::handle_submission(&state, &b, "4").await;
    assert!(matches!(verdict, Verdict::Correct(ref q) if q.id == 1));

    assert_eq!(
        received(&mut rx_b),
        vec![
            "Sorry, this question was already answered!",
            WINNER_TEXT,
            ANNOUNCE_TEXT,
            "No more questions available.",
        ]
    );
    assert_eq!(
        received(&mut rx_a),
        vec!["Wrong answer. Try again!", ANNOUNCE_TEXT, "No more questions available."]
    );
}

#[tokio::test]
async fn exhausted_bank_leaves_players_waiting() {
    let state = game(InMemoryLockStore::new(), vec![question("2+2?", "4")]).await;
    let (a, mut rx_a) = join(&state, "10.0.0.1");

    assert!(matches!(
        round_service::handle_submission(&state, &a, "4").await,
        Verdict::Correct(_)
    ));
    assert!(state.round().current().await.is_none());
    received(&mut rx_a);

    assert_eq!(
        round_service::handle_submission(&state, &a, "4").await,
        Verdict::NoActiveQuestion
    );
    assert_eq!(
        received(&mut rx_a),
        vec!["No active question. Please wait for the next one."]
    );
}

#[tokio::test]
async fn late_joiner_sees_the_current_question() {
    let state = game(InMemoryLockStore::new(), vec![question("2+2?", "4")]).await;
    let (late, mut rx) = join(&state, "10.0.0.9");

    assert!(round_service::greeting(&state, &late).await);
    assert_eq!(received(&mut rx), vec!["Current question: 2+2?"]);
}

#[tokio::test]
async fn stale_submission_leaves_the_new_question_unclaimed() {
    let locks = InMemoryLockStore::new();
    let state = game(
        locks.clone(),
        vec![question("2+2?", "4"), question("3+3?", "6")],
    )
    .await;
    let first = state.round().current().await.expect("round open");
    let second = round_service::advance_round(&state, first.id)
        .await
        .expect("next round");

    let stale = Submission {
        question_id: Some(first.id),
        answer: second.answer.clone(),
        claimant: "10.0.0.1".into(),
    };
    assert_eq!(
        arbitration::arbitrate(&state, &stale).await,
        Verdict::AlreadyAnswered
    );
    assert!(locks.is_empty());
}

#[tokio::test]
async fn disconnecting_twice_does_not_disturb_others() {
    let state = game(InMemoryLockStore::new(), vec![question("2+2?", "4")]).await;
    let (gone, _rx_gone) = join(&state, "10.0.0.1");
    let (stays, mut rx_stays) = join(&state, "10.0.0.2");

    assert!(state.connections().unregister(&gone.id));
    assert!(!state.connections().unregister(&gone.id));

    assert!(matches!(
        round_service::handle_submission(&state, &stays, "4").await,
        Verdict::Correct(_)
    ));
    assert_eq!(
        received(&mut rx_stays),
        vec![WINNER_TEXT, ANNOUNCE_TEXT, "No more questions available."]
    );
}

#[tokio::test]
async fn question_routes_feed_an_idle_game() {
    let state = game(InMemoryLockStore::new(), Vec::new()).await;
    let (_player, mut rx) = join(&state, "10.0.0.1");

    let Json(current) = questions::current_question(State(state.clone())).await;
    assert_eq!(current, QuestionResponse::no_active_question());

    let Json(stored) = questions::add_question(
        State(state.clone()),
        Json(CreateQuestionRequest {
            question: "2+2?".into(),
            answer: "4".into(),
        }),
    )
    .await
    .expect("question stored");
    assert_eq!(received(&mut rx), vec!["New question: 2+2?"]);

    let Json(current) = questions::current_question(State(state.clone())).await;
    assert_eq!(current, stored);

    let response = questions::upload_questions(State(state.clone()), Json(Vec::new()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(received(&mut rx).is_empty());
}
