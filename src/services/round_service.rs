use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    dao::models::QuestionId,
    dto::ws::RoundMessage,
    services::arbitration::{self, Submission, Verdict},
    state::{PlayerConnection, Question, SharedState},
};

/// Result of asking the question bank for the next round.
enum Draw {
    Found(Question),
    Exhausted,
    Failed,
}

/// Open the very first round and announce it to everyone connected.
///
/// An empty bank and a missing or failing question store all yield an empty round
/// announced as "No questions available.".
pub async fn start_round(state: &SharedState) -> Option<Question> {
    let _gate = state.transition_gate().await;
    let draw = match draw_question(state, None).await {
        // Nothing has been played yet, so there is no "more" to run out of.
        Draw::Exhausted => Draw::Failed,
        draw => draw,
    };
    open_round(state, draw).await
}

/// Start a round if none is open, e.g. once questions were added or storage came back.
///
/// Nothing is published or broadcast when the bank still has nothing to offer.
pub async fn resume_if_idle(state: &SharedState) -> Option<Question> {
    let _gate = state.transition_gate().await;
    if let Some(current) = state.round().current().await {
        return Some(current);
    }

    match draw_question(state, None).await {
        Draw::Found(question) => open_round(state, Draw::Found(question)).await,
        Draw::Exhausted | Draw::Failed => None,
    }
}

/// Retire `retired_id` and move on to the next question.
///
/// Only the first caller for a given question publishes; later callers find the round has
/// already moved and return without side effects.
pub async fn advance_round(state: &SharedState, retired_id: QuestionId) -> Option<Question> {
    let _gate = state.transition_gate().await;
    if state.round().current_id().await != Some(retired_id) {
        info!(question = retired_id, "round already advanced");
        return state.round().current().await;
    }

    let draw = draw_question(state, Some(retired_id)).await;
    open_round(state, draw).await
}

/// Send the joining player the question currently open, if any.
pub async fn greeting(state: &SharedState, connection: &PlayerConnection) -> bool {
    let current = state.round().current().await;
    let message = RoundMessage::greeting(current.as_ref()).to_string();
    state.connections().deliver(connection, &message)
}

/// Arbitrate one inbound answer and reply to its sender.
///
/// A correct answer additionally tells everyone and advances the round.
pub async fn handle_submission(
    state: &SharedState,
    connection: &PlayerConnection,
    answer: &str,
) -> Verdict {
    let submission = Submission {
        question_id: state.round().current_id().await,
        answer: answer.to_owned(),
        claimant: connection.peer.clone(),
    };

    let verdict = arbitration::arbitrate(state, &submission).await;
    let reply = match &verdict {
        Verdict::NoActiveQuestion => RoundMessage::NoActiveQuestion,
        Verdict::AlreadyAnswered => RoundMessage::AlreadyAnswered,
        Verdict::Wrong => RoundMessage::Wrong,
        Verdict::Unavailable => RoundMessage::CheckUnavailable,
        Verdict::Correct(_) => RoundMessage::Correct,
    };
    state.connections().deliver(connection, &reply.to_string());

    if let Verdict::Correct(question) = &verdict {
        info!(
            question = question.id,
            connection = %connection.id,
            peer = %connection.peer,
            "question answered correctly"
        );
        state
            .connections()
            .broadcast_text(&RoundMessage::SomeoneAnswered.to_string());
        advance_round(state, question.id).await;
    }

    verdict
}

/// Close every player connection.
pub fn shutdown(state: &SharedState) {
    let closed = state.connections().close_all();
    info!(closed, "closed player connections");
}

/// Fetch a random question from the installed store, bounded by the configured timeout.
async fn draw_question(state: &SharedState, exclude: Option<QuestionId>) -> Draw {
    let store = match state.require_question_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "cannot draw a question");
            return Draw::Failed;
        }
    };

    let limit = state.config().question_fetch_timeout();
    match timeout(limit, store.fetch_random(exclude)).await {
        Ok(Ok(Some(entity))) => Draw::Found(entity.into()),
        Ok(Ok(None)) => Draw::Exhausted,
        Ok(Err(err)) => {
            warn!(error = %err, "question store failed to provide a question");
            Draw::Failed
        }
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "question fetch timed out");
            Draw::Failed
        }
    }
}

/// Publish the outcome of a draw and broadcast it. Callers must hold the transition gate.
async fn open_round(state: &SharedState, draw: Draw) -> Option<Question> {
    let (next, message) = match draw {
        Draw::Found(question) => {
            let message = RoundMessage::new_question(&question).to_string();
            (Some(question), message)
        }
        Draw::Exhausted => (None, RoundMessage::NoMoreQuestions.to_string()),
        Draw::Failed => (None, RoundMessage::NoQuestionsAvailable.to_string()),
    };

    let published = state.round().publish(next).await;
    match &published {
        Some(question) => info!(question = question.id, "new round opened"),
        None => info!("no question published"),
    }
    let delivered = state.connections().broadcast_text(&message);
    info!(delivered, message = %message, "round update broadcast");
    published
}
