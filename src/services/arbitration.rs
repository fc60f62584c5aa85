//! First-correct-answer arbitration on top of the lock store's set-if-absent primitive.

use tracing::{debug, warn};

use crate::{
    config::WrongAnswerPolicy,
    dao::models::QuestionId,
    state::{AppState, Question},
};

/// One answer as received from a player, bound to the question current at arrival.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Question that was current when the answer arrived, if any.
    pub question_id: Option<QuestionId>,
    pub answer: String,
    /// Identity stored as the claim owner.
    pub claimant: String,
}

/// Outcome of arbitrating a [`Submission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No round is open.
    NoActiveQuestion,
    /// The question moved on, or another player holds the claim.
    AlreadyAnswered,
    /// The claim was won but the answer does not match.
    Wrong,
    /// The claim was won with the right answer; carries the question to retire.
    Correct(Question),
    /// The lock store could not be reached.
    Unavailable,
}

/// Decide the fate of `submission` against the round published in `state`.
///
/// Stale submissions never reach the lock store. A granted claim is re-validated against the
/// round so that a claim won on a question retired in between is reported as already answered.
pub async fn arbitrate(state: &AppState, submission: &Submission) -> Verdict {
    let Some(current) = state.round().current().await else {
        return Verdict::NoActiveQuestion;
    };
    if submission.question_id != Some(current.id) {
        debug!(
            submitted = ?submission.question_id,
            current = current.id,
            "stale submission"
        );
        return Verdict::AlreadyAnswered;
    }

    let config = state.config();
    let lock_store = state.lock_store();
    let key = config.claim_key(current.id);

    match lock_store
        .set_if_absent(key.clone(), submission.claimant.clone(), config.lock_ttl())
        .await
    {
        Ok(true) => {}
        Ok(false) => return Verdict::AlreadyAnswered,
        Err(err) => {
            warn!(error = %err, key = %key, "lock store unavailable while claiming");
            return Verdict::Unavailable;
        }
    }

    if state.round().current_id().await != Some(current.id) {
        debug!(key = %key, "claim granted on a retired question");
        return Verdict::AlreadyAnswered;
    }

    if current.accepts(&submission.answer) {
        return Verdict::Correct(current);
    }

    if config.wrong_answer_policy() == WrongAnswerPolicy::Release {
        release_claim(state, key, submission.claimant.clone()).await;
    }
    Verdict::Wrong
}

async fn release_claim(state: &AppState, key: String, owner: String) {
    match state.lock_store().release(key.clone(), owner).await {
        Ok(true) => debug!(key = %key, "released claim after wrong answer"),
        Ok(false) => debug!(key = %key, "claim already gone before release"),
        Err(err) => warn!(key = %key, error = %err, "failed to release claim; it will expire"),
    }
}
