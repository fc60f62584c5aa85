use std::fmt;

use crate::state::Question;

/// Text frames pushed to players over the quiz WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundMessage<'a> {
    /// Broadcast when a round opens.
    NewQuestion(&'a str),
    /// Sent to a player right after connecting while a round is open.
    CurrentQuestion(&'a str),
    /// Broadcast when the bank could not be read or was empty at startup.
    NoQuestionsAvailable,
    /// Sent to a player connecting while no round is open.
    NoQuestionAtTheMoment,
    /// Broadcast when the bank ran dry after a round.
    NoMoreQuestions,
    Correct,
    /// Broadcast once a winner is known, before the next question.
    SomeoneAnswered,
    Wrong,
    AlreadyAnswered,
    NoActiveQuestion,
    /// The lock service failed while checking an answer.
    CheckUnavailable,
}

impl<'a> RoundMessage<'a> {
    /// Announcement for a freshly published question.
    pub fn new_question(question: &'a Question) -> Self {
        Self::NewQuestion(&question.prompt)
    }

    /// Greeting for a player joining mid-round.
    pub fn greeting(current: Option<&'a Question>) -> Self {
        match current {
            Some(question) => Self::CurrentQuestion(&question.prompt),
            None => Self::NoQuestionAtTheMoment,
        }
    }
}

impl fmt::Display for RoundMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewQuestion(prompt) => write!(f, "New question: {prompt}"),
            Self::CurrentQuestion(prompt) => write!(f, "Current question: {prompt}"),
            Self::NoQuestionsAvailable => f.write_str("No questions available."),
            Self::NoQuestionAtTheMoment => f.write_str("No question available at the moment."),
            Self::NoMoreQuestions => f.write_str("No more questions available."),
            Self::Correct => f.write_str("Correct! You answered first."),
            Self::SomeoneAnswered => f.write_str(
                "Someone has answered the question correctly! Moving to the next question.",
            ),
            Self::Wrong => f.write_str("Wrong answer. Try again!"),
            Self::AlreadyAnswered => f.write_str("Sorry, this question was already answered!"),
            Self::NoActiveQuestion => {
                f.write_str("No active question. Please wait for the next one.")
            }
            Self::CheckUnavailable => {
                f.write_str("Your answer could not be checked right now. Try again!")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_texts_embed_the_prompt() {
        let question = Question {
            id: 1,
            prompt: "2+2?".into(),
            answer: "4".into(),
        };
        assert_eq!(
            RoundMessage::new_question(&question).to_string(),
            "New question: 2+2?"
        );
        assert_eq!(
            RoundMessage::greeting(Some(&question)).to_string(),
            "Current question: 2+2?"
        );
        assert_eq!(
            RoundMessage::greeting(None).to_string(),
            "No question available at the moment."
        );
    }
}
