use rand::seq::SliceRandom;

use crate::card::{CardStore, Flashcard};
use crate::error::Error;

/// One graded pass through a shuffled copy of a study set.
///
/// `NotStarted` until `start`, `InProgress` while cards remain, `Completed`
/// once the last answer is in. Calls outside the state they belong to fail
/// instead of guessing.
pub struct QuizSession {
    phase: Phase,
}

enum Phase {
    NotStarted,
    InProgress {
        cards: Vec<Flashcard>,
        position: usize,
        score: u32,
    },
    Completed {
        score: u32,
        total: u32,
    },
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::NotStarted => "not started",
            Phase::InProgress { .. } => "in progress",
            Phase::Completed { .. } => "completed",
        }
    }
}

/// Outcome of a single submission, for front-end feedback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grade {
    pub correct: bool,
    pub expected: String,
}

impl QuizSession {
    pub fn new() -> Self {
        QuizSession {
            phase: Phase::NotStarted,
        }
    }

    /// Copy the store's cards, shuffle the copy uniformly, and begin grading.
    pub fn start(&mut self, store: &CardStore) -> Result<(), Error> {
        if !matches!(self.phase, Phase::NotStarted) {
            return Err(self.invalid_state("start"));
        }
        if store.is_empty() {
            return Err(Error::EmptySet);
        }

        let mut cards = store.cards().to_vec();
        cards.shuffle(&mut rand::rng());
        self.phase = Phase::InProgress {
            cards,
            position: 0,
            score: 0,
        };
        Ok(())
    }

    /// Grade one typed answer against the current card and move on.
    pub fn submit(&mut self, answer: &str) -> Result<Grade, Error> {
        let Phase::InProgress {
            cards,
            position,
            score,
        } = &mut self.phase
        else {
            return Err(Error::InvalidState {
                op: "submit an answer",
                state: self.phase.name(),
            });
        };

        let expected = cards[*position].answer.clone();
        let correct = normalize(answer) == normalize(&expected);
        if correct {
            *score += 1;
        }
        *position += 1;

        let exhausted = *position == cards.len();
        let (final_score, total) = (*score, cards.len() as u32);
        if exhausted {
            self.phase = Phase::Completed {
                score: final_score,
                total,
            };
        }
        Ok(Grade { correct, expected })
    }

    pub fn current_question(&self) -> Result<&str, Error> {
        match &self.phase {
            Phase::InProgress { cards, position, .. } => Ok(&cards[*position].question),
            _ => Err(self.invalid_state("show a question")),
        }
    }

    /// `(score, total)` of a finished session.
    pub fn result(&self) -> Result<(u32, u32), Error> {
        match &self.phase {
            Phase::Completed { score, total } => Ok((*score, *total)),
            _ => Err(self.invalid_state("report a result")),
        }
    }

    /// `(answered, total, score)` while in progress, for the session header.
    pub fn progress(&self) -> Option<(usize, usize, u32)> {
        match &self.phase {
            Phase::InProgress {
                cards,
                position,
                score,
            } => Some((*position, cards.len(), *score)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Completed { .. })
    }

    fn invalid_state(&self, op: &'static str) -> Error {
        Error::InvalidState {
            op,
            state: self.phase.name(),
        }
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Grading ignores surrounding whitespace and letter case.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::card::CardStore;

    fn store(pairs: &[(&str, &str)]) -> CardStore {
        CardStore::from_cards(
            pairs
                .iter()
                .map(|(q, a)| Flashcard::new(*q, *a))
                .collect(),
        )
    }

    #[test]
    fn question_before_start_is_invalid() {
        let session = QuizSession::new();
        assert!(matches!(
            session.current_question(),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn starting_an_empty_set_fails() {
        let mut session = QuizSession::new();
        assert!(matches!(
            session.start(&CardStore::new()),
            Err(Error::EmptySet)
        ));
    }

    #[test]
    fn starting_twice_is_invalid() {
        let mut session = QuizSession::new();
        session.start(&store(&[("q", "a")])).unwrap();
        assert!(matches!(
            session.start(&store(&[("q", "a")])),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn perfect_run_scores_full_marks() {
        let cards = [("Q1", "A1"), ("Q2", "A2")];
        let answers: HashMap<&str, &str> = cards.iter().copied().collect();

        let mut session = QuizSession::new();
        session.start(&store(&cards)).unwrap();

        while !session.is_complete() {
            let question = session.current_question().unwrap().to_string();
            let grade = session.submit(answers[question.as_str()]).unwrap();
            assert!(grade.correct);
        }
        assert_eq!(session.result().unwrap(), (2, 2));
    }

    #[test]
    fn grading_ignores_case_and_whitespace() {
        let mut session = QuizSession::new();
        session.start(&store(&[("Capital of France?", "paris")])).unwrap();

        let grade = session.submit(" Paris ").unwrap();
        assert!(grade.correct);
        assert_eq!(grade.expected, "paris");
        assert_eq!(session.result().unwrap(), (1, 1));
    }

    #[test]
    fn wrong_answers_do_not_score() {
        let mut session = QuizSession::new();
        session.start(&store(&[("q", "right")])).unwrap();

        let grade = session.submit("wrong").unwrap();
        assert!(!grade.correct);
        assert_eq!(grade.expected, "right");
        assert_eq!(session.result().unwrap(), (0, 1));
    }

    #[test]
    fn submit_after_completion_is_invalid() {
        let mut session = QuizSession::new();
        session.start(&store(&[("q", "a")])).unwrap();
        session.submit("a").unwrap();

        assert!(matches!(
            session.submit("a"),
            Err(Error::InvalidState { .. })
        ));
        assert!(matches!(
            session.current_question(),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn result_before_completion_is_invalid() {
        let mut session = QuizSession::new();
        session.start(&store(&[("q", "a")])).unwrap();
        assert!(matches!(session.result(), Err(Error::InvalidState { .. })));
    }

    use proptest::prelude::*;
    proptest! {
        #[test]
        fn grading_never_panics(answer in "\\PC*", stored in "\\PC*") {
            let mut session = QuizSession::new();
            session
                .start(&store(&[("q", stored.as_str())]))
                .unwrap();
            let grade = session.submit(&answer).unwrap();
            prop_assert_eq!(grade.correct, normalize(&answer) == normalize(&stored));
        }

        #[test]
        fn padding_does_not_change_the_grade(stored in "\\PC*") {
            let padded = format!("  {}\t", stored);
            let mut session = QuizSession::new();
            session
                .start(&store(&[("q", stored.as_str())]))
                .unwrap();
            prop_assert!(session.submit(&padded).unwrap().correct);
        }
    }
}
