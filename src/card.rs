use serde::{Deserialize, Serialize};

/// A question/answer pair. Equality is by value; cards are never edited in
/// place, only appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Flashcard {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// An ordered collection of flashcards with a wrapping navigation cursor.
///
/// The cursor is valid whenever the store is non-empty. The store owns
/// nothing but the cards and the cursor; presentation state like "showing
/// the answer" belongs to whichever screen embeds it.
#[derive(Clone, Debug, Default)]
pub struct CardStore {
    cards: Vec<Flashcard>,
    cursor: usize,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor starts on the first card.
    pub fn from_cards(cards: Vec<Flashcard>) -> Self {
        CardStore { cards, cursor: 0 }
    }

    pub fn append(&mut self, card: Flashcard) {
        self.cards.push(card);
    }

    /// The card under the cursor, or `None` when the store is empty.
    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.cursor)
    }

    /// Move the cursor one step, wrapping around in both directions.
    /// A no-op on an empty store.
    pub fn advance(&mut self, direction: Direction) {
        if self.cards.is_empty() {
            return;
        }
        self.cursor = match direction {
            Direction::Forward => (self.cursor + 1) % self.cards.len(),
            Direction::Backward => (self.cursor + self.cards.len() - 1) % self.cards.len(),
        };
    }

    /// Zero-based cursor position; meaningless on an empty store.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(n: usize) -> CardStore {
        let cards = (0..n)
            .map(|i| Flashcard::new(format!("q{i}"), format!("a{i}")))
            .collect();
        CardStore::from_cards(cards)
    }

    #[test]
    fn empty_store_has_no_current_card() {
        let store = CardStore::new();
        assert!(store.current().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn append_keeps_cursor_on_first_card() {
        let mut store = CardStore::new();
        store.append(Flashcard::new("q0", "a0"));
        store.append(Flashcard::new("q1", "a1"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.current().unwrap().question, "q0");
    }

    #[test]
    fn advance_wraps_in_both_directions() {
        let mut store = store_of(3);

        store.advance(Direction::Forward);
        assert_eq!(store.position(), 1);
        store.advance(Direction::Forward);
        store.advance(Direction::Forward);
        assert_eq!(store.position(), 0);

        store.advance(Direction::Backward);
        assert_eq!(store.position(), 2);
        assert_eq!(store.current().unwrap().question, "q2");
    }

    #[test]
    fn advance_on_empty_store_is_a_noop() {
        let mut store = CardStore::new();
        store.advance(Direction::Forward);
        store.advance(Direction::Backward);
        assert!(store.current().is_none());
    }

    use proptest::prelude::*;
    proptest! {
        #[test]
        fn full_lap_returns_to_start(len in 1usize..64, start_steps in 0usize..64) {
            let mut store = store_of(len);
            for _ in 0..start_steps {
                store.advance(Direction::Forward);
            }
            let origin = store.position();

            for _ in 0..len {
                store.advance(Direction::Forward);
            }
            prop_assert_eq!(store.position(), origin);

            for _ in 0..len {
                store.advance(Direction::Backward);
            }
            prop_assert_eq!(store.position(), origin);
        }

        #[test]
        fn cursor_stays_valid(len in 1usize..64, steps in 0usize..256) {
            let mut store = store_of(len);
            for step in 0..steps {
                let direction = if step % 3 == 0 {
                    Direction::Backward
                } else {
                    Direction::Forward
                };
                store.advance(direction);
                prop_assert!(store.position() < store.len());
                prop_assert!(store.current().is_some());
            }
        }
    }
}
