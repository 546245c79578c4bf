use std::io;
use std::time::Duration;

use crate::card::{CardStore, Direction, Flashcard};
use crate::store::StudySetRepository;
use crate::tui::Theme;

use anyhow::{Context, Result};
use crossterm::event::KeyModifiers;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDirection, Layout},
    text::Line,
    widgets::{Paragraph, Wrap},
};

pub fn run(repo: &StudySetRepository, set: &str) -> Result<()> {
    let store = repo.get(set)?;
    start_browse_session(set, store)
}

struct BrowseState {
    store: CardStore,
    show_answer: bool,
}

impl BrowseState {
    fn new(store: CardStore) -> Self {
        Self {
            store,
            show_answer: false,
        }
    }

    fn current_card(&self) -> Option<&Flashcard> {
        self.store.current()
    }

    fn flip(&mut self) {
        if !self.store.is_empty() {
            self.show_answer = !self.show_answer;
        }
    }

    /// Moving to a neighboring card always lands on its question side.
    fn advance(&mut self, direction: Direction) {
        self.store.advance(direction);
        self.show_answer = false;
    }
}

fn start_browse_session(set: &str, store: CardStore) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                | KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        )
    )
    .context("failed to configure terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to start terminal")?;
    terminal.hide_cursor().context("failed to hide cursor")?;

    let mut state = BrowseState::new(store);
    let loop_result = browse_loop(&mut terminal, set, &mut state);

    teardown_terminal(&mut terminal)?;

    loop_result
}

fn browse_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    set: &str,
    state: &mut BrowseState,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| {
                let area = frame.area();
                frame.render_widget(Theme::backdrop(), area);
                let chunks = Layout::default()
                    .direction(LayoutDirection::Vertical)
                    .constraints([Constraint::Min(5), Constraint::Length(4)])
                    .split(area);

                let header_line = Line::from(vec![
                    Theme::label_span(header_text(state)),
                    Theme::bullet(),
                    Theme::span(set.to_string()),
                ]);

                let content = match state.current_card() {
                    Some(card) => format_card_text(card, state.show_answer),
                    None => String::from("No cards in this set."),
                };
                let card_widget = Paragraph::new(content)
                    .block(Theme::panel_with_line(header_line))
                    .wrap(Wrap { trim: false });
                frame.render_widget(card_widget, chunks[0]);

                let footer = Paragraph::new(instructions_text(state))
                    .block(Theme::panel_with_line(Theme::section_header("Controls")));
                frame.render_widget(footer, chunks[1]);
            })
            .context("failed to render frame")?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if key.code == KeyCode::Esc
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
            {
                break Ok(());
            }
            match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => state.flip(),
                KeyCode::Right | KeyCode::Char('n') => state.advance(Direction::Forward),
                KeyCode::Left | KeyCode::Char('p') => state.advance(Direction::Backward),
                _ => {}
            }
        }
    }
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        PopKeyboardEnhancementFlags,
        LeaveAlternateScreen
    )
    .context("failed to restore terminal")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

fn header_text(state: &BrowseState) -> String {
    if state.store.is_empty() {
        String::from("Empty set")
    } else {
        format!("Card {}/{}", state.store.position() + 1, state.store.len())
    }
}

fn instructions_text(state: &BrowseState) -> Vec<Line<'static>> {
    let flip_label = if state.show_answer {
        " show question"
    } else {
        " show answer"
    };
    vec![Line::from(vec![
        Theme::key_chip("Space"),
        Theme::span(" or "),
        Theme::key_chip("Enter"),
        Theme::span(flip_label),
        Theme::bullet(),
        Theme::key_chip("←"),
        Theme::span(" / "),
        Theme::key_chip("→"),
        Theme::span(" previous / next"),
        Theme::bullet(),
        Theme::key_chip("Esc"),
        Theme::span(" / "),
        Theme::key_chip("Ctrl+C"),
        Theme::span(" exit"),
    ])]
}

fn format_card_text(card: &Flashcard, show_answer: bool) -> String {
    let mut text = format!("Q:\n{}\n\nA:\n", card.question);
    if show_answer {
        text.push_str(&card.answer);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_of(pairs: &[(&str, &str)]) -> BrowseState {
        let cards = pairs
            .iter()
            .map(|(q, a)| Flashcard::new(*q, *a))
            .collect();
        BrowseState::new(CardStore::from_cards(cards))
    }

    #[test]
    fn card_hides_answer_until_revealed() {
        let card = Flashcard::new("What?", "Answer");

        let hidden = format_card_text(&card, false);
        assert!(!hidden.contains("Answer"));

        let shown = format_card_text(&card, true);
        assert!(shown.contains("Answer"));
    }

    #[test]
    fn advancing_resets_to_the_question_side() {
        let mut state = state_of(&[("q0", "a0"), ("q1", "a1")]);
        state.flip();
        assert!(state.show_answer);

        state.advance(Direction::Forward);
        assert!(!state.show_answer);
        assert_eq!(state.current_card().unwrap().question, "q1");
    }

    #[test]
    fn flip_is_a_noop_on_an_empty_store() {
        let mut state = BrowseState::new(CardStore::new());
        state.flip();
        assert!(!state.show_answer);
        assert_eq!(header_text(&state), "Empty set");
    }

    #[test]
    fn header_counts_from_one() {
        let mut state = state_of(&[("q0", "a0"), ("q1", "a1"), ("q2", "a2")]);
        assert_eq!(header_text(&state), "Card 1/3");

        state.advance(Direction::Backward);
        assert_eq!(header_text(&state), "Card 3/3");
    }
}
