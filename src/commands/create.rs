use crate::{
    card::Flashcard,
    error::Error,
    palette::Palette,
    store::StudySetRepository,
    tui::Editor,
    tui::Theme,
    utils::ask_yn,
    utils::pluralize,
    utils::trim_line,
};

use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

const FLASH_SECS: f64 = 1.5;

pub fn run(repo: &mut StudySetRepository, set: &str) -> Result<()> {
    let set = set.trim();
    if set.is_empty() {
        bail!("Study set name must not be empty");
    }

    let draft = match repo.get(set) {
        Ok(store) => store.cards().to_vec(),
        Err(Error::NotFound(_)) => {
            let should_create = ask_yn(format!(
                "Study set {} does not exist. Would you like to create it?",
                Palette::paint(Palette::ACCENT, set)
            ));
            if !should_create {
                println!("Aborting; study set not created.");
                return Ok(());
            }
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    capture_cards(repo, set, draft)
}

/// Parse the editor buffer into a card. The buffer is the `Q:`/`A:`
/// template; text between the markers may span lines.
fn parse_card(content: &str) -> Result<Flashcard> {
    #[derive(Clone, Copy)]
    enum Section {
        Question,
        Answer,
    }

    let mut question: Vec<&str> = Vec::new();
    let mut answer: Vec<&str> = Vec::new();
    let mut section = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Q:") {
            section = Some(Section::Question);
            question.push(rest);
        } else if let Some(rest) = line.strip_prefix("A:") {
            section = Some(Section::Answer);
            answer.push(rest);
        } else {
            match section {
                Some(Section::Question) => question.push(line),
                Some(Section::Answer) => answer.push(line),
                None => {}
            }
        }
    }

    let question = question.join("\n");
    let answer = answer.join("\n");
    let Some(question) = trim_line(&question) else {
        bail!("Card needs a question");
    };
    let Some(answer) = trim_line(&answer) else {
        bail!("Card needs an answer");
    };
    Ok(Flashcard::new(question, answer))
}

fn capture_cards(repo: &mut StudySetRepository, set: &str, mut draft: Vec<Flashcard>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                | KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        )
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.show_cursor()?;

    let mut added_count = 0usize;
    let mut unsaved = false;

    let editor_result: Result<()> = (|| {
        let mut editor = Editor::new();
        let mut status: Option<String> = None;
        let mut last_action_at: Option<Instant> = None;
        let mut view_height = 0usize;
        loop {
            terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(Theme::backdrop(), area);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(5), Constraint::Length(5)])
                    .split(area);

                view_height = chunks[0].height.saturating_sub(2) as usize;
                editor.ensure_cursor_visible(view_height.max(1));

                let editor_block = Theme::panel(set.to_string());
                let editor_widget = Paragraph::new(editor.content())
                    .block(editor_block)
                    .wrap(Wrap { trim: false })
                    .scroll((editor.scroll_top() as u16, 0));
                frame.render_widget(editor_widget, chunks[0]);

                let mut help_lines = vec![Line::from(vec![
                    Theme::key_chip("Ctrl+S"),
                    Theme::span(" add card"),
                    Theme::bullet(),
                    Theme::key_chip("Ctrl+W"),
                    Theme::span(" save set"),
                    Theme::bullet(),
                    Theme::key_chip("Esc"),
                    Theme::span(" / "),
                    Theme::key_chip("Ctrl+C"),
                    Theme::span(" exit"),
                ])];
                help_lines.push(Line::from(vec![
                    Theme::span("Cards in set:"),
                    Theme::label_span(format!(" {}", draft.len())),
                    Theme::bullet(),
                    Theme::span("Added this session:"),
                    Theme::label_span(format!(" {}", added_count)),
                ]));
                if let Some(time) = last_action_at
                    && time.elapsed().as_secs_f64() < FLASH_SECS
                    && let Some(message) = status.clone()
                {
                    let style = if message.starts_with("Unable") {
                        Theme::danger()
                    } else {
                        Theme::success()
                    };
                    help_lines.push(Line::from(vec![Span::styled(message, style)]));
                }

                let instructions = Paragraph::new(help_lines)
                    .block(Theme::panel_with_line(Theme::section_header("Help")))
                    .wrap(Wrap { trim: true });
                frame.render_widget(instructions, chunks[1]);

                let (cursor_row, cursor_col) = editor.cursor();
                let visible_row = cursor_row.saturating_sub(editor.scroll_top());
                let cursor_x =
                    chunks[0].x + 1 + (cursor_col as u16).min(chunks[0].width.saturating_sub(2));
                let cursor_y =
                    chunks[0].y + 1 + (visible_row as u16).min(chunks[0].height.saturating_sub(2));
                frame.set_cursor_position((cursor_x, cursor_y));
            })?;

            if event::poll(Duration::from_millis(16))?
                && let Event::Key(key) = event::read()?
            {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Esc
                    || (key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL))
                {
                    break;
                }

                if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    match parse_card(&editor.content()) {
                        Ok(card) => {
                            draft.push(card);
                            editor.clear();
                            added_count += 1;
                            unsaved = true;
                            status = Some(String::from("Card added."));
                        }
                        Err(e) => {
                            status = Some(format!("Unable to add card: {}", e));
                        }
                    }
                    last_action_at = Some(Instant::now());
                    continue;
                }

                if key.code == KeyCode::Char('w') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    match repo.save(set, &draft) {
                        Ok(()) => {
                            unsaved = false;
                            status = Some(String::from("Study set saved."));
                        }
                        Err(e) => {
                            status = Some(format!("Unable to save study set: {}", e));
                        }
                    }
                    last_action_at = Some(Instant::now());
                    continue;
                }

                match key.code {
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        editor.insert_char(c);
                    }
                    KeyCode::Enter => editor.insert_newline(),
                    KeyCode::Backspace => editor.backspace(),
                    KeyCode::Delete => editor.delete(),
                    KeyCode::Left => editor.move_left(),
                    KeyCode::Right => editor.move_right(),
                    KeyCode::Up => editor.move_up(),
                    KeyCode::Down => editor.move_down(),
                    KeyCode::Home => editor.move_home(),
                    KeyCode::End => editor.move_end(),
                    KeyCode::PageUp => {
                        for _ in 0..view_height.max(1) {
                            editor.move_up();
                        }
                    }
                    KeyCode::PageDown => {
                        for _ in 0..view_height.max(1) {
                            editor.move_down();
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    })();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        PopKeyboardEnhancementFlags,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    editor_result?;

    // Unsaved additions are written on the way out rather than dropped.
    if unsaved && !draft.is_empty() {
        repo.save(set, &draft)
            .with_context(|| format!("failed to save study set '{set}'"))?;
    }
    println!(
        "{} {}",
        Palette::dim(format!("Study set '{set}':")),
        Palette::paint(Palette::INFO, pluralize("card", draft.len()))
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_template_into_a_card() {
        let card = parse_card("Q: Capital of France?\nA: Paris").unwrap();
        assert_eq!(card.question, "Capital of France?");
        assert_eq!(card.answer, "Paris");
    }

    #[test]
    fn answers_may_span_multiple_lines() {
        let card = parse_card("Q: Define an isotope\nA: Same element,\ndifferent neutrons").unwrap();
        assert_eq!(card.answer, "Same element,\ndifferent neutrons");
    }

    #[test]
    fn rejects_a_blank_question() {
        let err = parse_card("Q: \nA: Paris").unwrap_err();
        assert!(err.to_string().contains("question"));
    }

    #[test]
    fn rejects_a_blank_answer() {
        let err = parse_card("Q: Capital of France?\nA: ").unwrap_err();
        assert!(err.to_string().contains("answer"));
    }

    #[test]
    fn text_before_the_first_marker_is_ignored() {
        let card = parse_card("stray\nQ: q\nA: a").unwrap();
        assert_eq!(card.question, "q");
    }
}
