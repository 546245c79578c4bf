use std::io;
use std::time::{Duration, Instant};

use crate::palette::Palette;
use crate::quiz::{Grade, QuizSession};
use crate::store::StudySetRepository;
use crate::tui::{AnswerInput, Theme};

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
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

const FLASH_SECS: f64 = 2.0;

pub fn run(repo: &mut StudySetRepository, set: &str) -> Result<()> {
    let store = repo.get(set)?;
    let mut session = QuizSession::new();
    session.start(&store)?;

    let outcome = run_quiz_screen(set, &mut session)?;

    match outcome {
        Some((score, total)) => {
            repo.record_score(set, score)?;
            let color = if score == total {
                Palette::SUCCESS
            } else {
                Palette::INFO
            };
            println!(
                "{} {}",
                Palette::dim(format!("Recorded score for '{set}':")),
                Palette::paint(color, format!("{score}/{total}"))
            );
        }
        None => println!("{}", Palette::dim("Quiz abandoned; no score recorded.")),
    }
    Ok(())
}

struct QuizScreen {
    input: AnswerInput,
    last_grade: Option<GradeFlash>,
}

struct GradeFlash {
    grade: Grade,
    graded_at: Instant,
}

/// Runs the full-screen session. `Some((score, total))` when the quiz was
/// completed, `None` when the user bailed out early.
fn run_quiz_screen(set: &str, session: &mut QuizSession) -> Result<Option<(u32, u32)>> {
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
    terminal.show_cursor().context("failed to show cursor")?;

    let loop_result = quiz_loop(&mut terminal, set, session);

    teardown_terminal(&mut terminal)?;

    loop_result
}

fn quiz_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    set: &str,
    session: &mut QuizSession,
) -> Result<Option<(u32, u32)>> {
    let mut screen = QuizScreen {
        input: AnswerInput::new(),
        last_grade: None,
    };

    loop {
        let completed = session.result().ok();

        terminal
            .draw(|frame| match completed {
                Some((score, total)) => draw_completion(frame, set, score, total),
                None => draw_question(frame, set, session, &screen),
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
                break Ok(completed);
            }
            if completed.is_some() {
                // Any other key also leaves the completion screen.
                break Ok(completed);
            }

            match key.code {
                KeyCode::Enter => {
                    let answer = screen.input.take();
                    let grade = session.submit(&answer)?;
                    screen.last_grade = Some(GradeFlash {
                        grade,
                        graded_at: Instant::now(),
                    });
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    screen.input.insert_char(c);
                }
                KeyCode::Backspace => screen.input.backspace(),
                KeyCode::Delete => screen.input.delete(),
                KeyCode::Left => screen.input.move_left(),
                KeyCode::Right => screen.input.move_right(),
                KeyCode::Home => screen.input.move_home(),
                KeyCode::End => screen.input.move_end(),
                _ => {}
            }
        }
    }
}

fn draw_question(frame: &mut Frame<'_>, set: &str, session: &QuizSession, screen: &QuizScreen) {
    let area = frame.area();
    frame.render_widget(Theme::backdrop(), area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(5),
        ])
        .split(area);

    let (answered, total, score) = session.progress().unwrap_or((0, 0, 0));
    let header_line = Line::from(vec![
        Theme::label_span(format!("Answered {answered}/{total}")),
        Theme::bullet(),
        Theme::span(format!("Score {score}")),
        Theme::bullet(),
        Theme::span(set.to_string()),
    ]);

    let question = session
        .current_question()
        .map(|q| format!("Q:\n{q}"))
        .unwrap_or_default();
    let question_widget = Paragraph::new(question)
        .block(Theme::panel_with_line(header_line))
        .wrap(Wrap { trim: false });
    frame.render_widget(question_widget, chunks[0]);

    let input_widget =
        Paragraph::new(screen.input.text().to_string()).block(Theme::panel("Your answer"));
    frame.render_widget(input_widget, chunks[1]);

    let footer = Paragraph::new(instructions_text(screen))
        .block(Theme::panel_with_line(Theme::section_header("Controls")));
    frame.render_widget(footer, chunks[2]);

    let cursor_x =
        chunks[1].x + 1 + (screen.input.cursor() as u16).min(chunks[1].width.saturating_sub(2));
    let cursor_y = chunks[1].y + 1;
    frame.set_cursor_position((cursor_x, cursor_y));
}

fn draw_completion(frame: &mut Frame<'_>, set: &str, score: u32, total: u32) {
    let area = frame.area();
    frame.render_widget(Theme::backdrop(), area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let style = if score == total {
        Theme::success()
    } else {
        Theme::emphasis()
    };
    let lines = vec![
        Line::from(vec![
            Theme::span("Final score"),
            Theme::bullet(),
            Span::styled(format!("{score}/{total}"), style),
        ]),
        Line::from(vec![Theme::span(
            "The score is saved with this study set.",
        )]),
    ];
    let summary = Paragraph::new(lines)
        .block(Theme::panel(format!("Quiz complete: {set}")))
        .wrap(Wrap { trim: false });
    frame.render_widget(summary, chunks[0]);

    let footer = Paragraph::new(vec![Line::from(vec![
        Theme::span("Press any key to exit"),
    ])])
    .block(Theme::panel_with_line(Theme::section_header("Controls")));
    frame.render_widget(footer, chunks[1]);
}

fn instructions_text(screen: &QuizScreen) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Theme::key_chip("Enter"),
        Theme::span(" submit answer"),
        Theme::bullet(),
        Theme::key_chip("Esc"),
        Theme::span(" / "),
        Theme::key_chip("Ctrl+C"),
        Theme::span(" exit"),
    ])];

    if let Some(flash) = &screen.last_grade
        && flash.graded_at.elapsed().as_secs_f64() < FLASH_SECS
    {
        lines.push(grade_flash_line(&flash.grade));
    }

    lines
}

fn grade_flash_line(grade: &Grade) -> Line<'static> {
    if grade.correct {
        Line::from(vec![Span::styled(" Correct", Theme::success())])
    } else {
        Line::from(vec![
            Span::styled(" Incorrect", Theme::danger()),
            Theme::span(format!(" (answer: {})", grade.expected)),
        ])
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

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten_line(line: &Line<'_>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.to_string())
            .collect::<String>()
    }

    #[test]
    fn incorrect_flash_names_the_expected_answer() {
        let line = grade_flash_line(&Grade {
            correct: false,
            expected: "paris".into(),
        });
        let text = flatten_line(&line);
        assert!(text.contains("Incorrect"));
        assert!(text.contains("paris"));
    }

    #[test]
    fn correct_flash_does_not_leak_the_answer() {
        let line = grade_flash_line(&Grade {
            correct: true,
            expected: "paris".into(),
        });
        let text = flatten_line(&line);
        assert!(text.contains("Correct"));
        assert!(!text.contains("paris"));
    }

    #[test]
    fn recent_grade_is_shown_in_instructions() {
        let screen = QuizScreen {
            input: AnswerInput::new(),
            last_grade: Some(GradeFlash {
                grade: Grade {
                    correct: false,
                    expected: "lima".into(),
                },
                graded_at: Instant::now(),
            }),
        };

        let lines = instructions_text(&screen);
        assert!(lines.len() >= 2);
        assert!(flatten_line(lines.last().unwrap()).contains("lima"));
    }
}
