use crate::{palette::Palette, store::StudySetRepository, tui::Theme, utils::pluralize};

use std::{io, time::Duration};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::{Paragraph, Wrap},
};

pub fn run(repo: &StudySetRepository, plain: bool) -> Result<()> {
    if plain {
        render_plain_summary(repo);
        Ok(())
    } else {
        render_dashboard(repo)
    }
}

fn render_plain_summary(repo: &StudySetRepository) {
    println!("{}", Palette::paint(Palette::ACCENT, "Study Sets"));
    if repo.is_empty() {
        println!(
            "{}",
            Palette::dim("No study sets yet. Create one with 'cardbox create <SET>'.")
        );
        return;
    }

    println!(
        "{} {}",
        Palette::dim("Sets:"),
        Palette::paint(Palette::INFO, repo.len())
    );
    println!(
        "{} {}",
        Palette::dim("Cards:"),
        Palette::paint(Palette::INFO, repo.total_cards())
    );
    println!();

    for (name, count, score) in repo.summaries() {
        let score_text = match score {
            Some(score) => Palette::paint(Palette::SUCCESS, format!("last score {score}")),
            None => Palette::dim("no score yet"),
        };
        println!(
            "{} {} {}",
            Palette::dim(format!("{name}:")),
            Palette::paint(Palette::INFO, pluralize("card", count)),
            score_text
        );
    }
}

fn render_dashboard(repo: &StudySetRepository) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let draw_result = dashboard_loop(&mut terminal, repo);

    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    draw_result
}

fn dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    repo: &StudySetRepository,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw_dashboard(frame, repo))?;

        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let exit_ctrl_c =
                key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            if key.code == KeyCode::Esc || exit_ctrl_c {
                break;
            }
        }
    }
    Ok(())
}

fn draw_dashboard(frame: &mut Frame<'_>, repo: &StudySetRepository) {
    let area = frame.area();
    frame.render_widget(Theme::backdrop(), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    frame.render_widget(collection_panel(repo), rows[0]);
    frame.render_widget(sets_panel(repo), rows[1]);
    frame.render_widget(help_panel(), rows[2]);
}

fn collection_panel(repo: &StudySetRepository) -> Paragraph<'static> {
    let scored = repo
        .summaries()
        .filter(|(_, _, score)| score.is_some())
        .count();
    let lines = vec![
        Line::from(vec![
            Theme::span("Study Sets"),
            Theme::bullet(),
            Theme::label_span(format!("{}", repo.len())),
            Theme::bullet(),
            Theme::span("Cards"),
            Theme::bullet(),
            Theme::label_span(format!("{}", repo.total_cards())),
        ]),
        Line::from(vec![
            Theme::span("With a Recorded Score"),
            Theme::bullet(),
            Theme::label_span(format!("{}", scored)),
            Theme::bullet(),
            Theme::span("Never Quizzed"),
            Theme::bullet(),
            Theme::label_span(format!("{}", repo.len() - scored)),
        ]),
    ];
    Paragraph::new(lines).block(Theme::panel("Collection"))
}

fn sets_panel(repo: &StudySetRepository) -> Paragraph<'static> {
    let lines: Vec<Line<'static>> = if repo.is_empty() {
        vec![Line::from(vec![Theme::span(
            "No study sets yet. Create one with 'cardbox create <SET>'.",
        )])]
    } else {
        repo.summaries()
            .map(|(name, count, score)| set_line(name, count, score))
            .collect()
    };
    Paragraph::new(lines)
        .block(Theme::panel("Sets"))
        .wrap(Wrap { trim: true })
}

fn set_line(name: &str, count: usize, score: Option<u32>) -> Line<'static> {
    let mut spans = vec![
        Theme::label_span(name.to_string()),
        Theme::bullet(),
        Theme::span(pluralize("card", count)),
        Theme::bullet(),
    ];
    match score {
        Some(score) => spans.push(Theme::span(format!("last score {score}"))),
        None => spans.push(Theme::span("no score yet")),
    }
    Line::from(spans)
}

fn help_panel() -> Paragraph<'static> {
    Paragraph::new(vec![Line::from(vec![
        Theme::key_chip("Esc"),
        Theme::span(" / "),
        Theme::key_chip("Ctrl+C"),
        Theme::span(" exit"),
        Theme::bullet(),
        Theme::span("Rerun command anytime to refresh data"),
    ])])
    .block(Theme::panel_with_line(Theme::section_header("Help")))
}
