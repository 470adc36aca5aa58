//! Terminal dashboard.
//!
//! Keys: `p` cycles the lookback period, `i` cycles the interval, `r` forces a
//! refresh, `q` / `Esc` quits. The view auto-refreshes every `refresh_secs`.

use crate::app::App;
use crate::view::{DashboardView, MetricCard, Tone, ViewState};
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use keylevel_ingestion::BarSource;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run the dashboard until the user quits.
pub async fn run<S: BarSource>(app: &mut App<S>) -> anyhow::Result<()> {
    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Refresh,
    CyclePeriod,
    CycleInterval,
}

fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('p') => Some(Action::CyclePeriod),
        KeyCode::Char('i') => Some(Action::CycleInterval),
        _ => None,
    }
}

/// Wait for the next terminal event on the blocking pool.
///
/// `event::poll` blocks its thread for up to `POLL_INTERVAL`; running it
/// through `spawn_blocking` keeps the runtime free for fetches.
async fn next_event<F>(poll: F) -> anyhow::Result<Option<Event>>
where
    F: FnOnce() -> io::Result<Option<Event>> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(poll).await??)
}

fn poll_terminal() -> io::Result<Option<Event>> {
    if event::poll(POLL_INTERVAL)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

async fn event_loop<B: Backend, S: BarSource>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> anyhow::Result<()> {
    terminal.draw(|f| render_ui(f, app.view(), app.last_refresh()))?;
    app.refresh().await;
    let mut last_refresh = Instant::now();

    loop {
        if last_refresh.elapsed() >= app.refresh_interval() {
            app.refresh().await;
            last_refresh = Instant::now();
        }

        terminal.draw(|f| render_ui(f, app.view(), app.last_refresh()))?;

        let Some(Event::Key(key)) = next_event(poll_terminal).await? else {
            continue;
        };
        let Some(action) = action_for(&key) else {
            continue;
        };

        match action {
            Action::Quit => break,
            Action::Refresh => {
                app.force_refresh().await;
            }
            Action::CyclePeriod => {
                app.cycle_period();
                terminal.draw(|f| render_ui(f, app.view(), app.last_refresh()))?;
                app.refresh().await;
            }
            Action::CycleInterval => {
                app.cycle_interval();
                terminal.draw(|f| render_ui(f, app.view(), app.last_refresh()))?;
                app.refresh().await;
            }
        }
        last_refresh = Instant::now();
    }

    Ok(())
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Neutral => Style::default().fg(Color::White),
        Tone::Positive => Style::default().fg(Color::Green),
        Tone::Negative => Style::default().fg(Color::Red),
        Tone::Warning => Style::default().fg(Color::Yellow),
        Tone::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Draw the whole screen.
pub fn render_ui(f: &mut Frame, view: &DashboardView, last_refresh: Option<DateTime<Utc>>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, view, chunks[0]);
    render_metrics(f, view, chunks[1]);
    render_key_levels(f, view, chunks[2]);
    render_status(f, view, chunks[3]);
    render_footer(f, view, last_refresh, chunks[5]);
}

fn render_header(f: &mut Frame, view: &DashboardView, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            view.title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(view.subtitle.clone(), Style::default().fg(Color::Gray))),
    ];

    let mut selection = vec![Span::styled(view.selection(), Style::default().fg(Color::White))];
    if let Some(as_of) = &view.as_of {
        selection.push(Span::raw("  "));
        selection.push(Span::styled(
            format!("last bar {as_of} ({} bars)", view.bar_count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(selection));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_metrics(f: &mut Frame, view: &DashboardView, area: Rect) {
    if view.metrics.is_empty() {
        let text = match view.state {
            ViewState::Loading => "Loading...",
            _ => "No metrics",
        };
        let block = Block::default().title(" METRICS ").borders(Borders::ALL);
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let n = view.metrics.len() as u32;
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(view.metrics.iter().map(|_| Constraint::Ratio(1, n)))
        .split(area);

    for (metric, cell) in view.metrics.iter().zip(cells.iter()) {
        render_metric(f, metric, *cell);
    }
}

fn render_metric(f: &mut Frame, metric: &MetricCard, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", metric.label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let value = Paragraph::new(Line::from(Span::styled(
        metric.value.clone(),
        tone_style(metric.tone).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(block);
    f.render_widget(value, area);
}

fn render_key_levels(f: &mut Frame, view: &DashboardView, area: Rect) {
    let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("Key Level").style(header_style),
        Cell::from("Price").style(header_style),
    ])
    .height(1);

    let rows: Vec<Row> = view
        .key_levels
        .iter()
        .map(|row| {
            let colour = if row.label == "Upper" { Color::Green } else { Color::Red };
            Row::new(vec![
                Cell::from(row.label).style(Style::default().fg(colour)),
                Cell::from(row.price.clone()).style(Style::default().fg(Color::White)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(12), Constraint::Length(14)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" KEY LEVELS (ATR-based) ")
                .border_style(Style::default().fg(Color::White)),
        );
    f.render_widget(table, area);
}

fn render_status(f: &mut Frame, view: &DashboardView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(tone_style(view.status.tone));
    let status = Paragraph::new(Span::styled(
        view.status.text.clone(),
        tone_style(view.status.tone),
    ))
    .block(block);
    f.render_widget(status, area);
}

fn render_footer(f: &mut Frame, view: &DashboardView, last_refresh: Option<DateTime<Utc>>, area: Rect) {
    let refreshed = match last_refresh {
        Some(ts) => format!("refreshed {}", ts.with_timezone(&Local).format("%H:%M:%S")),
        None => "not refreshed yet".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(view.footer.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::styled(refreshed, Style::default().fg(Color::DarkGray)),
        Span::raw("  |  "),
        Span::styled(
            "p period  i interval  r refresh  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
