//! Terminal user interface for the isqforge wizard
//!
//! Four screens, one per workflow stage. Each screen renders purely from
//! the latest state snapshot and emits only its own stage's commands; the
//! AI client and the exporter are never touched from here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;
use tokio::sync::{mpsc, watch};

use isqforge_wizard::{
    Command, ComparisonCommand, InputCommand, InquiryInput, Isq, IsqBundle, IsqsCommand,
    ProductProfile, ProfileCommand, Stage, WorkflowState,
};

/// Session events surfaced by the driver task, outside the workflow state.
#[derive(Debug, Clone)]
pub enum Notice {
    /// A workbook was written at this path
    Exported(PathBuf),
    /// The exporter failed; the workflow itself is untouched
    ExportFailed(String),
}

/// Labels for the inquiry form, in focus order
const FIELD_LABELS: [&str; 4] = ["Product", "Category", "Description", "Reference URLs"];

/// Index of the URL field within [`FIELD_LABELS`]
const URL_FIELD: usize = 3;

/// The inquiry entry form
struct InquiryForm {
    values: [String; 4],
    focus: usize,
}

impl InquiryForm {
    fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| String::new()),
            focus: 0,
        }
    }

    fn next(&mut self) {
        self.focus = (self.focus + 1) % FIELD_LABELS.len();
    }

    fn prev(&mut self) {
        self.focus = (self.focus + FIELD_LABELS.len() - 1) % FIELD_LABELS.len();
    }

    fn push(&mut self, c: char) {
        self.values[self.focus].push(c);
    }

    fn pop(&mut self) {
        self.values[self.focus].pop();
    }

    /// Build the inquiry from the current form content. Empty fields are
    /// omitted; URLs split on whitespace and commas.
    fn inquiry(&self) -> InquiryInput {
        let mut input = InquiryInput::new();
        for (index, label) in FIELD_LABELS.iter().enumerate() {
            if index == URL_FIELD {
                continue;
            }
            let value = self.values[index].trim();
            if !value.is_empty() {
                input = input.with_field(label.to_lowercase(), value);
            }
        }
        for url in self.values[URL_FIELD]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
        {
            input = input.with_url(url);
        }
        input
    }
}

/// TUI application state
struct WizardApp {
    states: watch::Receiver<WorkflowState>,
    commands: mpsc::UnboundedSender<Command>,
    notices: mpsc::UnboundedReceiver<Notice>,
    form: InquiryForm,
    last_notice: Option<String>,
    should_quit: bool,
}

impl WizardApp {
    fn send(&self, command: Command) {
        // A closed channel means the driver is gone; quitting is handled
        // by the next loop iteration rather than here.
        let _ = self.commands.send(command);
    }

    fn handle_key(&mut self, state: &WorkflowState, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match state.stage {
            Stage::Input => self.handle_input_key(state, key),
            Stage::Profile => match key.code {
                KeyCode::Char('n') | KeyCode::Enter if !state.loading => {
                    self.send(Command::Profile(ProfileCommand::ExtractIsqs));
                }
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            Stage::Isqs => match key.code {
                KeyCode::Char('e') => self.send(Command::Isqs(IsqsCommand::Export)),
                KeyCode::Char('c') => self.send(Command::Isqs(IsqsCommand::Compare)),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            Stage::Comparison => match key.code {
                KeyCode::Char('b') | KeyCode::Esc => {
                    self.send(Command::Comparison(ComparisonCommand::Back));
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn handle_input_key(&mut self, state: &WorkflowState, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.should_quit = true;
            return;
        }
        if state.loading {
            return;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.form.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev(),
            KeyCode::Enter => {
                self.send(Command::Input(InputCommand::Submit(self.form.inquiry())));
            }
            KeyCode::Backspace => self.form.pop(),
            KeyCode::Char(c) => self.form.push(c),
            _ => {}
        }
    }
}

/// Run the wizard UI until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be configured or drawn to.
pub fn run_wizard(
    states: watch::Receiver<WorkflowState>,
    commands: mpsc::UnboundedSender<Command>,
    notices: mpsc::UnboundedReceiver<Notice>,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = WizardApp {
        states,
        commands,
        notices,
        form: InquiryForm::new(),
        last_notice: None,
        should_quit: false,
    };

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main application loop
fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut WizardApp) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        while let Ok(notice) = app.notices.try_recv() {
            app.last_notice = Some(match notice {
                Notice::Exported(path) => format!("Workbook written to {}", path.display()),
                Notice::ExportFailed(reason) => format!("Export failed: {reason}"),
            });
        }

        let state = app.states.borrow().clone();
        terminal.draw(|f| ui(f, app, &state))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(&state, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Render the UI
fn ui(f: &mut Frame, app: &WizardApp, state: &WorkflowState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(2), // Error / notice / loading
            Constraint::Min(8),    // Stage screen
            Constraint::Length(3), // Footer/help
        ])
        .split(f.area());

    render_header(f, state, chunks[0]);
    render_status(f, app, state, chunks[1]);

    match state.stage {
        Stage::Input => render_input(f, app, state, chunks[2]),
        Stage::Profile => render_profile(f, state, chunks[2]),
        Stage::Isqs => render_isqs(f, state, chunks[2]),
        Stage::Comparison => render_comparison(f, state, chunks[2]),
    }

    render_footer(f, state, chunks[3]);
}

fn render_header(f: &mut Frame, state: &WorkflowState, area: Rect) {
    let header = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "isqforge ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("stage: "),
        Span::styled(state.stage.to_string(), Style::default().fg(Color::Yellow)),
    ])])
    .block(Block::default().borders(Borders::ALL).title(" Listing Wizard "));
    f.render_widget(header, area);
}

/// Error banner, export notice, and loading indicator. The error stays
/// until the next action clears it.
fn render_status(f: &mut Frame, app: &WizardApp, state: &WorkflowState, area: Rect) {
    let mut lines = Vec::new();

    if let Some(error) = &state.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else if let Some(notice) = &app.last_notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        )));
    }

    if state.loading {
        lines.push(Line::from(Span::styled(
            "Contacting model...",
            Style::default().fg(Color::Yellow),
        )));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_input(f: &mut Frame, app: &WizardApp, state: &WorkflowState, area: Rect) {
    let mut lines = Vec::new();
    for (index, label) in FIELD_LABELS.iter().enumerate() {
        let focused = index == app.form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut value = app.form.values[index].clone();
        if focused && !state.loading {
            value.push('_');
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{label:>16}: "), label_style),
            Span::raw(value),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "URLs accept several entries, separated by spaces or commas.",
        Style::default().fg(Color::DarkGray),
    )));

    let form = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Inquiry "));
    f.render_widget(form, area);
}

fn render_profile(f: &mut Frame, state: &WorkflowState, area: Rect) {
    let lines = match &state.profile {
        Some(profile) => profile_lines(profile),
        None => vec![Line::from("No profile yet.")],
    };

    let view = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Product Profile "),
        );
    f.render_widget(view, area);
}

fn render_isqs(f: &mut Frame, state: &WorkflowState, area: Rect) {
    let lines = match &state.isqs {
        Some(isqs) => isq_lines(isqs),
        None => vec![Line::from("No ISQs yet.")],
    };

    let view = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Extracted ISQs "),
        );
    f.render_widget(view, area);
}

fn render_comparison(f: &mut Frame, state: &WorkflowState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let profile = match &state.profile {
        Some(profile) => profile_lines(profile),
        None => vec![Line::from("No profile yet.")],
    };
    f.render_widget(
        Paragraph::new(profile)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Profile ")),
        halves[0],
    );

    let isqs = match &state.isqs {
        Some(isqs) => isq_lines(isqs),
        None => vec![Line::from("No ISQs yet.")],
    };
    f.render_widget(
        Paragraph::new(isqs)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" ISQs ")),
        halves[1],
    );
}

fn render_footer(f: &mut Frame, state: &WorkflowState, area: Rect) {
    let help = match state.stage {
        Stage::Input => "Tab next field · Enter submit · Esc quit",
        Stage::Profile => "n extract ISQs · q quit",
        Stage::Isqs => "e export workbook · c compare · q quit",
        Stage::Comparison => "b back · q quit",
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        help,
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn profile_lines(profile: &ProductProfile) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Summary",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(profile.summary.clone()),
        Line::from(""),
    ];
    for (key, value) in &profile.details {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{key}: "),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(value_text(value)),
        ]));
    }
    lines
}

fn isq_lines(isqs: &IsqBundle) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(section_heading("Configuration"));
    lines.extend(isq_entry(&isqs.config));

    lines.push(Line::from(""));
    lines.push(section_heading(&format!("Keys ({})", isqs.keys.len())));
    for isq in &isqs.keys {
        lines.extend(isq_entry(isq));
    }

    lines.push(Line::from(""));
    lines.push(section_heading(&format!("Buyers ({})", isqs.buyers.len())));
    for isq in &isqs.buyers {
        lines.extend(isq_entry(isq));
    }

    lines
}

fn section_heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn isq_entry(isq: &Isq) -> Vec<Line<'static>> {
    let name = isq.label().unwrap_or("(unnamed)").to_string();
    let mut lines = vec![Line::from(vec![
        Span::raw("  "),
        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
    ])];
    for (key, value) in &isq.fields {
        if key == "name" {
            continue;
        }
        lines.push(Line::from(format!("    {key}: {}", value_text(value))));
    }
    lines
}

/// Render a service-defined JSON value as display text.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_inquiry_splits_urls() {
        let mut form = InquiryForm::new();
        form.values[0] = "Ball valve".to_string();
        form.values[URL_FIELD] = "http://a, http://b  http://c".to_string();

        let input = form.inquiry();

        assert_eq!(input.fields.get("product").map(String::as_str), Some("Ball valve"));
        assert_eq!(
            input.urls,
            vec!["http://a", "http://b", "http://c"]
        );
    }

    #[test]
    fn test_form_omits_empty_fields() {
        let mut form = InquiryForm::new();
        form.values[1] = "  ".to_string();

        let input = form.inquiry();

        assert!(input.fields.is_empty());
        assert!(input.urls.is_empty());
    }

    #[test]
    fn test_form_focus_wraps() {
        let mut form = InquiryForm::new();
        form.prev();
        assert_eq!(form.focus, FIELD_LABELS.len() - 1);
        form.next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_value_text_nested_array() {
        let value = serde_json::json!([["a", "b"], "c"]);
        assert_eq!(value_text(&value), "a, b, c");
    }
}
