//! Ratatui-based terminal form.
//!
//! The TUI shows the 12 record fields and a "Predict Premium" button. Pressing
//! Enter runs the pipeline once; the result (or the encoding error) stays on
//! screen until the next submit. An age-sensitivity chart is drawn for the last
//! successful prediction.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::{Pipeline, PipelineOutput};
use crate::domain::{COLUMNS, Column, FieldKind, FieldSpec, FormState, N_FEATURES};
use crate::error::AppError;
use crate::report::{format_prediction, format_substitutions};

mod plotters_chart;

use plotters_chart::PremiumChart;

/// Ages covered by the sensitivity chart.
const AGE_SWEEP_MAX: i64 = 64;

/// Index of the submit button in the field list.
const SUBMIT_INDEX: usize = N_FEATURES;

/// Start the TUI with an already-built pipeline.
pub fn run(pipeline: Pipeline, form: FormState) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(pipeline, form);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Result of the last submit.
enum Outcome {
    Predicted {
        output: Box<PipelineOutput>,
        /// `None` when the age chart could not be computed.
        sweep: Option<Vec<(f64, f64)>>,
    },
    Failed(String),
}

struct App {
    pipeline: Pipeline,
    form: FormState,
    selected: usize,
    outcome: Option<Outcome>,
    status: String,
}

impl App {
    fn new(pipeline: Pipeline, form: FormState) -> Self {
        Self {
            pipeline,
            form,
            selected: 0,
            outcome: None,
            status: "Fill in the form and press Enter to predict.".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return true;
        }

        match key.code {
            KeyCode::Up | KeyCode::BackTab => {
                self.selected = self.selected.checked_sub(1).unwrap_or(SUBMIT_INDEX);
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1) % (SUBMIT_INDEX + 1);
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Left => self.step(-1),
            KeyCode::Right => self.step(1),
            KeyCode::Backspace => {
                if let Some(column) = self.selected_column() {
                    self.form.pop_char(column);
                }
            }
            KeyCode::Char(c) => {
                if let Some(column) = self.selected_column() {
                    self.form.push_char(column, c);
                }
            }
            _ => {}
        }
        false
    }

    fn selected_column(&self) -> Option<Column> {
        COLUMNS.get(self.selected).copied()
    }

    fn step(&mut self, delta: i64) {
        if let Some(column) = self.selected_column() {
            self.form.step(column, delta);
        }
    }

    /// Validate, encode, predict. Failures end this request only.
    fn submit(&mut self) {
        let record = match self.form.to_record() {
            Ok(record) => record,
            Err(err) => {
                self.status = err.to_string();
                self.selected = err_column(&err.label).map(Column::index).unwrap_or(self.selected);
                return;
            }
        };

        let output = match self.pipeline.predict(&record) {
            Ok(output) => output,
            Err(err) => {
                self.status = "Prediction abandoned.".to_string();
                self.outcome = Some(Outcome::Failed(format!("Error: {err}")));
                return;
            }
        };

        info!(premium = output.premium(), "tui prediction");
        self.status = format_prediction(output.premium());

        // The chart is a fixed age window; it never affects the prediction.
        let sweep = match self.pipeline.age_sweep(&record, 0..=AGE_SWEEP_MAX) {
            Ok(sweep) => Some(sweep),
            Err(err) => {
                warn!(error = %err, "age chart unavailable");
                None
            }
        };
        self.outcome = Some(Outcome::Predicted {
            output: Box::new(output),
            sweep,
        });
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let model = &self.pipeline.artifacts().model;
        let line = Line::from(vec![
            Span::styled("premium", Style::default().fg(Color::Cyan)),
            Span::raw(" · Health Insurance Premium Prediction using KNN Regression"),
            Span::styled(
                format!(
                    "  (k={} · {} reference rows · unseen={:?})",
                    model.k(),
                    model.n_samples(),
                    self.pipeline.handling().policy
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(48), Constraint::Min(0)])
            .split(area);

        self.draw_form(frame, columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(columns[1]);

        self.draw_result(frame, right[0]);
        self.draw_chart(frame, right[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items: Vec<ListItem> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, &column)| {
                let spec = FieldSpec::for_column(column);
                let mut value = self.form.value(column).to_string();
                if i == self.selected && !matches!(spec.kind, FieldKind::Choice(_)) {
                    value.push('▏');
                }
                if matches!(spec.kind, FieldKind::Choice(_)) {
                    value = format!("◂ {value} ▸");
                }
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<24}", spec.label()), Style::default().fg(Color::Gray)),
                    Span::raw(value),
                ]))
            })
            .collect();
        items.push(ListItem::new(Line::from(Span::styled(
            "[ Predict Premium ]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))));

        let list = List::new(items)
            .block(Block::default().title("Predict Premium").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Result").borders(Borders::ALL);
        let text = match &self.outcome {
            None => Text::from(Line::from(Span::styled(
                "No prediction yet.",
                Style::default().fg(Color::Gray),
            ))),
            Some(Outcome::Failed(message)) => Text::from(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))),
            Some(Outcome::Predicted { output, .. }) => {
                let mut lines = vec![Line::from(Span::styled(
                    format_prediction(output.premium()),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ))];
                let targets: Vec<String> = output
                    .prediction
                    .neighbors
                    .iter()
                    .map(|n| format!("{:.2}", n.target))
                    .collect();
                lines.push(Line::from(Span::styled(
                    format!("neighbors: {}", targets.join(", ")),
                    Style::default().fg(Color::Gray),
                )));
                for note in format_substitutions(&output.substitutions) {
                    lines.push(Line::from(Span::styled(note, Style::default().fg(Color::Yellow))));
                }
                Text::from(lines)
            }
        };

        let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Premium by Age").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(Outcome::Predicted { output, sweep }) = &self.outcome else {
            let msg = Paragraph::new("Waiting for a prediction...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let Some(sweep) = sweep else {
            let msg = Paragraph::new("Age chart unavailable for this record.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        // Ages past the window are still predicted; they are just not marked.
        let age = output.record.age;
        let current = (0..=AGE_SWEEP_MAX)
            .contains(&age)
            .then(|| (age as f64, output.premium()));
        let (x_bounds, y_bounds) = chart_bounds(sweep, current);
        let widget = PremiumChart {
            curve: sweep,
            current,
            x_bounds,
            y_bounds,
            x_label: "age",
            y_label: "premium",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  type to edit  ←/→ adjust  Enter predict  Esc quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn err_column(label: &str) -> Option<Column> {
    COLUMNS.iter().copied().find(|c| c.label() == label)
}

/// Axis bounds covering the sweep and the marked point, with a little padding.
fn chart_bounds(sweep: &[(f64, f64)], current: Option<(f64, f64)>) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (0.0_f64, AGE_SWEEP_MAX as f64);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in sweep.iter().chain(current.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !(y_min.is_finite() && y_max.is_finite()) || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-9);
    ([x_min, x_max], [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UnseenHandling;
    use crate::encoding::LabelEncoder;
    use crate::testing::{known_record, small_artifacts};

    fn app() -> App {
        let pipeline = Pipeline::new(small_artifacts(), UnseenHandling::default());
        App::new(pipeline, FormState::from_record(&known_record()))
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn enter_predicts_and_keeps_running() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Enter));
        match &app.outcome {
            Some(Outcome::Predicted { output, sweep }) => {
                assert!(output.premium().is_finite());
                assert_eq!(sweep.as_ref().map(Vec::len), Some((AGE_SWEEP_MAX + 1) as usize));
            }
            _ => panic!("expected a prediction"),
        }
        assert!(app.status.starts_with("Predicted Premium:"));
    }

    #[test]
    fn huge_age_predicts_with_a_fixed_chart_window() {
        let mut app = app();
        app.form.set(Column::Age, i64::MAX.to_string());
        press(&mut app, KeyCode::Enter);
        match &app.outcome {
            Some(Outcome::Predicted { output, sweep }) => {
                assert_eq!(output.record.age, i64::MAX);
                assert!(output.premium().is_finite());
                let sweep = sweep.as_ref().expect("chart computed");
                assert_eq!(sweep.len(), (AGE_SWEEP_MAX + 1) as usize);
                assert_eq!(sweep.last().map(|p| p.0), Some(AGE_SWEEP_MAX as f64));
            }
            _ => panic!("expected a prediction"),
        }
    }

    #[test]
    fn encoding_failure_is_shown_not_fatal() {
        let mut artifacts = small_artifacts();
        artifacts.encoders.plan_id = LabelEncoder::from_labels(Vec::<String>::new());
        let pipeline = Pipeline::new(artifacts, UnseenHandling::default());
        let mut app = App::new(pipeline, FormState::from_record(&known_record()));

        assert!(!press(&mut app, KeyCode::Enter));
        match &app.outcome {
            Some(Outcome::Failed(message)) => assert!(message.starts_with("Error: PlanId")),
            _ => panic!("expected a failure"),
        }
    }

    #[test]
    fn invalid_field_moves_selection_to_it() {
        let mut app = app();
        app.form.set(Column::Age, "");
        press(&mut app, KeyCode::Enter);
        assert!(app.outcome.is_none());
        assert_eq!(app.selected, Column::Age.index());
        assert!(app.status.starts_with("Age:"));
    }

    #[test]
    fn navigation_wraps_through_submit() {
        let mut app = app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, SUBMIT_INDEX);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn typing_edits_the_selected_field() {
        let mut app = app();
        app.selected = Column::StateCode.index();
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('N'));
        press(&mut app, KeyCode::Char('Y'));
        assert_eq!(app.form.value(Column::StateCode), "NY");

        app.selected = Column::Tobacco.index();
        press(&mut app, KeyCode::Right);
        assert_eq!(app.form.value(Column::Tobacco), "Yes");
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn bounds_cover_sweep_and_current_point() {
        let sweep = [(0.0, 100.0), (64.0, 300.0)];
        let (x, y) = chart_bounds(&sweep, Some((40.0, 350.0)));
        assert_eq!(x, [0.0, 64.0]);
        assert!(y[0] < 100.0 && y[1] > 350.0);

        let (x, y) = chart_bounds(&[], None);
        assert_eq!(x, [0.0, 64.0]);
        assert!(y[0] < y[1]);
    }
}
