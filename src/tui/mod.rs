// SPDX-License-Identifier: MIT
//! Interactive terminal dashboard.
//!
//! Layout:
//!   ┌─── nav bar ─────────────────────────────────────────────────────────┐
//!   │  Dashboard │ Results │ Upload │ Reports │ Settings        tenant    │
//!   ├─── page body ───────────────────────────────────────────────────────┤
//!   │  (one page visible at a time)                                       │
//!   ├─────────────────────────────────────────────────────────────────────┤
//!   │  status line + key bindings                                         │
//!   └─────────────────────────────────────────────────────────────────────┘
//!
//! The shell owns the terminal, the `AppState`, and the component structs;
//! it binds renderer output (rows, bars, pills) to ratatui widgets.  All
//! inputs converge on one channel: keyboard events from a reader thread and
//! upload-flow events from a forwarder task.  Each user-triggered flow is
//! awaited to completion before the next key is processed, so state is only
//! ever touched from this loop.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

use crate::api::ApiClient;
use crate::auth::AuthGate;
use crate::config::ConsoleConfig;
use crate::model::{normalize_claims, RefinedEntry};
use crate::nav::{NavEffect, Navigator, Page};
use crate::render::metrics::{chart, ChartView, EMPTY_CHART_MESSAGE};
use crate::render::results::{filter, table_rows, TableRow};
use crate::render::Tone;
use crate::settings::{self, EMPTY_CAPS_MESSAGE};
use crate::state::{normalize_tenant, AppState};
use crate::upload::progress::{FileSlot, IndicatorState, TransferSnapshot};
use crate::upload::{self, UploadEvent, UploadSpec};

const STATUS_FILTERS: [&str; 3] = ["", "Validated", "Not validated"];
const ERROR_FILTERS: [&str; 5] = ["", "No error", "Medical error", "Technical error", "Both"];

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => Color::Green,
        Tone::Error => Color::Red,
        Tone::Warning => Color::Yellow,
        Tone::Info => Color::Cyan,
    }
}

/// Everything the shell reacts to, on one channel.
#[derive(Debug)]
enum ShellEvent {
    Input(CEvent),
    Upload(UploadEvent),
}

// ─── Forms ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LoginForm {
    username: String,
    password: String,
    /// 0 = username, 1 = password.
    focus: usize,
    error: Option<&'static str>,
}

impl LoginForm {
    fn clear(&mut self) {
        self.username.clear();
        self.password.clear();
        self.focus = 0;
        self.error = None;
    }

    fn focused_field(&mut self) -> &mut String {
        if self.focus == 0 {
            &mut self.username
        } else {
            &mut self.password
        }
    }
}

#[derive(Debug, Default)]
struct UploadForm {
    tenant: String,
    claims_path: String,
    technical_path: String,
    medical_path: String,
    /// 0..=3, in field order above.
    focus: usize,
    snapshot: Option<TransferSnapshot>,
    running: bool,
}

impl UploadForm {
    fn focused_field(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.tenant,
            1 => &mut self.claims_path,
            2 => &mut self.technical_path,
            _ => &mut self.medical_path,
        }
    }

    fn spec(&self) -> UploadSpec {
        let path = |s: &String| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.into())
        };
        UploadSpec {
            tenant: self.tenant.clone(),
            claims_path: path(&self.claims_path),
            technical_path: path(&self.technical_path),
            medical_path: path(&self.medical_path),
        }
    }
}

#[derive(Debug, Default)]
struct FilterForm {
    query: String,
    status_idx: usize,
    error_idx: usize,
}

#[derive(Debug, Default)]
struct SettingsForm {
    threshold: String,
    cap_service: String,
    cap_value: String,
    /// 0 = threshold, 1 = service, 2 = cap value.
    focus: usize,
    selected: usize,
    message: Option<(String, Tone)>,
}

// ─── Shell ────────────────────────────────────────────────────────────────────

pub struct ConsoleUi {
    api: ApiClient,
    config: ConsoleConfig,
    state: AppState,
    nav: Navigator,
    gate: AuthGate,
    login: LoginForm,
    upload_form: UploadForm,
    filter_form: FilterForm,
    settings_form: SettingsForm,
    reports: Vec<RefinedEntry>,
    events_tx: Option<UnboundedSender<ShellEvent>>,
    status: Option<(String, Tone)>,
    should_quit: bool,
}

impl ConsoleUi {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api_url, config.timeout())
            .context("failed to build HTTP client")?;
        Ok(Self {
            api,
            config,
            state: AppState::default(),
            nav: Navigator::default(),
            gate: AuthGate::default(),
            login: LoginForm::default(),
            upload_form: UploadForm::default(),
            filter_form: FilterForm::default(),
            settings_form: SettingsForm::default(),
            reports: Vec::new(),
            events_tx: None,
            status: None,
            should_quit: false,
        })
    }

    /// Enter the alternate screen and run until quit.
    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.events_tx = Some(tx.clone());
        spawn_input_thread(tx);
        let mut tick = tokio::time::interval(Duration::from_millis(100));

        loop {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                Some(event) = rx.recv() => match event {
                    ShellEvent::Input(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await;
                    }
                    ShellEvent::Input(_) => {}
                    ShellEvent::Upload(event) => self.handle_upload_event(event),
                },
                _ = tick.tick() => {
                    self.state.tick_indicator_hide(Instant::now());
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────────

    async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        if !self.gate.is_authenticated() {
            self.handle_login_key(key).await;
            return;
        }

        // Page switching is global once logged in.
        match key.code {
            KeyCode::F(n @ 1..=5) => {
                self.switch_page(Page::ALL[(n - 1) as usize]).await;
                return;
            }
            KeyCode::Char('l') if ctrl => {
                self.logout();
                return;
            }
            _ => {}
        }

        match self.nav.current() {
            Page::Dashboard | Page::Reports => self.handle_passive_page_key(key).await,
            Page::Results => self.handle_results_key(key),
            Page::Upload => self.handle_upload_key(key),
            Page::Settings => self.handle_settings_key(key).await,
        }
    }

    async fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                self.login.focus = (self.login.focus + 1) % 2;
            }
            KeyCode::Backspace => {
                self.login.focused_field().pop();
            }
            KeyCode::Enter => {
                let username = self.login.username.clone();
                let password = self.login.password.clone();
                match self
                    .gate
                    .login(&self.api, &username, &password, &mut self.state)
                    .await
                {
                    Ok(()) => {
                        self.login.clear();
                        let effect = self.nav.show(Page::Dashboard);
                        self.apply_nav_effect(effect).await;
                    }
                    Err(message) => self.login.error = Some(message),
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.focused_field().push(c);
            }
            _ => {}
        }
    }

    async fn handle_passive_page_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('r') {
            match self.nav.current() {
                Page::Reports => self.load_reports().await,
                _ => self.refresh_data().await,
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.filter_form = FilterForm::default(),
            KeyCode::F(6) => {
                self.filter_form.status_idx =
                    (self.filter_form.status_idx + 1) % STATUS_FILTERS.len();
            }
            KeyCode::F(7) => {
                self.filter_form.error_idx = (self.filter_form.error_idx + 1) % ERROR_FILTERS.len();
            }
            KeyCode::Backspace => {
                self.filter_form.query.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter_form.query.push(c);
            }
            _ => {}
        }
    }

    fn handle_upload_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.upload_form.focus = (self.upload_form.focus + 1) % 4,
            KeyCode::Up => self.upload_form.focus = (self.upload_form.focus + 3) % 4,
            KeyCode::Backspace => {
                self.upload_form.focused_field().pop();
            }
            KeyCode::Enter => self.start_upload(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.upload_form.focused_field().push(c);
            }
            _ => {}
        }
    }

    async fn handle_settings_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.settings_form.focus = (self.settings_form.focus + 1) % 3;
            }
            KeyCode::Up => self.settings_form.focus = (self.settings_form.focus + 2) % 3,
            KeyCode::Backspace => {
                self.settings_focused_field().pop();
            }
            KeyCode::Left => {
                self.settings_form.selected = self.settings_form.selected.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.settings_form.selected + 1 < self.state.caps.len() {
                    self.settings_form.selected += 1;
                }
            }
            KeyCode::Char('a') if ctrl => {
                let service = self.settings_form.cap_service.trim().to_string();
                if !service.is_empty() {
                    let cap = self.settings_form.cap_value.trim().parse().unwrap_or(0.0);
                    self.state.caps.add(&service, cap);
                    self.settings_form.cap_service.clear();
                    self.settings_form.cap_value.clear();
                }
            }
            KeyCode::Char('d') if ctrl => {
                self.state.caps.remove(self.settings_form.selected);
                self.settings_form.selected = self
                    .settings_form
                    .selected
                    .min(self.state.caps.len().saturating_sub(1));
            }
            KeyCode::Char('s') if ctrl => self.save_settings().await,
            KeyCode::Char('r') if ctrl => self.load_settings().await,
            KeyCode::Char(c) if !ctrl => self.settings_focused_field().push(c),
            _ => {}
        }
    }

    fn settings_focused_field(&mut self) -> &mut String {
        match self.settings_form.focus {
            0 => &mut self.settings_form.threshold,
            1 => &mut self.settings_form.cap_service,
            _ => &mut self.settings_form.cap_value,
        }
    }

    // ─── Actions ─────────────────────────────────────────────────────────────

    async fn switch_page(&mut self, page: Page) {
        let effect = self.nav.show(page);
        self.apply_nav_effect(effect).await;
        match page {
            Page::Reports => self.load_reports().await,
            Page::Settings => self.load_settings().await,
            _ => {}
        }
    }

    async fn apply_nav_effect(&mut self, effect: NavEffect) {
        if effect == NavEffect::RefreshData {
            self.refresh_data().await;
        }
    }

    /// Fetch results + metrics for the current tenant and replace both
    /// together.
    async fn refresh_data(&mut self) {
        let tenant = normalize_tenant(&self.state.tenant);
        let results = self.api.results(&tenant).await;
        let metrics = self.api.metrics(&tenant).await;
        match (results, metrics) {
            (Ok(r), Ok(m)) => {
                self.state.replace_data(normalize_claims(&r.claims), m.metrics);
                self.status = None;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(tenant = %tenant, "refresh failed: {e}");
                self.status = Some((e.user_message("Failed to load data"), Tone::Error));
            }
        }
    }

    async fn load_reports(&mut self) {
        let tenant = normalize_tenant(&self.state.tenant);
        match self.api.refined(&tenant).await {
            Ok(resp) => self.reports = resp.refined,
            Err(e) => self.status = Some((e.user_message("Failed to load reports"), Tone::Error)),
        }
    }

    async fn load_settings(&mut self) {
        let tenant = normalize_tenant(&self.state.tenant);
        match settings::load(&self.api, &tenant).await {
            Ok(loaded) => {
                self.state.threshold = loaded.threshold.unwrap_or(0.0);
                self.settings_form.threshold = loaded
                    .threshold
                    .map(|t| t.to_string())
                    .unwrap_or_default();
                self.state.caps = loaded.caps;
                self.settings_form.selected = 0;
                self.settings_form.message = None;
            }
            Err(e) => {
                self.settings_form.message =
                    Some((e.user_message("Failed to load settings"), Tone::Error));
            }
        }
    }

    async fn save_settings(&mut self) {
        let tenant = normalize_tenant(&self.state.tenant);
        self.state.tenant = tenant.clone();
        self.state.threshold = self.settings_form.threshold.trim().parse().unwrap_or(0.0);
        match settings::save(&self.api, &tenant, self.state.threshold, &self.state.caps).await {
            Ok(()) => {
                self.settings_form.message = Some(("Settings saved".to_string(), Tone::Success));
            }
            Err(e) => {
                self.settings_form.message =
                    Some((e.user_message("Failed to save settings"), Tone::Error));
            }
        }
    }

    fn start_upload(&mut self) {
        if self.upload_form.running {
            return;
        }
        let Some(shell_tx) = self.events_tx.clone() else {
            return;
        };
        let spec = self.upload_form.spec();
        self.state.tenant = normalize_tenant(&spec.tenant);
        self.upload_form.running = true;
        self.upload_form.snapshot = None;

        // The flow emits UploadEvents; a forwarder folds them into the
        // shell channel so the main loop stays single-consumer.
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if shell_tx.send(ShellEvent::Upload(event)).is_err() {
                    break;
                }
            }
        });

        let api = self.api.clone();
        tokio::spawn(async move {
            let _ = upload::run(&api, spec, tx).await;
        });
    }

    fn handle_upload_event(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Started => {
                self.state.indicators.reset();
                self.state.hide_indicators_at = None;
                self.state.outcome = None;
                self.status = None;
            }
            UploadEvent::RuleRead(slot) => {
                self.state.indicators.set(slot, IndicatorState::Done);
            }
            UploadEvent::Progress(snapshot) => {
                self.state
                    .indicators
                    .set(FileSlot::Claims, IndicatorState::Active(snapshot.percent()));
                self.upload_form.snapshot = Some(snapshot);
            }
            UploadEvent::Uploaded => {
                self.state.indicators.set(FileSlot::Claims, IndicatorState::Done);
            }
            UploadEvent::Validated {
                outcome,
                claims,
                metrics,
            } => {
                self.state.replace_data(claims, metrics);
                self.status = Some((outcome.summary.clone(), outcome.tone));
                self.state.outcome = Some(outcome);
            }
            UploadEvent::Refreshed { claims, metrics } => {
                self.state.replace_data(claims, metrics);
                self.state
                    .indicators
                    .set(FileSlot::TechnicalRules, IndicatorState::Done);
                self.state
                    .indicators
                    .set(FileSlot::MedicalRules, IndicatorState::Done);
                self.state.arm_indicator_hide(Instant::now());
                self.upload_form.running = false;
                // Flow complete — land on the results table.  Data was
                // replaced from the canonical refetch just above.
                let _ = self.nav.show(Page::Results);
            }
            UploadEvent::Failed { message } => {
                self.state.indicators.fail_all();
                self.state.arm_indicator_hide(Instant::now());
                self.status = Some((message, Tone::Error));
                self.upload_form.running = false;
            }
        }
    }

    fn logout(&mut self) {
        self.gate.logout();
        self.login.clear();
    }

    // ─── Drawing ─────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        if !self.gate.is_authenticated() {
            self.draw_login(frame);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(frame.area());

        self.draw_nav(frame, chunks[0]);
        match self.nav.current() {
            Page::Dashboard => self.draw_dashboard(frame, chunks[1]),
            Page::Results => self.draw_results(frame, chunks[1]),
            Page::Upload => self.draw_upload(frame, chunks[1]),
            Page::Reports => self.draw_reports(frame, chunks[1]),
            Page::Settings => self.draw_settings(frame, chunks[1]),
        }
        self.draw_status(frame, chunks[2]);
    }

    fn draw_login(&self, frame: &mut Frame) {
        let area = centered_rect(44, 9, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" claimctl — sign in ")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let field = |label: &str, value: &str, focused: bool, masked: bool| {
            let shown = if masked {
                "*".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:<10}"), Style::default().fg(Color::DarkGray)),
                Span::styled(shown, style),
                Span::raw(if focused { "▏" } else { "" }),
            ])
        };

        frame.render_widget(
            Paragraph::new(field(
                "Username",
                &self.login.username,
                self.login.focus == 0,
                false,
            )),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(field(
                "Password",
                &self.login.password,
                self.login.focus == 1,
                true,
            )),
            rows[1],
        );
        if let Some(error) = self.login.error {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    error,
                    Style::default().fg(Color::Red),
                ))),
                rows[2],
            );
        }
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Enter sign in · Tab switch field · Esc quit",
                Style::default().fg(Color::DarkGray),
            ))),
            rows[3],
        );
    }

    fn draw_nav(&self, frame: &mut Frame, area: Rect) {
        let mut spans: Vec<Span> = Vec::new();
        for (i, page) in Page::ALL.iter().enumerate() {
            let style = if *page == self.nav.current() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" [F{}] {} ", i + 1, page.title()), style));
            spans.push(Span::raw("│"));
        }
        let tenant = normalize_tenant(&self.state.tenant);
        spans.push(Span::styled(
            format!("  tenant: {tenant}"),
            Style::default().fg(Color::DarkGray),
        ));

        frame.render_widget(
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(4)])
            .split(area);

        // Validation summary card; the outcome tone tints the border.
        let (summary, tone) = match &self.state.outcome {
            Some(o) => (o.summary.clone(), o.tone),
            None => ("No validation run yet".to_string(), Tone::Info),
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                summary,
                Style::default().fg(tone_color(tone)),
            )))
            .block(
                Block::default()
                    .title(" Validation summary ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(tone_color(tone))),
            ),
            rows[0],
        );

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        self.draw_chart(frame, charts[0], ChartView::Counts, " Claims by category ");
        self.draw_chart(frame, charts[1], ChartView::Amounts, " Paid amounts by category ");
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect, view: ChartView, title: &str) {
        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let bars = chart(&self.state.metrics, view, &self.config.currency);
        if bars.is_empty() {
            frame.render_widget(
                Paragraph::new(EMPTY_CHART_MESSAGE)
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let width = inner.width as usize;
        let lines: Vec<Line> = bars
            .iter()
            .flat_map(|bar| {
                let label = format!("{} — {} ({:.1}%)", bar.category, bar.value_label, bar.percent);
                let fill =
                    ((bar.percent / 100.0) * width.saturating_sub(2) as f64).round() as usize;
                vec![
                    Line::from(Span::raw(label)),
                    Line::from(Span::styled(
                        "█".repeat(fill),
                        Style::default().fg(tone_color(bar.tone)),
                    )),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let status_filter = STATUS_FILTERS[self.filter_form.status_idx];
        let error_filter = ERROR_FILTERS[self.filter_form.error_idx];
        let filter_line = Line::from(vec![
            Span::raw("search: "),
            Span::styled(
                format!("{}▏", self.filter_form.query),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   [F6] status: "),
            Span::styled(display_filter(status_filter), Style::default().fg(Color::Cyan)),
            Span::raw("   [F7] error: "),
            Span::styled(display_filter(error_filter), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(
            Paragraph::new(filter_line).block(Block::default().borders(Borders::ALL)),
            chunks[0],
        );

        let filtered = filter(
            &self.state.claims,
            &self.filter_form.query,
            status_filter,
            error_filter,
        );
        let rows: Vec<Row> = table_rows(&filtered)
            .into_iter()
            .map(|row| match row {
                TableRow::Placeholder(message) => Row::new(vec![
                    Cell::from(""),
                    Cell::from(message).style(Style::default().fg(Color::DarkGray)),
                ]),
                TableRow::Claim(r) => Row::new(vec![
                    Cell::from(Span::styled(
                        r.pill_label,
                        Style::default().fg(tone_color(r.pill_tone)),
                    )),
                    Cell::from(r.claim_id),
                    Cell::from(r.error_type),
                    Cell::from(r.explanation.join(" · ")),
                    Cell::from(r.actions.join(" · ")),
                ]),
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Length(16),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ],
        )
        .header(
            Row::new(vec![
                "Status",
                "Claim ID",
                "Error type",
                "Explanation",
                "Recommended action",
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title(" Results ").borders(Borders::ALL));
        frame.render_widget(table, chunks[1]);
    }

    fn draw_upload(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(5)])
            .split(area);

        let field = |label: &str, value: &str, focused: bool| {
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:<18}"), Style::default().fg(Color::DarkGray)),
                Span::styled(value.to_string(), style),
                Span::raw(if focused { "▏" } else { "" }),
            ])
        };
        let form = vec![
            field("Tenant", &self.upload_form.tenant, self.upload_form.focus == 0),
            field(
                "Claims file",
                &self.upload_form.claims_path,
                self.upload_form.focus == 1,
            ),
            field(
                "Technical rules",
                &self.upload_form.technical_path,
                self.upload_form.focus == 2,
            ),
            field(
                "Medical rules",
                &self.upload_form.medical_path,
                self.upload_form.focus == 3,
            ),
        ];
        frame.render_widget(
            Paragraph::new(form).block(
                Block::default()
                    .title(" Upload claims batch ")
                    .borders(Borders::ALL),
            ),
            chunks[0],
        );

        if self.state.indicators.visible {
            let gauges = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Length(2),
                    Constraint::Length(2),
                    Constraint::Length(1),
                ])
                .split(chunks[1]);
            for (i, slot) in [
                FileSlot::Claims,
                FileSlot::TechnicalRules,
                FileSlot::MedicalRules,
            ]
            .into_iter()
            .enumerate()
            {
                self.draw_indicator(frame, gauges[i], slot);
            }
            if let Some(snapshot) = &self.upload_form.snapshot {
                frame.render_widget(
                    Paragraph::new(format!(
                        "{} · {}",
                        snapshot.size_label(),
                        snapshot.speed_label()
                    )),
                    gauges[3],
                );
            }
        }
    }

    fn draw_indicator(&self, frame: &mut Frame, area: Rect, slot: FileSlot) {
        let state = match slot {
            FileSlot::Claims => self.state.indicators.claims,
            FileSlot::TechnicalRules => self.state.indicators.technical,
            FileSlot::MedicalRules => self.state.indicators.medical,
        };
        let (percent, color, note) = match state {
            IndicatorState::Pending => (0, Color::DarkGray, "waiting"),
            IndicatorState::Active(p) => (p, Color::Cyan, "uploading"),
            IndicatorState::Done => (100, Color::Green, "done"),
            IndicatorState::Failed => (100, Color::Red, "failed"),
        };
        let gauge = Gauge::default()
            .label(format!("{} — {note} ({percent}%)", slot.label()))
            .ratio(f64::from(percent.min(100)) / 100.0)
            .gauge_style(Style::default().fg(color));
        frame.render_widget(gauge, area);
    }

    fn draw_reports(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = if self.reports.is_empty() {
            vec![Row::new(vec![
                Cell::from(""),
                Cell::from("No refined entries").style(Style::default().fg(Color::DarkGray)),
            ])]
        } else {
            self.reports
                .iter()
                .map(|entry| {
                    Row::new(vec![
                        Cell::from(entry.claim_id.clone()),
                        Cell::from(entry.status.clone()),
                        Cell::from(entry.error_type.clone()),
                        Cell::from(entry.processed_at.clone()),
                    ])
                })
                .collect()
        };
        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Length(16),
                Constraint::Min(20),
            ],
        )
        .header(
            Row::new(vec!["Claim ID", "Status", "Error type", "Processed at"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(" Reports — refined adjudications ([r] reload) ")
                .borders(Borders::ALL),
        );
        frame.render_widget(table, area);
    }

    fn draw_settings(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        let field = |label: &str, value: &str, focused: bool| {
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:<22}"), Style::default().fg(Color::DarkGray)),
                Span::styled(value.to_string(), style),
                Span::raw(if focused { "▏" } else { "" }),
            ])
        };
        frame.render_widget(
            Paragraph::new(vec![
                field(
                    "Approval threshold",
                    &self.settings_form.threshold,
                    self.settings_form.focus == 0,
                ),
                field(
                    "New cap service",
                    &self.settings_form.cap_service,
                    self.settings_form.focus == 1,
                ),
                field(
                    "New cap amount",
                    &self.settings_form.cap_value,
                    self.settings_form.focus == 2,
                ),
            ])
            .block(
                Block::default()
                    .title(" Tenant settings ")
                    .borders(Borders::ALL),
            ),
            chunks[0],
        );

        let rows: Vec<Row> = if self.state.caps.is_empty() {
            vec![Row::new(vec![
                Cell::from(""),
                Cell::from(EMPTY_CAPS_MESSAGE).style(Style::default().fg(Color::DarkGray)),
            ])]
        } else {
            self.state
                .caps
                .entries()
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let style = if i == self.settings_form.selected {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from(format!("{i}")),
                        Cell::from(entry.service.clone()),
                        Cell::from(format!("{:.2}", entry.cap)),
                    ])
                    .style(style)
                })
                .collect()
        };
        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(16),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["#", "Service", "Cap"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(" Per-service caps ")
                .borders(Borders::ALL),
        );
        frame.render_widget(table, chunks[1]);

        if let Some((message, tone)) = &self.settings_form.message {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    message.clone(),
                    Style::default().fg(tone_color(*tone)),
                )),
                chunks[2],
            );
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let hints = match self.nav.current() {
            Page::Dashboard => "r refresh · F1-F5 pages · ^L logout · ^Q quit",
            Page::Results => "type to search · F6/F7 cycle filters · Esc clear · ^Q quit",
            Page::Upload => "Tab fields · Enter upload · ^Q quit",
            Page::Reports => "r reload · F1-F5 pages · ^Q quit",
            Page::Settings => "^A add cap · ^D delete · ^S save · ^R reload · ^Q quit",
        };
        let mut lines = vec![Line::from(Span::styled(
            hints,
            Style::default().fg(Color::DarkGray),
        ))];
        if let Some((message, tone)) = &self.status {
            lines.insert(
                0,
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(tone_color(*tone)),
                )),
            );
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}

fn display_filter(value: &str) -> &str {
    if value.is_empty() {
        "(all)"
    } else {
        value
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Read crossterm events on a dedicated thread; the async loop consumes the
/// channel.
fn spawn_input_thread(tx: UnboundedSender<ShellEvent>) {
    std::thread::spawn(move || loop {
        match crossterm::event::poll(Duration::from_millis(100)) {
            Ok(true) => {
                let Ok(event) = crossterm::event::read() else {
                    break;
                };
                if tx.send(ShellEvent::Input(event)).is_err() {
                    break;
                }
            }
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
