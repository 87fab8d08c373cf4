// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use pokedex_app::{
    AppCommand, AppEvent, AppState, BattleContext, BattleEvent, BattleTiming, CaptureChance,
    CaptureWorkflow, CatalogEntryDetail, CatalogEntrySummary, CollectionRow, CollectionStore,
    DialogController, DialogKind, DialogTone, DialogView, Navigator, PageLabel, Pager, Screen,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::collections::BTreeSet;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

const OWNED_MARK: &str = "●";
const MOVES_SHOWN: usize = 8;
const STAT_BAR_STEP: i64 = 10;

/// Everything the UI needs from the outside world.
pub trait AppRuntime {
    fn load_catalog_page(&mut self, offset: usize, limit: usize)
    -> Result<Vec<CatalogEntrySummary>>;
    fn load_detail(&mut self, name: &str) -> Result<Option<CatalogEntryDetail>>;
    fn load_collection(&mut self) -> Result<Vec<CollectionRow>>;
    fn remove_captured(&mut self, nickname: &str) -> Result<()>;
    fn collection_store(&mut self) -> &mut dyn CollectionStore;
    fn capture_chance(&mut self) -> Result<CaptureChance>;
    fn battle_timing(&self) -> BattleTiming;
    fn owned_names(&mut self) -> Result<BTreeSet<String>> {
        Ok(self
            .collection_store()
            .list_all()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Default)]
struct ViewData {
    catalog: Vec<CatalogEntrySummary>,
    catalog_cursor: usize,
    owned: BTreeSet<String>,
    detail: Option<CatalogEntryDetail>,
    collection: Vec<CollectionRow>,
    collection_cursor: usize,
    load_error: Option<String>,
    battle: Option<CaptureWorkflow>,
    dialogs: DialogController,
    help_visible: bool,
    status_token: u64,
}

#[derive(Debug, Default)]
struct LeaveBattle {
    requested: bool,
}

impl Navigator for LeaveBattle {
    fn complete(&mut self) {
        self.requested = true;
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    refresh_and_report(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        tick_battle(state, runtime, &mut view_data, &internal_tx, Instant::now());

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(battle) = view_data.battle.as_mut() {
        battle.abort(&mut view_data.dialogs);
    }
    view_data.dialogs.clear();

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    view_data.load_error = None;
    let result = load_screen(state, runtime, view_data);
    if let Err(error) = &result {
        tracing::warn!(screen = state.screen.title(), error = %format!("{error:#}"), "load screen failed");
        view_data.load_error = Some(error.to_string());
    }
    result
}

fn load_screen<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    match &state.screen {
        Screen::Catalog => {
            view_data.catalog.clear();
            view_data.owned = runtime.owned_names()?;
            view_data.catalog =
                runtime.load_catalog_page(state.pager.offset(), state.pager.limit())?;
            view_data.catalog_cursor = clamp_cursor(view_data.catalog_cursor, view_data.catalog.len());
        }
        Screen::Detail { name } => {
            view_data.detail = None;
            view_data.owned = runtime.owned_names()?;
            view_data.detail = runtime.load_detail(name)?;
            if view_data.detail.is_none() {
                bail!("no entry named {name}");
            }
        }
        Screen::Battle { .. } => {}
        Screen::Collection => {
            view_data.collection = runtime.load_collection()?;
            view_data.collection_cursor =
                clamp_cursor(view_data.collection_cursor, view_data.collection.len());
        }
    }
    Ok(())
}

fn refresh_and_report<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_view_data(state, runtime, view_data) {
        emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

fn move_cursor(cursor: &mut usize, len: usize, delta: isize) {
    if len == 0 {
        *cursor = 0;
        return;
    }
    *cursor = cursor.saturating_add_signed(delta).min(len - 1);
}

/// Applies a navigation command and reloads whatever the new screen or page
/// shows.
fn navigate<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events.is_empty() {
        return;
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::PageChanged { .. }))
    {
        view_data.catalog_cursor = 0;
    }
    refresh_and_report(state, runtime, view_data, internal_tx);
}

/// Advances the active battle and reacts to what happened.
fn tick_battle<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    now: Instant,
) {
    let Some(battle) = view_data.battle.as_mut() else {
        return;
    };
    let mut leave = LeaveBattle::default();
    let events = {
        let mut ctx = BattleContext {
            dialogs: &mut view_data.dialogs,
            collection: runtime.collection_store(),
            navigator: &mut leave,
        };
        battle.poll(now, &mut ctx)
    };
    let name = battle.entry().name.clone();

    for event in events {
        let message = match event {
            BattleEvent::BrokeFree => Some(format!("{name} broke free!")),
            BattleEvent::Captured { nickname } => {
                view_data.owned.insert(name.clone());
                Some(format!("{nickname} joined your collection"))
            }
            BattleEvent::SaveFailed => Some(format!("could not save {name}")),
            BattleEvent::Released => Some(format!("{name} released")),
            _ => None,
        };
        if let Some(message) = message {
            emit_status(state, view_data, internal_tx, message);
        }
    }

    if leave.requested {
        view_data.battle = None;
        navigate(state, runtime, view_data, internal_tx, AppCommand::GoHome);
    }
}

fn open_battle<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    name: &str,
) {
    let detail = match runtime.load_detail(name) {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            emit_status(state, view_data, internal_tx, format!("no entry named {name}"));
            return;
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
            return;
        }
    };
    let chance = match runtime.capture_chance() {
        Ok(chance) => chance,
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("battle unavailable: {error}"));
            return;
        }
    };
    let caught = match runtime.collection_store().contains_name(&detail.name) {
        Ok(caught) => caught,
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "check ownership failed");
            false
        }
    };

    let name = detail.name.clone();
    view_data.battle =
        Some(CaptureWorkflow::new(detail, chance, runtime.battle_timing()).with_caught(caught));
    state.dispatch(AppCommand::OpenBattle(name));
}

fn leave_battle<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Some(mut battle) = view_data.battle.take() {
        battle.abort(&mut view_data.dialogs);
    }
    navigate(state, runtime, view_data, internal_tx, AppCommand::Back);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return true;
    }

    if view_data.dialogs.is_open() {
        handle_dialog_key(&mut view_data.dialogs, key);
        return false;
    }

    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }
    if key.code == KeyCode::Char('?') {
        view_data.help_visible = true;
        return false;
    }

    match state.screen.clone() {
        Screen::Catalog => handle_catalog_key(state, runtime, view_data, internal_tx, key),
        Screen::Detail { name } => {
            handle_detail_key(state, runtime, view_data, internal_tx, key, &name)
        }
        Screen::Battle { .. } => handle_battle_key(state, runtime, view_data, internal_tx, key),
        Screen::Collection => handle_collection_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_dialog_key(dialogs: &mut DialogController, key: KeyEvent) {
    let Some(kind) = dialogs.active().map(|view| view.kind()) else {
        return;
    };
    match kind {
        DialogKind::Confirmation => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                dialogs.confirm();
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                dialogs.cancel();
            }
            _ => {}
        },
        DialogKind::TextInput => match key.code {
            KeyCode::Enter => {
                dialogs.submit();
            }
            KeyCode::Esc => {
                dialogs.cancel();
            }
            KeyCode::Backspace => {
                dialogs.pop_char();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                dialogs.set_input("");
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                dialogs.push_char(ch);
            }
            _ => {}
        },
    }
}

fn handle_catalog_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let selected = view_data
        .catalog
        .get(view_data.catalog_cursor)
        .map(|entry| entry.name.clone());

    let command = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Left | KeyCode::Char('p') => Some(AppCommand::PrevPage),
        KeyCode::Right | KeyCode::Char('n') => Some(AppCommand::NextPage),
        KeyCode::Char('g') => Some(AppCommand::FirstPage),
        KeyCode::Char('G') => Some(AppCommand::LastPage),
        KeyCode::Char('c') => Some(AppCommand::OpenCollection),
        KeyCode::Enter => selected.map(AppCommand::OpenDetail),
        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(&mut view_data.catalog_cursor, view_data.catalog.len(), -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(&mut view_data.catalog_cursor, view_data.catalog.len(), 1);
            None
        }
        KeyCode::Char('b') => {
            if let Some(name) = selected {
                open_battle(state, runtime, view_data, internal_tx, &name);
            }
            None
        }
        KeyCode::Char('r') => {
            refresh_and_report(state, runtime, view_data, internal_tx);
            None
        }
        _ => None,
    };
    if let Some(command) = command {
        navigate(state, runtime, view_data, internal_tx, command);
    }
    false
}

fn handle_detail_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    name: &str,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('b') if view_data.detail.is_some() => {
            open_battle(state, runtime, view_data, internal_tx, name);
        }
        KeyCode::Char('c') => {
            navigate(state, runtime, view_data, internal_tx, AppCommand::OpenCollection);
        }
        KeyCode::Esc | KeyCode::Backspace => {
            navigate(state, runtime, view_data, internal_tx, AppCommand::Back);
        }
        _ => {}
    }
    false
}

fn handle_battle_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => leave_battle(state, runtime, view_data, internal_tx),
        KeyCode::Char('t') | KeyCode::Enter => {
            let Some(battle) = view_data.battle.as_mut() else {
                return false;
            };
            if !battle.attempt_capture(Instant::now()) && !battle.is_visible() {
                let message = format!("{} is gone", battle.entry().name);
                emit_status(state, view_data, internal_tx, message);
            }
        }
        KeyCode::Char('e') => {
            if let Some(battle) = view_data.battle.as_mut() {
                battle.attempt_escape(&mut view_data.dialogs);
            }
        }
        _ => {}
    }
    false
}

fn handle_collection_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(&mut view_data.collection_cursor, view_data.collection.len(), -1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(&mut view_data.collection_cursor, view_data.collection.len(), 1);
        }
        KeyCode::Char('d') => {
            let Some(nickname) = view_data
                .collection
                .get(view_data.collection_cursor)
                .map(|row| row.entry.nickname.clone())
            else {
                return false;
            };
            match runtime.remove_captured(&nickname) {
                Ok(()) => {
                    emit_status(state, view_data, internal_tx, format!("removed {nickname}"));
                    refresh_and_report(state, runtime, view_data, internal_tx);
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("remove failed: {error}"));
                }
            }
        }
        KeyCode::Esc | KeyCode::Backspace => {
            navigate(state, runtime, view_data, internal_tx, AppCommand::Back);
        }
        _ => {}
    }
    false
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data))
        .block(Block::default().title("pokedex").borders(Borders::ALL))
        .style(Style::default().fg(Color::White));
    frame.render_widget(header, layout[0]);

    if let Some(error) = &view_data.load_error {
        let body = Paragraph::new(format!("could not load this screen: {error}\n\npress r to retry or esc to go back"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(state.screen.title()));
        frame.render_widget(body, layout[1]);
    } else {
        match &state.screen {
            Screen::Catalog => render_catalog(frame, layout[1], state, view_data),
            Screen::Detail { .. } => {
                let body = Paragraph::new(render_detail_text(view_data))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title("detail"));
                frame.render_widget(body, layout[1]);
            }
            Screen::Battle { .. } => {
                let body = Paragraph::new(render_battle_text(view_data))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title("battle"));
                frame.render_widget(body, layout[1]);
            }
            Screen::Collection => render_collection(frame, layout[1], view_data),
        }
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    if let Some(view) = view_data.dialogs.active() {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let color = tone_color(dialog_tone(&view));
        let dialog = Paragraph::new(render_dialog_text(&view))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(view.title().to_owned())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(color)),
            );
        frame.render_widget(dialog, area);
    }
}

fn render_catalog(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let header = Row::new(["#", "name", "types", "owned"].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = view_data.catalog.iter().enumerate().map(|(index, entry)| {
        let owned = if view_data.owned.contains(&entry.name) {
            OWNED_MARK
        } else {
            ""
        };
        let mut style = Style::default();
        if index == view_data.catalog_cursor {
            style = style
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
        }
        Row::new(vec![
            Cell::from(format!("{:04}", entry.id.get())),
            Cell::from(entry.name.clone()),
            Cell::from(entry.types.join(" / ")),
            Cell::from(owned),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Min(14),
        Constraint::Min(16),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(format!("catalog  {}", page_strip(&state.pager)))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn render_collection(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let title = format!("my pokemon ({})", view_data.collection.len());
    if view_data.collection.is_empty() {
        let empty = Paragraph::new("No Pokemon captured yet. Find one in the catalog and press b to battle.")
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["nickname", "name", "#", "types"].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = view_data.collection.iter().enumerate().map(|(index, row)| {
        let mut style = Style::default();
        if index == view_data.collection_cursor {
            style = style
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
        }
        let types = if row.types.is_empty() {
            "?".to_owned()
        } else {
            row.types.join(" / ")
        };
        Row::new(vec![
            Cell::from(row.entry.nickname.clone()),
            Cell::from(row.entry.name.clone()),
            Cell::from(format!("{:04}", row.entry.id.get())),
            Cell::from(types),
        ])
        .style(style)
    });
    let widths = [
        Constraint::Min(14),
        Constraint::Min(14),
        Constraint::Length(6),
        Constraint::Min(16),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn header_text(state: &AppState, view_data: &ViewData) -> String {
    match &state.screen {
        Screen::Catalog => format!(
            "Catalog · page {} of {} · {}",
            state.pager.current_page(),
            state.pager.total_pages(),
            state.pager.range_label()
        ),
        Screen::Detail { name } => format!("Catalog › {name}"),
        Screen::Battle { name } => format!("Catalog › {name} › battle"),
        Screen::Collection => format!("My Pokemon · {} captured", view_data.collection.len()),
    }
}

fn page_strip(pager: &Pager) -> String {
    pager
        .page_numbers()
        .into_iter()
        .map(|label| match label {
            PageLabel::Page(page) if page == pager.current_page() => format!("[{page}]"),
            PageLabel::Page(page) => page.to_string(),
            PageLabel::Gap => "…".to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_detail_text(view_data: &ViewData) -> String {
    let Some(detail) = &view_data.detail else {
        return "loading...".to_owned();
    };

    let owned = if view_data.owned.contains(&detail.name) {
        "  (owned)"
    } else {
        ""
    };
    let mut lines = vec![
        format!("#{:04} {}{owned}", detail.id.get(), detail.name),
        format!("types: {}", detail.types.join(" / ")),
        format!(
            "height: {:.1} m   weight: {:.1} kg",
            detail.height as f64 / 10.0,
            detail.weight as f64 / 10.0
        ),
        format!("abilities: {}", detail.abilities.join(", ")),
        String::new(),
        "stats:".to_owned(),
    ];
    for stat in &detail.stats {
        let bar = "█".repeat(usize::try_from(stat.value / STAT_BAR_STEP).unwrap_or(0));
        lines.push(format!("  {:<16} {:>3} {bar}", stat.name, stat.value));
    }
    lines.push(String::new());

    let mut moves = detail
        .moves
        .iter()
        .take(MOVES_SHOWN)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if detail.moves.len() > MOVES_SHOWN {
        moves.push_str(&format!(" (+{} more)", detail.moves.len() - MOVES_SHOWN));
    }
    lines.push(format!("moves: {moves}"));
    lines.join("\n")
}

fn render_battle_text(view_data: &ViewData) -> String {
    let Some(battle) = &view_data.battle else {
        return String::new();
    };
    let name = &battle.entry().name;

    let mut lines = Vec::new();
    if battle.is_visible() {
        lines.push(format!("A wild {} appeared!", name.to_uppercase()));
    } else {
        lines.push(format!("{name} fled."));
    }
    if battle.is_caught() {
        lines.push("(owned)".to_owned());
    }
    lines.push(String::new());
    if battle.is_throwing() {
        lines.push("Throwing a Poke Ball...".to_owned());
    } else if battle.is_visible() && !battle.in_flight() {
        lines.push("Press t to throw a Poke Ball or e to escape.".to_owned());
    }
    lines.join("\n")
}

fn dialog_tone(view: &DialogView<'_>) -> DialogTone {
    match view {
        DialogView::Confirmation { params, .. } => params.tone,
        DialogView::TextInput { .. } => DialogTone::Success,
    }
}

fn tone_color(tone: DialogTone) -> Color {
    match tone {
        DialogTone::Info => Color::Cyan,
        DialogTone::Warning => Color::Yellow,
        DialogTone::Error => Color::Red,
        DialogTone::Success => Color::Green,
        DialogTone::Celebration => Color::Magenta,
    }
}

fn render_dialog_text(view: &DialogView<'_>) -> String {
    match view {
        DialogView::Confirmation { params, .. } => format!(
            "{}\n\n[enter] {}    [esc] {}",
            params.message, params.confirm_label, params.cancel_label
        ),
        DialogView::TextInput {
            params,
            value,
            error,
            ..
        } => {
            let mut lines = vec![params.message.clone(), String::new()];
            if value.is_empty() {
                lines.push(format!("> {}", params.placeholder));
            } else {
                lines.push(format!("> {value}_"));
            }
            if let Some(error) = error {
                lines.push(format!("! {error}"));
            }
            lines.push(String::new());
            lines.push(format!(
                "[enter] {}    [esc] {}",
                params.confirm_label, params.cancel_label
            ));
            lines.join("\n")
        }
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let hints = match view_data.dialogs.active() {
        Some(DialogView::Confirmation { params, .. }) => format!(
            "enter/y {} | esc/n {}",
            params.confirm_label, params.cancel_label
        ),
        Some(DialogView::TextInput { params, .. }) => format!(
            "type a nickname | backspace | ctrl+u clear | enter {} | esc {}",
            params.confirm_label, params.cancel_label
        ),
        None => match state.screen {
            Screen::Catalog => {
                "←/→ or p/n page | g/G first/last | j/k move | enter detail | b battle | c collection | ? help | q quit"
                    .to_owned()
            }
            Screen::Detail { .. } => "b battle | c collection | esc back | q quit".to_owned(),
            Screen::Battle { .. } => "t throw | e escape | esc leave".to_owned(),
            Screen::Collection => "j/k move | d remove | esc back | q quit".to_owned(),
        },
    };
    match &state.status_line {
        Some(status) => format!("{status} | {hints}"),
        None => hints,
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
catalog: ←/→ or p/n page | g/G first/last page | j/k move | enter detail | b battle | c collection | r reload | q quit\n\
detail: b battle | c collection | esc back\n\
battle: t or enter throw | e escape | esc leave\n\
collection: j/k move | d remove | esc back\n\
dialog: enter/y confirm | esc/n cancel\n\
nickname: type | backspace | ctrl+u clear | enter save | esc release"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, handle_key_event, header_text, help_overlay_text,
        page_strip, process_internal_events, refresh_view_data, render_battle_text,
        render_detail_text, render_dialog_text, status_text, tick_battle,
    };
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pokedex_app::{
        AppState, BattleTiming, CaptureChance, CatalogEntryDetail, CatalogEntrySummary,
        CatalogSource, CollectionRow, CollectionStore, DialogKind, MemoryCollection, Pager, Screen,
        hydrate,
    };
    use pokedex_testkit::{FixtureCatalog, always_capture, never_capture};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    struct TestRuntime {
        catalog: FixtureCatalog,
        collection: MemoryCollection,
        capture: bool,
        removed: Vec<String>,
    }

    impl Default for TestRuntime {
        fn default() -> Self {
            Self {
                catalog: FixtureCatalog::new(),
                collection: MemoryCollection::new(),
                capture: true,
                removed: Vec::new(),
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_catalog_page(
            &mut self,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<CatalogEntrySummary>> {
            self.catalog.list_page(offset, limit)
        }

        fn load_detail(&mut self, name: &str) -> Result<Option<CatalogEntryDetail>> {
            self.catalog.get_detail(name)
        }

        fn load_collection(&mut self) -> Result<Vec<CollectionRow>> {
            Ok(hydrate(self.collection.list_all()?, &self.catalog))
        }

        fn remove_captured(&mut self, nickname: &str) -> Result<()> {
            self.removed.push(nickname.to_owned());
            self.collection.remove(nickname)
        }

        fn collection_store(&mut self) -> &mut dyn CollectionStore {
            &mut self.collection
        }

        fn capture_chance(&mut self) -> Result<CaptureChance> {
            Ok(if self.capture {
                always_capture()
            } else {
                never_capture()
            })
        }

        fn battle_timing(&self) -> BattleTiming {
            BattleTiming {
                throw_duration: Duration::ZERO,
                leave_delay: Duration::ZERO,
            }
        }
    }

    fn small_state() -> AppState {
        AppState::with_pager(Pager::new(0, 5, 12))
    }

    fn internal_tx() -> mpsc::Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        code: KeyCode,
    ) -> bool {
        handle_key_event(
            state,
            runtime,
            view_data,
            &internal_tx(),
            KeyEvent::new(code, KeyModifiers::NONE),
        )
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view_data, KeyCode::Char(ch));
        }
    }

    fn tick(state: &mut AppState, runtime: &mut TestRuntime, view_data: &mut ViewData) {
        tick_battle(
            state,
            runtime,
            view_data,
            &internal_tx(),
            Instant::now() + Duration::from_millis(1),
        );
    }

    fn loaded(state: &AppState, runtime: &mut TestRuntime) -> ViewData {
        let mut view_data = ViewData::default();
        refresh_view_data(state, runtime, &mut view_data).expect("refresh should work");
        view_data
    }

    fn catalog_names(view_data: &ViewData) -> Vec<&str> {
        view_data
            .catalog
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    #[test]
    fn paging_keys_reload_the_catalog() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);
        assert_eq!(catalog_names(&view_data)[0], "bulbasaur");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('j'));
        assert_eq!(view_data.catalog_cursor, 1);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Right);
        assert_eq!(state.pager.offset(), 5);
        assert_eq!(view_data.catalog_cursor, 0);
        assert_eq!(catalog_names(&view_data)[0], "pikachu");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('G'));
        assert_eq!(state.pager.offset(), 7);
        assert_eq!(catalog_names(&view_data).len(), 5);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('p'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('g'));
        assert_eq!(state.pager.offset(), 0);
    }

    #[test]
    fn enter_opens_detail_and_esc_returns() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(
            state.screen,
            Screen::Detail {
                name: "charmander".to_owned()
            }
        );
        let text = render_detail_text(&view_data);
        assert!(text.contains("#0004 charmander"), "{text}");
        assert!(text.contains("height: 0.6 m   weight: 8.5 kg"), "{text}");
        assert!(text.contains("blaze, solar-power"), "{text}");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(state.screen, Screen::Catalog);
    }

    #[test]
    fn full_capture_flow_from_catalog_back_home() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        assert_eq!(
            state.screen,
            Screen::Battle {
                name: "bulbasaur".to_owned()
            }
        );
        assert!(render_battle_text(&view_data).contains("A wild BULBASAUR appeared!"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('t'));
        tick(&mut state, &mut runtime, &mut view_data);
        assert_eq!(
            view_data.dialogs.active().map(|view| view.kind()),
            Some(DialogKind::TextInput)
        );

        for _ in 0.."bulbasaur".len() {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Backspace);
        }
        type_text(&mut state, &mut runtime, &mut view_data, "Sprout");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        tick(&mut state, &mut runtime, &mut view_data);

        assert_eq!(
            runtime.collection.nicknames().expect("nicknames"),
            vec!["Sprout".to_owned()]
        );
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("Sprout joined"))
        );
        assert!(view_data.owned.contains("bulbasaur"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('y'));
        tick(&mut state, &mut runtime, &mut view_data);
        assert_eq!(state.screen, Screen::Catalog);
        assert!(view_data.battle.is_none());
        assert!(!view_data.dialogs.is_open());
    }

    #[test]
    fn open_dialog_captures_plain_keys() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        tick(&mut state, &mut runtime, &mut view_data);

        let quit = press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('q'));
        assert!(!quit);
        match view_data.dialogs.active() {
            Some(pokedex_app::DialogView::TextInput { value, .. }) => {
                assert_eq!(value, "bulbasaurq");
            }
            other => panic!("expected nickname input, got {other:?}"),
        }

        let quit = handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &internal_tx(),
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        assert!(quit);
    }

    #[test]
    fn failed_throw_shows_escape_notice_and_creature_flees() {
        let mut state = small_state();
        let mut runtime = TestRuntime {
            capture: false,
            ..TestRuntime::default()
        };
        let mut view_data = loaded(&state, &mut runtime);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('t'));
        tick(&mut state, &mut runtime, &mut view_data);

        let view = view_data.dialogs.active().expect("escape notice");
        assert_eq!(view.title(), "Pokemon Escaped!");
        assert!(render_dialog_text(&view).contains("[enter] Try Again"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        tick(&mut state, &mut runtime, &mut view_data);
        assert!(!view_data.dialogs.is_open());
        assert!(render_battle_text(&view_data).contains("bulbasaur fled."));
        assert!(runtime.collection.entries().is_empty());

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('t'));
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("bulbasaur is gone"))
        );
    }

    #[test]
    fn esc_during_battle_aborts_and_returns_to_detail() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('t'));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(
            state.screen,
            Screen::Detail {
                name: "bulbasaur".to_owned()
            }
        );
        assert!(view_data.battle.is_none());
        tick(&mut state, &mut runtime, &mut view_data);
        assert!(!view_data.dialogs.is_open());
    }

    #[test]
    fn escape_confirmation_leaves_for_home() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('e'));
        assert_eq!(
            view_data.dialogs.active().map(|view| view.title().to_owned()),
            Some("Escape Battle?".to_owned())
        );
        assert!(status_text(&state, &view_data).contains("enter/y Yes, Escape"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        tick(&mut state, &mut runtime, &mut view_data);
        assert_eq!(state.screen, Screen::Catalog);
    }

    #[test]
    fn collection_lists_hydrated_rows_and_removes_selection() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        runtime.collection = MemoryCollection::with_entries(vec![
            pokedex_app::CapturedEntry {
                id: pokedex_app::CatalogId::new(25),
                name: "pikachu".to_owned(),
                nickname: "Sparky".to_owned(),
            },
            pokedex_app::CapturedEntry {
                id: pokedex_app::CatalogId::new(94),
                name: "gengar".to_owned(),
                nickname: "Boo".to_owned(),
            },
        ]);
        let mut view_data = loaded(&state, &mut runtime);
        assert!(view_data.owned.contains("gengar"));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('c'));
        assert_eq!(state.screen, Screen::Collection);
        assert_eq!(view_data.collection.len(), 2);
        assert_eq!(view_data.collection[1].types, vec!["ghost", "poison"]);
        assert_eq!(header_text(&state, &view_data), "My Pokemon · 2 captured");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('d'));
        assert_eq!(runtime.removed, vec!["Boo".to_owned()]);
        assert_eq!(view_data.collection.len(), 1);
        assert_eq!(view_data.collection_cursor, 0);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(state.screen, Screen::Catalog);
    }

    #[test]
    fn offline_catalog_shows_load_error() {
        let state = small_state();
        let mut runtime = TestRuntime {
            catalog: FixtureCatalog::offline(),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        assert!(refresh_view_data(&state, &mut runtime, &mut view_data).is_err());
        assert_eq!(
            view_data.load_error.as_deref(),
            Some("fixture catalog is offline")
        );
        assert!(view_data.catalog.is_empty());
    }

    #[test]
    fn unknown_detail_is_a_load_error() {
        let state = AppState {
            screen: Screen::Detail {
                name: "missingno".to_owned(),
            },
            ..small_state()
        };
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        assert!(refresh_view_data(&state, &mut runtime, &mut view_data).is_err());
        assert_eq!(
            view_data.load_error.as_deref(),
            Some("no entry named missingno")
        );
    }

    #[test]
    fn help_overlay_toggles_and_swallows_next_key() {
        let mut state = small_state();
        let mut runtime = TestRuntime::default();
        let mut view_data = loaded(&state, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('?'));
        assert!(view_data.help_visible);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Right);
        assert!(!view_data.help_visible);
        assert_eq!(state.pager.offset(), 0);
        assert!(help_overlay_text().contains("ctrl+q quit"));
    }

    #[test]
    fn stale_status_clear_tokens_are_ignored() {
        let mut state = small_state();
        let mut view_data = ViewData {
            status_token: 2,
            ..ViewData::default()
        };
        state.status_line = Some("hello".to_owned());
        let (tx, rx) = mpsc::channel();

        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("send clear");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert_eq!(state.status_line.as_deref(), Some("hello"));

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("send clear");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn page_strip_marks_current_page() {
        let pager = Pager::default().go_to_page(3);
        assert_eq!(page_strip(&pager), "1 2 [3] 4 5 … 65");
    }

    #[test]
    fn header_shows_range_for_catalog() {
        let state = AppState::default();
        assert_eq!(
            header_text(&state, &ViewData::default()),
            "Catalog · page 1 of 65 · [1] - [20] of [1,300]"
        );
    }
}
