// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use orgdesk_app::{
    AppCommand, AppEvent, AppState, Branch, Choice, Collection, Descriptor, EntityKind, FieldKind,
    FormOutput, FormPhase, FormState, FormTarget, ListView, LoadState, Record, RequestError,
    Route, RowAction, RowMenu, Submission, TabKind, VisitorCounter, choices, loading_view,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const VISITOR_TICK: Duration = Duration::from_secs(1);
const CHECKBOX_ON: &str = "[x]";
const CHECKBOX_OFF: &str = "[ ]";

/// Everything the dashboard needs from the outside world. Remote calls
/// report failures through the request taxonomy so screens can react to
/// them without knowing about HTTP.
pub trait AppRuntime {
    fn sign_in(&mut self, username: &str, password: &str) -> Result<(), RequestError>;
    fn sign_out(&mut self) -> Result<()>;
    fn load_collection(&mut self, kind: EntityKind) -> Result<Collection, RequestError>;
    fn load_record(&mut self, kind: EntityKind, id: &str) -> Result<Record, RequestError>;
    fn load_branches(&mut self, company_id: &str) -> Result<Vec<Branch>, RequestError>;
    fn delete_entity(&mut self, kind: EntityKind, id: &str) -> Result<(), RequestError>;
    fn submit(&mut self, submission: &Submission) -> Result<(), RequestError>;
    /// A fresh counter configured for this session's visitor screen.
    fn visitor_counter(&mut self) -> VisitorCounter;
    fn next_visitor_frame(&mut self) -> Result<Option<Vec<Descriptor>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

struct VisitorScreen {
    counter: VisitorCounter,
    frames: u64,
    last_detected: usize,
    last_error: Option<String>,
    idle: bool,
    next_tick: Instant,
}

impl VisitorScreen {
    fn new(counter: VisitorCounter) -> Self {
        Self {
            counter,
            frames: 0,
            last_detected: 0,
            last_error: None,
            idle: false,
            next_tick: Instant::now(),
        }
    }
}

#[derive(Default)]
struct ViewData {
    rows_per_page: usize,
    list: Option<Box<dyn ListView>>,
    form: Option<FormState>,
    visitors: Option<VisitorScreen>,
    filter_editing: bool,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page,
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    rows_per_page: usize,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(rows_per_page);
    let (internal_tx, internal_rx) = mpsc::channel();

    refresh_view_data(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);
        tick_visitors(state, runtime, &mut view_data, Instant::now());

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
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
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

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if should_refresh_view(&events) {
        refresh_view_data(state, runtime, view_data, internal_tx);
    }
    for event in &events {
        if let AppEvent::DeleteConfirmed { kind, id } = event {
            delete_row(state, runtime, view_data, internal_tx, *kind, id);
        }
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn should_refresh_view(events: &[AppEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, AppEvent::RouteChanged(_)))
}

fn navigate<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    route: Route,
) {
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        AppCommand::Navigate(route),
        internal_tx,
    );
}

/// Rebuilds the screen for the current route, fetching whatever it needs.
/// A 403 on any of those fetches moves to the access-denied screen.
fn refresh_view_data<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.list = None;
    view_data.form = None;
    view_data.visitors = None;
    view_data.filter_editing = false;
    debug!(route = %state.route.path(), "entering screen");

    let outcome = match state.route.clone() {
        Route::List(kind) => {
            let mut list = loading_view(kind, view_data.rows_per_page);
            let outcome = match runtime.load_collection(kind) {
                Ok(collection) => {
                    list = collection.into_list_view(view_data.rows_per_page);
                    Ok(())
                }
                Err(error) if error.redirects() => Err(error),
                Err(error) => {
                    list.fail(error.to_string());
                    Ok(())
                }
            };
            view_data.list = Some(list);
            outcome
        }
        Route::Create(kind) => {
            load_form(runtime, view_data, FormTarget::Create(kind))
        }
        Route::Edit(kind, id) => load_form(runtime, view_data, FormTarget::Edit(kind, id)),
        Route::SignIn => {
            view_data.form = Some(FormState::new(FormTarget::SignIn));
            Ok(())
        }
        Route::Visitors => {
            view_data.visitors = Some(VisitorScreen::new(runtime.visitor_counter()));
            Ok(())
        }
        Route::PermissionDenied | Route::NotFound => Ok(()),
    };

    if let Err(error) = outcome {
        warn!(route = %state.route.path(), %error, "redirecting to access denied");
        navigate(
            state,
            runtime,
            view_data,
            internal_tx,
            Route::PermissionDenied,
        );
    }
}

fn load_form<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    target: FormTarget,
) -> Result<(), RequestError> {
    let mut form = FormState::new(target.clone());

    let mut lookup_error = None;
    for lookup in form.lookups() {
        match runtime.load_collection(lookup.kind()) {
            Ok(collection) => form.set_choices(lookup.field_key(), choices(&collection)),
            Err(error) if error.redirects() => return Err(error),
            Err(error) => {
                lookup_error = Some(error);
                break;
            }
        }
    }
    match lookup_error {
        Some(error) => form.lookup_failed(&error),
        None => form.lookups_loaded(),
    }

    if let FormTarget::Edit(kind, id) = &target {
        match runtime.load_record(*kind, id) {
            Ok(record) => {
                form.populate(&record);
                if *kind == EntityKind::Department {
                    match runtime.load_collection(EntityKind::Branch) {
                        Ok(collection) => form.set_choices("branchId", choices(&collection)),
                        Err(error) if error.redirects() => return Err(error),
                        Err(error) => form.lookup_failed(&error),
                    }
                }
            }
            Err(error) if error.redirects() => return Err(error),
            Err(error) => form.entity_failed(&error),
        }
    }

    view_data.form = Some(form);
    Ok(())
}

fn tick_visitors<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    now: Instant,
) {
    if state.route != Route::Visitors {
        return;
    }
    let Some(screen) = view_data.visitors.as_mut() else {
        return;
    };
    if now < screen.next_tick {
        return;
    }
    screen.next_tick = now + VISITOR_TICK;

    match runtime.next_visitor_frame() {
        Ok(Some(frame)) => {
            screen.idle = false;
            screen.frames += 1;
            match screen.counter.observe_frame(&frame) {
                Ok(outcome) => {
                    screen.last_detected = outcome.detected;
                    screen.last_error = None;
                    if outcome.new_visitors > 0 {
                        debug!(
                            new_visitors = outcome.new_visitors,
                            total = screen.counter.count(),
                            "visitors counted"
                        );
                    }
                }
                Err(error) => {
                    warn!(%error, "frame rejected");
                    screen.last_error = Some(format!("{error:#}"));
                }
            }
        }
        Ok(None) => screen.idle = true,
        Err(error) => {
            warn!(%error, "face detector failed");
            screen.last_error = Some(format!("{error:#}"));
        }
    }
}

fn delete_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
    id: &str,
) {
    let Some(list) = view_data
        .list
        .as_mut()
        .filter(|list| list.kind() == kind)
    else {
        return;
    };
    if !list.begin_delete(id) {
        emit_status(
            state,
            view_data,
            internal_tx,
            "a delete is already in progress",
        );
        return;
    }

    match runtime.delete_entity(kind, id) {
        Ok(()) => {
            list.commit_delete();
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("deleted {} {id}", kind.as_str()),
            );
        }
        Err(error) => {
            list.rollback_delete();
            warn!(kind = kind.as_str(), id, %error, "delete failed, row restored");
            if error.redirects() {
                navigate(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    Route::PermissionDenied,
                );
            } else {
                emit_status(state, view_data, internal_tx, error.to_string());
            }
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.row_menu.is_some() {
        handle_row_menu_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match state.route {
        Route::List(kind) => handle_list_key(state, runtime, view_data, internal_tx, kind, key),
        Route::Create(_) | Route::Edit(..) | Route::SignIn => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
        }
        Route::Visitors => {
            if !handle_nav_key(state, runtime, view_data, internal_tx, key)
                && key.code == KeyCode::Char('c')
            {
                view_data.visitors = Some(VisitorScreen::new(runtime.visitor_counter()));
                emit_status(state, view_data, internal_tx, "visitor count reset");
            }
        }
        Route::PermissionDenied | Route::NotFound => {
            if !handle_nav_key(state, runtime, view_data, internal_tx, key)
                && matches!(key.code, KeyCode::Enter | KeyCode::Esc)
            {
                navigate(state, runtime, view_data, internal_tx, Route::HOME);
            }
        }
    }
    false
}

/// Keys shared by every screen that is not a form.
fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let command = match key.code {
        KeyCode::Tab | KeyCode::Char('f') => AppCommand::NextTab,
        KeyCode::BackTab | KeyCode::Char('b') => AppCommand::PrevTab,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return true;
        }
        KeyCode::Char('L') => {
            match runtime.sign_out() {
                Ok(()) => {
                    emit_status(state, view_data, internal_tx, "signed out");
                    navigate(state, runtime, view_data, internal_tx, Route::SignIn);
                }
                Err(error) => emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("sign out failed: {error:#}"),
                ),
            }
            return true;
        }
        _ => return false,
    };
    dispatch_and_refresh(state, runtime, view_data, command, internal_tx);
    true
}

fn handle_list_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
    key: KeyEvent,
) {
    if view_data.filter_editing {
        handle_filter_key(view_data, key);
        return;
    }
    if handle_nav_key(state, runtime, view_data, internal_tx, key) {
        return;
    }

    match key.code {
        KeyCode::Char('a') => {
            navigate(state, runtime, view_data, internal_tx, Route::Create(kind));
            return;
        }
        KeyCode::Char('R') => {
            refresh_view_data(state, runtime, view_data, internal_tx);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("reloaded {}", kind.label()),
            );
            return;
        }
        KeyCode::Char('/') => {
            view_data.filter_editing = true;
            return;
        }
        KeyCode::Enter => {
            if let Some(id) = view_data.list.as_ref().and_then(|list| list.focused_id()) {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::OpenRowMenu(id),
                    internal_tx,
                );
            }
            return;
        }
        _ => {}
    }

    if let Some(status) = view_data
        .list
        .as_mut()
        .and_then(|list| apply_list_key(list.as_mut(), key))
    {
        emit_status(state, view_data, internal_tx, status);
    }
}

fn apply_list_key(list: &mut dyn ListView, key: KeyEvent) -> Option<String> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => list.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => list.move_cursor(-1),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
            if !list.next_page() {
                return Some("already on the last page".to_owned());
            }
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
            if !list.prev_page() {
                return Some("already on the first page".to_owned());
            }
        }
        KeyCode::Char('r') => {
            list.cycle_rows_per_page();
            return Some(format!("{} rows per page", list.table().rows_per_page));
        }
        KeyCode::Char(' ') => list.toggle_focused(),
        KeyCode::Char('A') => {
            list.toggle_all();
            return Some(format!("{} selected", list.table().selected.len()));
        }
        KeyCode::Char(digit @ '1'..='9') => {
            let column = digit as usize - '1' as usize;
            let label = list.sort_by_column(column)?;
            return Some(format!(
                "sorted by {label} {}",
                list.table().order.as_str()
            ));
        }
        KeyCode::Esc if !list.query().is_empty() => {
            list.set_query(String::new());
            return Some("filter cleared".to_owned());
        }
        _ => {}
    }
    None
}

fn handle_filter_key(view_data: &mut ViewData, key: KeyEvent) {
    let Some(list) = view_data.list.as_mut() else {
        view_data.filter_editing = false;
        return;
    };
    match key.code {
        KeyCode::Enter | KeyCode::Esc => view_data.filter_editing = false,
        KeyCode::Backspace => {
            let mut query = list.query().to_owned();
            query.pop();
            list.set_query(query);
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut query = list.query().to_owned();
            query.push(ch);
            list.set_query(query);
        }
        _ => {}
    }
}

fn handle_row_menu_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let confirming = state.row_menu.as_ref().is_some_and(|menu| menu.confirming);
    let command = if confirming {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => AppCommand::ConfirmDelete,
            KeyCode::Char('n') | KeyCode::Esc => AppCommand::DismissRowMenu,
            _ => return,
        }
    } else {
        match key.code {
            KeyCode::Char('j')
            | KeyCode::Char('k')
            | KeyCode::Down
            | KeyCode::Up
            | KeyCode::Tab
            | KeyCode::BackTab => AppCommand::MoveRowMenu,
            KeyCode::Enter => AppCommand::ChooseRowAction,
            KeyCode::Esc | KeyCode::Char('q') => AppCommand::DismissRowMenu,
            _ => return,
        }
    };
    dispatch_and_refresh(state, runtime, view_data, command, internal_tx);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            if let Some(kind) = form.target().kind() {
                navigate(state, runtime, view_data, internal_tx, Route::List(kind));
            }
        }
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Char('s') if ctrl => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left | KeyCode::Right => {
            let delta = if key.code == KeyCode::Left { -1 } else { 1 };
            let company_changed = form.cycle_choice(delta)
                && form
                    .focused()
                    .is_some_and(|field| field.spec.key == "companyId");
            if company_changed {
                reload_branches(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Char(' ')
            if form
                .focused()
                .is_some_and(|field| field.spec.kind == FieldKind::MultiChoice) =>
        {
            form.toggle_choice();
        }
        KeyCode::Char(ch) if !ctrl => form.push_char(ch),
        KeyCode::Backspace => form.pop_char(),
        _ => {}
    }
}

fn reload_branches<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(company_id) = view_data
        .form
        .as_ref()
        .and_then(FormState::branch_company)
        .map(str::to_owned)
    else {
        return;
    };

    match runtime.load_branches(&company_id) {
        Ok(branches) => {
            if let Some(form) = view_data.form.as_mut() {
                form.set_choices(
                    "branchId",
                    branches.iter().map(Choice::from_record).collect(),
                );
                form.clear_value("branchId");
            }
        }
        Err(error) if error.redirects() => {
            navigate(
                state,
                runtime,
                view_data,
                internal_tx,
                Route::PermissionDenied,
            );
        }
        Err(error) => {
            warn!(company_id = %company_id, %error, "branch lookup failed");
            if let Some(form) = view_data.form.as_mut() {
                form.lookup_failed(&error);
            }
        }
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let output = match view_data.form.as_mut().map(FormState::submit) {
        None => return,
        Some(Err(error)) => {
            emit_status(state, view_data, internal_tx, error.to_string());
            return;
        }
        Some(Ok(output)) => output,
    };

    match output {
        FormOutput::SignIn { username, password } => {
            match runtime.sign_in(&username, &password) {
                Ok(()) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("signed in as {username}"),
                    );
                    navigate(state, runtime, view_data, internal_tx, Route::HOME);
                }
                Err(error) => {
                    if let Some(form) = view_data.form.as_mut() {
                        form.submit_failed(&error);
                    }
                }
            }
        }
        FormOutput::Submit(submission) => match runtime.submit(&submission) {
            Ok(()) => {
                if let Some(form) = view_data.form.as_mut() {
                    form.submit_succeeded();
                }
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!(
                        "{}d {}",
                        submission.operation.verb(),
                        submission.kind.as_str()
                    ),
                );
                navigate(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    Route::List(submission.kind),
                );
            }
            Err(error) if error.redirects() => {
                navigate(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    Route::PermissionDenied,
                );
            }
            Err(error) => {
                warn!(kind = submission.kind.as_str(), %error, "submit failed");
                if let Some(form) = view_data.form.as_mut() {
                    form.submit_failed(&error);
                }
            }
        },
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let active = state.route.tab();
    let selected = TabKind::ALL
        .iter()
        .position(|tab| Some(*tab) == active)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab.label().to_owned())
        .collect::<Vec<String>>();
    let highlight = if active.is_some() {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("orgdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(highlight)
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match &state.route {
        Route::List(kind) => render_list(frame, layout[1], *kind, view_data),
        Route::Create(_) | Route::Edit(..) | Route::SignIn => {
            let title = view_data
                .form
                .as_ref()
                .map(|form| form.target().title())
                .unwrap_or_default();
            let body = Paragraph::new(
                view_data
                    .form
                    .as_ref()
                    .map(render_form_text)
                    .unwrap_or_default(),
            )
            .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(body, layout[1]);
        }
        Route::Visitors => {
            let body = Paragraph::new(
                view_data
                    .visitors
                    .as_ref()
                    .map(render_visitors_text)
                    .unwrap_or_default(),
            )
            .block(Block::default().borders(Borders::ALL).title("visitors"));
            frame.render_widget(body, layout[1]);
        }
        Route::PermissionDenied => {
            let body = Paragraph::new(access_denied_text())
                .style(Style::default().fg(Color::Red))
                .block(Block::default().borders(Borders::ALL).title("403"));
            frame.render_widget(body, layout[1]);
        }
        Route::NotFound => {
            let body = Paragraph::new(not_found_text())
                .block(Block::default().borders(Borders::ALL).title("404"));
            frame.render_widget(body, layout[1]);
        }
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(menu) = &state.row_menu {
        let area = centered_rect(40, 30, frame.area());
        frame.render_widget(Clear, area);
        let title = if menu.confirming { "confirm" } else { "row" };
        let overlay = Paragraph::new(render_row_menu_text(menu)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, kind: EntityKind, view_data: &ViewData) {
    let block = Block::default().borders(Borders::ALL).title(kind.label());
    let Some(list) = view_data.list.as_deref() else {
        frame.render_widget(Paragraph::new(String::new()).block(block), area);
        return;
    };

    match list.load_state() {
        LoadState::Loading => {
            frame.render_widget(Paragraph::new("Loading...").block(block), area);
            return;
        }
        LoadState::Failed(message) => {
            let body = Paragraph::new(message.clone())
                .style(Style::default().fg(Color::Red))
                .block(block);
            frame.render_widget(body, area);
            return;
        }
        LoadState::Ready => {}
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(list_toolbar_text(list, view_data.filter_editing)),
        parts[0],
    );
    frame.render_widget(Paragraph::new(pagination_text(list)), parts[2]);

    if list.not_found() {
        let body = Paragraph::new(not_found_rows_text(list))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(body, parts[1]);
        return;
    }

    let columns = list.columns();
    let mut widths = vec![Constraint::Length(3)];
    widths.extend(columns.iter().map(|_| Constraint::Min(8)));

    let header_cells = std::iter::once(Cell::from(select_all_marker(list))).chain(
        (0..columns.len()).map(|index| {
            Cell::from(header_label(list, index)).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        }),
    );
    let header = Row::new(header_cells);

    let cursor = list.cursor();
    let mut rows = list
        .visible_rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let checkbox = if row.selected { CHECKBOX_ON } else { CHECKBOX_OFF };
            let style = if index == cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(std::iter::once(checkbox.to_owned()).chain(row.cells)).style(style)
        })
        .collect::<Vec<_>>();
    rows.extend((0..list.empty_rows()).map(|_| Row::new(vec![String::new(); columns.len() + 1])));

    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, parts[1]);
}

fn select_all_marker(list: &dyn ListView) -> &'static str {
    let selected = list.table().selected.len();
    if selected > 0 && selected == list.total_count() {
        CHECKBOX_ON
    } else if selected > 0 {
        "[-]"
    } else {
        CHECKBOX_OFF
    }
}

fn header_label(list: &dyn ListView, index: usize) -> String {
    let Some(column) = list.columns().get(index) else {
        return String::new();
    };
    let table = list.table();
    if table.order_by == column.key {
        format!("{} {}", column.label, table.order.arrow())
    } else {
        column.label.to_owned()
    }
}

fn list_toolbar_text(list: &dyn ListView, editing: bool) -> String {
    let cursor = if editing { "▏" } else { "" };
    let selected = list.table().selected.len();
    let mut text = format!("filter: {}{cursor}", list.query());
    if selected > 0 {
        text.push_str(&format!(" | {selected} selected"));
    }
    text
}

fn pagination_text(list: &dyn ListView) -> String {
    let table = list.table();
    let filtered = list.filtered_count();
    let pages = table.page_count(filtered).max(1);
    let start = if filtered == 0 {
        0
    } else {
        table.page * table.rows_per_page + 1
    };
    let end = ((table.page + 1) * table.rows_per_page).min(filtered);
    format!(
        "{start}-{end} of {filtered} | page {}/{pages} | rows {}",
        table.page + 1,
        table.rows_per_page
    )
}

fn not_found_rows_text(list: &dyn ListView) -> String {
    format!(
        "Not found\n\nNo {} match \"{}\". Try checking for typos or using complete words.",
        list.kind().label(),
        list.query()
    )
}

fn render_form_text(form: &FormState) -> String {
    let mut lines = Vec::new();
    match form.phase() {
        FormPhase::LoadingReference | FormPhase::LoadingEntity => {
            lines.push("Loading...".to_owned());
        }
        FormPhase::Submitting => lines.push("Submitting...".to_owned()),
        FormPhase::Ready | FormPhase::Succeeded => {}
    }
    if let Some(error) = form.error() {
        lines.push(format!("! {error}"));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }

    for (index, field) in form.fields().iter().enumerate() {
        let marker = if index == form.focus() { ">" } else { " " };
        let value = match field.spec.kind {
            FieldKind::Choice if field.choices.is_empty() => "(no options)".to_owned(),
            FieldKind::Choice => format!("◀ {} ▶", field.display_value()),
            FieldKind::MultiChoice => field
                .choices
                .iter()
                .enumerate()
                .map(|(choice_index, choice)| {
                    let checked = if field.selected.contains(&choice.value) {
                        CHECKBOX_ON
                    } else {
                        CHECKBOX_OFF
                    };
                    let pointer = if index == form.focus() && choice_index == field.cursor {
                        "›"
                    } else {
                        " "
                    };
                    format!("\n    {pointer}{checked} {}", choice.label)
                })
                .collect::<String>(),
            FieldKind::Text | FieldKind::Secret | FieldKind::File => field.display_value(),
        };
        lines.push(format!("{marker} {}: {value}", field.spec.label));
        if let Some(error) = form.visible_error(index) {
            lines.push(format!("    ! {error}"));
        }
    }
    lines.join("\n")
}

fn render_visitors_text(screen: &VisitorScreen) -> String {
    let mut lines = vec![
        format!("visitors: {}", screen.counter.count()),
        format!("faces in last frame: {}", screen.last_detected),
        format!("frames processed: {}", screen.frames),
        format!(
            "known faces: {} | match threshold {:.2}",
            screen.counter.known_len(),
            screen.counter.threshold()
        ),
    ];
    if screen.idle {
        lines.push("waiting for frames from the detector".to_owned());
    }
    if let Some(error) = &screen.last_error {
        lines.push(format!("! {error}"));
    }
    lines.join("\n")
}

fn render_row_menu_text(menu: &RowMenu) -> String {
    if menu.confirming {
        return format!(
            "Delete {} {}?\nThis cannot be undone.\n\ny confirm | n cancel",
            menu.kind.as_str(),
            menu.row_id
        );
    }
    [RowAction::Edit, RowAction::Delete]
        .iter()
        .map(|action| {
            let marker = if *action == menu.action { ">" } else { " " };
            format!("{marker} {}", action.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn access_denied_text() -> &'static str {
    "Access Denied (403)\n\nYou do not have permission to view this page.\n\nenter go home"
}

fn not_found_text() -> &'static str {
    "Page not found (404)\n\nThe page you are looking for does not exist.\n\nenter go home"
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | tab/shift+tab or f/b switch tabs | ? help | L sign out\n\
list: j/k move | h/l page | r rows per page | 1-9 sort column | / filter | space select | A select all\n\
list: enter row menu | a add | R reload | esc clear filter\n\
row menu: j/k choose | enter pick | esc close | confirm: y delete, n cancel\n\
form: tab/shift+tab field | left/right choose | space toggle | enter or ctrl+s submit | esc back\n\
visitors: c reset count"
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let (mode, hints) = match &state.route {
        Route::List(_) if view_data.filter_editing => ("FILTER", "type to filter | enter done"),
        Route::List(_) if state.row_menu.is_some() => ("MENU", "j/k | enter | esc"),
        Route::List(_) => ("LIST", "j/k h/l | / filter | enter menu | a add | ? help | ctrl+q"),
        Route::Create(_) | Route::Edit(..) => ("FORM", "tab field | enter submit | esc back"),
        Route::SignIn => ("SIGN IN", "tab field | enter sign in | ctrl+q"),
        Route::Visitors => ("VISITORS", "c reset | tab switch | ctrl+q"),
        Route::PermissionDenied | Route::NotFound => ("NOTICE", "enter home | ctrl+q"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
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
