// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List(EntityKind),
    Create(EntityKind),
    Edit(EntityKind, String),
    PermissionDenied,
    NotFound,
    SignIn,
    Visitors,
}

impl Route {
    pub const HOME: Self = Self::List(EntityKind::Company);

    /// Resolves a path to a route. Anything unrecognized lands on
    /// `NotFound`.
    pub fn parse(path: &str) -> Self {
        let path = path.trim().trim_matches('/');
        match path {
            "" => return Self::HOME,
            "permission-denied" => return Self::PermissionDenied,
            "404" => return Self::NotFound,
            "sign-in" => return Self::SignIn,
            "visitors" => return Self::Visitors,
            "emp-register" => return Self::Create(EntityKind::Employee),
            _ => {}
        }

        if let Some(kind) = EntityKind::parse(path) {
            return Self::List(kind);
        }
        if let Some(kind) = path.strip_suffix("-register").and_then(EntityKind::parse) {
            return Self::Create(kind);
        }
        if let Some((head, id)) = path.split_once("-edit/")
            && let Some(kind) = EntityKind::parse(head)
            && !id.is_empty()
            && !id.contains('/')
        {
            return Self::Edit(kind, id.to_owned());
        }
        Self::NotFound
    }

    pub fn path(&self) -> String {
        match self {
            Self::List(kind) => format!("/{}", kind.as_str()),
            Self::Create(kind) => format!("/{}-register", kind.as_str()),
            Self::Edit(kind, id) => format!("/{}-edit/{id}", kind.as_str()),
            Self::PermissionDenied => "/permission-denied".to_owned(),
            Self::NotFound => "/404".to_owned(),
            Self::SignIn => "/sign-in".to_owned(),
            Self::Visitors => "/visitors".to_owned(),
        }
    }

    /// Tab highlighted while this route is showing.
    pub fn tab(&self) -> Option<TabKind> {
        match self {
            Self::List(kind) | Self::Create(kind) | Self::Edit(kind, _) => {
                Some(TabKind::Entity(*kind))
            }
            Self::Visitors => Some(TabKind::Visitors),
            Self::PermissionDenied | Self::NotFound | Self::SignIn => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Entity(EntityKind),
    Visitors,
}

impl TabKind {
    pub const ALL: [Self; 7] = [
        Self::Entity(EntityKind::Company),
        Self::Entity(EntityKind::Branch),
        Self::Entity(EntityKind::Department),
        Self::Entity(EntityKind::Employee),
        Self::Entity(EntityKind::Role),
        Self::Entity(EntityKind::User),
        Self::Visitors,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Entity(kind) => kind.label(),
            Self::Visitors => "visitors",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value == "visitors" {
            return Some(Self::Visitors);
        }
        EntityKind::parse(value).map(Self::Entity)
    }

    pub fn route(self) -> Route {
        match self {
            Self::Entity(kind) => Route::List(kind),
            Self::Visitors => Route::Visitors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Popover bound to one list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMenu {
    pub kind: EntityKind,
    pub row_id: String,
    pub action: RowAction,
    pub confirming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub route: Route,
    pub status_line: Option<String>,
    pub row_menu: Option<RowMenu>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            route: Route::HOME,
            status_line: None,
            row_menu: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Navigate(Route),
    NextTab,
    PrevTab,
    OpenRowMenu(String),
    MoveRowMenu,
    ChooseRowAction,
    ConfirmDelete,
    DismissRowMenu,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    RouteChanged(Route),
    RowMenuOpened(String),
    RowMenuClosed,
    DeleteRequested { kind: EntityKind, id: String },
    DeleteConfirmed { kind: EntityKind, id: String },
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Navigate(route) => self.navigate(route),
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::OpenRowMenu(row_id) => {
                let Route::List(kind) = self.route else {
                    return Vec::new();
                };
                self.row_menu = Some(RowMenu {
                    kind,
                    row_id: row_id.clone(),
                    action: RowAction::Edit,
                    confirming: false,
                });
                vec![AppEvent::RowMenuOpened(row_id)]
            }
            AppCommand::MoveRowMenu => {
                if let Some(menu) = self.row_menu.as_mut().filter(|menu| !menu.confirming) {
                    menu.action = match menu.action {
                        RowAction::Edit => RowAction::Delete,
                        RowAction::Delete => RowAction::Edit,
                    };
                }
                Vec::new()
            }
            AppCommand::ChooseRowAction => {
                let Some(menu) = self.row_menu.as_mut() else {
                    return Vec::new();
                };
                if menu.confirming {
                    return Vec::new();
                }
                match menu.action {
                    RowAction::Edit => {
                        let route = Route::Edit(menu.kind, menu.row_id.clone());
                        let mut events = vec![AppEvent::RowMenuClosed];
                        events.extend(self.navigate(route));
                        events
                    }
                    RowAction::Delete => {
                        menu.confirming = true;
                        vec![AppEvent::DeleteRequested {
                            kind: menu.kind,
                            id: menu.row_id.clone(),
                        }]
                    }
                }
            }
            AppCommand::ConfirmDelete => match self.row_menu.take() {
                Some(menu) if menu.confirming => vec![
                    AppEvent::RowMenuClosed,
                    AppEvent::DeleteConfirmed {
                        kind: menu.kind,
                        id: menu.row_id,
                    },
                ],
                other => {
                    self.row_menu = other;
                    Vec::new()
                }
            },
            AppCommand::DismissRowMenu => {
                if self.row_menu.take().is_some() {
                    vec![AppEvent::RowMenuClosed]
                } else {
                    Vec::new()
                }
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn navigate(&mut self, route: Route) -> Vec<AppEvent> {
        self.row_menu = None;
        self.route = route.clone();
        vec![AppEvent::RouteChanged(route)]
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = self
            .route
            .tab()
            .and_then(|active| tabs.iter().position(|tab| *tab == active))
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.navigate(tabs[next].route())
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
