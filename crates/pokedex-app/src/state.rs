// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::pager::Pager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Catalog,
    Detail { name: String },
    Battle { name: String },
    Collection,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Detail { .. } => "Detail",
            Self::Battle { .. } => "Battle",
            Self::Collection => "My Pokemon",
        }
    }

    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::Detail { name } | Self::Battle { name } => Some(name),
            Self::Catalog | Self::Collection => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub pager: Pager,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Catalog,
            pager: Pager::default(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    GoToPage(usize),
    OpenDetail(String),
    OpenBattle(String),
    OpenCollection,
    GoHome,
    Back,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    PageChanged { offset: usize },
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_pager(pager: Pager) -> Self {
        Self {
            pager,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::FirstPage => self.move_page(self.pager.first()),
            AppCommand::PrevPage => self.move_page(self.pager.prev()),
            AppCommand::NextPage => self.move_page(self.pager.next()),
            AppCommand::LastPage => self.move_page(self.pager.last()),
            AppCommand::GoToPage(page) => self.move_page(self.pager.go_to_page(page)),
            AppCommand::OpenDetail(name) => self.show(Screen::Detail { name }),
            AppCommand::OpenBattle(name) => self.show(Screen::Battle { name }),
            AppCommand::OpenCollection => self.show(Screen::Collection),
            AppCommand::GoHome => self.show(Screen::Catalog),
            AppCommand::Back => {
                let previous = match &self.screen {
                    Screen::Catalog => return Vec::new(),
                    Screen::Battle { name } => Screen::Detail { name: name.clone() },
                    Screen::Detail { .. } | Screen::Collection => Screen::Catalog,
                };
                self.show(previous)
            }
            AppCommand::SetStatus(message) => vec![self.set_status(message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn move_page(&mut self, pager: Pager) -> Vec<AppEvent> {
        if pager == self.pager {
            return Vec::new();
        }
        self.pager = pager;
        vec![AppEvent::PageChanged {
            offset: pager.offset(),
        }]
    }

    fn show(&mut self, screen: Screen) -> Vec<AppEvent> {
        if screen == self.screen {
            return Vec::new();
        }
        self.screen = screen.clone();
        vec![AppEvent::ScreenChanged(screen)]
    }

    fn set_status(&mut self, message: String) -> AppEvent {
        self.status_line = Some(message.clone());
        AppEvent::StatusUpdated(message)
    }
}
