use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Text,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::api::ValidationErrors;
use crate::models::Credentials;
use crate::ui::components::{error_spans, field_spans};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    Back,
    Submit,
    Exit,
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum LoginField {
    Email,
    Password,
}

pub struct LoginState {
    credentials: Credentials,
    current_field: LoginField,
    editing: bool,
    errors: ValidationErrors,
}

impl LoginState {
    pub fn new() -> Self {
        Self {
            credentials: Credentials::default(),
            current_field: LoginField::Email,
            editing: false,
            errors: ValidationErrors::new(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub fn toggle_field(&mut self) {
        self.current_field = match self.current_field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let value = match self.current_field {
            LoginField::Email => &mut self.credentials.email,
            LoginField::Password => &mut self.credentials.password,
        };

        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }
}

impl Default for LoginState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_login<B: Backend>(f: &mut Frame<B>, area: Rect, state: &mut LoginState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new("Login to your account")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let masked = "*".repeat(state.credentials.password.chars().count());
    let rows = [
        (LoginField::Email, "Email", "email", state.credentials.email.as_str()),
        (LoginField::Password, "Password", "password", masked.as_str()),
    ];

    let items: Vec<ListItem> = rows
        .iter()
        .map(|(field, label, key, value)| {
            let focused = state.current_field == *field;
            let mut lines = vec![field_spans(label, value, focused, state.editing)];
            lines.extend(error_spans(state.errors.field(key)));
            ListItem::new(Text::from(lines))
        })
        .collect();

    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Credentials"));
    f.render_widget(form, chunks[1]);

    let help_text = if state.editing {
        "Enter/Esc - Done editing"
    } else {
        "Enter - Edit field | Up/Down - Switch field | S - Login | Esc - Home | Q - Quit"
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

pub fn handle_key(state: &mut LoginState, key: KeyCode) -> Option<LoginAction> {
    if state.editing {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.editing = false,
            _ => state.edit_current_field(key),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(LoginAction::Back),
        KeyCode::Char('q') => return Some(LoginAction::Exit),
        KeyCode::Enter => state.editing = true,
        KeyCode::Up | KeyCode::Down | KeyCode::Tab => state.toggle_field(),
        KeyCode::Char('s') => return Some(LoginAction::Submit),
        _ => {}
    }
    None
}
