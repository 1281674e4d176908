use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::api::CrmApi;
use crate::app::{App, Screen, Status};
use crate::router::{nav_links, welcome, Route};
use crate::session::Session;
use crate::ui::{customer_form, customers, login, project_form, projects};

/// Draw the navigation header and the status line; returns the area left
/// for the current screen.
pub fn render_shell<B: Backend>(
    frame: &mut Frame<B>,
    route: Route,
    session: &Session,
    status: Option<&Status>,
) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ].as_ref())
        .split(frame.size());

    let mut spans = Vec::new();
    for (i, link) in nav_links(route, session).iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("<{}> {}", link.key, link.label),
            Style::default().fg(Color::Cyan),
        ));
        // greeting sits between Home and the account links
        if i == 0 {
            if let Some(greeting) = welcome(session) {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(greeting, Style::default().fg(Color::DarkGray)));
            }
        }
    }

    let header = Paragraph::new(Spans::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(route.path(), Style::default().add_modifier(Modifier::BOLD))),
    );
    frame.render_widget(header, chunks[0]);

    let status_line = match status {
        Some(Status::Error(message)) => {
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red))
        }
        Some(Status::Info(message)) => {
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Green))
        }
        None => Paragraph::new(""),
    };
    frame.render_widget(status_line, chunks[2]);

    chunks[1]
}

pub fn render_app<B: Backend, A: CrmApi>(frame: &mut Frame<B>, app: &mut App<A>) {
    let body = render_shell(frame, app.route(), app.session(), app.status());

    match app.screen_mut() {
        Screen::Login(state) => login::render_login(frame, body, state),
        Screen::Home(state) => projects::render_projects(frame, body, state),
        Screen::Customers(state) => customers::render_customers(frame, body, state),
        Screen::CustomerForm(state) => customer_form::render_customer_form(frame, body, state),
        Screen::ProjectForm(state) => project_form::render_project_form(frame, body, state),
    }
}
