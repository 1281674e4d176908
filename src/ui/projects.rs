use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::Project;
use crate::ui::components::{next_index, previous_index, render_delete_confirmation};

// Represents the state of the project list on the home screen
pub struct ProjectsState {
    projects: Vec<Project>,
    list_state: ListState,
    expanded: Option<i64>,
    show_delete_confirmation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Exit,
    NewProject,
    EditProject(i64),
    DeleteProject(i64),
}

impl ProjectsState {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut list_state = ListState::default();
        if !projects.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            projects,
            list_state,
            expanded: None,
            show_delete_confirmation: false,
        }
    }

    pub fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        let selected = match self.list_state.selected() {
            _ if self.projects.is_empty() => None,
            Some(i) => Some(i.min(self.projects.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn next(&mut self) {
        let i = next_index(self.list_state.selected(), self.projects.len());
        self.list_state.select(i);
    }

    pub fn previous(&mut self) {
        let i = previous_index(self.list_state.selected(), self.projects.len());
        self.list_state.select(i);
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn is_confirming(&self) -> bool {
        self.show_delete_confirmation
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.list_state.selected().and_then(|i| self.projects.get(i))
    }

    pub fn selected_project_id(&self) -> Option<i64> {
        self.selected_project().map(|p| p.id)
    }

    /// Show or hide the customers of `id`; at most one project is open
    pub fn toggle_expanded(&mut self, id: i64) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }

    pub fn expanded(&self) -> Option<i64> {
        self.expanded
    }
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &mut ProjectsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(area);

    if state.projects.is_empty() {
        let empty = Paragraph::new("There are no projects")
            .block(Block::default().title("Projects").borders(Borders::ALL));
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = state
            .projects
            .iter()
            .map(|project| ListItem::new(project_text(project, state.expanded == Some(project.id))))
            .collect();

        let projects_list = List::new(items)
            .block(Block::default().title("Projects").borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

        frame.render_stateful_widget(projects_list, chunks[0], &mut state.list_state);
    }

    let buttons_text = match state.selected_project() {
        Some(project) if state.expanded == Some(project.id) => {
            "<Enter> Hide Customers | <E> Edit | <D> Delete | <N> New Project | <Q> Quit"
        }
        Some(_) => "<Enter> Show Customers | <E> Edit | <D> Delete | <N> New Project | <Q> Quit",
        None => "<N> New Project | <Q> Quit",
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, area, "Are you sure you want to delete this project?");
    }
}

fn project_text(project: &Project, expanded: bool) -> Text<'static> {
    let mut lines = vec![
        Spans::from(vec![
            Span::styled(project.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(project.created_label(), Style::default().fg(Color::DarkGray)),
        ]),
        Spans::from(format!("  {}", project.description)),
    ];

    if expanded {
        lines.push(Spans::from(Span::styled(
            "  Customers:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if project.customers.is_empty() {
            lines.push(Spans::from("    No customers linked to this project."));
        }
        for customer in &project.customers {
            lines.push(Spans::from(format!("    - {} - {}", customer.name, customer.email)));
        }
    }
    lines.push(Spans::from(""));

    Text::from(lines)
}

pub fn handle_key(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.toggle_delete_confirmation();
                return state.selected_project_id().map(ProjectAction::DeleteProject);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.toggle_delete_confirmation();
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ProjectAction::Exit),
        KeyCode::Char('n') => return Some(ProjectAction::NewProject),
        KeyCode::Char('e') => return state.selected_project_id().map(ProjectAction::EditProject),
        KeyCode::Char('d') => {
            if state.selected_project().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Enter => {
            if let Some(id) = state.selected_project_id() {
                state.toggle_expanded(id);
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    None
}
