use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::api::{FieldPath, ValidationErrors};
use crate::models::{Customer, Project, ProjectPayload};
use crate::ui::components::{error_spans, field_spans, next_index, previous_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormAction {
    Cancel,
    Create,
    Update(i64),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ProjectField {
    Name,
    Description,
    Customers,
}

/// Roster entries whose name contains `query`, ignoring case
pub fn filter_customers<'a>(roster: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    let needle = query.to_lowercase();
    roster
        .iter()
        .filter(|customer| customer.name.to_lowercase().contains(&needle))
        .collect()
}

pub struct ProjectFormState {
    project_id: Option<i64>,
    name: String,
    description: String,
    selected: Vec<i64>,
    roster: Vec<Customer>,
    linked: Vec<Customer>,
    search: String,
    picker_open: bool,
    picker_cursor: usize,
    current_field: ProjectField,
    editing: bool,
    errors: ValidationErrors,
}

impl ProjectFormState {
    /// New project; every customer can be picked
    pub fn new(roster: Vec<Customer>) -> Self {
        Self {
            project_id: None,
            name: String::new(),
            description: String::new(),
            selected: Vec::new(),
            roster,
            linked: Vec::new(),
            search: String::new(),
            picker_open: false,
            picker_cursor: 0,
            current_field: ProjectField::Name,
            editing: false,
            errors: ValidationErrors::new(),
        }
    }

    /// Existing project. The picker lists only customers that are not yet
    /// linked; linked ones start out selected.
    pub fn from_existing(project: Project, all_customers: Vec<Customer>) -> Self {
        let linked_ids = project.customer_ids();
        let roster = all_customers
            .into_iter()
            .filter(|c| !linked_ids.contains(&c.id))
            .collect();

        Self {
            project_id: Some(project.id),
            name: project.name,
            description: project.description,
            selected: linked_ids,
            linked: project.customers,
            ..Self::new(roster)
        }
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn roster(&self) -> &[Customer] {
        &self.roster
    }

    pub fn selected(&self) -> &[i64] {
        &self.selected
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.picker_cursor = 0;
    }

    pub fn filtered(&self) -> Vec<&Customer> {
        filter_customers(&self.roster, &self.search)
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    /// Checkbox toggle: add the id when absent, drop it when present
    pub fn toggle_customer(&mut self, id: i64) {
        if let Some(pos) = self.selected.iter().position(|&s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    /// Selected customers resolved for the recap list, in selection order.
    /// Previously linked customers resolve too, although the roster omits them.
    pub fn recap(&self) -> Vec<&Customer> {
        self.selected
            .iter()
            .filter_map(|id| {
                self.roster
                    .iter()
                    .chain(self.linked.iter())
                    .find(|c| c.id == *id)
            })
            .collect()
    }

    pub fn toggle_picker(&mut self) {
        self.picker_open = !self.picker_open;
        self.picker_cursor = 0;
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker_open
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    fn highlighted_customer_id(&self) -> Option<i64> {
        self.filtered().get(self.picker_cursor).map(|c| c.id)
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Description,
            ProjectField::Description => ProjectField::Customers,
            ProjectField::Customers => ProjectField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Customers,
            ProjectField::Description => ProjectField::Name,
            ProjectField::Customers => ProjectField::Description,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let value = match self.current_field {
            ProjectField::Name => &mut self.name,
            ProjectField::Description => &mut self.description,
            ProjectField::Customers => return,
        };

        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }

    pub fn payload(&self) -> ProjectPayload {
        ProjectPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            customer_ids: self.selected.clone(),
        }
    }

    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    /// `customer_ids` and `customer_ids.N` messages, shown under the picker
    fn customer_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|(path, _)| is_customer_path(path))
            .flat_map(|(_, messages)| messages.iter().cloned())
            .collect()
    }

    /// Errors for keys the form has no input for, prefixed with the key
    pub fn unplaced_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|(path, _)| match path {
                FieldPath::Field(name) => {
                    name != "name" && name != "description" && !is_customer_path(path)
                }
                FieldPath::Nested { .. } => !is_customer_path(path),
            })
            .flat_map(|(path, messages)| {
                messages.iter().map(move |m| format!("{}: {}", path, m))
            })
            .collect()
    }
}

fn is_customer_path(path: &FieldPath) -> bool {
    match path {
        FieldPath::Field(name) => name.starts_with("customer_ids"),
        FieldPath::Nested { collection, .. } => collection == "customer_ids",
    }
}

pub fn render_project_form<B: Backend>(f: &mut Frame<B>, area: Rect, state: &mut ProjectFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(8),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let title_text = if state.project_id.is_some() {
        "Update Project"
    } else {
        "Create a New Project"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);
    render_recap(f, state, chunks[2]);

    let help_text = if state.picker_open {
        "Type - Search | Up/Down - Move | Enter - Check/uncheck | Esc - Close customers"
    } else if state.editing {
        "Enter/Esc - Done editing"
    } else {
        "Enter - Edit field / open customers | Up/Down - Navigate | S - Save project | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ProjectFormState, area: Rect) {
    let mut items: Vec<ListItem> = Vec::new();

    for (field, label, value) in [
        (ProjectField::Name, "Project Name", &state.name),
        (ProjectField::Description, "Description", &state.description),
    ] {
        let focused = state.current_field == field;
        let key = if field == ProjectField::Name { "name" } else { "description" };
        let mut lines = vec![field_spans(label, value, focused, state.editing)];
        lines.extend(error_spans(state.errors.field(key)));
        items.push(ListItem::new(Text::from(lines)));
    }

    let focused = state.current_field == ProjectField::Customers;
    let toggle_label = format!(
        "[{} Customers] {} selected",
        if state.picker_open { "Close" } else { "Show" },
        state.selected.len()
    );
    let toggle_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let mut lines = vec![Spans::from(Span::styled(toggle_label, toggle_style))];
    lines.extend(error_spans(&state.customer_errors()));

    if state.picker_open {
        lines.push(Spans::from(format!("  Search Customers: {}|", state.search)));
        let filtered = state.filtered();
        if filtered.is_empty() {
            lines.push(Spans::from("  No available customers"));
        }
        for (i, customer) in filtered.iter().enumerate() {
            let check = if state.is_selected(customer.id) { "[x]" } else { "[ ]" };
            let style = if i == state.picker_cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Spans::from(Span::styled(
                format!("  {} {} ({})", check, customer.name, customer.email),
                style,
            )));
        }
    }
    items.push(ListItem::new(Text::from(lines)));

    for message in state.unplaced_errors() {
        items.push(ListItem::new(Spans::from(Span::styled(
            message,
            Style::default().fg(Color::Red),
        ))));
    }

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Project Details"));
    f.render_widget(form_list, area);
}

fn render_recap<B: Backend>(f: &mut Frame<B>, state: &ProjectFormState, area: Rect) {
    let recap = state.recap();
    let items: Vec<ListItem> = if recap.is_empty() {
        vec![ListItem::new("No customers found")]
    } else {
        recap
            .iter()
            .map(|c| ListItem::new(format!("{} ({})", c.name, c.email)))
            .collect()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Selected Customers"));
    f.render_widget(list, area);
}

pub fn handle_key(state: &mut ProjectFormState, key: KeyCode) -> Option<ProjectFormAction> {
    if state.picker_open {
        match key {
            KeyCode::Esc => state.toggle_picker(),
            KeyCode::Enter => {
                if let Some(id) = state.highlighted_customer_id() {
                    state.toggle_customer(id);
                }
            }
            KeyCode::Down => {
                if let Some(i) = next_index(Some(state.picker_cursor), state.filtered().len()) {
                    state.picker_cursor = i;
                }
            }
            KeyCode::Up => {
                if let Some(i) = previous_index(Some(state.picker_cursor), state.filtered().len()) {
                    state.picker_cursor = i;
                }
            }
            KeyCode::Char(c) => {
                state.search.push(c);
                state.picker_cursor = 0;
            }
            KeyCode::Backspace => {
                state.search.pop();
                state.picker_cursor = 0;
            }
            _ => {}
        }
        return None;
    }

    if state.editing {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.editing = false,
            _ => state.edit_current_field(key),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(ProjectFormAction::Cancel),
        KeyCode::Enter => match state.current_field {
            ProjectField::Customers => state.toggle_picker(),
            _ => state.editing = true,
        },
        KeyCode::Up => state.previous_field(),
        KeyCode::Down => state.next_field(),
        KeyCode::Char('s') => {
            return Some(match state.project_id {
                Some(id) => ProjectFormAction::Update(id),
                None => ProjectFormAction::Create,
            });
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", id),
            ..Default::default()
        }
    }

    fn roster() -> Vec<Customer> {
        vec![
            customer(1, "Alice Smith"),
            customer(2, "Bob Jones"),
            customer(3, "ALINA Park"),
        ]
    }

    fn names(customers: &[&Customer]) -> Vec<String> {
        customers.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let roster = roster();
        assert_eq!(
            names(&filter_customers(&roster, "ali")),
            ["Alice Smith", "ALINA Park"]
        );
        assert_eq!(names(&filter_customers(&roster, "JONES")), ["Bob Jones"]);
        assert!(filter_customers(&roster, "zed").is_empty());
    }

    #[test]
    fn empty_search_returns_full_roster() {
        let roster = roster();
        assert_eq!(filter_customers(&roster, "").len(), roster.len());
    }

    #[test]
    fn select_then_deselect_is_a_no_op() {
        let mut state = ProjectFormState::new(roster());
        state.toggle_customer(3);
        let before = state.selected().to_vec();

        state.toggle_customer(1);
        assert!(state.is_selected(1));
        state.toggle_customer(1);

        assert_eq!(state.selected(), before.as_slice());
    }

    #[test]
    fn update_roster_excludes_linked_customers() {
        let project = Project {
            id: 9,
            name: "Bridge".to_string(),
            customers: vec![customer(2, "Bob Jones")],
            ..Default::default()
        };
        let state = ProjectFormState::from_existing(project, roster());

        let roster_ids: Vec<i64> = state.roster().iter().map(|c| c.id).collect();
        assert_eq!(roster_ids, vec![1, 3]);
        assert_eq!(state.selected(), [2]);
        assert_eq!(state.payload().customer_ids, vec![2]);
    }

    #[test]
    fn recap_resolves_previously_linked_customers() {
        let project = Project {
            id: 9,
            customers: vec![customer(2, "Bob Jones")],
            ..Default::default()
        };
        let mut state = ProjectFormState::from_existing(project, roster());
        state.toggle_customer(1);

        assert_eq!(names(&state.recap()), ["Bob Jones", "Alice Smith"]);
    }

    #[test]
    fn unmatched_error_keys_are_listed() {
        let mut state = ProjectFormState::new(roster());
        let errors: ValidationErrors = [
            (FieldPath::field("name"), "Required.".to_string()),
            (FieldPath::field("customer_ids"), "Pick one.".to_string()),
            (FieldPath::nested("customer_ids", 0, "id"), "Unknown.".to_string()),
            (FieldPath::field("deadline"), "Too soon.".to_string()),
            (FieldPath::nested("tasks", 2, "title"), "Missing.".to_string()),
        ]
        .into_iter()
        .collect();
        state.set_errors(errors);

        assert_eq!(state.customer_errors(), ["Pick one.", "Unknown."]);
        assert_eq!(
            state.unplaced_errors(),
            vec!["deadline: Too soon.".to_string(), "tasks.2.title: Missing.".to_string()]
        );
    }

    #[test]
    fn picker_keys_search_and_toggle() {
        let mut state = ProjectFormState::new(roster());
        state.next_field();
        state.next_field();
        handle_key(&mut state, KeyCode::Enter);
        assert!(state.is_picker_open());

        for c in "bob".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        assert_eq!(state.search(), "bob");
        handle_key(&mut state, KeyCode::Enter);
        assert_eq!(state.selected(), [2]);

        // 's' while the picker is open is search text, not save
        assert_eq!(handle_key(&mut state, KeyCode::Char('s')), None);
        handle_key(&mut state, KeyCode::Backspace);
        handle_key(&mut state, KeyCode::Esc);
        assert!(!state.is_picker_open());
        assert_eq!(handle_key(&mut state, KeyCode::Char('s')), Some(ProjectFormAction::Create));
    }

    #[test]
    fn typing_fills_name_and_description() {
        let mut state = ProjectFormState::new(Vec::new());
        handle_key(&mut state, KeyCode::Enter);
        for c in "Atlas".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Down);
        handle_key(&mut state, KeyCode::Enter);
        for c in "Map".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Esc);

        let payload = state.payload();
        assert_eq!(payload.name, "Atlas");
        assert_eq!(payload.description, "Map");
        assert!(payload.customer_ids.is_empty());
    }
}
