use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::Customer;
use crate::ui::components::{next_index, previous_index, render_delete_confirmation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingDelete {
    Customer(i64),
    Address(i64),
}

// Represents the state of the customer list screen
pub struct CustomersState {
    customers: Vec<Customer>,
    list_state: ListState,
    expanded: Option<i64>,
    address_cursor: usize,
    pending_delete: Option<PendingDelete>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerListAction {
    Back,
    NewCustomer,
    EditCustomer(i64),
    DeleteCustomer(i64),
    DeleteAddress(i64),
}

impl CustomersState {
    pub fn new(customers: Vec<Customer>) -> Self {
        let mut list_state = ListState::default();
        if !customers.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            customers,
            list_state,
            expanded: None,
            address_cursor: 0,
            pending_delete: None,
        }
    }

    /// Swap in a refetched list, keeping the expanded row and the cursor
    pub fn replace_customers(&mut self, customers: Vec<Customer>) {
        self.customers = customers;
        let selected = match self.list_state.selected() {
            _ if self.customers.is_empty() => None,
            Some(i) => Some(i.min(self.customers.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);

        let address_count = self.expanded_customer().map_or(0, |c| c.addresses.len());
        if self.address_cursor >= address_count {
            self.address_cursor = address_count.saturating_sub(1);
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn next(&mut self) {
        let i = next_index(self.list_state.selected(), self.customers.len());
        self.list_state.select(i);
    }

    pub fn previous(&mut self) {
        let i = previous_index(self.list_state.selected(), self.customers.len());
        self.list_state.select(i);
    }

    pub fn selected_customer(&self) -> Option<&Customer> {
        self.list_state.selected().and_then(|i| self.customers.get(i))
    }

    pub fn selected_customer_id(&self) -> Option<i64> {
        self.selected_customer().map(|c| c.id)
    }

    /// Expand `id`, or collapse it when it is already the expanded row
    pub fn toggle_expanded(&mut self, id: i64) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
        self.address_cursor = 0;
    }

    pub fn expanded(&self) -> Option<i64> {
        self.expanded
    }

    fn expanded_customer(&self) -> Option<&Customer> {
        let id = self.expanded?;
        self.customers.iter().find(|c| c.id == id)
    }

    /// Addresses can only be picked inside the panel of the row under the cursor
    fn selected_is_expanded(&self) -> bool {
        self.expanded.is_some() && self.expanded == self.selected_customer_id()
    }

    pub fn next_address(&mut self) {
        let len = self.expanded_customer().map_or(0, |c| c.addresses.len());
        if let Some(i) = next_index(Some(self.address_cursor), len) {
            self.address_cursor = i;
        }
    }

    pub fn previous_address(&mut self) {
        let len = self.expanded_customer().map_or(0, |c| c.addresses.len());
        if let Some(i) = previous_index(Some(self.address_cursor), len) {
            self.address_cursor = i;
        }
    }

    pub fn highlighted_address_id(&self) -> Option<i64> {
        self.expanded_customer()
            .and_then(|c| c.addresses.get(self.address_cursor))
            .and_then(|a| a.id)
    }

    pub fn is_confirming(&self) -> bool {
        self.pending_delete.is_some()
    }

    fn confirm(&mut self) -> Option<CustomerListAction> {
        match self.pending_delete.take()? {
            PendingDelete::Customer(id) => Some(CustomerListAction::DeleteCustomer(id)),
            PendingDelete::Address(id) => Some(CustomerListAction::DeleteAddress(id)),
        }
    }
}

pub fn render_customers<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &mut CustomersState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(area);

    let header = Paragraph::new(Spans::from(Span::styled(
        format!("  {:<28} {:<34} {}", "Name", "Email", "Actions"),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(header, chunks[0]);

    if state.customers.is_empty() {
        let empty = Paragraph::new("No customers available.")
            .block(Block::default().title("Customer List").borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = state
            .customers
            .iter()
            .map(|customer| ListItem::new(customer_text(state, customer)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Customer List").borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

        frame.render_stateful_widget(list, chunks[1], &mut state.list_state);
    }

    let mut buttons_text = String::from("<N> New | <Esc> Home");
    if state.selected_customer().is_some() {
        buttons_text = String::from(
            "<Enter> Details | <E> Edit | <D> Delete | <N> New | <Esc> Home",
        );
    }
    if state.selected_is_expanded() {
        buttons_text.push_str(" | <Left/Right> Address | <X> Delete Address");
    }

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    match state.pending_delete {
        Some(PendingDelete::Customer(_)) => {
            render_delete_confirmation(frame, area, "Are you sure you want to delete this customer?")
        }
        Some(PendingDelete::Address(_)) => {
            render_delete_confirmation(frame, area, "Are you sure you want to delete this address?")
        }
        None => {}
    }
}

fn customer_text(state: &CustomersState, customer: &Customer) -> Text<'static> {
    let is_expanded = state.expanded == Some(customer.id);
    let marker = if is_expanded { "▲" } else { "▼" };

    let mut lines = vec![Spans::from(format!(
        "{:<28} {:<34} {}",
        customer.name, customer.email, marker
    ))];

    if is_expanded {
        lines.push(Spans::from(format!("    Company: {}", customer.company)));
        lines.push(Spans::from(format!("    Contact: {}", customer.contact)));
        lines.push(Spans::from(format!("    Country: {}", customer.country)));
        lines.push(Spans::from(Span::styled(
            "    Addresses:",
            Style::default().add_modifier(Modifier::BOLD),
        )));

        if customer.addresses.is_empty() {
            lines.push(Spans::from("      No addresses available."));
        }
        for (i, address) in customer.addresses.iter().enumerate() {
            let style = if i == state.address_cursor && state.selected_is_expanded() {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Spans::from(Span::styled(
                format!("      - {}", address.summary()),
                style,
            )));
        }
    }

    Text::from(lines)
}

pub fn handle_key(state: &mut CustomersState, key: KeyCode) -> Option<CustomerListAction> {
    if state.is_confirming() {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => return state.confirm(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.pending_delete = None,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(CustomerListAction::Back),
        KeyCode::Char('n') => return Some(CustomerListAction::NewCustomer),
        KeyCode::Char('e') => {
            if let Some(id) = state.selected_customer_id() {
                return Some(CustomerListAction::EditCustomer(id));
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = state.selected_customer_id() {
                state.pending_delete = Some(PendingDelete::Customer(id));
            }
        }
        KeyCode::Char('x') => {
            if state.selected_is_expanded() {
                if let Some(id) = state.highlighted_address_id() {
                    state.pending_delete = Some(PendingDelete::Address(id));
                }
            }
        }
        KeyCode::Enter => {
            if let Some(id) = state.selected_customer_id() {
                state.toggle_expanded(id);
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Right if state.selected_is_expanded() => state.next_address(),
        KeyCode::Left if state.selected_is_expanded() => state.previous_address(),
        _ => {}
    }
    None
}
