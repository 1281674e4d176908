use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::api::{FieldPath, ValidationErrors};
use crate::models::{Address, Customer, CustomerPayload};
use crate::ui::components::{error_spans, field_spans, render_delete_confirmation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerFormAction {
    Cancel,
    Submit,
    DeleteAddress(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    Name,
    Email,
    Company,
    Contact,
    Country,
}

impl CustomerField {
    const ALL: [CustomerField; 5] = [
        CustomerField::Name,
        CustomerField::Email,
        CustomerField::Company,
        CustomerField::Contact,
        CustomerField::Country,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CustomerField::Name => "name",
            CustomerField::Email => "email",
            CustomerField::Company => "company",
            CustomerField::Contact => "contact",
            CustomerField::Country => "country",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CustomerField::Name => "Name",
            CustomerField::Email => "Email",
            CustomerField::Company => "Company",
            CustomerField::Contact => "Contact",
            CustomerField::Country => "Country",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    No,
    Street,
    City,
    State,
}

impl AddressField {
    const ALL: [AddressField; 4] = [
        AddressField::No,
        AddressField::Street,
        AddressField::City,
        AddressField::State,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AddressField::No => "no",
            AddressField::Street => "street",
            AddressField::City => "city",
            AddressField::State => "state",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AddressField::No => "No",
            AddressField::Street => "Street",
            AddressField::City => "City",
            AddressField::State => "State",
        }
    }
}

/// Identity of an address row for the lifetime of the form. Unlike the
/// row's position it does not change when other rows are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub key: RowKey,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Customer(CustomerField),
    Address(RowKey, AddressField),
}

pub struct CustomerFormState {
    customer_id: Option<i64>,
    name: String,
    email: String,
    company: String,
    contact: String,
    country: String,
    rows: Vec<AddressRow>,
    next_key: u64,
    focus: usize,
    editing: bool,
    errors: ValidationErrors,
    // row order at the last submit; nested errors are indexed against it
    submitted_rows: Vec<RowKey>,
    pending_delete: Option<i64>,
}

impl CustomerFormState {
    /// Blank form for a new customer, seeded with one empty address row
    pub fn new() -> Self {
        let mut state = Self::empty(None);
        state.add_row();
        state
    }

    pub fn from_existing(customer: Customer) -> Self {
        let mut state = Self::empty(Some(customer.id));
        state.name = customer.name;
        state.email = customer.email;
        state.company = customer.company;
        state.contact = customer.contact;
        state.country = customer.country;
        for address in customer.addresses {
            state.push_row(address);
        }
        state
    }

    fn empty(customer_id: Option<i64>) -> Self {
        Self {
            customer_id,
            name: String::new(),
            email: String::new(),
            company: String::new(),
            contact: String::new(),
            country: String::new(),
            rows: Vec::new(),
            next_key: 0,
            focus: 0,
            editing: false,
            errors: ValidationErrors::new(),
            submitted_rows: Vec::new(),
            pending_delete: None,
        }
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.customer_id
    }

    pub fn is_update(&self) -> bool {
        self.customer_id.is_some()
    }

    pub fn rows(&self) -> &[AddressRow] {
        &self.rows
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.rows.iter().map(|row| row.address.clone()).collect()
    }

    fn push_row(&mut self, address: Address) -> RowKey {
        let key = RowKey(self.next_key);
        self.next_key += 1;
        self.rows.push(AddressRow { key, address });
        key
    }

    /// Append an empty address row and return its key
    pub fn add_row(&mut self) -> RowKey {
        self.push_row(Address::default())
    }

    /// Drop a row from the form only; nothing is sent to the backend
    pub fn remove_row(&mut self, key: RowKey) {
        self.rows.retain(|row| row.key != key);
        self.clamp_focus();
    }

    /// Drop the row of an address the backend has just deleted
    pub fn remove_persisted_address(&mut self, id: i64) {
        self.rows.retain(|row| row.address.id != Some(id));
        self.clamp_focus();
    }

    pub fn fields(&self) -> Vec<FormField> {
        let mut fields: Vec<FormField> = CustomerField::ALL
            .iter()
            .map(|&f| FormField::Customer(f))
            .collect();
        for row in &self.rows {
            fields.extend(
                AddressField::ALL
                    .iter()
                    .map(|&f| FormField::Address(row.key, f)),
            );
        }
        fields
    }

    pub fn focused_field(&self) -> Option<FormField> {
        self.fields().get(self.focus).copied()
    }

    pub fn focus_field(&mut self, field: FormField) {
        if let Some(i) = self.fields().iter().position(|f| *f == field) {
            self.focus = i;
        }
    }

    fn focused_row(&self) -> Option<&AddressRow> {
        match self.focused_field()? {
            FormField::Address(key, _) => self.rows.iter().find(|row| row.key == key),
            FormField::Customer(_) => None,
        }
    }

    fn clamp_focus(&mut self) {
        let len = self.fields().len();
        if self.focus >= len {
            self.focus = len.saturating_sub(1);
        }
    }

    pub fn next_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + 1) % len;
    }

    pub fn previous_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_confirming(&self) -> bool {
        self.pending_delete.is_some()
    }

    pub fn value(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Customer(f) => Some(match f {
                CustomerField::Name => &self.name,
                CustomerField::Email => &self.email,
                CustomerField::Company => &self.company,
                CustomerField::Contact => &self.contact,
                CustomerField::Country => &self.country,
            }),
            FormField::Address(key, f) => {
                let address = &self.rows.iter().find(|row| row.key == key)?.address;
                Some(match f {
                    AddressField::No => &address.no,
                    AddressField::Street => &address.street,
                    AddressField::City => &address.city,
                    AddressField::State => &address.state,
                })
            }
        }
    }

    fn value_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Customer(f) => Some(match f {
                CustomerField::Name => &mut self.name,
                CustomerField::Email => &mut self.email,
                CustomerField::Company => &mut self.company,
                CustomerField::Contact => &mut self.contact,
                CustomerField::Country => &mut self.country,
            }),
            FormField::Address(key, f) => {
                let address = &mut self.rows.iter_mut().find(|row| row.key == key)?.address;
                Some(match f {
                    AddressField::No => &mut address.no,
                    AddressField::Street => &mut address.street,
                    AddressField::City => &mut address.city,
                    AddressField::State => &mut address.state,
                })
            }
        }
    }

    pub fn set_value(&mut self, field: FormField, value: &str) {
        if let Some(slot) = self.value_mut(field) {
            *slot = value.to_string();
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }
        let Some(field) = self.focused_field() else {
            return;
        };
        if let Some(value) = self.value_mut(field) {
            match key {
                KeyCode::Char(c) => value.push(c),
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => {}
            }
        }
    }

    /// Build the request body and remember the row order it was sent in.
    /// Errors from the previous attempt no longer apply and are dropped.
    pub fn submit(&mut self) -> CustomerPayload {
        self.submitted_rows = self.rows.iter().map(|row| row.key).collect();
        self.errors = ValidationErrors::new();
        CustomerPayload {
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            contact: self.contact.clone(),
            country: self.country.clone(),
            addresses: self.addresses(),
        }
    }

    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Messages to show beneath `field`
    pub fn errors_for(&self, field: FormField) -> &[String] {
        match field {
            FormField::Customer(f) => self.errors.field(f.key()),
            FormField::Address(key, f) => {
                match self.submitted_rows.iter().position(|k| *k == key) {
                    Some(index) => self.errors.nested("addresses", index, f.key()),
                    None => &[],
                }
            }
        }
    }

    fn row_still_present(&self, index: usize) -> bool {
        self.submitted_rows
            .get(index)
            .is_some_and(|key| self.rows.iter().any(|row| row.key == *key))
    }

    /// Errors that belong to no rendered input, e.g. `addresses` itself
    pub fn unplaced_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|(path, _)| match path {
                FieldPath::Field(name) => !CustomerField::ALL.iter().any(|f| f.key() == name),
                FieldPath::Nested { collection, index, field } => {
                    collection != "addresses"
                        || !self.row_still_present(*index)
                        || !AddressField::ALL.iter().any(|f| f.key() == field)
                }
            })
            .flat_map(|(path, messages)| {
                messages.iter().map(move |m| format!("{}: {}", path, m))
            })
            .collect()
    }
}

impl Default for CustomerFormState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_customer_form<B: Backend>(f: &mut Frame<B>, area: Rect, state: &mut CustomerFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let title_text = if state.is_update() {
        "Update Customer"
    } else {
        "Register a New Customer"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        "Enter/Esc - Done editing"
    } else if state.is_update() {
        "Enter - Edit | Up/Down - Navigate | A - Add address | R - Remove address | X - Delete saved address | S - Update | Esc - Cancel"
    } else {
        "Enter - Edit | Up/Down - Navigate | A - Add address | R - Remove address | S - Save | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if state.is_confirming() {
        render_delete_confirmation(f, area, "Are you sure you want to delete this address?");
    }
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &CustomerFormState, area: Rect) {
    let focused = state.focused_field();
    let mut items: Vec<ListItem> = Vec::new();
    let mut focused_item = None;

    let mut push_field = |items: &mut Vec<ListItem>, field: FormField, label: &str| {
        let is_focused = focused == Some(field);
        if is_focused {
            focused_item = Some(items.len());
        }
        let mut lines = vec![field_spans(
            label,
            state.value(field).unwrap_or_default(),
            is_focused,
            state.editing,
        )];
        lines.extend(error_spans(state.errors_for(field)));
        items.push(ListItem::new(Text::from(lines)));
    };

    for field in CustomerField::ALL {
        push_field(&mut items, FormField::Customer(field), field.label());
    }

    items.push(ListItem::new(Spans::from(Span::styled(
        "Addresses",
        Style::default().add_modifier(Modifier::BOLD),
    ))));

    for (i, row) in state.rows.iter().enumerate() {
        let saved = if row.address.is_persisted() { " (saved)" } else { "" };
        items.push(ListItem::new(Spans::from(Span::styled(
            format!("  Address #{}{}", i + 1, saved),
            Style::default().fg(Color::Cyan),
        ))));
        for field in AddressField::ALL {
            push_field(&mut items, FormField::Address(row.key, field), field.label());
        }
    }

    for message in state.unplaced_errors() {
        items.push(ListItem::new(Spans::from(Span::styled(
            message,
            Style::default().fg(Color::Red),
        ))));
    }

    let mut list_state = ListState::default();
    list_state.select(focused_item);

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Customer Details"));

    f.render_stateful_widget(form_list, area, &mut list_state);
}

pub fn handle_key(state: &mut CustomerFormState, key: KeyCode) -> Option<CustomerFormAction> {
    if let Some(id) = state.pending_delete {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.pending_delete = None;
                return Some(CustomerFormAction::DeleteAddress(id));
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.pending_delete = None,
            _ => {}
        }
        return None;
    }

    if state.editing {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.toggle_editing(),
            _ => state.edit_current_field(key),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(CustomerFormAction::Cancel),
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up => state.previous_field(),
        KeyCode::Down => state.next_field(),
        KeyCode::Char('a') => {
            let key = state.add_row();
            state.focus_field(FormField::Address(key, AddressField::No));
        }
        KeyCode::Char('r') => {
            if let Some(key) = state.focused_row().map(|row| row.key) {
                state.remove_row(key);
            }
        }
        KeyCode::Char('x') if state.is_update() => {
            state.pending_delete = state.focused_row().and_then(|row| row.address.id);
        }
        KeyCode::Char('s') => return Some(CustomerFormAction::Submit),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved_customer() -> Customer {
        Customer {
            id: 5,
            name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
            company: "Acme Ltd".to_string(),
            contact: "555-0100".to_string(),
            country: "NZ".to_string(),
            addresses: vec![
                Address {
                    id: Some(40),
                    no: "1".to_string(),
                    street: "Queen St".to_string(),
                    city: "Auckland".to_string(),
                    state: "AKL".to_string(),
                },
                Address {
                    id: Some(41),
                    no: "2".to_string(),
                    street: "Lambton Quay".to_string(),
                    city: "Wellington".to_string(),
                    state: "WGN".to_string(),
                },
            ],
        }
    }

    fn type_text(state: &mut CustomerFormState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn new_form_has_one_empty_address() {
        let state = CustomerFormState::new();
        assert_eq!(state.addresses(), vec![Address::default()]);
        assert!(!state.is_update());
    }

    #[test]
    fn add_then_remove_restores_rows() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let before = state.addresses();

        let key = state.add_row();
        assert_eq!(state.rows().len(), 3);
        state.remove_row(key);

        assert_eq!(state.addresses(), before);
    }

    #[test]
    fn typing_edits_focused_field() {
        let mut state = CustomerFormState::new();
        type_text(&mut state, "Initech");
        assert_eq!(state.submit().name, "Initech");

        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Backspace);
        handle_key(&mut state, KeyCode::Esc);
        assert_eq!(state.submit().name, "Initec");
    }

    #[test]
    fn add_key_focuses_new_row() {
        let mut state = CustomerFormState::new();
        handle_key(&mut state, KeyCode::Char('a'));
        type_text(&mut state, "221B");

        let addresses = state.addresses();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[1].no, "221B");
        assert_eq!(addresses[0].no, "");
    }

    #[test]
    fn remove_key_only_acts_on_address_rows() {
        let mut state = CustomerFormState::new();
        handle_key(&mut state, KeyCode::Char('r'));
        assert_eq!(state.rows().len(), 1);

        let key = state.rows()[0].key;
        state.focus_field(FormField::Address(key, AddressField::City));
        handle_key(&mut state, KeyCode::Char('r'));
        assert!(state.rows().is_empty());
        assert_eq!(state.focused_field(), Some(FormField::Customer(CustomerField::Country)));
    }

    #[test]
    fn delete_saved_address_asks_first() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let second = state.rows()[1].key;
        state.focus_field(FormField::Address(second, AddressField::Street));

        assert_eq!(handle_key(&mut state, KeyCode::Char('x')), None);
        assert!(state.is_confirming());
        assert_eq!(
            handle_key(&mut state, KeyCode::Char('y')),
            Some(CustomerFormAction::DeleteAddress(41))
        );
    }

    #[test]
    fn unsaved_rows_cannot_be_deleted_remotely() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let key = state.add_row();
        state.focus_field(FormField::Address(key, AddressField::No));
        handle_key(&mut state, KeyCode::Char('x'));
        assert!(!state.is_confirming());

        let mut fresh = CustomerFormState::new();
        let key = fresh.rows()[0].key;
        fresh.focus_field(FormField::Address(key, AddressField::No));
        handle_key(&mut fresh, KeyCode::Char('x'));
        assert!(!fresh.is_confirming());
    }

    #[test]
    fn remove_persisted_address_removes_exactly_one() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        state.remove_persisted_address(40);
        let ids: Vec<_> = state.addresses().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(41)]);
    }

    #[test]
    fn nested_errors_follow_rows_after_removal() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let first = state.rows()[0].key;
        let second = state.rows()[1].key;
        state.submit();

        let errors: ValidationErrors = [
            (FieldPath::field("email"), "The email must be valid.".to_string()),
            (FieldPath::nested("addresses", 1, "city"), "The city is required.".to_string()),
        ]
        .into_iter()
        .collect();
        state.set_errors(errors);

        let city_of = |key| FormField::Address(key, AddressField::City);
        assert_eq!(state.errors_for(city_of(second)), ["The city is required."]);
        assert!(state.errors_for(city_of(first)).is_empty());
        assert_eq!(
            state.errors_for(FormField::Customer(CustomerField::Email)),
            ["The email must be valid."]
        );

        // the message stays with its row even though it is now at index 0
        state.remove_row(first);
        assert_eq!(state.errors_for(city_of(second)), ["The city is required."]);
    }

    #[test]
    fn unknown_error_keys_are_listed_separately() {
        let mut state = CustomerFormState::new();
        state.submit();
        let errors: ValidationErrors = [
            (FieldPath::field("addresses"), "At least one address.".to_string()),
            (FieldPath::nested("addresses", 3, "street"), "Missing.".to_string()),
            (FieldPath::field("name"), "Required.".to_string()),
        ]
        .into_iter()
        .collect();
        state.set_errors(errors);

        assert_eq!(
            state.unplaced_errors(),
            vec![
                "addresses: At least one address.".to_string(),
                "addresses.3.street: Missing.".to_string(),
            ]
        );
    }

    #[test]
    fn errors_of_removed_rows_move_to_unplaced() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let first = state.rows()[0].key;
        state.submit();
        let errors: ValidationErrors = [(
            FieldPath::nested("addresses", 0, "street"),
            "Street required.".to_string(),
        )]
        .into_iter()
        .collect();
        state.set_errors(errors);
        assert!(state.unplaced_errors().is_empty());

        state.remove_row(first);

        assert_eq!(
            state.unplaced_errors(),
            vec!["addresses.0.street: Street required.".to_string()]
        );
    }

    #[test]
    fn resubmitting_drops_stale_row_errors() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let first = state.rows()[0].key;
        state.submit();
        let errors: ValidationErrors = [(
            FieldPath::nested("addresses", 1, "street"),
            "Street required.".to_string(),
        )]
        .into_iter()
        .collect();
        state.set_errors(errors);

        state.remove_row(first);
        let fresh = state.add_row();
        state.submit();

        assert!(state.errors().is_empty());
        assert!(state.errors_for(FormField::Address(fresh, AddressField::Street)).is_empty());
        assert!(state.unplaced_errors().is_empty());
    }

    #[test]
    fn submit_sends_rows_in_form_order() {
        let mut state = CustomerFormState::from_existing(saved_customer());
        let key = state.add_row();
        state.set_value(FormField::Address(key, AddressField::Street), "Cuba St");

        let payload = state.submit();
        assert_eq!(payload.name, "Acme");
        assert_eq!(payload.addresses.len(), 3);
        assert_eq!(payload.addresses[2].street, "Cuba St");
        assert_eq!(payload.addresses[2].id, None);
        assert_eq!(handle_key(&mut state, KeyCode::Char('s')), Some(CustomerFormAction::Submit));
    }
}
