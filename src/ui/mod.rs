pub mod components;
pub mod customer_form;
pub mod customers;
pub mod layout;
pub mod login;
pub mod project_form;
pub mod projects;
