//! Application state machine.
//!
//! `App` owns the backend client, the session and the screen currently on
//! display. Key presses go to the screen, the screen answers with an action,
//! and the action is carried out here against the backend.

use crossterm::event::KeyCode;

use crate::api::{ApiError, ApiResult, CrmApi};
use crate::router::{nav_links, resolve, NavTarget, Route};
use crate::session::{Session, SessionStore};
use crate::ui::customer_form::{self, CustomerFormAction, CustomerFormState};
use crate::ui::customers::{self, CustomerListAction, CustomersState};
use crate::ui::login::{self, LoginAction, LoginState};
use crate::ui::project_form::{self, ProjectFormAction, ProjectFormState};
use crate::ui::projects::{self, ProjectAction, ProjectsState};

// Represents the screen currently rendered
pub enum Screen {
    Login(LoginState),
    Home(ProjectsState),
    Customers(CustomersState),
    CustomerForm(CustomerFormState),
    ProjectForm(ProjectFormState),
}

impl Screen {
    /// True while typed characters belong to the screen (text entry or a
    /// confirmation popup), so the header shortcuts are off
    pub fn captures_keys(&self) -> bool {
        match self {
            Screen::Login(state) => state.is_editing(),
            Screen::Home(state) => state.is_confirming(),
            Screen::Customers(state) => state.is_confirming(),
            Screen::CustomerForm(state) => state.is_editing() || state.is_confirming(),
            Screen::ProjectForm(state) => state.is_editing() || state.is_picker_open(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

enum ScreenAction {
    Login(LoginAction),
    Projects(ProjectAction),
    Customers(CustomerListAction),
    CustomerForm(CustomerFormAction),
    ProjectForm(ProjectFormAction),
}

pub struct App<A: CrmApi> {
    api: A,
    session: Session,
    store: Option<SessionStore>,
    route: Route,
    screen: Screen,
    status: Option<Status>,
    should_quit: bool,
}

impl<A: CrmApi> App<A> {
    pub fn new(api: A, session: Session, store: Option<SessionStore>) -> Self {
        Self {
            api,
            session,
            store,
            route: Route::Home,
            screen: Screen::Home(ProjectsState::new(Vec::new())),
            status: None,
            should_quit: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Leave the event loop from any screen
    pub fn quit(&mut self) {
        tracing::debug!(route = %self.route, "quit requested");
        self.should_quit = true;
    }

    fn report(&mut self, context: &str, err: &ApiError) {
        tracing::warn!(error = %err, "{}", context);
        self.status = Some(Status::Error(format!("{}: {}", context, err)));
    }

    fn token(&self) -> ApiResult<String> {
        self.session
            .token()
            .map(str::to_string)
            .ok_or(ApiError::MissingToken)
    }

    /// Resolve a token persisted by an earlier run into a user. Only a token
    /// the backend answers with 401 is forgotten.
    pub async fn restore_session(&mut self) {
        let Some(token) = self.session.token().map(str::to_string) else {
            return;
        };
        if self.session.is_authenticated() {
            return;
        }

        match self.api.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user = %user.email, "session restored");
                self.session.login(user, token);
            }
            Err(ApiError::Unauthorized(message)) => {
                tracing::info!(%message, "stored token rejected");
                self.session.logout();
                self.forget_token();
            }
            // backend unreachable or failing; the token may still be good
            Err(err) => self.report("Could not restore session", &err),
        }
    }

    fn forget_token(&mut self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.clear() {
                tracing::warn!(error = %err, "could not remove session file");
            }
        }
    }

    /// Switch to `requested`, loading whatever the screen needs. When the
    /// load fails the current screen stays up.
    pub async fn navigate(&mut self, requested: Route) {
        let target = resolve(requested, &self.session);

        match self.load_screen(target).await {
            Ok(Some(screen)) => {
                tracing::debug!(route = %requested, screen = %target, "navigate");
                self.route = requested;
                self.screen = screen;
            }
            Ok(None) => {
                // Home without a token goes to the login form
                self.route = Route::Login;
                self.screen = Screen::Login(LoginState::new());
            }
            Err(err) => self.report(&format!("Could not open {}", requested), &err),
        }
    }

    async fn load_screen(&self, target: Route) -> ApiResult<Option<Screen>> {
        let screen = match target {
            Route::Login => Screen::Login(LoginState::new()),
            Route::Home => {
                let Some(token) = self.session.token() else {
                    return Ok(None);
                };
                Screen::Home(ProjectsState::new(self.api.list_projects(token).await?))
            }
            Route::Customers => {
                let customers = self.api.list_customers(&self.token()?).await?;
                Screen::Customers(CustomersState::new(customers))
            }
            Route::CustomerAdd => Screen::CustomerForm(CustomerFormState::new()),
            Route::CustomerUpdate(id) => {
                let customer = self.api.get_customer(&self.token()?, id).await?;
                Screen::CustomerForm(CustomerFormState::from_existing(customer))
            }
            Route::ProjectAdd => {
                let roster = self.api.list_customers(&self.token()?).await?;
                Screen::ProjectForm(ProjectFormState::new(roster))
            }
            Route::ProjectUpdate(id) => {
                let token = self.token()?;
                let project = self.api.get_project(&token, id).await?;
                let roster = self.api.list_customers(&token).await?;
                Screen::ProjectForm(ProjectFormState::from_existing(project, roster))
            }
        };
        Ok(Some(screen))
    }

    pub async fn handle_key(&mut self, key: KeyCode) {
        self.status = None;

        if !self.screen.captures_keys() {
            let link = nav_links(self.route, &self.session)
                .into_iter()
                .find(|link| key == KeyCode::Char(link.key));
            if let Some(link) = link {
                match link.target {
                    NavTarget::Go(route) => self.navigate(route).await,
                    NavTarget::Logout => self.logout().await,
                }
                return;
            }
        }

        let action = match &mut self.screen {
            Screen::Login(state) => login::handle_key(state, key).map(ScreenAction::Login),
            Screen::Home(state) => projects::handle_key(state, key).map(ScreenAction::Projects),
            Screen::Customers(state) => {
                customers::handle_key(state, key).map(ScreenAction::Customers)
            }
            Screen::CustomerForm(state) => {
                customer_form::handle_key(state, key).map(ScreenAction::CustomerForm)
            }
            Screen::ProjectForm(state) => {
                project_form::handle_key(state, key).map(ScreenAction::ProjectForm)
            }
        };

        match action {
            Some(ScreenAction::Login(action)) => self.on_login(action).await,
            Some(ScreenAction::Projects(action)) => self.on_projects(action).await,
            Some(ScreenAction::Customers(action)) => self.on_customers(action).await,
            Some(ScreenAction::CustomerForm(action)) => self.on_customer_form(action).await,
            Some(ScreenAction::ProjectForm(action)) => self.on_project_form(action).await,
            None => {}
        }
    }

    async fn on_login(&mut self, action: LoginAction) {
        match action {
            LoginAction::Back => self.navigate(Route::Home).await,
            LoginAction::Exit => self.should_quit = true,
            LoginAction::Submit => {
                let Screen::Login(state) = &self.screen else {
                    return;
                };
                let credentials = state.credentials().clone();

                match self.api.login(&credentials).await {
                    Ok(grant) => {
                        tracing::info!(user = %grant.user.email, "logged in");
                        if let Some(store) = &self.store {
                            if let Err(err) = store.save(&grant.token) {
                                tracing::warn!(error = %err, "could not persist session");
                            }
                        }
                        self.session.login(grant.user, grant.token);
                        // a guarded route that sent us here is shown now
                        let next = if self.route == Route::Login { Route::Home } else { self.route };
                        self.navigate(next).await;
                    }
                    Err(ApiError::Validation(errors)) => {
                        if let Screen::Login(state) = &mut self.screen {
                            state.set_errors(errors);
                        }
                    }
                    Err(err) => self.report("Login failed", &err),
                }
            }
        }
    }

    pub async fn logout(&mut self) {
        if let Some(token) = self.session.token().map(str::to_string) {
            if let Err(err) = self.api.logout(&token).await {
                self.report("Logout failed", &err);
                return;
            }
        }

        tracing::info!("logged out");
        self.session.logout();
        self.forget_token();
        self.navigate(Route::Login).await;
    }

    async fn on_projects(&mut self, action: ProjectAction) {
        match action {
            ProjectAction::Exit => self.should_quit = true,
            ProjectAction::NewProject => self.navigate(Route::ProjectAdd).await,
            ProjectAction::EditProject(id) => self.navigate(Route::ProjectUpdate(id)).await,
            ProjectAction::DeleteProject(id) => {
                let result = match self.token() {
                    Ok(token) => self.api.delete_project(&token, id).await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(()) => {
                        tracing::info!(project = id, "project deleted");
                        self.refresh_projects().await;
                    }
                    Err(err) => self.report("Could not delete project", &err),
                }
            }
        }
    }

    async fn refresh_projects(&mut self) {
        let result = match self.token() {
            Ok(token) => self.api.list_projects(&token).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(projects) => {
                if let Screen::Home(state) = &mut self.screen {
                    state.replace_projects(projects);
                }
            }
            Err(err) => self.report("Could not load projects", &err),
        }
    }

    async fn on_customers(&mut self, action: CustomerListAction) {
        match action {
            CustomerListAction::Back => self.navigate(Route::Home).await,
            CustomerListAction::NewCustomer => self.navigate(Route::CustomerAdd).await,
            CustomerListAction::EditCustomer(id) => {
                self.navigate(Route::CustomerUpdate(id)).await
            }
            CustomerListAction::DeleteCustomer(id) => {
                let result = match self.token() {
                    Ok(token) => self.api.delete_customer(&token, id).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = result {
                    self.report("Could not delete customer", &err);
                }
                self.refresh_customers().await;
            }
            CustomerListAction::DeleteAddress(id) => {
                let result = match self.token() {
                    Ok(token) => self.api.delete_address(&token, id).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = result {
                    self.report("Could not delete address", &err);
                }
                self.refresh_customers().await;
            }
        }
    }

    async fn refresh_customers(&mut self) {
        let result = match self.token() {
            Ok(token) => self.api.list_customers(&token).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(list) => {
                if let Screen::Customers(state) = &mut self.screen {
                    state.replace_customers(list);
                }
            }
            Err(err) => self.report("Could not load customers", &err),
        }
    }

    async fn on_customer_form(&mut self, action: CustomerFormAction) {
        if action == CustomerFormAction::Cancel {
            return self.navigate(Route::Customers).await;
        }
        let token = match self.token() {
            Ok(token) => token,
            Err(err) => return self.report("Not saved", &err),
        };

        match action {
            CustomerFormAction::Cancel => {}
            CustomerFormAction::Submit => {
                let Screen::CustomerForm(state) = &mut self.screen else {
                    return;
                };
                let payload = state.submit();
                let result = match state.customer_id() {
                    Some(id) => self.api.update_customer(&token, id, &payload).await,
                    None => self.api.create_customer(&token, &payload).await,
                };

                match result {
                    Ok(()) => {
                        tracing::info!(customer = %payload.name, "customer saved");
                        self.navigate(Route::Customers).await;
                    }
                    Err(ApiError::Validation(errors)) => {
                        if let Screen::CustomerForm(state) = &mut self.screen {
                            state.set_errors(errors);
                        }
                    }
                    Err(err) => self.report("Could not save customer", &err),
                }
            }
            CustomerFormAction::DeleteAddress(id) => {
                match self.api.delete_address(&token, id).await {
                    Ok(()) => {
                        if let Screen::CustomerForm(state) = &mut self.screen {
                            state.remove_persisted_address(id);
                        }
                        self.status = Some(Status::Info("Address deleted".to_string()));
                    }
                    Err(err) => self.report("Could not delete address", &err),
                }
            }
        }
    }

    async fn on_project_form(&mut self, action: ProjectFormAction) {
        if action == ProjectFormAction::Cancel {
            return self.navigate(Route::Home).await;
        }
        let Screen::ProjectForm(state) = &self.screen else {
            return;
        };
        let payload = state.payload();
        let id = match action {
            ProjectFormAction::Update(id) => Some(id),
            _ => None,
        };

        let result = match self.token() {
            Ok(token) => match id {
                Some(id) => self.api.update_project(&token, id, &payload).await,
                None => self.api.create_project(&token, &payload).await,
            },
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!(project = %payload.name, "project saved");
                self.navigate(Route::Home).await;
            }
            Err(ApiError::Validation(errors)) => {
                if let Screen::ProjectForm(state) = &mut self.screen {
                    state.set_errors(errors);
                }
            }
            Err(err) => self.report("Could not save project", &err),
        }
    }
}
