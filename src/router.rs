//! Client-side routes, the login guard and the header navigation.

use std::fmt;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Customers,
    CustomerAdd,
    CustomerUpdate(i64),
    ProjectAdd,
    ProjectUpdate(i64),
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["login"] => Some(Route::Login),
            ["customers"] => Some(Route::Customers),
            ["customers", "add"] => Some(Route::CustomerAdd),
            ["customers", "update", id] => id.parse().ok().map(Route::CustomerUpdate),
            ["projects", "add"] => Some(Route::ProjectAdd),
            ["projects", "update", id] => id.parse().ok().map(Route::ProjectUpdate),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Customers => "/customers".to_string(),
            Route::CustomerAdd => "/customers/add".to_string(),
            Route::CustomerUpdate(id) => format!("/customers/update/{}", id),
            Route::ProjectAdd => "/projects/add".to_string(),
            Route::ProjectUpdate(id) => format!("/projects/update/{}", id),
        }
    }

    /// Everything except the index and the login page needs a user
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Home | Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// The screen to render for `requested`. Protected routes show the login
/// form in place; the login route shows Home once a user is present.
pub fn resolve(requested: Route, session: &Session) -> Route {
    match requested {
        Route::Login if session.is_authenticated() => Route::Home,
        route if route.is_protected() && !session.is_authenticated() => Route::Login,
        route => route,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Go(Route),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub key: char,
    pub label: &'static str,
    pub target: NavTarget,
}

impl NavLink {
    const fn new(key: char, label: &'static str, target: NavTarget) -> Self {
        Self { key, label, target }
    }
}

pub fn nav_links(current: Route, session: &Session) -> Vec<NavLink> {
    let mut links = vec![NavLink::new('H', "Home", NavTarget::Go(Route::Home))];

    if !session.is_authenticated() {
        links.push(NavLink::new('L', "Login", NavTarget::Go(Route::Login)));
        return links;
    }

    if current == Route::Customers {
        links.push(NavLink::new('A', "New Customer", NavTarget::Go(Route::CustomerAdd)));
    } else {
        links.push(NavLink::new('C', "Customers", NavTarget::Go(Route::Customers)));
        if current != Route::ProjectAdd {
            links.push(NavLink::new('P', "New Project", NavTarget::Go(Route::ProjectAdd)));
        }
    }
    links.push(NavLink::new('L', "Logout", NavTarget::Logout));

    links
}

/// Header greeting for the logged-in user
pub fn welcome(session: &Session) -> Option<String> {
    session
        .user()
        .map(|user| format!("Welcome back {}", user.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn logged_in() -> Session {
        let mut session = Session::new();
        session.login(
            User {
                id: 7,
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
            },
            "token",
        );
        session
    }

    fn labels(links: &[NavLink]) -> Vec<&'static str> {
        links.iter().map(|link| link.label).collect()
    }

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Home,
            Route::Login,
            Route::Customers,
            Route::CustomerAdd,
            Route::CustomerUpdate(12),
            Route::ProjectAdd,
            Route::ProjectUpdate(3),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert_eq!(Route::parse("/projects"), None);
        assert_eq!(Route::parse("/customers/update/abc"), None);
        assert_eq!(Route::parse("/projects/4/edit"), None);
        assert_eq!(Route::parse("/customers/"), Some(Route::Customers));
    }

    #[test]
    fn guard_renders_login_in_place() {
        let anonymous = Session::new();
        assert_eq!(resolve(Route::Customers, &anonymous), Route::Login);
        assert_eq!(resolve(Route::ProjectUpdate(1), &anonymous), Route::Login);
        assert_eq!(resolve(Route::Home, &anonymous), Route::Home);
        assert_eq!(resolve(Route::Login, &anonymous), Route::Login);

        let session = logged_in();
        assert_eq!(resolve(Route::Customers, &session), Route::Customers);
        assert_eq!(resolve(Route::Login, &session), Route::Home);
    }

    #[test]
    fn restored_token_without_user_is_still_guarded() {
        let session = Session::with_token("stale");
        assert_eq!(resolve(Route::CustomerAdd, &session), Route::Login);
    }

    #[test]
    fn nav_for_anonymous_user() {
        let links = nav_links(Route::Home, &Session::new());
        assert_eq!(labels(&links), ["Home", "Login"]);
        assert_eq!(welcome(&Session::new()), None);
    }

    #[test]
    fn nav_on_customer_list_offers_new_customer() {
        let links = nav_links(Route::Customers, &logged_in());
        assert_eq!(labels(&links), ["Home", "New Customer", "Logout"]);
    }

    #[test]
    fn nav_hides_new_project_on_project_add() {
        let session = logged_in();
        assert_eq!(
            labels(&nav_links(Route::Home, &session)),
            ["Home", "Customers", "New Project", "Logout"]
        );
        assert_eq!(
            labels(&nav_links(Route::ProjectAdd, &session)),
            ["Home", "Customers", "Logout"]
        );
        assert_eq!(welcome(&session).as_deref(), Some("Welcome back Grace"));
    }
}
