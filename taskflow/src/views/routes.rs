//! Routing shell
//!
//! Maps URL paths to views. Protected views send anonymous users to the
//! login page; public views send signed-in users to the dashboard. Nothing
//! renders while the initial session check is running.

use crate::services::auth::AuthStatus;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Project(String),
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Dashboard,
            "/login" => Route::Login,
            "/register" => Route::Register,
            _ => match trimmed.strip_prefix("/projects/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Project(id.to_string()),
                _ => Route::NotFound,
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Project(id) => format!("/projects/{}", id),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Only reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Only reachable with a session
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Project(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Initial session check in flight; render nothing yet
    Pending,
    Render(Route),
    Redirect(Route),
}

/// Decide what to show for `path` given the session state
pub fn resolve(path: &str, status: &AuthStatus) -> Navigation {
    let route = Route::parse(path);

    let signed_in = match status {
        AuthStatus::Loading => return Navigation::Pending,
        AuthStatus::Anonymous => false,
        AuthStatus::Authenticated(_) => true,
    };

    if route.is_protected() && !signed_in {
        return Navigation::Redirect(Route::Login);
    }
    if route.is_public() && signed_in {
        return Navigation::Redirect(Route::Dashboard);
    }

    Navigation::Render(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::User;

    fn signed_in() -> AuthStatus {
        AuthStatus::Authenticated(User {
            id: "u1".to_string(),
            email: None,
        })
    }

    #[test]
    fn test_parse() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/register/"), Route::Register);
        assert_eq!(Route::parse("/projects/abc?tab=1"), Route::Project("abc".to_string()));
        assert_eq!(Route::parse("/projects/"), Route::NotFound);
        assert_eq!(Route::parse("/projects/a/b"), Route::NotFound);
        assert_eq!(Route::parse("/auth/callback"), Route::NotFound);
    }

    #[test]
    fn test_path_round_trip() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Dashboard,
            Route::Project("p1".to_string()),
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_protected_routes_redirect_to_login() {
        let anon = AuthStatus::Anonymous;
        assert_eq!(resolve("/", &anon), Navigation::Redirect(Route::Login));
        assert_eq!(resolve("/projects/p1", &anon), Navigation::Redirect(Route::Login));
        assert_eq!(resolve("/login", &anon), Navigation::Render(Route::Login));
        assert_eq!(resolve("/register", &anon), Navigation::Render(Route::Register));
    }

    #[test]
    fn test_public_routes_redirect_home_when_signed_in() {
        let user = signed_in();
        assert_eq!(resolve("/login", &user), Navigation::Redirect(Route::Dashboard));
        assert_eq!(resolve("/register", &user), Navigation::Redirect(Route::Dashboard));
        assert_eq!(resolve("/", &user), Navigation::Render(Route::Dashboard));
        assert_eq!(
            resolve("/projects/p1", &user),
            Navigation::Render(Route::Project("p1".to_string()))
        );
    }

    #[test]
    fn test_nothing_renders_while_loading() {
        assert_eq!(resolve("/", &AuthStatus::Loading), Navigation::Pending);
        assert_eq!(resolve("/login", &AuthStatus::Loading), Navigation::Pending);
    }
}
