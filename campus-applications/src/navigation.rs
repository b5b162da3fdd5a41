//! Navigation port
//!
//! The application never renders anything itself; it tells a [`Navigator`]
//! where to go. The login location remembers where the visitor was headed
//! as `/login?from=<encoded path>`.

use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

pub const LOGIN_PATH: &str = "/login";
pub const INDEX_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Where to continue after logging in (login location only)
    pub return_to: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { INDEX_PATH.to_string() } else { path },
            return_to: None,
        }
    }

    /// The login screen, remembering `from` unless it is the login screen
    /// itself
    pub fn login(from: Option<&Location>) -> Self {
        Self {
            path: LOGIN_PATH.to_string(),
            return_to: from
                .filter(|location| !location.is_login())
                .map(|location| location.path.clone()),
        }
    }

    /// Parse an href such as `/courses/3` or `/login?from=%2Fcourses%2F3`
    pub fn parse(href: &str) -> Self {
        let Some((path, query)) = href.split_once('?') else {
            return Self::new(href);
        };

        if path != LOGIN_PATH {
            return Self::new(href);
        }

        let return_to = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "from")
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(|value| value.into_owned())
            .filter(|value| !value.is_empty());

        Self {
            path: path.to_string(),
            return_to,
        }
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }

    pub fn is_index(&self) -> bool {
        self.path == INDEX_PATH
    }

    pub fn href(&self) -> String {
        match &self.return_to {
            Some(from) => format!("{}?from={}", self.path, urlencoding::encode(from)),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

impl From<&str> for Location {
    fn from(href: &str) -> Self {
        Location::parse(href)
    }
}

/// Where screens get switched
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Location);

    fn current(&self) -> Option<Location>;
}

/// Navigator that keeps the visited locations in order
#[derive(Debug, Default)]
pub struct NavigationHistory {
    entries: Mutex<Vec<Location>>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Location> {
        self.entries.lock().clone()
    }
}

impl Navigator for NavigationHistory {
    fn navigate(&self, to: Location) {
        debug!(to = %to, "Navigating");
        self.entries.lock().push(to);
    }

    fn current(&self) -> Option<Location> {
        self.entries.lock().last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_location_roundtrip() {
        let requested = Location::new("/courses/3?tab=lessons");
        let login = Location::login(Some(&requested));
        assert_eq!(login.href(), "/login?from=%2Fcourses%2F3%3Ftab%3Dlessons");

        let parsed = Location::parse(&login.href());
        assert!(parsed.is_login());
        assert_eq!(parsed.return_to.as_deref(), Some("/courses/3?tab=lessons"));
    }

    #[test]
    fn test_login_never_returns_to_itself() {
        let login = Location::login(Some(&Location::new(LOGIN_PATH)));
        assert_eq!(login.return_to, None);
        assert_eq!(login.href(), "/login");
    }

    #[test]
    fn test_history_tracks_current() {
        let history = NavigationHistory::new();
        assert!(history.current().is_none());
        history.navigate(Location::new("/courses"));
        history.navigate(Location::new(""));
        assert_eq!(history.current().unwrap().path, "/");
        assert_eq!(history.entries().len(), 2);
    }
}
