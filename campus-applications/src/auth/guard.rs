//! Route Guard
//!
//! Decides per navigation whether a screen renders, or where the visitor is
//! sent instead. A pure function of (session, requested location, required
//! roles); it holds no state of its own.

use crate::navigation::Location;
use crate::session::Session;
use campus_core::{Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The boot check is still running; show a neutral loading indicator
    Loading,
    /// Nobody is logged in; go to login and come back afterwards
    RedirectToLogin { location: Location },
    /// Logged in, but this screen is for someone else (or is the index)
    RedirectHome { location: Location },
    Render,
}

impl GuardDecision {
    /// Where the navigator should go, if anywhere
    pub fn redirect(&self) -> Option<&Location> {
        match self {
            GuardDecision::RedirectToLogin { location }
            | GuardDecision::RedirectHome { location } => Some(location),
            GuardDecision::Loading | GuardDecision::Render => None,
        }
    }
}

/// Evaluate a navigation.
///
/// `required_roles` of `None` means any logged-in user may open the screen.
/// The login screen itself is public.
pub fn evaluate(
    session: &Session,
    requested: &Location,
    required_roles: Option<&[Role]>,
) -> GuardDecision {
    if !session.is_ready() {
        return GuardDecision::Loading;
    }

    let Some(user) = &session.identity else {
        if requested.is_login() {
            return GuardDecision::Render;
        }
        return GuardDecision::RedirectToLogin {
            location: Location::login(Some(requested)),
        };
    };

    if requested.is_login() {
        return GuardDecision::RedirectHome {
            location: after_login(user, requested.return_to.as_deref()),
        };
    }

    if let Some(roles) = required_roles {
        if !roles.contains(&user.role) {
            return GuardDecision::RedirectHome {
                location: home_for(user.role),
            };
        }
    }

    if requested.is_index() {
        return GuardDecision::RedirectHome {
            location: home_for(user.role),
        };
    }

    GuardDecision::Render
}

pub fn home_for(role: Role) -> Location {
    Location::new(role.home_path())
}

/// Where a fresh login lands: the remembered location, or the role's home.
///
/// Only same-origin paths are honored; anything else lands on the home.
pub fn after_login(user: &User, return_to: Option<&str>) -> Location {
    match return_to {
        Some(path) if is_local_path(path) => {
            let location = Location::new(path);
            if location.is_login() || location.is_index() {
                home_for(user.role)
            } else {
                location
            }
        }
        _ => home_for(user.role),
    }
}

/// A single leading slash, not `//host` or `/\host`
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/') && !matches!(chars.next(), Some('/') | Some('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LoadingState;

    fn user(role: Role) -> User {
        User {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            display_name: None,
            role,
            avatar: None,
        }
    }

    fn ready(identity: Option<User>) -> Session {
        Session {
            identity,
            loading: LoadingState::Ready,
            authenticated_at: None,
        }
    }

    #[test]
    fn test_checking_session_defers_decision() {
        let decision = evaluate(
            &Session::checking(),
            &Location::new("/admin/reports"),
            Some(&[Role::Admin][..]),
        );
        assert_eq!(decision, GuardDecision::Loading);
        assert!(decision.redirect().is_none());
    }

    #[test]
    fn test_anonymous_visitor_goes_to_login_with_return_path() {
        let decision = evaluate(
            &ready(None),
            &Location::new("/admin/reports"),
            Some(&[Role::Admin][..]),
        );
        match decision {
            GuardDecision::RedirectToLogin { location } => {
                assert!(location.is_login());
                assert_eq!(location.return_to.as_deref(), Some("/admin/reports"));
            }
            other => panic!("Expected login redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_visitor_may_open_login() {
        let decision = evaluate(&ready(None), &Location::new("/login"), None);
        assert_eq!(decision, GuardDecision::Render);
    }

    #[test]
    fn test_wrong_role_goes_home_not_to_login() {
        let decision = evaluate(
            &ready(Some(user(Role::Student))),
            &Location::new("/teacher/courses"),
            Some(&[Role::Teacher][..]),
        );
        assert_eq!(
            decision,
            GuardDecision::RedirectHome {
                location: Location::new("/student/dashboard")
            }
        );
    }

    #[test]
    fn test_every_role_has_its_own_home() {
        for (role, home) in [
            (Role::Student, "/student/dashboard"),
            (Role::Teacher, "/teacher/dashboard"),
            (Role::Admin, "/admin/dashboard"),
        ] {
            let decision = evaluate(&ready(Some(user(role))), &Location::new("/"), None);
            assert_eq!(decision.redirect().unwrap().path, home);
        }
    }

    #[test]
    fn test_member_role_renders() {
        let decision = evaluate(
            &ready(Some(user(Role::Teacher))),
            &Location::new("/teacher/courses"),
            Some(&[Role::Teacher, Role::Admin][..]),
        );
        assert_eq!(decision, GuardDecision::Render);

        let decision = evaluate(
            &ready(Some(user(Role::Student))),
            &Location::new("/courses"),
            None,
        );
        assert_eq!(decision, GuardDecision::Render);
    }

    #[test]
    fn test_logged_in_user_skips_login_screen() {
        let decision = evaluate(
            &ready(Some(user(Role::Student))),
            &Location::parse("/login?from=%2Fcourses%2F9"),
            None,
        );
        assert_eq!(decision.redirect().unwrap().path, "/courses/9");
    }

    #[test]
    fn test_after_login_ignores_foreign_return_paths() {
        let teacher = user(Role::Teacher);
        for target in [
            "//evil.example",
            "//evil.example/teacher/dashboard",
            "/\\evil.example",
            "https://evil.example/login",
            "javascript:alert(1)",
            "teacher/courses",
        ] {
            assert_eq!(
                after_login(&teacher, Some(target)).path,
                "/teacher/dashboard",
                "{} must not be followed",
                target
            );
        }
    }

    #[test]
    fn test_after_login_targets() {
        let student = user(Role::Student);
        assert_eq!(after_login(&student, None).path, "/student/dashboard");
        assert_eq!(after_login(&student, Some("/login")).path, "/student/dashboard");
        assert_eq!(after_login(&student, Some("/")).path, "/student/dashboard");
        assert_eq!(after_login(&student, Some("/courses/2")).path, "/courses/2");
        assert_eq!(after_login(&student, Some("")).path, "/student/dashboard");
    }
}
