//! Registration form validation.
//!
//! Messages follow the usual web-framework wording so existing clients can
//! display them unchanged.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::forms::{non_blank, FormErrors, REQUIRED};
use crate::models::Sex;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const AGE_MIN: u32 = 1;
pub const AGE_MAX: u32 = 120;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "1234567890", "qwertyuiop",
    "iloveyou", "sunshine", "princess", "football", "baseball", "welcome1",
    "abc12345", "qwerty123", "letmein1", "trustno1", "passw0rd", "admin123",
];

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("valid email regex")
    })
}

/// Raw submitted registration fields.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
}

/// A registration that passed every check not requiring the database.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
}

impl RegistrationForm {
    /// Builds the form from any field lookup (JSON object, urlencoded pairs,
    /// multipart text parts).
    pub fn from_lookup<F>(get: F) -> RegistrationForm
    where
        F: Fn(&str) -> Option<String>,
    {
        RegistrationForm {
            username: get("username"),
            email: get("email"),
            password1: get("password1"),
            password2: get("password2"),
            age: get("age"),
            sex: get("sex"),
        }
    }

    pub fn clean(&self) -> Result<CleanRegistration, FormErrors> {
        let mut errors = FormErrors::new();

        let username = non_blank(self.username.as_deref());
        match username {
            None => errors.add("username", REQUIRED),
            Some(u) if u.chars().count() > USERNAME_MAX_LEN => errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters (it has {}).", u.chars().count()),
            ),
            Some(u) if !username_re().is_match(u) => errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ),
            Some(_) => {}
        }

        let email = non_blank(self.email.as_deref());
        match email {
            None => errors.add("email", REQUIRED),
            Some(e) if !email_re().is_match(e) => errors.add("email", "Enter a valid email address."),
            Some(_) => {}
        }

        // Passwords are not trimmed.
        let password1 = self.password1.as_deref().filter(|p| !p.is_empty());
        let password2 = self.password2.as_deref().filter(|p| !p.is_empty());
        if password1.is_none() {
            errors.add("password1", REQUIRED);
        }
        match (password1, password2) {
            (_, None) => errors.add("password2", REQUIRED),
            (Some(p1), Some(p2)) if p1 != p2 => {
                errors.add("password2", "The two password fields didn\u{2019}t match.")
            }
            (Some(p), Some(_)) => {
                for msg in password_problems(p, username.unwrap_or(""), email.unwrap_or("")) {
                    errors.add("password2", msg);
                }
            }
            (None, Some(_)) => {}
        }

        let age = match non_blank(self.age.as_deref()) {
            None => None,
            Some(raw) => match parse_whole_number(raw) {
                None => {
                    errors.add("age", "Enter a whole number.");
                    None
                }
                Some(n) if n < AGE_MIN as i64 => {
                    errors.add("age", format!("Ensure this value is greater than or equal to {AGE_MIN}."));
                    None
                }
                Some(n) if n > AGE_MAX as i64 => {
                    errors.add("age", format!("Ensure this value is less than or equal to {AGE_MAX}."));
                    None
                }
                Some(n) => Some(n as u32),
            },
        };

        let sex = match non_blank(self.sex.as_deref()) {
            None => None,
            Some(raw) => match Sex::from_str(raw) {
                Ok(s) => Some(s),
                Err(_) => {
                    errors.add("sex", format!("Select a valid choice. {raw} is not one of the available choices."));
                    None
                }
            },
        };

        errors.into_result(CleanRegistration {
            username: username.unwrap_or_default().to_owned(),
            email: email.unwrap_or_default().to_owned(),
            password: password1.unwrap_or_default().to_owned(),
            age,
            sex,
        })
    }
}

/// Accepts "42" and "42.0" (JSON numbers often arrive as floats).
fn parse_whole_number(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e12).then_some(f as i64)
}

fn password_problems(password: &str, username: &str, email: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let lower = password.to_lowercase();

    let email_local = email.split('@').next().unwrap_or("");
    let similar = [username, email_local]
        .iter()
        .map(|s| s.to_lowercase())
        .filter(|s| s.len() >= 3)
        .any(|attr| lower.contains(&attr) || attr.contains(&lower));
    if similar {
        problems.push("The password is too similar to the username.".to_owned());
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
        ));
    }
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        problems.push("This password is too common.".to_owned());
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_owned());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> RegistrationForm {
        RegistrationForm::from_lookup(|k| {
            pairs.iter().find(|(name, _)| *name == k).map(|(_, v)| v.to_string())
        })
    }

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("username", "jdoe"),
            ("email", "jdoe@example.com"),
            ("password1", "Xr4y-Lungs!"),
            ("password2", "Xr4y-Lungs!"),
            ("age", "45"),
            ("sex", "F"),
        ]
    }

    #[test]
    fn accepts_valid_submission() {
        let clean = form(&valid()).clean().unwrap();
        assert_eq!(clean.username, "jdoe");
        assert_eq!(clean.age, Some(45));
        assert_eq!(clean.sex, Some(Sex::Female));
    }

    #[test]
    fn optional_demographics_may_be_blank() {
        let mut fields = valid();
        fields.retain(|(k, _)| *k != "age");
        fields.push(("age", ""));
        fields.retain(|(k, _)| *k != "sex");
        let clean = form(&fields).clean().unwrap();
        assert_eq!((clean.age, clean.sex), (None, None));
    }

    #[test]
    fn reports_every_missing_required_field() {
        let errors = form(&[]).clean().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["email", "password1", "password2", "username"]);
    }

    #[test]
    fn password_mismatch() {
        let mut fields = valid();
        fields[3] = ("password2", "something-else");
        let errors = form(&fields).clean().unwrap_err();
        assert_eq!(errors.get("password2").unwrap().len(), 1);
        assert!(errors.get("password2").unwrap()[0].contains("didn"));
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let mut fields = valid();
        fields[2] = ("password1", "1234567");
        fields[3] = ("password2", "1234567");
        let msgs = form(&fields).clean().unwrap_err().get("password2").unwrap().to_vec();
        assert!(msgs.iter().any(|m| m.contains("too short")));
        assert!(msgs.iter().any(|m| m.contains("entirely numeric")));

        fields[2] = ("password1", "jdoe-1234");
        fields[3] = ("password2", "jdoe-1234");
        let msgs = form(&fields).clean().unwrap_err().get("password2").unwrap().to_vec();
        assert!(msgs.iter().any(|m| m.contains("too similar")));
    }

    #[test]
    fn age_bounds_and_format() {
        for (raw, expect) in [("0", "greater than"), ("121", "less than"), ("old", "whole number"), ("3.5", "whole number")] {
            let mut fields = valid();
            fields[4] = ("age", raw);
            let errors = form(&fields).clean().unwrap_err();
            assert!(errors.get("age").unwrap()[0].contains(expect), "{raw}");
        }
        let mut fields = valid();
        fields[4] = ("age", "30.0");
        assert_eq!(form(&fields).clean().unwrap().age, Some(30));
    }

    #[test]
    fn bad_username_email_and_sex() {
        let mut fields = valid();
        fields[0] = ("username", "john doe");
        fields[1] = ("email", "not-an-email");
        fields[5] = ("sex", "X");
        let errors = form(&fields).clean().unwrap_err();
        assert!(errors.get("username").is_some());
        assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);
        assert!(errors.get("sex").unwrap()[0].contains("X is not one of"));
    }
}
