//! Payload validation
//!
//! Each field runs its checks in order and reports only the first failure,
//! while every failing field is reported.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{Result, ValidationErrors};
use crate::models::{NewUser, ValidNewUser};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Minimum entropy (in bits) a password needs to be accepted
pub const MIN_PASSWORD_ENTROPY: f64 = 80.0;

/// Checks for one text field
struct Field<'a> {
    name: &'static str,
    value: Option<&'a str>,
}

impl<'a> Field<'a> {
    fn new(name: &'static str, value: &'a Option<String>) -> Self {
        Self {
            name,
            value: value.as_deref(),
        }
    }

    fn not_blank(self, errors: &mut ValidationErrors, message: &str) -> Option<&'a str> {
        match self.value {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                errors.add(self.name, message);
                None
            }
        }
    }
}

fn max_chars(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
    message: &str,
) -> bool {
    if value.chars().count() > max {
        errors.add(field, message);
        false
    } else {
        true
    }
}

/// Whether `email` looks like an address
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Estimated entropy of a password in bits
///
/// The character pool is the sum of the classes present (lowercase 26,
/// uppercase 26, digits 10, symbols 33, control 33, non-ASCII 128). Repeated
/// bytes only add `log2(distinct)` bits each.
pub fn password_entropy(password: &str) -> f64 {
    let bytes = password.as_bytes();
    if bytes.is_empty() {
        return 0.0;
    }

    let distinct: BTreeSet<u8> = bytes.iter().copied().collect();
    let (mut control, mut digit, mut upper, mut lower, mut symbol, mut other) =
        (0u32, 0u32, 0u32, 0u32, 0u32, 0u32);

    for &b in &distinct {
        match b {
            0..=31 | 127 => control = 33,
            b'0'..=b'9' => digit = 10,
            b'A'..=b'Z' => upper = 26,
            b'a'..=b'z' => lower = 26,
            128..=255 => other = 128,
            _ => symbol = 33,
        }
    }

    let pool = f64::from(control + digit + upper + lower + symbol + other);
    let chars = distinct.len() as f64;
    let repeats = (bytes.len() - distinct.len()) as f64;

    chars * pool.log2() + repeats * chars.log2()
}

/// Whether a password is strong enough to be stored
pub fn is_strong_password(password: &str) -> bool {
    password_entropy(password) >= MIN_PASSWORD_ENTROPY
}

impl NewUser {
    /// Check the creation payload and collect every failing field
    pub fn validate(&self) -> Result<ValidNewUser> {
        let mut errors = ValidationErrors::new();

        let username = Field::new("username", &self.username)
            .not_blank(&mut errors, "You must enter a username")
            .filter(|v| {
                max_chars(
                    &mut errors,
                    "username",
                    v,
                    180,
                    "The username must be a maximum of 180 characters",
                )
            });

        let password = Field::new("password", &self.password)
            .not_blank(&mut errors, "You must enter a password")
            .filter(|v| {
                let strong = is_strong_password(v);
                if !strong {
                    errors.add(
                        "password",
                        "Your password is too weak. Add numbers, upper, lower and special characters",
                    );
                }
                strong
            });

        let name = Field::new("name", &self.name)
            .not_blank(&mut errors, "You must enter a name")
            .filter(|v| {
                max_chars(
                    &mut errors,
                    "name",
                    v,
                    50,
                    "The name must be a maximum of 50 characters",
                )
            });

        let surname = Field::new("surname", &self.surname)
            .not_blank(&mut errors, "You must enter a surname")
            .filter(|v| {
                max_chars(
                    &mut errors,
                    "surname",
                    v,
                    50,
                    "The surname must be a maximum of 50 characters",
                )
            });

        let email = Field::new("email", &self.email)
            .not_blank(&mut errors, "You must enter an email address")
            .filter(|v| {
                max_chars(
                    &mut errors,
                    "email",
                    v,
                    50,
                    "The email must be a maximum of 50 characters",
                )
            })
            .filter(|v| {
                let valid = is_valid_email(v);
                if !valid {
                    errors.add("email", "Incorrect email address");
                }
                valid
            });

        match (username, password, name, surname, email) {
            (Some(username), Some(password), Some(name), Some(surname), Some(email))
                if errors.is_empty() =>
            {
                Ok(ValidNewUser {
                    username: username.to_string(),
                    password: password.to_string(),
                    name: name.to_string(),
                    surname: surname.to_string(),
                    email: email.to_string(),
                })
            }
            _ => Err(errors.into()),
        }
    }
}
