//! Client-side form checks. Nothing here touches the network, and every
//! function is safe to call on each keystroke.

use crate::error::{ClientError, Result};
use crate::models::auth::RegistrationForm;
use crate::models::candidate::ApplicationForm;
use regex::Regex;
use std::sync::OnceLock;

pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "yahoo.co.in",
    "yahoo.co.uk",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "msn.com",
    "icloud.com",
    "me.com",
    "mac.com",
    "protonmail.com",
    "proton.me",
    "aol.com",
    "zoho.com",
    "mail.com",
    "yandex.com",
    "gmx.com",
    "fastmail.com",
];

pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProblem {
    Malformed,
    DisallowedProvider,
}

impl EmailProblem {
    pub fn message(&self) -> &'static str {
        match self {
            EmailProblem::Malformed => "Invalid email format",
            EmailProblem::DisallowedProvider => {
                "Please use a legitimate email provider (Gmail, Yahoo, Outlook, etc.)"
            }
        }
    }
}

pub fn validate_email(email: &str) -> std::result::Result<(), EmailProblem> {
    if !email_pattern().is_match(email) {
        return Err(EmailProblem::Malformed);
    }

    let domain = email
        .split('@')
        .nth(1)
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_EMAIL_DOMAINS.contains(&domain.as_str()) {
        Ok(())
    } else {
        Err(EmailProblem::DisallowedProvider)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 4] = [
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::Symbol,
    ];

    pub fn is_satisfied_by(&self, password: &str) -> bool {
        match self {
            PasswordRule::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            PasswordRule::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            PasswordRule::Digit => password.chars().any(|c| c.is_ascii_digit()),
            PasswordRule::Symbol => password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PasswordRule::Uppercase => "one uppercase letter",
            PasswordRule::Lowercase => "one lowercase letter",
            PasswordRule::Digit => "one number",
            PasswordRule::Symbol => "one special character (!@#$%^&*...)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    pub score: u8,
    /// Empty for untouched (empty) input.
    pub label: &'static str,
    pub is_valid: bool,
    pub missing: Vec<PasswordRule>,
    pub message: String,
}

pub fn password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength {
            score: 0,
            label: "",
            is_valid: false,
            missing: PasswordRule::ALL.to_vec(),
            message: String::new(),
        };
    }

    let missing: Vec<PasswordRule> = PasswordRule::ALL
        .iter()
        .copied()
        .filter(|rule| !rule.is_satisfied_by(password))
        .collect();
    let satisfied = PasswordRule::ALL.len() - missing.len();

    let label = match satisfied {
        0 => "Very Weak",
        1 => "Weak",
        2 => "Fair",
        3 => "Good",
        _ => "Strong",
    };

    let message = if missing.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = missing.iter().map(PasswordRule::description).collect();
        format!("Password must contain {}", names.join(", "))
    };

    PasswordStrength {
        score: 25 * satisfied as u8,
        label,
        is_valid: missing.is_empty(),
        missing,
        message,
    }
}

/// Registration checks in the order the form reports them.
pub fn validate_registration(form: &RegistrationForm) -> Result<()> {
    if let Err(problem) = validate_email(&form.email) {
        return Err(ClientError::Validation(problem.message().to_string()));
    }

    let strength = password_strength(&form.password);
    if !strength.is_valid {
        let message = if strength.message.is_empty() {
            "Password is too weak".to_string()
        } else {
            strength.message
        };
        return Err(ClientError::Validation(message));
    }

    if form.password != form.confirm_password {
        return Err(ClientError::Validation("Passwords do not match".to_string()));
    }

    Ok(())
}

pub fn validate_application(form: &ApplicationForm) -> Result<()> {
    let problem = if form.name.trim().is_empty() {
        Some("Please enter your full name")
    } else if form.dob.trim().is_empty() {
        Some("Please select your date of birth")
    } else if form.gender.trim().is_empty() {
        Some("Please select your gender")
    } else if form.description.trim().is_empty() {
        Some("Please enter your description/manifesto")
    } else {
        None
    };

    match problem {
        Some(message) => Err(ClientError::Validation(message.to_string())),
        None => Ok(()),
    }
}
