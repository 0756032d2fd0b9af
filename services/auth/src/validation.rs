//! Input validation utilities

use anyhow::Result;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Emails are unique case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A single password strength requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength(usize),
    RequireUppercase,
    RequireLowercase,
    RequireDigit,
    RequireSpecial,
}

impl PasswordRule {
    /// Returns the failure message when `password` breaks this rule
    pub fn check(&self, password: &str) -> Option<String> {
        let satisfied = match self {
            PasswordRule::MinLength(min) => password.chars().count() >= *min,
            PasswordRule::RequireUppercase => password.chars().any(|c| c.is_uppercase()),
            PasswordRule::RequireLowercase => password.chars().any(|c| c.is_lowercase()),
            PasswordRule::RequireDigit => password.chars().any(|c| c.is_ascii_digit()),
            PasswordRule::RequireSpecial => password.chars().any(|c| !c.is_alphanumeric()),
        };

        if satisfied {
            return None;
        }

        Some(match self {
            PasswordRule::MinLength(min) => {
                format!("Password must be at least {} characters long", min)
            }
            PasswordRule::RequireUppercase => {
                "Password must contain at least one uppercase letter".to_string()
            }
            PasswordRule::RequireLowercase => {
                "Password must contain at least one lowercase letter".to_string()
            }
            PasswordRule::RequireDigit => "Password must contain at least one number".to_string(),
            PasswordRule::RequireSpecial => {
                "Password must contain at least one special character".to_string()
            }
        })
    }
}

impl FromStr for PasswordRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uppercase" => Ok(PasswordRule::RequireUppercase),
            "lowercase" => Ok(PasswordRule::RequireLowercase),
            "digit" => Ok(PasswordRule::RequireDigit),
            "special" => Ok(PasswordRule::RequireSpecial),
            other => Err(format!("unknown password rule: {}", other)),
        }
    }
}

/// Ordered set of password rules; the first failing rule is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    rules: Vec<PasswordRule>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            rules: vec![PasswordRule::MinLength(8)],
        }
    }
}

impl PasswordPolicy {
    pub fn new(rules: Vec<PasswordRule>) -> Self {
        Self { rules }
    }

    /// Build the policy from the environment
    ///
    /// # Environment Variables
    /// - `PASSWORD_RULES`: comma-separated extra rules on top of the 8
    ///   character minimum (`uppercase`, `lowercase`, `digit`, `special`)
    pub fn from_env() -> Result<Self> {
        let mut policy = Self::default();

        if let Ok(raw) = std::env::var("PASSWORD_RULES") {
            for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
                let rule = name.parse::<PasswordRule>().map_err(anyhow::Error::msg)?;
                if !policy.rules.contains(&rule) {
                    policy.rules.push(rule);
                }
            }
        }

        Ok(policy)
    }

    pub fn rules(&self) -> &[PasswordRule] {
        &self.rules
    }

    /// Validate password strength against every rule in order
    pub fn validate_password_strength(&self, password: &str) -> Result<(), String> {
        match self.rules.iter().find_map(|rule| rule.check(password)) {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }
}
