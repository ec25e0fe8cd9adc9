//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 100 {
        return Err("Name must be at most 100 characters long".to_string());
    }

    Ok(())
}

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

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}
