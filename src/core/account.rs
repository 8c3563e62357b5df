use crate::utils::error::{FieldErrors, Result};
use crate::utils::validation::{has_mixed_case_and_digit, is_plausible_email};
use serde::{Deserialize, Serialize};

pub const MIN_REGISTRATION_PASSWORD: usize = 8;
pub const MIN_LOGIN_PASSWORD: usize = 6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub university: String,
    pub major: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_to_terms: bool,
}

impl RegistrationForm {
    /// Check every field and report all problems at once, keyed by field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();

        if self.full_name.trim().is_empty() {
            errors.add("full_name", "Full name is required");
        }

        check_email(&self.email, &mut errors);

        if self.university.trim().is_empty() {
            errors.add("university", "University is required");
        }

        if self.major.trim().is_empty() {
            errors.add("major", "Major is required");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_REGISTRATION_PASSWORD {
            errors.add("password", "Password must be at least 8 characters");
        } else if !has_mixed_case_and_digit(&self.password) {
            errors.add(
                "password",
                "Password must contain at least one uppercase letter, one lowercase letter, and one number",
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        if !self.agree_to_terms {
            errors.add("agree_to_terms", "You must agree to the terms and conditions");
        }

        errors.into_result()
    }

    /// Initial username: the local part of the email address.
    pub fn username(&self) -> &str {
        let email = self.email.trim();
        email.split('@').next().unwrap_or(email)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();

        check_email(&self.email, &mut errors);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_LOGIN_PASSWORD {
            errors.add("password", "Password must be at least 6 characters");
        }

        errors.into_result()
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !is_plausible_email(email) {
        errors.add("email", "Please enter a valid email address");
    }
}
