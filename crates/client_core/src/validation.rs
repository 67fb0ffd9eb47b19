use shared::protocol::{CategoryDraft, NewAccount, NewTicket, RegisterRequest};

use crate::error::ValidationError;

pub const PASSWORD_SPECIALS: &str = "@#$!%*?&";
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be a positive amount"));
    }
    Ok(())
}

/// Sign-up form as typed by the user, before it becomes a `RegisterRequest`.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("password", &self.password)?;
        require("confirm_password", &self.confirm_password)?;
        validate_email(&self.email)?;
        if !self.phone.trim().is_empty() {
            validate_phone(&self.phone)?;
        }
        validate_password_strength(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::new(
                "confirm_password",
                "passwords do not match",
            ));
        }

        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            phone: self.phone.trim().to_string(),
        })
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::new("email", "must contain '@'"));
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ValidationError::new("email", "is not a valid address"));
    }
    Ok(())
}

/// 10 to 15 digits, optionally with a leading `+` and spaces or dashes.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if body
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-'))
    {
        return Err(ValidationError::new("phone", "may only contain digits"));
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(10..=15).contains(&digits) {
        return Err(ValidationError::new("phone", "must have 10 to 15 digits"));
    }
    Ok(())
}

pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if long_enough && has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::new(
            "password",
            format!(
                "must be at least {MIN_PASSWORD_LEN} characters and include uppercase, lowercase, number and one of {PASSWORD_SPECIALS}"
            ),
        ))
    }
}

pub fn validate_account(account: &NewAccount) -> Result<(), ValidationError> {
    require("bank_name", &account.bank_name)?;
    require("account_type", &account.account_type)?;
    if !account.balance.is_finite() {
        return Err(ValidationError::new("balance", "must be a number"));
    }
    Ok(())
}

pub fn validate_category(category: &CategoryDraft) -> Result<(), ValidationError> {
    require("name", &category.name)
}

pub fn validate_ticket(ticket: &NewTicket) -> Result<(), ValidationError> {
    require("subject", &ticket.subject)?;
    require("description", &ticket.description)?;
    require("category", &ticket.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Asha Rao".into(),
            email: "Asha@Bank.in".into(),
            phone: "+91 98765-43210".into(),
            password: "Str0ng@pass".into(),
            confirm_password: "Str0ng@pass".into(),
        }
    }

    #[test]
    fn valid_form_keeps_email_as_typed() {
        let request = RegistrationForm {
            email: "  Asha@Bank.in ".into(),
            ..form()
        }
        .validate()
        .expect("valid");
        assert_eq!(request.email, "Asha@Bank.in");
        assert_eq!(request.name, "Asha Rao");
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let mut f = form();
        f.name = "   ".into();
        assert_eq!(f.validate().expect_err("invalid").field, "name");
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let mut f = form();
        f.confirm_password = "Str0ng@pasS".into();
        let err = f.validate().expect_err("invalid");
        assert_eq!(err.field, "confirm_password");
    }

    #[test]
    fn weak_passwords_are_rejected() {
        for weak in ["Sh0rt@", "alllower1@", "ALLUPPER1@", "NoDigits@@", "NoSpecial11"] {
            assert!(
                validate_password_strength(weak).is_err(),
                "accepted weak password {weak}"
            );
        }
        assert!(validate_password_strength("short1@A").is_ok());
    }

    #[test]
    fn phone_length_is_checked() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("user@bank.in").is_ok());
        assert!(validate_email("user.bank.in").is_err());
        assert!(validate_email("user@bank").is_err());
        assert!(validate_email("@bank.in").is_err());
    }

    #[test]
    fn ticket_requires_subject_and_description() {
        let ticket = NewTicket {
            subject: "Card blocked".into(),
            description: "".into(),
            category: "cards".into(),
        };
        assert_eq!(validate_ticket(&ticket).expect_err("invalid").field, "description");
    }
}
