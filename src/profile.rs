use serde::{Deserialize, Serialize};

use crate::models::StudentProfile;

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 500;

/// Raw fields as posted by the profile form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub emergency_phone: String,
}

impl From<&StudentProfile> for ProfileForm {
    fn from(profile: &StudentProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            emergency_contact: profile.emergency_contact.clone().unwrap_or_default(),
            emergency_phone: profile.emergency_phone.clone().unwrap_or_default(),
        }
    }
}

/// A validated profile change, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

impl ProfileForm {
    /// Trims every field and checks it; returns one message per failed field.
    pub fn validate(&self) -> Result<ProfileUpdate, Vec<String>> {
        let mut errors = Vec::new();

        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_ascii_lowercase();

        if first_name.is_empty() || first_name.len() > MAX_NAME_LEN {
            errors.push(format!("First name is required (max {MAX_NAME_LEN} characters)."));
        }
        if last_name.is_empty() || last_name.len() > MAX_NAME_LEN {
            errors.push(format!("Last name is required (max {MAX_NAME_LEN} characters)."));
        }
        if !valid_email(&email) {
            errors.push("Email address is not valid.".to_string());
        }

        let phone = optional(&self.phone);
        if phone.as_deref().is_some_and(|p| !valid_phone(p)) {
            errors.push("Phone number is not valid.".to_string());
        }
        let emergency_phone = optional(&self.emergency_phone);
        if emergency_phone.as_deref().is_some_and(|p| !valid_phone(p)) {
            errors.push("Emergency phone number is not valid.".to_string());
        }

        let address = optional(&self.address);
        if address.as_deref().is_some_and(|a| a.len() > MAX_ADDRESS_LEN) {
            errors.push(format!("Address is too long (max {MAX_ADDRESS_LEN} characters)."));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProfileUpdate {
            first_name,
            last_name,
            email,
            phone,
            address,
            emergency_contact: optional(&self.emergency_contact),
            emergency_phone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProfileForm {
        ProfileForm {
            first_name: " Maya ".to_string(),
            last_name: "Chen".to_string(),
            email: "Maya.Chen@Campus.edu".to_string(),
            phone: "+1 (555) 010-2000".to_string(),
            address: "".to_string(),
            emergency_contact: "Lin Chen".to_string(),
            emergency_phone: "".to_string(),
        }
    }

    #[test]
    fn valid_form_is_normalized() {
        let update = form().validate().unwrap();
        assert_eq!(update.first_name, "Maya");
        assert_eq!(update.email, "maya.chen@campus.edu");
        assert_eq!(update.phone.as_deref(), Some("+1 (555) 010-2000"));
        assert_eq!(update.address, None);
        assert_eq!(update.emergency_phone, None);
        assert_eq!(update.emergency_contact.as_deref(), Some("Lin Chen"));
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut bad = form();
        bad.first_name = "   ".to_string();
        bad.last_name = String::new();
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["", "maya", "maya@", "@campus.edu", "maya@campus", "maya@@campus.edu", "ma ya@campus.edu"] {
            let mut bad = form();
            bad.email = email.to_string();
            assert!(bad.validate().is_err(), "accepted {email:?}");
        }
    }

    #[test]
    fn phone_must_look_like_a_number() {
        let mut bad = form();
        bad.phone = "call me".to_string();
        assert!(bad.validate().is_err());

        let mut short = form();
        short.emergency_phone = "12-34".to_string();
        assert_eq!(
            short.validate().unwrap_err(),
            vec!["Emergency phone number is not valid.".to_string()]
        );
    }
}
