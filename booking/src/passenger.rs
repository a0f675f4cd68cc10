//! Passenger contact form: draft, validation and profile pre-fill.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Problem with one form field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldError {
    /// First name left blank
    FirstNameRequired,
    /// Last name left blank
    LastNameRequired,
    /// Phone left blank
    PhoneRequired,
    /// Phone is not 9 to 15 digits with an optional leading `+`
    PhoneInvalid,
}

impl FieldError {
    /// Text shown next to the field
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::FirstNameRequired => "Введите имя",
            Self::LastNameRequired => "Введите фамилию",
            Self::PhoneRequired => "Введите номер телефона",
            Self::PhoneInvalid => "Некорректный номер телефона",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Per-field validation errors of a submitted form
#[derive(Clone, Debug, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("passenger form has invalid fields")]
pub struct PassengerErrors {
    /// First name error
    pub first_name: Option<FieldError>,
    /// Last name error
    pub last_name: Option<FieldError>,
    /// Phone error
    pub phone: Option<FieldError>,
}

impl PassengerErrors {
    /// Whether no field has an error
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

/// Validated passenger contact data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Phone as entered (trimmed)
    pub phone: String,
    /// Optional email, not validated
    pub email: Option<String>,
}

/// Profile data usable for pre-filling the form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
}

/// Form draft as typed by the passenger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerForm {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Phone number
    pub phone: String,
    /// Email address
    pub email: String,
}

/// Whether `raw` is a phone number: after removing whitespace and dashes, an
/// optional `+` followed by 9 to 15 ASCII digits
#[must_use]
pub fn is_valid_phone(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (9..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl PassengerForm {
    /// Validate the draft
    ///
    /// # Errors
    ///
    /// Returns every field problem at once.
    pub fn validate(&self) -> Result<PassengerDetails, PassengerErrors> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let phone = self.phone.trim();

        let errors = PassengerErrors {
            first_name: first_name.is_empty().then_some(FieldError::FirstNameRequired),
            last_name: last_name.is_empty().then_some(FieldError::LastNameRequired),
            phone: if phone.is_empty() {
                Some(FieldError::PhoneRequired)
            } else if is_valid_phone(phone) {
                None
            } else {
                Some(FieldError::PhoneInvalid)
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let email = self.email.trim();
        Ok(PassengerDetails {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: phone.to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
        })
    }

    /// Pre-fill from profiles
    ///
    /// Each field takes the backend profile value, else the identity-provider
    /// value, else keeps what is already there. Blank values count as absent.
    pub fn prefill(&mut self, profile: Option<&ProfileData>, identity: Option<&ProfileData>) {
        fn merge(
            current: &mut String,
            pick: impl Fn(&ProfileData) -> Option<&String>,
            profile: Option<&ProfileData>,
            identity: Option<&ProfileData>,
        ) {
            let chosen = present(profile.and_then(&pick)).or_else(|| present(identity.and_then(&pick)));
            if let Some(value) = chosen {
                *current = value.to_string();
            }
        }

        merge(&mut self.first_name, |p| p.first_name.as_ref(), profile, identity);
        merge(&mut self.last_name, |p| p.last_name.as_ref(), profile, identity);
        merge(&mut self.phone, |p| p.phone.as_ref(), profile, identity);
        merge(&mut self.email, |p| p.email.as_ref(), profile, identity);
    }

    /// Draft holding previously confirmed details
    #[must_use]
    pub fn from_details(details: &PassengerDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            phone: details.phone.clone(),
            email: details.email.clone().unwrap_or_default(),
        }
    }
}
