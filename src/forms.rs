//! Submitted forms and their field-level validation. Field rules are declared
//! with `validator`; each form then converts into the domain input the
//! handlers pass on, or into `FieldErrors` for re-render.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::models::service::parse_price;
use crate::models::user::normalize_email;
use crate::models::{parse_date, parse_time, BookingStatus, BusinessFields, ServiceFields, WorkingHour};
use crate::services::scheduling::BookingRequest;

#[derive(Debug, Default, Clone)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            for e in errs {
                let message = match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                };
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

/// Runs the declared field rules.
fn check<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::default(),
        Err(errors) => errors.into(),
    }
}

// ── Helpers ──

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Blank inputs become `None`.
fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(optional(&String::deserialize(deserializer)?))
}

/// Untrimmed; only an empty value becomes `None`. Used for passwords.
fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok((!value.is_empty()).then_some(value))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn checked(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on" | "true" | "1" | "y" | "yes"))
}

// ── Auth ──

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "This field is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    pub next: String,
}

impl LoginForm {
    /// Returns the normalized email once both fields are present.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        check(self).into_result(normalize_email(&self.email))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Must be at most 120 characters.")
    )]
    pub email: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "Must be between 2 and 50 characters."))]
    pub first_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "Must be between 2 and 50 characters."))]
    pub last_name: String,
    #[validate(length(min = 6, message = "Must be at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        check(self).into_result(Registration {
            email: normalize_email(&self.email),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password: self.password.clone(),
        })
    }
}

// ── Business ──

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct BusinessForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Must be between 2 and 100 characters."))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 20, message = "Must be at most 20 characters."))]
    pub phone: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 255, message = "Must be at most 255 characters."))]
    pub address: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub description: String,
}

fn business_fields(name: &str, phone: &str, address: &str, description: &str) -> BusinessFields {
    BusinessFields {
        name: name.trim().to_string(),
        phone: optional(phone),
        address: optional(address),
        description: optional(description),
    }
}

impl BusinessForm {
    pub fn validate(&self) -> Result<BusinessFields, FieldErrors> {
        check(self).into_result(business_fields(
            &self.name,
            &self.phone,
            &self.address,
            &self.description,
        ))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AdminBusinessForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Must be between 2 and 100 characters."))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 20, message = "Must be at most 20 characters."))]
    pub phone: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 255, message = "Must be at most 255 characters."))]
    pub address: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub description: String,
    pub owner_id: String,
    pub is_active: Option<String>,
}

#[derive(Debug)]
pub struct AdminBusinessInput {
    pub fields: BusinessFields,
    pub owner_id: i64,
    pub is_active: bool,
}

impl AdminBusinessForm {
    pub fn is_active(&self) -> bool {
        checked(&self.is_active)
    }

    pub fn validate(&self) -> Result<AdminBusinessInput, FieldErrors> {
        let mut errors = check(self);
        let owner_id = match self.owner_id.trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                errors.add("owner_id", "Choose an owner.");
                0
            }
        };
        errors.into_result(AdminBusinessInput {
            fields: business_fields(&self.name, &self.phone, &self.address, &self.description),
            owner_id,
            is_active: self.is_active(),
        })
    }
}

// ── Services ──

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ServiceForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Must be between 2 and 100 characters."))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub description: String,
    #[serde(deserialize_with = "trimmed")]
    pub price: String,
    #[serde(deserialize_with = "trimmed")]
    pub duration_minutes: String,
}

impl ServiceForm {
    /// Text rules come from the form; numeric ranges from `ServiceFields`.
    /// A duration that is not a number is reported as out of range.
    pub fn validate(&self) -> Result<ServiceFields, FieldErrors> {
        let mut errors = check(self);

        let price_cents = match parse_price(&self.price) {
            Some(cents) => cents,
            None => {
                errors.add("price", "Enter a non-negative amount with at most two decimals.");
                0
            }
        };

        let fields = ServiceFields {
            name: self.name.trim().to_string(),
            description: optional(&self.description),
            price_cents,
            duration_minutes: self.duration_minutes.trim().parse().unwrap_or(0),
        };
        errors.extend(check(&fields));
        errors.into_result(fields)
    }
}

// ── Working hours ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkingHourForm {
    pub open_time: String,
    pub close_time: String,
    pub is_closed: Option<String>,
}

impl WorkingHourForm {
    pub fn from_hour(hour: &WorkingHour) -> Self {
        Self {
            open_time: crate::models::format_time(&hour.open_time),
            close_time: crate::models::format_time(&hour.close_time),
            is_closed: hour.is_closed.then(|| "on".to_string()),
        }
    }

    pub fn is_closed(&self) -> bool {
        checked(&self.is_closed)
    }

    /// A closed day may leave the times blank; the stored ones are kept.
    pub fn validate(&self, current: &WorkingHour) -> Result<(NaiveTime, NaiveTime, bool), FieldErrors> {
        let mut errors = FieldErrors::default();
        let closed = self.is_closed();

        let open = parse_time(&self.open_time);
        let close = parse_time(&self.close_time);

        if closed {
            return Ok((
                open.unwrap_or(current.open_time),
                close.unwrap_or(current.close_time),
                true,
            ));
        }

        if open.is_none() {
            errors.add("open_time", "Enter a time as HH:MM.");
        }
        if close.is_none() {
            errors.add("close_time", "Enter a time as HH:MM.");
        }
        if let (Some(o), Some(c)) = (open, close) {
            if c <= o {
                errors.add("close_time", "Closing time must be after opening time.");
            }
        }

        errors.into_result((
            open.unwrap_or(current.open_time),
            close.unwrap_or(current.close_time),
            false,
        ))
    }
}

// ── Bookings ──

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct BookingForm {
    #[serde(deserialize_with = "trimmed")]
    pub service_id: String,
    #[serde(deserialize_with = "trimmed")]
    pub booking_date: String,
    #[serde(deserialize_with = "trimmed")]
    pub booking_time: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Must be between 2 and 100 characters."))]
    pub customer_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 20, message = "Must be between 10 and 20 characters."))]
    pub customer_phone: String,
    #[serde(deserialize_with = "trimmed_opt")]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Must be at most 120 characters.")
    )]
    pub customer_email: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub notes: String,
}

impl BookingForm {
    pub fn service_id(&self) -> Option<i64> {
        self.service_id.trim().parse().ok()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.booking_date)
    }

    /// Validates everything except the service, which needs the store.
    pub fn validate(&self, today: NaiveDate) -> Result<BookingRequest, FieldErrors> {
        let mut errors = check(self);

        if self.service_id().is_none() {
            errors.add("service_id", "Choose a service.");
        }

        let date = match self.date() {
            Some(d) if d < today => {
                errors.add("booking_date", "Choose a date that is not in the past.");
                today
            }
            Some(d) => d,
            None => {
                errors.add("booking_date", "Enter a date as YYYY-MM-DD.");
                today
            }
        };

        let time = match parse_time(&self.booking_time) {
            Some(t) => t,
            None => {
                errors.add("booking_time", "Choose a time.");
                NaiveTime::MIN
            }
        };

        errors.into_result(BookingRequest {
            date,
            time,
            customer_name: self.customer_name.trim().to_string(),
            customer_phone: self.customer_phone.trim().to_string(),
            customer_email: self.customer_email.as_deref().map(normalize_email),
            notes: optional(&self.notes),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: String,
}

impl StatusForm {
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::parse(self.status.trim())
    }
}

// ── Admin users ──

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AdminUserForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Must be at most 120 characters.")
    )]
    pub email: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "Must be between 2 and 50 characters."))]
    pub first_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "Must be between 2 and 50 characters."))]
    pub last_name: String,
    #[serde(deserialize_with = "non_empty")]
    #[validate(length(min = 6, message = "Must be at least 6 characters."))]
    pub password: Option<String>,
    pub is_admin: Option<String>,
}

#[derive(Debug)]
pub struct AdminUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: Option<String>,
    pub is_admin: bool,
}

impl AdminUserForm {
    pub fn is_admin(&self) -> bool {
        checked(&self.is_admin)
    }

    /// New users need a password; on edit a blank password keeps the old one.
    pub fn validate(&self, password_required: bool) -> Result<AdminUserInput, FieldErrors> {
        let mut errors = check(self);
        if password_required && self.password.is_none() {
            errors.add("password", "This field is required.");
        }

        errors.into_result(AdminUserInput {
            email: normalize_email(&self.email),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password: self.password.clone(),
            is_admin: self.is_admin(),
        })
    }
}
