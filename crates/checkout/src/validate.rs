//! Checkout form validation.
//!
//! Contact name, surname, phone, and email are always required; address and
//! city only when the delivery method is ship. Validation happens before any
//! network call and reports every missing field at once.

use lapacho_core::{Contact, DeliveryMethod, Email};

use crate::error::CheckoutError;

/// Raw user input from the checkout form.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub notes: String,
}

/// A validated form: canonical contact plus ship-only fields.
#[derive(Debug, Clone)]
pub struct ValidatedForm {
    pub contact: Contact,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: String,
}

/// Validate the form for the chosen delivery method.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] naming every missing or malformed
/// field.
pub fn validate(form: &CheckoutForm, method: DeliveryMethod) -> Result<ValidatedForm, CheckoutError> {
    let mut missing = Vec::new();

    for (field, value) in [
        ("name", &form.name),
        ("surname", &form.surname),
        ("phone", &form.phone),
    ] {
        if value.trim().is_empty() {
            missing.push(field.to_owned());
        }
    }

    let email = match Email::parse(form.email.trim()) {
        Ok(email) => Some(email),
        Err(_) => {
            missing.push("email".to_owned());
            None
        }
    };

    let (address, city) = if method.requires_address() {
        if form.address.trim().is_empty() {
            missing.push("address".to_owned());
        }
        if form.city.trim().is_empty() {
            missing.push("city".to_owned());
        }
        (
            Some(form.address.trim().to_owned()),
            Some(form.city.trim().to_owned()),
        )
    } else {
        (None, None)
    };

    if !missing.is_empty() {
        return Err(CheckoutError::Validation(missing));
    }

    let Some(email) = email else {
        return Err(CheckoutError::Validation(vec!["email".to_owned()]));
    };

    Ok(ValidatedForm {
        contact: Contact {
            name: form.name.trim().to_owned(),
            surname: form.surname.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
            email,
        },
        address,
        city,
        notes: form.notes.trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> CheckoutForm {
        CheckoutForm {
            name: "Ana".to_owned(),
            surname: "Gómez".to_owned(),
            phone: "362-400-0000".to_owned(),
            email: "ana@example.com".to_owned(),
            address: "Av. Sarmiento 1200".to_owned(),
            city: "Resistencia".to_owned(),
            notes: String::new(),
        }
    }

    #[test]
    fn complete_form_validates_for_ship() {
        let validated = validate(&complete_form(), DeliveryMethod::Ship).unwrap();
        assert_eq!(validated.contact.name, "Ana");
        assert_eq!(validated.address.as_deref(), Some("Av. Sarmiento 1200"));
    }

    #[test]
    fn ship_requires_address_and_city() {
        let mut form = complete_form();
        form.address.clear();
        form.city.clear();

        let err = validate(&form, DeliveryMethod::Ship).unwrap_err();
        let CheckoutError::Validation(missing) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(missing, vec!["address", "city"]);
    }

    #[test]
    fn pickup_does_not_require_address() {
        let mut form = complete_form();
        form.address.clear();
        form.city.clear();

        let validated = validate(&form, DeliveryMethod::Pickup).unwrap();
        assert_eq!(validated.address, None);
        assert_eq!(validated.city, None);
    }

    #[test]
    fn contact_fields_are_always_required() {
        let mut form = complete_form();
        form.name.clear();
        form.phone = "   ".to_owned();

        let err = validate(&form, DeliveryMethod::Pickup).unwrap_err();
        let CheckoutError::Validation(missing) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(missing, vec!["name", "phone"]);
    }

    #[test]
    fn malformed_email_is_reported_as_missing() {
        let mut form = complete_form();
        form.email = "not-an-email".to_owned();

        let err = validate(&form, DeliveryMethod::Pickup).unwrap_err();
        let CheckoutError::Validation(missing) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(missing, vec!["email"]);
    }
}
