//! Response normalization at the API boundary.
//!
//! The order API has grown several response shapes over time: camelCase and
//! snake_case keys, numbers-as-strings for money, variant labels nested one
//! of three ways, legacy Spanish status values. All of that is absorbed here,
//! once; everything past this module sees only the canonical
//! [`lapacho_core::Order`].
//!
//! Only one thing is structural: a created order must have an `id`. Anything
//! else that is missing gets a defensible default.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use lapacho_core::{
    Contact, Delivery, DeliveryMethod, Email, Order, OrderId, OrderLine, PaymentStatus,
    ProductId, VariantId,
};

use crate::error::CheckoutError;

/// Best-effort contact prefill from a profile response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPrefill {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Normalize an order API response into the canonical [`Order`].
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidResponse`] when the payload has no usable
/// `id` or the contact email is unparseable. Both abort the flow: proceeding
/// would mean holding an order reference we cannot trust.
pub fn order(value: &Value) -> Result<Order, CheckoutError> {
    let id = int_at(value, &["id"])
        .ok_or_else(|| CheckoutError::InvalidResponse("order has no id".to_owned()))?;
    let id = OrderId::new(id);

    let order_number = str_at(value, &["order_number", "orderNumber", "number"])
        .unwrap_or_else(|| format!("#{id}"));

    let items: Vec<OrderLine> = value
        .get("items")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().map(order_line).collect())
        .unwrap_or_default();

    let contact = contact(value)?;
    let items_subtotal: Decimal = items.iter().map(|line| line.subtotal).sum();
    let total =
        decimal_at(value, &["total"]).unwrap_or(items_subtotal);
    let delivery = delivery(value, total - items_subtotal);

    let payment_status = str_at(value, &["payment_status", "paymentStatus", "status"])
        .map_or(PaymentStatus::Pending, |raw| payment_status(&raw));

    let payment_method = value
        .get("payment_method")
        .or_else(|| value.get("paymentMethod"))
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    let created_at = str_at(value, &["created_at", "createdAt", "order_date"])
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc));

    Ok(Order {
        id,
        order_number,
        items,
        contact,
        delivery,
        total,
        payment_method,
        payment_status,
        notes: str_at(value, &["notes"]).unwrap_or_default(),
        created_at,
    })
}

/// Normalize a profile response into prefill data. Never fails; unreadable
/// fields are simply absent.
#[must_use]
pub fn profile(value: &Value) -> ContactPrefill {
    ContactPrefill {
        name: str_at(value, &["first_name", "name", "profile.name", "username"]),
        surname: str_at(value, &["last_name", "surname", "profile.surname"]),
        email: str_at(value, &["email", "profile.email"]),
        phone: str_at(value, &["phone", "telephone", "profile.phone"]),
        address: str_at(value, &["address", "profile.address"]),
        city: str_at(value, &["city", "profile.city"]),
    }
}

fn order_line(value: &Value) -> OrderLine {
    let unit_price = decimal_at(value, &["unit_price", "unitPrice", "price"]).unwrap_or_default();
    let quantity = int_at(value, &["quantity"])
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1);
    let subtotal = decimal_at(value, &["subtotal"])
        .unwrap_or_else(|| unit_price * Decimal::from(quantity));

    OrderLine {
        product_id: ProductId::new(
            int_at(value, &["product_id", "productId", "product.id", "product"]).unwrap_or(0),
        ),
        variant_id: int_at(value, &["variant_id", "variantId", "variant.id"])
            .map(VariantId::new),
        name: str_at(value, &["name", "product_name", "productName", "title"])
            .unwrap_or_default(),
        quantity,
        unit_price,
        subtotal,
        // Variant labels have appeared under all three of these shapes.
        size: str_at(value, &["size", "size_name", "variant.size", "variant.size.name"]),
        color: str_at(value, &["color", "color_name", "variant.color", "variant.color.name"]),
    }
}

fn contact(value: &Value) -> Result<Contact, CheckoutError> {
    let scope = value.get("contact").unwrap_or(value);
    let email_raw = str_at(scope, &["email", "contact_email", "email_contact"])
        .ok_or_else(|| CheckoutError::InvalidResponse("order has no contact email".to_owned()))?;
    let email = Email::parse(&email_raw).map_err(|err| {
        CheckoutError::InvalidResponse(format!("order contact email: {err}"))
    })?;

    Ok(Contact {
        name: str_at(scope, &["name", "first_name"]).unwrap_or_default(),
        surname: str_at(scope, &["surname", "last_name"]).unwrap_or_default(),
        phone: str_at(scope, &["phone", "contact_phone", "phone_contact"]).unwrap_or_default(),
        email,
    })
}

fn delivery(value: &Value, inferred_cost: Decimal) -> Delivery {
    let scope = value.get("delivery").or_else(|| value.get("shipping"));

    let cost = scope
        .and_then(|s| decimal_at(s, &["cost"]))
        .unwrap_or(inferred_cost);

    let method = scope
        .and_then(|s| str_at(s, &["method"]))
        .and_then(|raw| raw.parse().ok())
        // Old responses omit the method entirely; a nonzero cost means ship.
        .unwrap_or(if cost > Decimal::ZERO {
            DeliveryMethod::Ship
        } else {
            DeliveryMethod::Pickup
        });

    Delivery {
        method,
        cost,
        address: scope.and_then(|s| str_at(s, &["address"])),
        city: scope.and_then(|s| str_at(s, &["city"])),
    }
}

/// Map a status string, tolerating the backend's legacy Spanish values.
fn payment_status(raw: &str) -> PaymentStatus {
    match raw {
        "paid" | "pagado" | "aprobado" => PaymentStatus::Paid,
        "failed" | "rechazado" | "cancelado" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Look up a string under any of the given keys. A key containing dots is a
/// nested path.
fn str_at(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let found = path(value, key)?;
        match found {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    })
}

/// Look up an integer under any of the given keys.
fn int_at(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| {
        let found = path(value, key)?;
        found
            .as_i64()
            .or_else(|| found.as_str().and_then(|s| s.parse().ok()))
    })
}

/// Look up a decimal under any of the given keys. The backend serializes
/// money both as JSON numbers and as strings ("1500.00").
fn decimal_at(value: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| {
        let found = path(value, key)?;
        match found {
            Value::String(s) => s.parse().ok(),
            Value::Number(_) => found
                .as_i64()
                .map(Decimal::from)
                .or_else(|| found.as_f64().and_then(|f| Decimal::try_from(f).ok())),
            _ => None,
        }
    })
}

fn path<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(value, |v, part| v.get(part))
}
