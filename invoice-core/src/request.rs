//! Invoice request model and its lenient JSON reading.
//!
//! Only the overall shape of the payload can fail. Individual
//! fields that are missing, `null` or of the wrong type degrade to
//! "absent" and the calculator applies its defaults.

use std::str::FromStr;

use log::warn;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::RenderInputError;

/// A customer order to be rendered as an invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceRequest {
    pub customer_name: Option<String>,
    pub business_name: Option<String>,
    pub delivery_address: Option<String>,
    pub invoice_number: Option<String>,
    /// Row order on the page follows this order.
    pub items: Vec<LineItem>,
}

/// One orderable product, sold by the case (primary) and/or by the
/// unit (secondary).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub primary_quantity: Option<Decimal>,
    pub secondary_quantity: Option<Decimal>,
    pub primary_unit_price: Option<Decimal>,
    pub secondary_unit_price: Option<Decimal>,
}

const PRIMARY_QUANTITY: &[&str] = &["primaryQuantity", "caseQuantity"];
const SECONDARY_QUANTITY: &[&str] = &["secondaryQuantity", "unitQuantity"];
const PRIMARY_UNIT_PRICE: &[&str] = &["primaryUnitPrice", "casePrice"];
const SECONDARY_UNIT_PRICE: &[&str] = &["secondaryUnitPrice", "unitPrice"];

impl InvoiceRequest {
    /// Parse a JSON payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, RenderInputError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, RenderInputError> {
        let obj = value.as_object().ok_or(RenderInputError::NotAnObject)?;
        let items = match obj.get("items") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| LineItem::from_value(index, item))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(RenderInputError::ItemsNotArray),
        };

        Ok(InvoiceRequest {
            customer_name: text(obj, "customerName"),
            business_name: text(obj, "businessName"),
            delivery_address: text(obj, "deliveryAddress"),
            invoice_number: text(obj, "invoiceNumber"),
            items,
        })
    }
}

impl LineItem {
    /// An item with a name and every numeric field absent.
    pub fn named(name: impl Into<String>) -> Self {
        LineItem {
            name: name.into(),
            ..LineItem::default()
        }
    }

    pub fn with_primary(mut self, quantity: impl Into<Decimal>) -> Self {
        self.primary_quantity = Some(quantity.into());
        self
    }

    pub fn with_secondary(mut self, quantity: impl Into<Decimal>) -> Self {
        self.secondary_quantity = Some(quantity.into());
        self
    }

    pub fn with_primary_price(mut self, price: impl Into<Decimal>) -> Self {
        self.primary_unit_price = Some(price.into());
        self
    }

    pub fn with_secondary_price(mut self, price: impl Into<Decimal>) -> Self {
        self.secondary_unit_price = Some(price.into());
        self
    }

    fn from_value(index: usize, value: &Value) -> Result<Self, RenderInputError> {
        let obj = value
            .as_object()
            .ok_or(RenderInputError::ItemNotObject { index })?;
        Ok(LineItem {
            name: text(obj, "name").unwrap_or_default(),
            primary_quantity: number(obj, PRIMARY_QUANTITY, index),
            secondary_quantity: number(obj, SECONDARY_QUANTITY, index),
            primary_unit_price: number(obj, PRIMARY_UNIT_PRICE, index),
            secondary_unit_price: number(obj, SECONDARY_UNIT_PRICE, index),
        })
    }
}

/// Strings are taken as-is and numbers are printed. Anything else
/// reads as absent.
fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present alias wins. Values that are not numbers or numeric
/// strings read as absent.
fn number(obj: &Map<String, Value>, aliases: &[&str], index: usize) -> Option<Decimal> {
    let (key, value) = aliases
        .iter()
        .find_map(|key| obj.get(*key).map(|v| (*key, v)))?;
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    if parsed.is_none() {
        warn!("item {}: ignoring non-numeric `{}` value {}", index, key, value);
    }
    parsed
}

pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
