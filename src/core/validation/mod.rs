//! Validation of caller payloads
//!
//! Payloads are checked once, before the service touches a store. A
//! [`Validated<T>`] can only be obtained from [`Validated::new`].

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::invoice::{InvoicePatch, LineItem, NewInvoice, compute_total};

/// Payloads with checks the derive attributes cannot express
pub trait Payload: Validate {
    fn extra_errors(&self) -> Vec<FieldValidationError> {
        Vec::new()
    }
}

impl Payload for NewInvoice {
    fn extra_errors(&self) -> Vec<FieldValidationError> {
        let mut errors = non_finite_errors(&self.line_items);
        errors.extend(currency_errors(self.currency.as_deref()));
        errors
    }
}

impl Payload for InvoicePatch {
    fn extra_errors(&self) -> Vec<FieldValidationError> {
        let mut errors = self
            .line_items
            .as_deref()
            .map(non_finite_errors)
            .unwrap_or_default();
        errors.extend(currency_errors(self.currency.as_deref()));
        errors
    }
}

/// A payload that passed validation
#[derive(Debug, Clone)]
pub struct Validated<T>(T);

impl<T: Payload> Validated<T> {
    pub fn new(payload: T) -> Result<Self, ValidationError> {
        let mut errors = match payload.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => flatten(&errors),
        };
        errors.extend(payload.extra_errors());

        if errors.is_empty() {
            return Ok(Self(payload));
        }

        errors.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        errors.dedup();
        Err(ValidationError::FieldErrors(errors))
    }
}

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Finite inputs can still overflow: amounts and the total are checked too
fn non_finite_errors(items: &[LineItem]) -> Vec<FieldValidationError> {
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mut inputs_finite = true;
        if !item.quantity.is_finite() {
            inputs_finite = false;
            errors.push(FieldValidationError {
                field: format!("line_items[{}].quantity", index),
                message: "quantity must be a finite number".to_string(),
            });
        }
        if !item.unit_price.is_finite() {
            inputs_finite = false;
            errors.push(FieldValidationError {
                field: format!("line_items[{}].unit_price", index),
                message: "unit_price must be a finite number".to_string(),
            });
        }
        if inputs_finite && !item.amount().is_finite() {
            errors.push(FieldValidationError {
                field: format!("line_items[{}]", index),
                message: "quantity x unit_price is too large".to_string(),
            });
        }
    }

    if errors.is_empty() && !compute_total(items).is_finite() {
        errors.push(FieldValidationError {
            field: "line_items".to_string(),
            message: "total of the line items is too large".to_string(),
        });
    }
    errors
}

fn currency_errors(currency: Option<&str>) -> Option<FieldValidationError> {
    let currency = currency?;
    let letters = !currency.is_empty() && currency.chars().all(|c| c.is_ascii_alphabetic());
    (!letters).then(|| FieldValidationError {
        field: "currency".to_string(),
        message: "currency must be a three-letter code".to_string(),
    })
}

/// Flatten nested validator errors into dotted field paths
pub fn flatten(errors: &ValidationErrors) -> Vec<FieldValidationError> {
    let mut out = Vec::new();
    flatten_into("", errors, &mut out);
    out
}

fn flatten_into(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldValidationError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", error.code));
                    out.push(FieldValidationError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_into(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_into(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(err: ValidationError) -> Vec<String> {
        match err {
            ValidationError::FieldErrors(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("Expected FieldErrors, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        let payload = NewInvoice::with_items(vec![LineItem::new("Widget", 2.0, 9.5)]);
        let validated = Validated::new(payload).unwrap();
        assert_eq!(validated.line_items.len(), 1);
    }

    #[test]
    fn test_empty_line_items_rejected() {
        let err = Validated::new(NewInvoice::with_items(vec![])).unwrap_err();
        assert_eq!(field_names(err), vec!["line_items"]);
    }

    #[test]
    fn test_item_errors_have_indexed_paths() {
        let payload = NewInvoice::with_items(vec![
            LineItem::new("ok", 1.0, 1.0),
            LineItem::new("", 0.0, -1.0),
        ]);
        let fields = field_names(Validated::new(payload).unwrap_err());
        assert_eq!(
            fields,
            vec![
                "line_items[1].description",
                "line_items[1].quantity",
                "line_items[1].unit_price",
            ]
        );
    }

    #[test]
    fn test_zero_unit_price_is_allowed() {
        let payload = NewInvoice::with_items(vec![LineItem::new("Free sample", 1.0, 0.0)]);
        assert!(Validated::new(payload).is_ok());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let payload = NewInvoice::with_items(vec![LineItem::new("x", f64::INFINITY, 1.0)]);
        let fields = field_names(Validated::new(payload).unwrap_err());
        assert!(fields.contains(&"line_items[0].quantity".to_string()));
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut payload = NewInvoice::with_items(vec![LineItem::new("x", 1.0, 1.0)]);
        payload.customer_email = Some("not-an-email".into());
        assert_eq!(
            field_names(Validated::new(payload).unwrap_err()),
            vec!["customer_email"]
        );
    }

    #[test]
    fn test_patch_without_lines_passes() {
        let patch = InvoicePatch {
            notes: Some(Some("paid by wire".into())),
            ..Default::default()
        };
        assert!(Validated::new(patch).is_ok());
    }

    #[test]
    fn test_overflowing_amount_rejected() {
        let payload = NewInvoice::with_items(vec![
            LineItem::new("ok", 1.0, 1.0),
            LineItem::new("big", 1e200, 1e200),
        ]);
        assert_eq!(
            field_names(Validated::new(payload).unwrap_err()),
            vec!["line_items[1]"]
        );
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let payload = NewInvoice::with_items(vec![
            LineItem::new("a", 1.0, f64::MAX),
            LineItem::new("b", 1.0, f64::MAX),
        ]);
        assert_eq!(
            field_names(Validated::new(payload).unwrap_err()),
            vec!["line_items"]
        );

        let patch = InvoicePatch {
            line_items: Some(vec![
                LineItem::new("a", 1.0, f64::MAX),
                LineItem::new("b", 1.0, f64::MAX),
            ]),
            ..Default::default()
        };
        assert!(Validated::new(patch).is_err());
    }

    #[test]
    fn test_currency_must_be_letters() {
        for currency in ["1$!", "E R", "€UR"] {
            let mut payload = NewInvoice::with_items(vec![LineItem::new("x", 1.0, 1.0)]);
            payload.currency = Some(currency.into());
            assert_eq!(
                field_names(Validated::new(payload).unwrap_err()),
                vec!["currency"],
                "currency {:?} should be rejected",
                currency
            );
        }

        let patch = InvoicePatch {
            currency: Some("12X".into()),
            ..Default::default()
        };
        assert_eq!(field_names(Validated::new(patch).unwrap_err()), vec!["currency"]);

        let mut payload = NewInvoice::with_items(vec![LineItem::new("x", 1.0, 1.0)]);
        payload.currency = Some("usd".into());
        assert!(Validated::new(payload).is_ok());
    }

    #[test]
    fn test_patch_with_empty_lines_rejected() {
        let patch = InvoicePatch {
            line_items: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            field_names(Validated::new(patch).unwrap_err()),
            vec!["line_items"]
        );
    }
}
