//! Acceptance checks applied to a decoded order before it is persisted

use order_db::Order;

/// The first rule an order violated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `payment.amount` or `items[2].price`
    pub field: String,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: &'static str) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

const EMPTY: &str = "must not be empty";
const NOT_POSITIVE: &str = "must be greater than zero";

fn required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, EMPTY));
    }
    Ok(())
}

fn positive(value: i64, field: &str) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(field, NOT_POSITIVE));
    }
    Ok(())
}

/// Check an order, reporting the first violation.
///
/// Fields are checked in a fixed order so the same input always reports the
/// same field.
pub fn validate(order: &Order) -> Result<(), ValidationError> {
    required(&order.order_uid, "order_uid")?;
    required(&order.track_number, "track_number")?;
    required(&order.entry, "entry")?;

    required(&order.delivery.name, "delivery.name")?;
    required(&order.delivery.phone, "delivery.phone")?;

    required(&order.payment.transaction, "payment.transaction")?;
    positive(order.payment.amount, "payment.amount")?;
    required(&order.payment.currency, "payment.currency")?;

    if order.items.is_empty() {
        return Err(ValidationError::new("items", EMPTY));
    }
    for (i, item) in order.items.iter().enumerate() {
        required(&item.name, &format!("items[{}].name", i))?;
        positive(item.price, &format!("items[{}].price", i))?;
    }

    // Email is optional, but must look like one when given
    let email = &order.delivery.email;
    if !email.is_empty() && !(email.contains('@') && email.contains('.')) {
        return Err(ValidationError::new(
            "delivery.email",
            "must contain '@' and '.'",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_db::{Delivery, Item, Payment};

    fn valid_order() -> Order {
        Order {
            order_uid: "ord-1".to_string(),
            track_number: "TRACK1".to_string(),
            entry: "WBIL".to_string(),
            delivery: Delivery {
                name: "Test Testov".to_string(),
                phone: "+9720000000".to_string(),
                email: "test@gmail.com".to_string(),
                ..Default::default()
            },
            payment: Payment {
                transaction: "ord-1".to_string(),
                currency: "USD".to_string(),
                amount: 100,
                ..Default::default()
            },
            items: vec![Item {
                name: "Mascaras".to_string(),
                price: 100,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn field_of(order: &Order) -> String {
        validate(order).unwrap_err().field
    }

    #[test]
    fn test_valid_order_passes() {
        assert!(validate(&valid_order()).is_ok());
    }

    #[test]
    fn test_empty_email_is_allowed() {
        let mut order = valid_order();
        order.delivery.email.clear();
        assert!(validate(&order).is_ok());
    }

    #[test]
    fn test_required_top_level_fields() {
        let mut order = valid_order();
        order.order_uid.clear();
        assert_eq!(field_of(&order), "order_uid");

        let mut order = valid_order();
        order.track_number.clear();
        assert_eq!(field_of(&order), "track_number");

        let mut order = valid_order();
        order.entry.clear();
        assert_eq!(field_of(&order), "entry");
    }

    #[test]
    fn test_delivery_fields() {
        let mut order = valid_order();
        order.delivery.name.clear();
        assert_eq!(field_of(&order), "delivery.name");

        let mut order = valid_order();
        order.delivery.phone.clear();
        assert_eq!(field_of(&order), "delivery.phone");
    }

    #[test]
    fn test_payment_fields() {
        let mut order = valid_order();
        order.payment.transaction.clear();
        assert_eq!(field_of(&order), "payment.transaction");

        let mut order = valid_order();
        order.payment.amount = 0;
        let err = validate(&order).unwrap_err();
        assert_eq!(err.field, "payment.amount");
        assert_eq!(err.reason, NOT_POSITIVE);

        let mut order = valid_order();
        order.payment.amount = -5;
        assert_eq!(field_of(&order), "payment.amount");

        let mut order = valid_order();
        order.payment.currency.clear();
        assert_eq!(field_of(&order), "payment.currency");
    }

    #[test]
    fn test_items_must_not_be_empty() {
        let mut order = valid_order();
        order.items.clear();
        assert_eq!(field_of(&order), "items");
    }

    #[test]
    fn test_item_fields_report_index() {
        let mut order = valid_order();
        order.items.push(Item {
            name: String::new(),
            price: 10,
            ..Default::default()
        });
        assert_eq!(field_of(&order), "items[1].name");

        let mut order = valid_order();
        order.items[0].price = 0;
        assert_eq!(field_of(&order), "items[0].price");
    }

    #[test]
    fn test_email_shape() {
        let mut order = valid_order();
        order.delivery.email = "not-an-email".to_string();
        assert_eq!(field_of(&order), "delivery.email");

        order.delivery.email = "user@localhost".to_string();
        assert_eq!(field_of(&order), "delivery.email");

        order.delivery.email = "user.name@example.com".to_string();
        assert!(validate(&order).is_ok());
    }

    #[test]
    fn test_first_violation_wins() {
        let order = Order::default();
        assert_eq!(field_of(&order), "order_uid");

        let mut order = valid_order();
        order.entry.clear();
        order.items.clear();
        order.delivery.email = "bad".to_string();
        assert_eq!(field_of(&order), "entry");
    }

    #[test]
    fn test_display() {
        let mut order = valid_order();
        order.items.clear();
        let err = validate(&order).unwrap_err();
        assert_eq!(err.to_string(), "items: must not be empty");
    }
}
