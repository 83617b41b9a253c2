//! # Input Checks
//!
//! Pure checks run before a transaction is opened. A request that fails
//! here never touches the store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller input ──► validate_*() ──► repository tx ──► SQLite            │
//! │                       │                                 │               │
//! │                 InvalidArgument               CHECK / UNIQUE / FK       │
//! │                 (early, cheap)                (last line, same rules)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_quantity, validate_loan_days};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_loan_days(14).is_ok());
//! assert!(validate_loan_days(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_LOAN_DAYS};

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

// -----------------------------------------------------------------------------
// Text
// -----------------------------------------------------------------------------

/// Trims a title, author, member or product name and checks it is between
/// 1 and 200 characters.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Normalizes a member email to trimmed lowercase.
///
/// Accepts `local@domain.tld` shapes only: one `@`, something before it,
/// a dot inside the domain, no whitespace. Deliverability is not checked.
///
/// ```rust
/// use stockroom_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Ada@Example.org ").unwrap(), "ada@example.org");
/// assert!(validate_email("ada.example.org").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("must contain '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(email.to_lowercase())
}

// -----------------------------------------------------------------------------
// Numbers
// -----------------------------------------------------------------------------

/// Validates an entity id supplied by a caller.
///
/// Database ids start at 1, so zero and negatives can never match a row.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Quantity of one cart line: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    match qty {
        ..=0 => Err(ValidationError::MustBePositive {
            field: "quantity".into(),
        }),
        1..=MAX_ITEM_QUANTITY => Ok(()),
        _ => Err(ValidationError::OutOfRange {
            field: "quantity".into(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }),
    }
}

/// Catalog prices are whole cents; zero is a free item.
///
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents >= 0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: "price".into(),
            min: 0,
            max: i64::MAX,
        })
    }
}

/// Validates the number of copies a book is registered with.
pub fn validate_copies(copies: i64) -> ValidationResult<()> {
    if copies <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "copies".to_string(),
        });
    }

    Ok(())
}

/// Validates a requested loan length in days (1..=365).
pub fn validate_loan_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_LOAN_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "duration_days".to_string(),
            min: 1,
            max: MAX_LOAN_DAYS,
        });
    }

    Ok(())
}

// -----------------------------------------------------------------------------
// Carts
// -----------------------------------------------------------------------------

/// Validates that a cart with `current_lines` lines may take one more.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::TooMany {
            field: "cart lines".to_string(),
            max: MAX_CART_LINES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("title", "  Dune ").unwrap(), "Dune");
        assert!(validate_name("title", "").is_err());
        assert!(validate_name("title", "   ").is_err());
        assert!(validate_name("title", &"A".repeat(201)).is_err());
        assert!(validate_name("title", &"A".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("jan@example.pl").unwrap(), "jan@example.pl");
        assert!(validate_email("").is_err());
        assert!(validate_email("jan@").is_err());
        assert!(validate_email("@example.pl").is_err());
        assert!(validate_email("jan@localhost").is_err());
        assert!(validate_email("jan@@example.pl").is_err());
        assert!(validate_email("j an@example.pl").is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        for ok in [1, 2, MAX_ITEM_QUANTITY] {
            assert!(validate_quantity(ok).is_ok(), "{ok}");
        }
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(-3),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_price_accepts_free_items() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_ids_and_copies() {
        assert!(validate_id("book_id", 1).is_ok());
        assert!(validate_id("book_id", 0).is_err());
        assert!(validate_copies(1).is_ok());
        assert!(validate_copies(0).is_err());
    }

    #[test]
    fn test_validate_loan_days() {
        assert!(validate_loan_days(1).is_ok());
        assert!(validate_loan_days(365).is_ok());
        assert!(validate_loan_days(0).is_err());
        assert!(validate_loan_days(366).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }
}
