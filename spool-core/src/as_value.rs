use crate::{Error, Result, Value};
use rust_decimal::Decimal;
use std::{any, borrow::Cow, sync::Arc};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the coercion layer used by the row mapper when a column value is
/// assigned to an entity member, and by the bulk loader when a member is read
/// back into a row.
///
/// # Coercion rules
/// - The canonical variant of the type is always accepted.
/// - Integers accept any integer variant whose value fits the target range,
///   anything else is an error (no truncation).
/// - `bool` accepts `Boolean`, or an integer that is exactly 0 or 1.
/// - `f64` accepts `Float32` and `Float64`, `f32` accepts `Float32` only.
/// - `Decimal` accepts `Decimal` and every integer variant.
/// - `String` accepts `Varchar` and `Char`, `char` accepts `Char` and a
///   `Varchar` holding exactly one character.
/// - A NULL is accepted only by `Option<T>`, which maps it to `None`.
///
/// # Examples
/// ```rust
/// use spool_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL of this type (for example `Value::Int32(None)` for `i32`).
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self` following the
    /// coercion rules above.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

pub(crate) fn cannot_convert<T>(value: &Value) -> Error {
    if value.is_null() {
        Error::msg(format!(
            "Cannot convert NULL ({}) to {}",
            value.type_name(),
            any::type_name::<T>()
        ))
    } else {
        Error::msg(format!(
            "Cannot convert {} ({}) to {}",
            value,
            value.type_name(),
            any::type_name::<T>()
        ))
    }
}

/// Widens any non NULL integer variant, `None` for everything else.
fn as_integer(value: &Value) -> Option<i128> {
    Some(match *value {
        Value::Int8(Some(v)) => v as i128,
        Value::Int16(Some(v)) => v as i128,
        Value::Int32(Some(v)) => v as i128,
        Value::Int64(Some(v)) => v as i128,
        Value::UInt8(Some(v)) => v as i128,
        Value::UInt16(Some(v)) => v as i128,
        Value::UInt32(Some(v)) => v as i128,
        Value::UInt64(Some(v)) => v as i128,
        _ => return None,
    })
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat $(if $guard:expr)? => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest $(if $guard)? => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $destination(Some(v)) = value {
                    return Ok(v);
                }
                let Some(wide) = as_integer(&value) else {
                    return Err(cannot_convert::<Self>(&value));
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {} ({}) is out of range for {}",
                        wide,
                        value.type_name(),
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

impl_as_value!(
    bool,
    Value::Boolean,
    ref v if as_integer(v) == Some(0) => Ok(false),
    ref v if as_integer(v) == Some(1) => Ok(true),
);
impl_as_value!(f32, Value::Float32);
impl_as_value!(f64, Value::Float64, Value::Float32(Some(v)) => Ok(v as f64));
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int8(Some(v)) => Ok(Decimal::from(v)),
    Value::Int16(Some(v)) => Ok(Decimal::from(v)),
    Value::Int32(Some(v)) => Ok(Decimal::from(v)),
    Value::Int64(Some(v)) => Ok(Decimal::from(v)),
    Value::UInt8(Some(v)) => Ok(Decimal::from(v)),
    Value::UInt16(Some(v)) => Ok(Decimal::from(v)),
    Value::UInt32(Some(v)) => Ok(Decimal::from(v)),
    Value::UInt64(Some(v)) => Ok(Decimal::from(v)),
);
impl_as_value!(
    char,
    Value::Char,
    Value::Varchar(Some(ref v)) if v.chars().count() == 1 => {
        Ok(v.chars().next().unwrap_or_default())
    },
);
impl_as_value!(String, Value::Varchar, Value::Char(Some(v)) => Ok(v.into()));
impl_as_value!(Vec<u8>, Value::Blob);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone);
impl_as_value!(Uuid, Value::Uuid);

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

impl<T: AsValue + Clone> AsValue for Arc<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        Arc::unwrap_or_clone(self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Arc::new)
    }
}
