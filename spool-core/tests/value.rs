#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use spool_core::{AsValue, Value};
    use std::{borrow::Cow, sync::Arc};
    use time::{Date, Month};
    use uuid::Uuid;

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Int32(None).is_null());
        assert!(!Value::Int32(Some(0)).is_null());
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(None));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        assert_eq!(bool::try_from_value(val).unwrap(), true);
        assert_eq!(bool::try_from_value(1i8.into()).unwrap(), true);
        assert_eq!(bool::try_from_value(0i64.into()).unwrap(), false);
        assert_eq!(bool::try_from_value(1u32.into()).unwrap(), true);
        assert!(bool::try_from_value(2i32.into()).is_err());
        assert!(bool::try_from_value(0.5f32.into()).is_err());
        assert!(bool::try_from_value("true".into()).is_err());
    }

    #[test]
    fn value_integers_in_range() {
        assert_eq!(i8::try_from_value(99u8.into()).unwrap(), 99);
        assert_eq!(i16::try_from_value((-7i64).into()).unwrap(), -7);
        assert_eq!(i32::try_from_value(2_000_000_000u32.into()).unwrap(), 2_000_000_000);
        assert_eq!(i64::try_from_value(12i8.into()).unwrap(), 12);
        assert_eq!(u64::try_from_value(5i16.into()).unwrap(), 5);
        assert_eq!(u8::try_from_value(Value::UInt8(Some(255))).unwrap(), 255);
    }

    #[test]
    fn value_integers_out_of_range() {
        assert!(i8::try_from_value(128i16.into()).is_err());
        assert!(u8::try_from_value((-1i32).into()).is_err());
        assert!(i32::try_from_value(u64::MAX.into()).is_err());
        assert!(u64::try_from_value(i64::MIN.into()).is_err());
    }

    #[test]
    fn value_integers_reject_other_types() {
        assert!(i32::try_from_value(1.0f64.into()).is_err());
        assert!(i64::try_from_value("12".into()).is_err());
        assert!(i32::try_from_value(true.into()).is_err());
    }

    #[test]
    fn value_floats() {
        assert_eq!(f64::try_from_value(1.5f32.into()).unwrap(), 1.5);
        assert_eq!(f64::try_from_value(2.25f64.into()).unwrap(), 2.25);
        assert_eq!(f32::try_from_value(1.5f32.into()).unwrap(), 1.5);
        assert!(f32::try_from_value(1.5f64.into()).is_err());
        assert!(f64::try_from_value(3i32.into()).is_err());
    }

    #[test]
    fn value_decimal() {
        let val: Value = Decimal::new(12345, 2).into();
        assert_eq!(val, Value::Decimal(Some(Decimal::new(12345, 2))));
        assert_eq!(Decimal::try_from_value(val).unwrap(), Decimal::new(12345, 2));
        assert_eq!(Decimal::try_from_value(42i32.into()).unwrap(), Decimal::from(42));
        assert_eq!(Decimal::try_from_value(7u64.into()).unwrap(), Decimal::from(7));
        assert!(Decimal::try_from_value(1.0f64.into()).is_err());
    }

    #[test]
    fn value_strings() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert_eq!(String::try_from_value('x'.into()).unwrap(), "x");
        assert_eq!(char::try_from_value('x'.into()).unwrap(), 'x');
        assert_eq!(char::try_from_value("y".into()).unwrap(), 'y');
        assert!(char::try_from_value("yz".into()).is_err());
        assert!(String::try_from_value(12i32.into()).is_err());
        let cow: Cow<'static, str> = AsValue::try_from_value("borrowed".into()).unwrap();
        assert_eq!(cow, "borrowed");
    }

    #[test]
    fn value_blob() {
        let val: Value = vec![1u8, 2, 3].into();
        assert_eq!(val, Value::Blob(Some([1u8, 2, 3].into())));
        assert_eq!(Vec::<u8>::try_from_value(val).unwrap(), vec![1, 2, 3]);
        assert!(Vec::<u8>::try_from_value("abc".into()).is_err());
    }

    #[test]
    fn value_temporal_and_uuid() {
        let date = Date::from_calendar_date(2024, Month::February, 29).unwrap();
        assert_eq!(Date::try_from_value(date.into()).unwrap(), date);
        assert!(Date::try_from_value("2024-02-29".into()).is_err());
        let uuid = Uuid::from_u128(0x67e5504410b1426f9247bb680e5fe0c8);
        assert_eq!(Uuid::try_from_value(uuid.into()).unwrap(), uuid);
        assert!(Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).is_err());
    }

    #[test]
    fn value_null_requires_option() {
        assert!(i32::try_from_value(Value::Int32(None)).is_err());
        assert!(String::try_from_value(Value::Null).is_err());
        assert_eq!(Option::<i32>::try_from_value(Value::Int32(None)).unwrap(), None);
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::try_from_value(3i16.into()).unwrap(), Some(3));
        assert_eq!(Option::<String>::as_empty_value(), Value::Varchar(None));
        assert_eq!(None::<i32>.as_value(), Value::Int32(None));
    }

    #[test]
    fn value_wrappers() {
        assert_eq!(*Box::<i32>::try_from_value(5i64.into()).unwrap(), 5);
        assert_eq!(*Arc::<String>::try_from_value("a".into()).unwrap(), "a");
        assert_eq!(Arc::new(9u8).as_value(), Value::UInt8(Some(9)));
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int32(None).to_string(), "NULL");
        assert_eq!(Value::Int32(Some(42)).to_string(), "42");
    }

    #[test]
    fn conversion_error_names_the_types() {
        let error = i8::try_from_value("abc".into()).unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("i8"), "{}", message);
    }
}
