#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use spool::{ColumnMapping, Entity, Failure, RowLabeled, RowNames, Value};
    use std::sync::Arc;
    use time::{Date, Month};
    use uuid::Uuid;

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    struct SomeEntity {
        a: i8,
        b: String,
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    struct Invoice {
        #[spool(name = "InvoiceId")]
        id: Uuid,
        _number: i64,
        total: Decimal,
        issued: Option<Date>,
        note: Option<String>,
        #[spool(skip)]
        cached: Vec<String>,
        tags: Arc<String>,
    }

    fn labels(names: &[&str]) -> RowNames {
        names.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn columns() {
        let columns = SomeEntity::columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "a");
        assert_eq!(columns[0].field, "a");
        assert!(matches!(columns[0].value, Value::Int8(None)));
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].name, "b");
        assert!(matches!(columns[1].value, Value::Varchar(None)));
    }

    #[test]
    fn columns_attributes() {
        let columns = Invoice::columns();
        assert_eq!(
            columns.iter().map(|c| c.name).collect::<Vec<_>>(),
            ["InvoiceId", "number", "total", "issued", "note", "tags"]
        );
        assert_eq!(columns[0].field, "id");
        assert_eq!(columns[1].field, "_number");
        assert!(matches!(columns[2].value, Value::Decimal(None)));
        assert!(columns[3].nullable);
        assert!(matches!(columns[3].value, Value::Date(None)));
        assert!(columns[4].nullable);
        assert!(!columns[5].nullable);
        assert!(Invoice::column_index("cached").is_none());
        assert_eq!(Invoice::column_index("note"), Some(4));
    }

    #[test]
    fn get_and_set() {
        let mut invoice = Invoice::default();
        let id = Uuid::from_u128(0x1234);
        invoice.set_column(0, id.into()).unwrap();
        invoice.set("number", Value::Int32(Some(17))).unwrap();
        invoice.set("issued", Value::Date(None)).unwrap();
        invoice
            .set(
                "issued",
                Date::from_calendar_date(2025, Month::March, 1).unwrap().into(),
            )
            .unwrap();
        assert_eq!(invoice.id, id);
        assert_eq!(invoice._number, 17);
        assert_eq!(
            invoice.issued,
            Some(Date::from_calendar_date(2025, Month::March, 1).unwrap())
        );
        assert_eq!(invoice.get("number"), Some(Value::Int64(Some(17))));
        assert_eq!(invoice.get("note"), Some(Value::Varchar(None)));
        assert_eq!(invoice.get_column(6), None);
        assert!(invoice.set_column(6, Value::Null).is_err());
        assert!(invoice.set("total", "a lot".into()).is_err());
    }

    #[test]
    fn from_row() {
        let row = RowLabeled::new(
            labels(&["note", "InvoiceId", "total", "unknown"]),
            [
                Value::Varchar(Some("paid".into())),
                Value::Uuid(Some(Uuid::nil())),
                Value::Int32(Some(250)),
                Value::Boolean(Some(true)),
            ]
            .into(),
        );
        let invoice = Invoice::from_row(row).unwrap();
        assert_eq!(invoice.note.as_deref(), Some("paid"));
        assert_eq!(invoice.id, Uuid::nil());
        assert_eq!(invoice.total, Decimal::from(250));
        assert_eq!(invoice._number, 0);
        assert!(invoice.cached.is_empty());
    }

    #[test]
    fn from_row_null_into_required_member() {
        let row = RowLabeled::new(labels(&["a"]), [Value::Int8(None)].into());
        let error = SomeEntity::from_row(row).unwrap_err();
        assert_eq!(Failure::of(&error), Some(Failure::Mapping));
    }

    #[test]
    fn row_labeled() {
        let entity = SomeEntity {
            a: -3,
            b: "text".into(),
        };
        let row = entity.row_labeled();
        assert_eq!(row.names(), ["a", "b"]);
        assert_eq!(
            row.values(),
            [Value::Int8(Some(-3)), Value::Varchar(Some("text".into()))]
        );
        assert_eq!(SomeEntity::from_row(row).unwrap(), entity);
    }

    #[test]
    fn column_mapping() {
        let mapping = ColumnMapping::for_entity::<Invoice>(&["InvoiceId", "note"]);
        assert_eq!(
            mapping.destinations().collect::<Vec<_>>(),
            ["number", "total", "issued", "tags"]
        );
        assert_eq!(mapping.get("total").map(|v| v.source_index), Some(2));
    }
}
