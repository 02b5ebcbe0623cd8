use newsdesk::storage::SortOrder;
use newsdesk::validation::{rules, Checks};
use newsdesk::{record, Database, Error, RecordExt, Secret, Table, ValidationErrorKind, Value};

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    let categories = db.table(Table::Categories);
    for name in ["Sport", "Politics", "Arts"] {
        categories.insert(&record([("name", name.into())])).unwrap();
    }
    db
}

#[test]
fn secret_is_fully_redacted() {
    let password = Secret::new("hunter22hunter".to_string());
    assert_eq!(format!("{password:?}"), "[REDACTED]");
    assert_eq!(format!("{password}"), "[REDACTED]");
}

#[test]
fn gateway_crud_cycle() {
    let db = seeded();
    let categories = db.table(Table::Categories);

    let ordered = categories.find_all(Some("name"), Some("asc")).unwrap();
    let names: Vec<_> = ordered.iter().map(|r| r.display("name")).collect();
    assert_eq!(names, ["Arts", "Politics", "Sport"]);

    let changed = categories
        .update(&record([("id", 2.into()), ("name", "World".into())]))
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        categories.find_by_key(2).unwrap().unwrap().text("name"),
        Some("World")
    );

    assert_eq!(categories.delete(2).unwrap(), 1);
    assert_eq!(categories.delete(2).unwrap(), 0);
    assert_eq!(categories.find_all(None, None).unwrap().len(), 2);
}

#[test]
fn gateway_rejects_bad_arguments_before_touching_storage() {
    let db = seeded();
    let categories = db.table(Table::Categories);

    assert!(matches!(categories.find("", "Sport", None, None), Err(Error::Argument(_))));
    assert!(matches!(categories.find("name", "", None, None), Err(Error::Argument(_))));
    assert!(matches!(categories.find("colour", "red", None, None), Err(Error::Argument(_))));
    assert!(matches!(
        categories.find_all(Some("name"), Some("sideways")),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        categories.update(&record([("name", "Nope".into())])),
        Err(Error::Argument(_))
    ));
    assert!(matches!(categories.delete(Value::Null), Err(Error::Argument(_))));
}

#[test]
fn injected_values_are_bound_not_spliced() {
    let db = seeded();
    let categories = db.table(Table::Categories);
    let hostile = "x'; DROP TABLE category; --";
    categories.insert(&record([("name", hostile.into())])).unwrap();

    let rows = categories.find("name", hostile, None, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(categories.find_all(None, None).unwrap().len(), 4);
}

#[test]
fn sort_order_parses_either_case() {
    assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    assert!("up".parse::<SortOrder>().is_err());
}

#[test]
fn checks_collect_every_failure_in_order() {
    let mut checks = Checks::new();
    checks
        .push(rules::required(&[("Username", Some("bob")), ("Password", Some(" "))]))
        .push(rules::no_spaces(&[("Username", "bob smith")]))
        .push(rules::length("Username", "bob smith", 4, 32))
        .push(rules::email("not-an-email"))
        .push(rules::uk_phone("07222-555555"));

    let errors = checks.finish().unwrap_err();
    let kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        [
            ValidationErrorKind::Required,
            ValidationErrorKind::ContainsSpaces,
            ValidationErrorKind::InvalidEmail,
            ValidationErrorKind::InvalidPhone,
        ]
    );
    assert_eq!(errors.messages()[0], "Password field is required.");
}

#[test]
fn uk_phone_formats() {
    for good in ["+447222555555", "07222555555", "+44 7222 555 555", "(01222) 555555", "07222555555 #3456"] {
        assert!(rules::uk_phone(good).is_none(), "{good}");
    }
    for bad in ["(+447222)555555", "555", "+15551234567"] {
        assert!(rules::uk_phone(bad).is_some(), "{bad}");
    }
}
