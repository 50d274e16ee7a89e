use proptest::prelude::*;
use steplint::core::types::Value;
use steplint::rules::Rule;

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9f64).prop_map(Value::Float),
        Just(Value::Float(f64::NAN)),
        "[a-z0-9/_-]{0,12}".prop_map(Value::String),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn equals_is_reflexive(value in value_strategy()) {
        prop_assert!(Rule::equals().evaluate(&value, &value).unwrap());
    }

    #[test]
    fn negation_inverts_equals(a in value_strategy(), b in value_strategy()) {
        let plain = Rule::equals().evaluate(&a, &b).unwrap();
        let negated = Rule::equals().negated().evaluate(&a, &b).unwrap();
        prop_assert_eq!(plain, !negated);
    }

    #[test]
    fn negation_inverts_contains(a in value_strategy(), b in value_strategy()) {
        let plain = Rule::contains().evaluate(&a, &b);
        let negated = Rule::contains().negated().evaluate(&a, &b);
        match (plain, negated) {
            (Ok(p), Ok(n)) => prop_assert_eq!(p, !n),
            (Err(_), Err(_)) => {}
            other => prop_assert!(false, "negation changed comparability: {:?}", other),
        }
    }

    #[test]
    fn list_contains_each_leaf(items in proptest::collection::vec(leaf_strategy(), 1..8)) {
        let list = Value::List(items.clone());
        for item in &items {
            prop_assert!(Rule::contains().evaluate(&list, item).unwrap());
        }
    }

    #[test]
    fn list_order_does_not_matter(items in proptest::collection::vec(leaf_strategy(), 0..8)) {
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert!(Rule::equals()
            .evaluate(&Value::List(items), &Value::List(reversed))
            .unwrap());
    }

    #[test]
    fn message_describes_relation_before_negation(a in value_strategy(), b in value_strategy()) {
        let plain = Rule::equals().check(&a, &b).unwrap();
        let negated = Rule::equals().negated().check(&a, &b).unwrap();
        prop_assert_eq!(plain.message, negated.message);
        prop_assert_eq!(plain.success, !negated.success);
    }
}

#[test]
fn contains_scalar_membership() {
    let list = Value::from(vec![1i64, 2, 3]);
    assert!(Rule::contains().evaluate(&list, &Value::from(2i64)).unwrap());
    assert!(!Rule::contains().evaluate(&list, &Value::from(4i64)).unwrap());
    assert!(Rule::contains()
        .negated()
        .evaluate(&list, &Value::from(4i64))
        .unwrap());
}

#[test]
fn contains_on_scalar_is_an_error() {
    assert!(Rule::contains()
        .evaluate(&Value::from(true), &Value::from(1i64))
        .is_err());
}

#[test]
fn nan_from_toml_equals_itself() {
    #[derive(serde::Deserialize)]
    struct Expectation {
        expected: Value,
    }

    let parsed: Expectation = toml::from_str("expected = nan").unwrap();
    assert!(matches!(parsed.expected, Value::Float(x) if x.is_nan()));
    assert!(Rule::equals()
        .evaluate(&parsed.expected, &parsed.expected)
        .unwrap());
    assert!(!Rule::equals()
        .negated()
        .evaluate(&parsed.expected, &parsed.expected)
        .unwrap());
}
