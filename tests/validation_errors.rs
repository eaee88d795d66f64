use bundle_shapley::{
    BundleShapleyBuilder, DEFAULT_MAX_EXACT_BUYERS, DemandProfile, ItemValues, ShapleyError,
    compute_approximate, compute_exact, demand_profile, item_values_from_f64,
};
use rust_decimal::dec;
use std::collections::BTreeSet;

fn create_basic_demand() -> DemandProfile<String, u64> {
    demand_profile(vec![
        ("0xaaa".to_string(), vec![1, 2]),
        ("0xbbb".to_string(), vec![2, 3]),
    ])
}

fn create_large_demand(n_buyers: usize) -> DemandProfile<String, u64> {
    demand_profile((0..n_buyers).map(|i| (format!("0x{i:03}"), vec![i as u64 % 4, 10])))
}

#[test]
fn test_negative_price_rejected() {
    for result in [
        compute_exact(dec!(-10), &create_basic_demand(), None),
        compute_approximate(dec!(-10), &create_basic_demand(), None),
    ] {
        match result.unwrap_err() {
            ShapleyError::InvalidInput(msg) => assert!(msg.contains("non-negative")),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}

#[test]
fn test_empty_buyer_set_rejected() {
    let demand: DemandProfile<String, u64> = DemandProfile::new();
    for result in [
        compute_exact(dec!(10), &demand, None),
        compute_approximate(dec!(10), &demand, None),
    ] {
        assert!(matches!(result, Err(ShapleyError::InvalidInput(_))));
    }
}

#[test]
fn test_negative_item_value_rejected() {
    let values = ItemValues::from([(1, dec!(5)), (3, dec!(-1))]);
    let result = compute_exact(dec!(10), &create_basic_demand(), Some(&values));
    match result.unwrap_err() {
        ShapleyError::InvalidInput(msg) => assert!(msg.contains("item 3")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_non_finite_item_value_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = item_values_from_f64(vec![(1u64, 1.0), (2, bad)]);
        assert!(matches!(result, Err(ShapleyError::InvalidInput(_))));
    }
}

#[test]
fn test_item_outside_bundle_rejected() {
    let engine = BundleShapleyBuilder::default()
        .price(dec!(10))
        .demand(create_basic_demand())
        .bundle_items(BTreeSet::from([1, 2]))
        .build()
        .unwrap();

    match engine.compute_exact().unwrap_err() {
        ShapleyError::InvalidInput(msg) => assert!(msg.contains("not part of the bundle")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_too_many_buyers_for_exact() {
    let demand = create_large_demand(DEFAULT_MAX_EXACT_BUYERS + 1);

    match compute_exact(dec!(100), &demand, None).unwrap_err() {
        ShapleyError::TooManyBuyers { count, limit } => {
            assert_eq!(count, 11);
            assert_eq!(limit, 10);
        }
        other => panic!("Expected TooManyBuyers, got {other:?}"),
    }
}

#[test]
fn test_approximate_never_guarded() {
    let demand = create_large_demand(500);

    let result = compute_approximate(dec!(1000), &demand, None).unwrap();

    assert_eq!(result.len(), 500);
    assert_eq!(result.total(), dec!(1000));
}

#[test]
fn test_limit_is_configurable() {
    let build = |limit: usize| {
        BundleShapleyBuilder::default()
            .price(dec!(100))
            .demand(create_large_demand(4))
            .max_exact_buyers(limit)
            .build()
            .unwrap()
    };

    assert!(matches!(
        build(3).compute_exact(),
        Err(ShapleyError::TooManyBuyers { count: 4, limit: 3 })
    ));
    assert_eq!(build(4).compute_exact().unwrap().total(), dec!(100));
}

#[test]
fn test_missing_builder_field() {
    let result = BundleShapleyBuilder::<String, u64>::default()
        .price(dec!(10))
        .build();
    let err: ShapleyError = result.unwrap_err().into();
    assert!(err.to_string().contains("demand"));
}
