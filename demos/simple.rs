use bundle_shapley::{BundleShapleyBuilder, DemandProfile, demand_profile, error::Result};
use rust_decimal::dec;

fn build_sample_demand() -> DemandProfile<String, u32> {
    demand_profile(vec![
        ("0xA11CE".to_string(), vec![1, 2]),
        ("0xB0B".to_string(), vec![2, 3]),
        ("0xCAFE".to_string(), vec![1, 3, 4]),
    ])
}

fn main() -> Result<()> {
    let engine = BundleShapleyBuilder::default()
        .price(dec!(100))
        .demand(build_sample_demand())
        .build()?;

    let exact = engine.compute_exact()?;
    let approximate = engine.compute_approximate()?;

    println!("{:>9}  {:>9}  {:>9}  {:>11}", "Buyer", "Exact", "Percent", "Approximate");
    for (buyer, share) in exact.iter() {
        println!(
            "{:>9}  {:>9.2}  {:>8.2}%  {:>11.2}",
            buyer,
            share.amount,
            share.proportion * dec!(100),
            approximate.amount(buyer).unwrap_or_default()
        );
    }

    Ok(())
}
