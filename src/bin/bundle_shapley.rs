//! Command-line front end: reads a bundle description as JSON and prints
//! each buyer's share of the price.

use bundle_shapley::{
    Allocation, BundleShapleyBuilder, DEFAULT_MAX_EXACT_BUYERS, Divergence, demand_profile,
};
use clap::{Parser, ValueEnum};
use rust_decimal::{Decimal, dec};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    error::Error,
    io::Read,
    path::PathBuf,
};
use tabled::{Table, Tabled, settings::Style};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Split a bundle price among buyers with Shapley values")]
struct Cli {
    /// JSON bundle description; read from stdin when omitted
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Method::Exact)]
    method: Method,

    /// Largest buyer count the exact solver accepts
    #[arg(long, default_value_t = DEFAULT_MAX_EXACT_BUYERS)]
    max_exact_buyers: usize,

    /// Enumerate join orders on a single thread
    #[arg(long)]
    sequential: bool,

    /// Also print integer base-unit amounts (18 for wei)
    #[arg(long)]
    decimals: Option<u32>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    Exact,
    Approximate,
    Compare,
}

/// `{"price": "100", "buyers": {"0xa": [1, 2]}, "item_values": {"1": "10"}, "bundle_items": [1, 2]}`
#[derive(Debug, Deserialize)]
struct BundleInput {
    price: Decimal,
    buyers: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    item_values: Option<BTreeMap<u64, Decimal>>,
    #[serde(default)]
    bundle_items: Option<BTreeSet<u64>>,
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "Buyer")]
    buyer: String,
    #[tabled(rename = "Amount")]
    amount: Decimal,
    #[tabled(rename = "Percent")]
    percent: String,
    #[tabled(rename = "Base units")]
    base_units: String,
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Buyer")]
    buyer: String,
    #[tabled(rename = "Exact")]
    exact: Decimal,
    #[tabled(rename = "Approximate")]
    approximate: Decimal,
    #[tabled(rename = "Difference")]
    difference: Decimal,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&std::env::var("RUST_LOG").unwrap_or_default()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = read_input(cli.input.as_ref())?;
    info!(
        buyers = input.buyers.len(),
        price = %input.price,
        method = ?cli.method,
        "computing bundle shares"
    );

    let mut builder = BundleShapleyBuilder::default();
    builder
        .price(input.price)
        .demand(demand_profile(input.buyers))
        .max_exact_buyers(cli.max_exact_buyers)
        .parallel(!cli.sequential);
    if let Some(values) = input.item_values {
        builder.item_values(values);
    }
    if let Some(items) = input.bundle_items {
        builder.bundle_items(items);
    }
    let engine = builder.build()?;

    match cli.method {
        Method::Exact => print_allocation(&engine.compute_exact()?, &cli)?,
        Method::Approximate => print_allocation(&engine.compute_approximate()?, &cli)?,
        Method::Compare => print_divergence(&engine.compare()?, cli.json)?,
    }

    Ok(())
}

/// `RUST_LOG` directives on top of a warn-level default, so the equal-split
/// fallback is always reported
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn read_input(path: Option<&PathBuf>) -> Result<BundleInput, Box<dyn Error>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_allocation(allocation: &Allocation<String>, cli: &Cli) -> Result<(), Box<dyn Error>> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(allocation)?);
        return Ok(());
    }

    let base_units = cli
        .decimals
        .map(|decimals| allocation.to_base_units(decimals))
        .transpose()?;

    let rows: Vec<ShareRow> = allocation
        .iter()
        .map(|(buyer, share)| ShareRow {
            buyer: buyer.clone(),
            amount: share.amount,
            percent: format!("{:.2}%", share.proportion * dec!(100)),
            base_units: base_units
                .as_ref()
                .and_then(|units| units.get(buyer))
                .map(u128::to_string)
                .unwrap_or_default(),
        })
        .collect();

    println!("{} allocation of {}", allocation.method(), allocation.price());
    println!(
        "{}",
        Table::new(rows).with(Style::psql().remove_horizontals())
    );
    Ok(())
}

fn print_divergence(divergence: &Divergence<String>, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(divergence)?);
        return Ok(());
    }

    let rows: Vec<ComparisonRow> = divergence
        .entries
        .iter()
        .map(|(buyer, c)| ComparisonRow {
            buyer: buyer.clone(),
            exact: c.exact,
            approximate: c.approximate,
            difference: c.difference,
        })
        .collect();

    println!(
        "{}",
        Table::new(rows).with(Style::psql().remove_horizontals())
    );
    println!("max absolute difference: {}", divergence.max_abs_difference);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_shown_by_default() {
        assert_eq!(log_filter("").max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_rust_log_raises_level() {
        assert_eq!(log_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
