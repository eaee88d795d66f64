use crate::{
    coalition::{CharacteristicFunction, Coverage},
    error::{Result, ShapleyError},
    permutations::Permutations,
    utils::factorial,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

/// Exact Shapley value of every buyer, indexed like the game's buyers.
///
/// Averages each buyer's marginal contribution over all n! join orders:
///
/// ```text
/// φ_i = (1/n!) · Σ_π [ v(Pred_π(i) ∪ {i}) − v(Pred_π(i)) ]
/// ```
///
/// The orderings are split by the buyer placed first. Each partition walks the
/// (n-1)! orderings of the remaining buyers with its own accumulator, and the
/// partition totals are summed in partition order, so the parallel and
/// sequential paths return the same values.
pub(crate) fn shapley_values(game: &CharacteristicFunction, parallel: bool) -> Result<Vec<Decimal>> {
    let n = game.buyer_count();
    if n == 0 {
        return Ok(Vec::new());
    }

    let n_orderings = factorial(n).ok_or_else(|| {
        ShapleyError::ArithmeticOverflow(format!("the number of orderings of {n} buyers"))
    })?;
    debug!(
        buyers = n,
        items = game.item_count(),
        orderings = n_orderings,
        parallel,
        "enumerating join orders"
    );

    let partitions: Vec<Vec<Decimal>> = if parallel && n > 2 {
        (0..n)
            .into_par_iter()
            .map(|first| partition_totals(game, first))
            .collect::<Result<_>>()?
    } else {
        (0..n)
            .map(|first| partition_totals(game, first))
            .collect::<Result<_>>()?
    };

    let mut totals = vec![Decimal::ZERO; n];
    for partition in partitions {
        for (total, value) in totals.iter_mut().zip(partition) {
            *total = checked_accumulate(*total, value)?;
        }
    }

    let n_orderings = Decimal::from(n_orderings);
    let values = totals
        .into_iter()
        .map(|total| {
            total
                .checked_div(n_orderings)
                .ok_or_else(|| ShapleyError::ArithmeticOverflow("Shapley average".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(buyers = n, "exact Shapley values computed");
    Ok(values)
}

/// Marginal contributions summed over every ordering that starts with `first`
fn partition_totals(game: &CharacteristicFunction, first: usize) -> Result<Vec<Decimal>> {
    let n = game.buyer_count();
    let mut totals = vec![Decimal::ZERO; n];
    let mut coverage = Coverage::new(game.item_count());

    let rest: Vec<usize> = (0..n).filter(|&buyer| buyer != first).collect();
    let mut orderings = Permutations::new(rest);

    while let Some(order) = orderings.next_permutation() {
        coverage.clear();
        for &buyer in std::iter::once(&first).chain(order) {
            let marginal = game.join(&mut coverage, buyer);
            totals[buyer] = checked_accumulate(totals[buyer], marginal)?;
        }
    }

    Ok(totals)
}

fn checked_accumulate(total: Decimal, value: Decimal) -> Result<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| ShapleyError::ArithmeticOverflow("marginal contribution totals".to_string()))
}
