use std::cmp::min;
use std::ops::Index;

use itertools::Itertools;
use varisat::{ExtendFormula, Lit};

/// Clauses stating no two of `lits` are true; (!A + !B) * (!A + !C) * ...
pub(crate) fn at_most_one(lits: &[Lit]) -> Vec<Vec<Lit>> {
    lits.iter()
        .combinations(2)
        .map(|pair| vec![!**pair.index(0), !**pair.index(1)])
        .collect_vec()
}

/// Clauses making `ladder` an order encoding: `ladder[k]` means "value > k", so each rung implies the one below it.
pub(crate) fn ordered(ladder: &[Lit]) -> Vec<Vec<Lit>> {
    ladder.iter()
        .tuple_windows()
        .map(|(lower, upper)| vec![!*upper, *lower])
        .collect_vec()
}

/// Add clauses to `formula` requiring `Σ weight · lit <= bound` over `terms`, all weights positive.
///
/// Small cases are handled directly; in general this is a sequential weight counter.
/// Register `m` after term `j` is forced true whenever the first `j + 1` terms sum to more than `m`.
/// It is never forced false, so any assignment within the bound extends to the registers, and any assignment over it trips an overflow clause.
pub(crate) fn at_most_weighted<F: ExtendFormula>(formula: &mut F, terms: &[(u64, Lit)], bound: u64) {
    let total: u64 = terms.iter().map(|(weight, _)| weight).sum();
    if total <= bound {
        return;
    }

    if bound == 0 {
        terms.iter().for_each(|(_, lit)| formula.add_clause(&[!*lit]));
        return;
    }

    if bound == 1 && terms.iter().all(|(weight, _)| *weight == 1) {
        let lits = terms.iter().map(|(_, lit)| *lit).collect_vec();
        at_most_one(&lits).iter().for_each(|clause| formula.add_clause(clause));
        return;
    }

    // previous[m] <=> the terms so far sum to at least m + 1
    let mut previous: Vec<Lit> = Vec::new();
    for (weight, lit) in terms.iter().copied() {
        if weight > bound {
            formula.add_clause(&[!lit]);
            continue;
        }
        let weight = weight as usize;
        let bound = bound as usize;

        // this term on top of the previous sum would overflow
        if let Some(tight) = previous.get(bound - weight) {
            formula.add_clause(&[!lit, !*tight]);
        }

        let next = (0..min(bound, previous.len() + weight))
            .map(|_| formula.new_lit())
            .collect_vec();

        for register in next.iter().take(weight) {
            formula.add_clause(&[!lit, *register]);
        }
        for (carried, register) in previous.iter().zip(&next) {
            formula.add_clause(&[!*carried, *register]);
        }
        for (m, carried) in previous.iter().enumerate() {
            if let Some(register) = next.get(m + weight) {
                formula.add_clause(&[!lit, !*carried, *register]);
            }
        }

        previous = next;
    }
}

/// Build a totalizer over `terms` and return its output registers, at most `cap` of them.
///
/// Output `m` is forced true whenever the terms sum to at least `m + 1`; the last output therefore also covers every sum past the cap.
/// The registers stay in `formula`, so a sum can be bounded again and again by adding the unit clause `!outputs[b]` for "sum <= b".
pub(crate) fn totalizer<F: ExtendFormula>(formula: &mut F, terms: &[(u64, Lit)], cap: usize) -> Vec<Lit> {
    match terms {
        [] => Vec::new(),
        [(weight, lit)] => vec![*lit; min(*weight, cap as u64) as usize],
        _ => {
            let (left, right) = terms.split_at(terms.len() / 2);
            let left = totalizer(formula, left, cap);
            let right = totalizer(formula, right, cap);
            merge_counts(formula, &left, &right, cap)
        }
    }
}

fn merge_counts<F: ExtendFormula>(formula: &mut F, left: &[Lit], right: &[Lit], cap: usize) -> Vec<Lit> {
    if left.is_empty() || right.is_empty() {
        return left.iter().chain(right).copied().take(cap).collect_vec();
    }

    let outputs = (0..min(left.len() + right.len(), cap))
        .map(|_| formula.new_lit())
        .collect_vec();

    for counts in [left, right] {
        for (register, count) in outputs.iter().zip(counts) {
            formula.add_clause(&[!*count, *register]);
        }
    }
    for ((i, a), (j, b)) in left.iter().enumerate().cartesian_product(right.iter().enumerate()) {
        if let Some(register) = outputs.get(i + j + 1) {
            formula.add_clause(&[!*a, !*b, *register]);
        }
    }

    outputs
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use varisat::{CnfFormula, ExtendFormula, Lit, Solver};

    use crate::logic::{at_most_weighted, ordered, totalizer};

    fn count_models(weights: &[u64], bound: u64) -> (usize, usize) {
        // (models found, assignments actually within bound)
        let mut formula = CnfFormula::new();
        let lits = weights.iter().map(|_| formula.new_lit()).collect_vec();
        let terms = weights.iter().copied().zip(lits.iter().copied()).collect_vec();
        at_most_weighted(&mut formula, &terms, bound);

        let mut found = 0;
        let mut expected = 0;
        for assignment in 0..(1u32 << weights.len()) {
            let chosen = lits.iter().enumerate()
                .map(|(i, lit)| if assignment & (1 << i) != 0 { *lit } else { !*lit })
                .collect_vec();
            let sum: u64 = weights.iter().enumerate()
                .filter(|(i, _)| assignment & (1 << i) != 0)
                .map(|(_, weight)| weight)
                .sum();
            if sum <= bound {
                expected += 1;
            }

            let mut solver = Solver::new();
            solver.add_formula(&formula);
            solver.assume(&chosen);
            if solver.solve().unwrap() {
                found += 1;
            }
        }

        (found, expected)
    }

    #[test]
    fn unit_weights() {
        let (found, expected) = count_models(&[1, 1, 1, 1, 1], 2);
        assert_eq!(found, expected);
        assert_eq!(found, 1 + 5 + 10);
    }

    #[test]
    fn at_most_one_shortcut() {
        let (found, expected) = count_models(&[1, 1, 1, 1], 1);
        assert_eq!(found, expected);
        assert_eq!(found, 5);
    }

    #[test]
    fn mixed_weights() {
        let (found, expected) = count_models(&[2, 1, 3, 1, 2], 4);
        assert_eq!(found, expected);
    }

    #[test]
    fn weight_above_bound() {
        let (found, expected) = count_models(&[1, 5, 2], 3);
        assert_eq!(found, expected);
        assert_eq!(found, 4);
    }

    #[test]
    fn zero_bound() {
        let (found, expected) = count_models(&[1, 2], 0);
        assert_eq!((found, expected), (1, 1));
    }

    #[test]
    fn totalizer_bounds_every_sum() {
        let weights = [2, 1, 3, 1, 1];
        let cap = 5;
        let mut formula = CnfFormula::new();
        let lits = weights.iter().map(|_| formula.new_lit()).collect_vec();
        let terms = weights.iter().copied().zip(lits.iter().copied()).collect_vec();
        let outputs = totalizer(&mut formula, &terms, cap);
        assert_eq!(outputs.len(), cap);

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        for (bound, output) in outputs.iter().enumerate() {
            for assignment in 0..(1u32 << weights.len()) {
                let mut chosen = lits.iter().enumerate()
                    .map(|(i, lit)| if assignment & (1 << i) != 0 { *lit } else { !*lit })
                    .collect_vec();
                let sum: u64 = weights.iter().enumerate()
                    .filter(|(i, _)| assignment & (1 << i) != 0)
                    .map(|(_, weight)| weight)
                    .sum();

                chosen.push(!*output);
                solver.assume(&chosen);
                assert_eq!(solver.solve().unwrap(), sum <= bound as u64, "sum {} against bound {}", sum, bound);
            }
        }
    }

    #[test]
    fn totalizer_tightens_in_place() {
        let mut solver = Solver::new();
        let lits = (0..6).map(|_| solver.new_lit()).collect_vec();
        let terms = lits.iter().map(|lit| (1, *lit)).collect_vec();
        let outputs = totalizer(&mut solver, &terms, 4);

        // at least three true
        for chosen in lits.iter().copied().combinations(4) {
            solver.add_clause(&chosen);
        }

        solver.add_clause(&[!outputs[3]]);
        assert!(solver.solve().unwrap());
        solver.add_clause(&[!outputs[2]]);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert_eq!(lits.iter().filter(|lit| model.contains(*lit)).count(), 3);

        solver.add_clause(&[!outputs[1]]);
        assert!(!solver.solve().unwrap());
    }

    #[test]
    fn ladder_is_monotone() {
        let mut formula = CnfFormula::new();
        let ladder: Vec<Lit> = (0..3).map(|_| formula.new_lit()).collect();
        ordered(&ladder).iter().for_each(|clause| formula.add_clause(clause));

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        solver.assume(&[!ladder[0], ladder[2]]);
        assert!(!solver.solve().unwrap());
        solver.assume(&[ladder[1], !ladder[2]]);
        assert!(solver.solve().unwrap());
    }
}
