// Grouping, ranking and pivoting over the transaction list.
//
// Everything here is a pure function of its input. Group and pivot labels
// come out in ascending key order, which also fixes how ties rank in
// `top_n`.

use crate::error::AggregateError;
use crate::types::{Measure, Totals, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

/// Sum sales and profit over the whole dataset.
///
/// The margin is left as `None` when total sales is exactly zero instead of
/// producing NaN or infinity.
pub fn totals(data: &[Transaction]) -> Totals {
    let sales: f64 = data.iter().map(|t| t.sales).sum();
    let profit: f64 = data.iter().map(|t| t.profit).sum();
    let margin = if sales == 0.0 {
        None
    } else {
        Some(profit / sales * 100.0)
    };
    Totals {
        sales,
        profit,
        margin,
    }
}

impl Totals {
    pub fn margin_pct(&self) -> Result<f64, AggregateError> {
        self.margin.ok_or(AggregateError::DivisionByZero)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow<K> {
    pub key: K,
    pub values: Vec<f64>,
}

/// One row per distinct key, one summed column per measure.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable<K> {
    measures: Vec<Measure>,
    rows: Vec<GroupRow<K>>,
}

impl<K> GroupTable<K> {
    pub fn rows(&self) -> &[GroupRow<K>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, measure: Measure) -> Result<usize, AggregateError> {
        self.measures
            .iter()
            .position(|m| *m == measure)
            .ok_or(AggregateError::UnknownMeasure(measure.label()))
    }
}

pub fn group_sum<K, F>(data: &[Transaction], key_fn: F, measures: &[Measure]) -> GroupTable<K>
where
    K: Ord,
    F: Fn(&Transaction) -> K,
{
    let mut map: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for t in data {
        let sums = map
            .entry(key_fn(t))
            .or_insert_with(|| vec![0.0; measures.len()]);
        for (sum, m) in sums.iter_mut().zip(measures) {
            *sum += m.of(t);
        }
    }
    GroupTable {
        measures: measures.to_vec(),
        rows: map
            .into_iter()
            .map(|(key, values)| GroupRow { key, values })
            .collect(),
    }
}

/// The `n` largest rows by `measure`, largest first. Equal values keep the
/// table's order.
pub fn top_n<K: Clone>(
    table: &GroupTable<K>,
    measure: Measure,
    n: usize,
) -> Result<Vec<GroupRow<K>>, AggregateError> {
    let idx = table.column(measure)?;
    let mut ranked: Vec<&GroupRow<K>> = table.rows.iter().collect();
    // `sort_by` is stable; `total_cmp` keeps the order total even for NaN.
    ranked.sort_by(|a, b| b.values[idx].total_cmp(&a.values[idx]));
    Ok(ranked.into_iter().take(n).cloned().collect())
}

/// Dense two-way table. `cells[r][c]` belongs to `rows[r]` and `columns[c]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotMatrix<R, C, V> {
    pub rows: Vec<R>,
    pub columns: Vec<C>,
    pub cells: Vec<Vec<V>>,
}

impl<R, C, V: Copy> PivotMatrix<R, C, V> {
    pub fn column_values(&self, col: usize) -> Vec<V> {
        self.cells.iter().filter_map(|r| r.get(col).copied()).collect()
    }
}

pub fn pivot<R, C, V, FR, FC, FV>(
    data: &[Transaction],
    row_fn: FR,
    col_fn: FC,
    value_fn: FV,
) -> PivotMatrix<R, C, V>
where
    R: Ord + Clone,
    C: Ord + Clone,
    V: Copy + Default + AddAssign,
    FR: Fn(&Transaction) -> R,
    FC: Fn(&Transaction) -> C,
    FV: Fn(&Transaction) -> V,
{
    let mut sparse: BTreeMap<(R, C), V> = BTreeMap::new();
    let mut columns: BTreeSet<C> = BTreeSet::new();
    for t in data {
        let (r, c) = (row_fn(t), col_fn(t));
        columns.insert(c.clone());
        *sparse.entry((r, c)).or_default() += value_fn(t);
    }

    let columns: Vec<C> = columns.into_iter().collect();
    let mut rows: Vec<R> = Vec::new();
    let mut cells: Vec<Vec<V>> = Vec::new();
    for ((r, c), v) in sparse {
        if rows.last() != Some(&r) {
            rows.push(r);
            cells.push(vec![V::default(); columns.len()]);
        }
        if let (Ok(ci), Some(row)) = (columns.binary_search(&c), cells.last_mut()) {
            row[ci] = v;
        }
    }
    PivotMatrix {
        rows,
        columns,
        cells,
    }
}
