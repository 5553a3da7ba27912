//! Design matrices for the linear demand model
//!
//! A [`TermSpec`] is the single contract for column order. The fitted model
//! keeps the term specification it was trained with and every future matrix
//! is built from that same value, so historical and scenario matrices cannot
//! disagree.

use crate::data::{ColumnSet, ObservationTable};
use crate::error::{ForecastError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-period inputs a design row is built from
pub trait Covariates {
    /// 1-based time index
    fn t(&self) -> u32;
    /// Promotion flag, `None` if the source has no promo column
    fn promo(&self) -> Option<bool>;
    /// Holiday flag, `None` if the source has no holiday column
    fn holiday(&self) -> Option<bool>;
    /// Price index, `None` if the source has no price column
    fn price_index(&self) -> Option<f64>;
}

/// One regression term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Intercept,
    Trend,
    Promo,
    Holiday,
    /// Price index centered at 1.0
    Price,
}

impl Term {
    /// Column name used in coefficient reports
    pub fn name(&self) -> &'static str {
        match self {
            Term::Intercept => "intercept",
            Term::Trend => "t",
            Term::Promo => "promo",
            Term::Holiday => "holiday",
            Term::Price => "price_index_centered",
        }
    }

    /// Value of this term for one period
    pub fn value<C: Covariates>(&self, period: &C) -> Option<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Term::Intercept => Some(1.0),
            Term::Trend => Some(period.t() as f64),
            Term::Promo => period.promo().map(flag),
            Term::Holiday => period.holiday().map(flag),
            // Centering makes the intercept the revenue at a price index of 1.0
            Term::Price => period.price_index().map(|p| p - 1.0),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, immutable list of model terms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Term>", into = "Vec<Term>")]
pub struct TermSpec {
    terms: Vec<Term>,
}

impl TermSpec {
    /// Create a term specification.
    ///
    /// The intercept must be present and no term may appear twice.
    pub fn new(terms: Vec<Term>) -> Result<Self> {
        if !terms.contains(&Term::Intercept) {
            return Err(ForecastError::InvalidParameter(
                "Term specification must include the intercept".to_string(),
            ));
        }
        for (i, term) in terms.iter().enumerate() {
            if terms[..i].contains(term) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Term '{}' appears more than once",
                    term
                )));
            }
        }

        Ok(Self { terms })
    }

    /// Intercept, trend, promo, holiday and centered price
    pub fn full() -> Self {
        Self {
            terms: vec![
                Term::Intercept,
                Term::Trend,
                Term::Promo,
                Term::Holiday,
                Term::Price,
            ],
        }
    }

    /// Intercept, trend and promo
    pub fn trend_promo() -> Self {
        Self {
            terms: vec![Term::Intercept, Term::Trend, Term::Promo],
        }
    }

    /// Richest specification the given optional columns support
    pub fn for_columns(columns: ColumnSet) -> Self {
        let mut terms = vec![Term::Intercept, Term::Trend];
        if columns.promo {
            terms.push(Term::Promo);
        }
        if columns.holiday {
            terms.push(Term::Holiday);
        }
        if columns.price_index {
            terms.push(Term::Price);
        }
        Self { terms }
    }

    /// Richest specification the table supports
    pub fn for_table(table: &ObservationTable) -> Self {
        Self::for_columns(table.columns())
    }

    /// Terms in column order
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Column names in order
    pub fn names(&self) -> Vec<&'static str> {
        self.terms.iter().map(Term::name).collect()
    }

    /// Column index of a term
    pub fn position(&self, term: Term) -> Option<usize> {
        self.terms.iter().position(|&t| t == term)
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a validated spec
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Build the design matrix for `periods`, one row per period in input order
    pub fn build<C: Covariates>(&self, periods: &[C]) -> Result<FeatureMatrix> {
        let k = self.terms.len();
        let mut data = Vec::with_capacity(periods.len() * k);

        for (row, period) in periods.iter().enumerate() {
            for term in &self.terms {
                let value = term.value(period).ok_or_else(|| {
                    ForecastError::ShapeError(format!(
                        "Period {} has no '{}' column required by the term specification",
                        row + 1,
                        term
                    ))
                })?;
                data.push(value);
            }
        }

        Ok(FeatureMatrix {
            terms: self.clone(),
            values: DMatrix::from_row_slice(periods.len(), k, &data),
        })
    }
}

impl TryFrom<Vec<Term>> for TermSpec {
    type Error = ForecastError;

    fn try_from(terms: Vec<Term>) -> Result<Self> {
        Self::new(terms)
    }
}

impl From<TermSpec> for Vec<Term> {
    fn from(spec: TermSpec) -> Self {
        spec.terms
    }
}

/// Numeric design matrix tagged with the term specification that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    terms: TermSpec,
    values: DMatrix<f64>,
}

impl FeatureMatrix {
    /// Term specification of the columns
    pub fn terms(&self) -> &TermSpec {
        &self.terms
    }

    /// Underlying n x k matrix
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of periods
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of terms
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Values of one term's column
    pub fn column(&self, term: Term) -> Option<Vec<f64>> {
        let j = self.terms.position(term)?;
        Some(self.values.column(j).iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Period {
        t: u32,
        promo: Option<bool>,
        holiday: Option<bool>,
        price: Option<f64>,
    }

    impl Covariates for Period {
        fn t(&self) -> u32 {
            self.t
        }
        fn promo(&self) -> Option<bool> {
            self.promo
        }
        fn holiday(&self) -> Option<bool> {
            self.holiday
        }
        fn price_index(&self) -> Option<f64> {
            self.price
        }
    }

    fn periods() -> Vec<Period> {
        vec![
            Period { t: 1, promo: Some(true), holiday: Some(false), price: Some(1.02) },
            Period { t: 2, promo: Some(false), holiday: Some(true), price: Some(0.97) },
            Period { t: 3, promo: Some(false), holiday: Some(false), price: Some(1.0) },
        ]
    }

    #[rstest]
    #[case(TermSpec::full())]
    #[case(TermSpec::trend_promo())]
    #[case(TermSpec::new(vec![Term::Price, Term::Intercept]).unwrap())]
    #[case(TermSpec::new(vec![Term::Holiday, Term::Trend, Term::Intercept]).unwrap())]
    fn test_intercept_is_all_ones(#[case] spec: TermSpec) {
        let x = spec.build(&periods()).unwrap();
        assert_eq!(x.nrows(), 3);
        assert_eq!(x.ncols(), spec.len());
        assert_eq!(x.terms(), &spec);
        assert!(x.column(Term::Intercept).unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_column_order_follows_spec() {
        let spec = TermSpec::new(vec![Term::Price, Term::Intercept, Term::Trend]).unwrap();
        let x = spec.build(&periods()).unwrap();

        assert!((x.values()[(0, 0)] - 0.02).abs() < 1e-12);
        assert!((x.values()[(1, 0)] + 0.03).abs() < 1e-12);
        assert_eq!(x.values()[(0, 1)], 1.0);
        assert_eq!(x.values()[(2, 2)], 3.0);
        assert_eq!(spec.names(), vec!["price_index_centered", "intercept", "t"]);
    }

    #[test]
    fn test_flags_become_indicators() {
        let x = TermSpec::full().build(&periods()).unwrap();
        assert_eq!(x.column(Term::Promo).unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(x.column(Term::Holiday).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_shape_error() {
        let rows = vec![Period { t: 1, promo: Some(true), holiday: None, price: None }];
        let err = TermSpec::full().build(&rows).unwrap_err();
        assert!(matches!(err, ForecastError::ShapeError(_)));

        assert!(TermSpec::trend_promo().build(&rows).is_ok());
    }

    #[test]
    fn test_empty_periods_give_zero_rows() {
        let rows: Vec<Period> = Vec::new();
        let x = TermSpec::full().build(&rows).unwrap();
        assert_eq!(x.nrows(), 0);
        assert_eq!(x.ncols(), 5);
    }

    #[test]
    fn test_spec_validation() {
        assert!(TermSpec::new(vec![Term::Trend]).is_err());
        assert!(TermSpec::new(vec![Term::Intercept, Term::Trend, Term::Trend]).is_err());
    }

    #[test]
    fn test_for_columns() {
        let spec = TermSpec::for_columns(ColumnSet {
            promo: true,
            holiday: false,
            price_index: false,
        });
        assert_eq!(spec, TermSpec::trend_promo());

        let spec = TermSpec::for_columns(ColumnSet {
            promo: true,
            holiday: true,
            price_index: true,
        });
        assert_eq!(spec, TermSpec::full());
    }

    #[test]
    fn test_spec_serde() {
        let json = serde_json::to_string(&TermSpec::trend_promo()).unwrap();
        assert_eq!(json, r#"["intercept","trend","promo"]"#);

        let bad: std::result::Result<TermSpec, _> = serde_json::from_str(r#"["trend"]"#);
        assert!(bad.is_err());
    }
}
