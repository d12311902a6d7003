use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxOptimizerError;
use crate::types::{Money, Rate};
use crate::TaxOptimizerResult;

/// One marginal band: income above `floor` is taxed at `rate` until the next floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub floor: Money,
    pub rate: Rate,
}

impl Bracket {
    pub fn new(floor: Money, rate: Rate) -> Self {
        Bracket { floor, rate }
    }
}

/// Ordered marginal-rate schedule. Floors strictly increase and start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> TaxOptimizerResult<Self> {
        validate_brackets(&brackets)?;
        Ok(BracketTable { brackets })
    }

    /// Build from `(floor, rate)` pairs.
    pub fn from_pairs(pairs: &[(Money, Rate)]) -> TaxOptimizerResult<Self> {
        Self::new(pairs.iter().map(|&(f, r)| Bracket::new(f, r)).collect())
    }

    /// Build from compiled-in constants that are known to be well formed.
    pub(crate) fn from_trusted_pairs(pairs: &[(Money, Rate)]) -> Self {
        let brackets: Vec<Bracket> = pairs.iter().map(|&(f, r)| Bracket::new(f, r)).collect();
        debug_assert!(validate_brackets(&brackets).is_ok());
        BracketTable { brackets }
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Upper bound of bracket `i`, `None` for the open-ended top band.
    pub fn ceiling(&self, i: usize) -> Option<Money> {
        self.brackets.get(i + 1).map(|b| b.floor)
    }

    /// Rate applying to the next dollar above `income`.
    pub fn marginal_rate(&self, income: Money) -> Rate {
        self.brackets
            .iter()
            .rev()
            .find(|b| income >= b.floor)
            .map(|b| b.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<Bracket>> for BracketTable {
    type Error = TaxOptimizerError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        BracketTable::new(brackets)
    }
}

impl From<BracketTable> for Vec<Bracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

fn validate_brackets(brackets: &[Bracket]) -> TaxOptimizerResult<()> {
    let first = brackets.first().ok_or_else(|| TaxOptimizerError::InvalidConfig {
        field: "brackets".into(),
        reason: "Bracket table must contain at least one bracket".into(),
    })?;
    if !first.floor.is_zero() {
        return Err(TaxOptimizerError::InvalidConfig {
            field: "brackets[0].floor".into(),
            reason: "Lowest bracket must start at zero".into(),
        });
    }
    for (i, b) in brackets.iter().enumerate() {
        if b.rate < Decimal::ZERO || b.rate > Decimal::ONE {
            return Err(TaxOptimizerError::InvalidConfig {
                field: format!("brackets[{i}].rate"),
                reason: "Marginal rate must be between 0 and 1".into(),
            });
        }
    }
    for (i, pair) in brackets.windows(2).enumerate() {
        if pair[1].floor <= pair[0].floor {
            return Err(TaxOptimizerError::InvalidConfig {
                field: format!("brackets[{}].floor", i + 1),
                reason: "Bracket floors must be strictly increasing".into(),
            });
        }
    }
    Ok(())
}

/// Progressive tax on `income` under `table`.
///
/// Walks the bands from the bottom, taxing `min(remaining, band width)` at
/// each band's rate. Non-positive income owes nothing.
pub fn bracket_tax(income: Money, table: &BracketTable) -> Money {
    if income <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut tax = Decimal::ZERO;
    let mut remaining = income;

    for (i, bracket) in table.brackets.iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let taxed = match table.ceiling(i) {
            Some(ceiling) => remaining.min(ceiling - bracket.floor),
            None => remaining,
        };
        tax += taxed * bracket.rate;
        remaining -= taxed;
    }

    tax.max(Decimal::ZERO)
}
