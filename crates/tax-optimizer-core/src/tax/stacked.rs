//! Preferential-rate tax on long-term gains and qualified dividends.
//!
//! Preferential income sits on top of ordinary income: the first
//! preferential dollar is placed at `ordinary` and the last at
//! `ordinary + preferential`. Only the preferential layer is taxed here.

use rust_decimal::Decimal;

use crate::tax::brackets::BracketTable;
use crate::types::Money;

/// Tax on `preferential` income stacked above `ordinary` taxable income.
///
/// Walks the preferential schedule from the highest threshold down. Each
/// band taxes the slice between `max(ordinary, band floor)` and the top of
/// what remains unplaced, then lowers that top to the band's lower edge.
pub fn stacked_income_tax(ordinary: Money, preferential: Money, table: &BracketTable) -> Money {
    if preferential <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let ordinary = ordinary.max(Decimal::ZERO);

    let mut tax = Decimal::ZERO;
    let mut remaining = preferential;
    let mut top = ordinary + preferential;

    for bracket in table.brackets().iter().rev() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let lower = ordinary.max(bracket.floor);
        if top <= lower {
            continue;
        }
        let slice = (top - lower).min(remaining);
        tax += slice * bracket.rate;
        remaining -= slice;
        top = lower;
    }

    tax
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn single_pref() -> BracketTable {
        BracketTable::from_pairs(&[
            (dec!(0), dec!(0)),
            (dec!(48_350), dec!(0.15)),
            (dec!(533_400), dec!(0.20)),
        ])
        .unwrap()
    }

    #[test]
    fn test_entirely_inside_zero_band() {
        // 30,000 + 5,000 = 35,000 < 48,350
        assert_eq!(stacked_income_tax(dec!(30_000), dec!(5_000), &single_pref()), dec!(0));
    }

    #[test]
    fn test_straddles_zero_and_fifteen() {
        // Combined 60,000: 8,350 at 0%, 11,650 at 15% = 1,747.50
        assert_eq!(
            stacked_income_tax(dec!(40_000), dec!(20_000), &single_pref()),
            dec!(1_747.50)
        );
    }

    #[test]
    fn test_ordinary_exactly_at_threshold() {
        // Every preferential dollar sits above 48,350
        assert_eq!(
            stacked_income_tax(dec!(48_350), dec!(1_000), &single_pref()),
            dec!(150)
        );
    }

    #[test]
    fn test_combined_exactly_at_threshold() {
        // Last preferential dollar lands exactly on 48,350: all at 0%
        assert_eq!(
            stacked_income_tax(dec!(47_350), dec!(1_000), &single_pref()),
            dec!(0)
        );
    }

    #[test]
    fn test_spans_all_three_bands() {
        // Ordinary 40,000, preferential 600,000, combined 640,000:
        // 106,600 at 20% = 21,320; 485,050 at 15% = 72,757.50; 8,350 at 0%
        assert_eq!(
            stacked_income_tax(dec!(40_000), dec!(600_000), &single_pref()),
            dec!(94_077.50)
        );
    }

    #[test]
    fn test_ordinary_above_top_threshold() {
        assert_eq!(
            stacked_income_tax(dec!(700_000), dec!(10_000), &single_pref()),
            dec!(2_000)
        );
    }

    #[test]
    fn test_non_positive_preferential_is_zero() {
        assert_eq!(stacked_income_tax(dec!(100_000), dec!(0), &single_pref()), dec!(0));
        assert_eq!(stacked_income_tax(dec!(100_000), dec!(-10), &single_pref()), dec!(0));
    }

    #[test]
    fn test_never_double_counts() {
        // The taxed slices always add up to the preferential amount, so the
        // tax can never exceed preferential * top rate.
        let table = single_pref();
        for ordinary in [dec!(0), dec!(48_349), dec!(48_350), dec!(533_399), dec!(533_400)] {
            let pref = dec!(100_000);
            let tax = stacked_income_tax(ordinary, pref, &table);
            assert!(tax <= pref * dec!(0.20));
            assert!(tax >= Decimal::ZERO);
        }
    }
}
