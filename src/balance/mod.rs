// src/balance/mod.rs
//! Turns the raw extracted figures into a balance sheet that adds up.
//!
//! The assets side is authoritative. Shortfalls in a breakdown are plugged
//! into the non-current bucket, and whatever still separates total assets
//! from liabilities plus net assets is absorbed by net assets.

use serde::Serialize;

/// Figures as found in the document; `None` means no usable fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawBalanceFacts {
    pub current_assets: Option<i64>,
    pub non_current_assets: Option<i64>,
    pub current_liabilities: Option<i64>,
    pub non_current_liabilities: Option<i64>,
    pub net_assets: Option<i64>,
    pub total_assets: Option<i64>,
    pub total_liabilities: Option<i64>,
}

/// `RawBalanceFacts` after the degrade-to-zero step. Zero now also stands
/// for "not reported".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilledBalanceFacts {
    pub current_assets: i64,
    pub non_current_assets: i64,
    pub current_liabilities: i64,
    pub non_current_liabilities: i64,
    pub net_assets: i64,
    pub total_assets: i64,
    pub total_liabilities: i64,
}

impl RawBalanceFacts {
    pub fn filled(&self) -> FilledBalanceFacts {
        FilledBalanceFacts {
            current_assets: self.current_assets.unwrap_or(0),
            non_current_assets: self.non_current_assets.unwrap_or(0),
            current_liabilities: self.current_liabilities.unwrap_or(0),
            non_current_liabilities: self.non_current_liabilities.unwrap_or(0),
            net_assets: self.net_assets.unwrap_or(0),
            total_assets: self.total_assets.unwrap_or(0),
            total_liabilities: self.total_liabilities.unwrap_or(0),
        }
    }
}

/// The five-number summary handed to the presentation layer.
///
/// Always satisfies `current_assets + non_current_assets == total_assets`
/// and `current_liabilities + non_current_liabilities + net_assets == total_assets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BalanceSheetSummary {
    pub company_name: String,
    pub current_assets: i64,
    pub non_current_assets: i64,
    pub current_liabilities: i64,
    pub non_current_liabilities: i64,
    pub net_assets: i64,
    pub total_assets: i64,
}

impl BalanceSheetSummary {
    /// False for the all-zero summary produced from a document with no
    /// matching figures.
    pub fn has_data(&self) -> bool {
        self.total_assets != 0
    }

    /// Net assets as a percentage of total assets.
    pub fn equity_ratio(&self) -> Option<f64> {
        percent(self.net_assets, self.total_assets)
    }

    /// Current assets as a percentage of current liabilities.
    pub fn current_ratio(&self) -> Option<f64> {
        percent(self.current_assets, self.current_liabilities)
    }
}

fn percent(numerator: i64, denominator: i64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 * 100.0 / denominator as f64)
}

/// Figures are clamped to this magnitude before reconciling, which keeps every
/// derived figure well inside `i64`.
pub const FIGURE_LIMIT: i64 = 100_000_000_000_000_000;

/// Reconciles the raw figures. Cannot fail.
pub fn reconcile(company_name: &str, raw: &RawBalanceFacts) -> BalanceSheetSummary {
    let filled = raw.filled();
    let clamp = |v: i64| i128::from(v.clamp(-FIGURE_LIMIT, FIGURE_LIMIT));
    let mut ca = clamp(filled.current_assets);
    let mut nca = clamp(filled.non_current_assets);
    let cl = clamp(filled.current_liabilities);
    let mut ncl = clamp(filled.non_current_liabilities);
    let mut na = clamp(filled.net_assets);

    // 1. total assets: reported if positive, else the sum of the breakdown
    let total_assets = match clamp(filled.total_assets) {
        t if t > 0 => t,
        _ => ca + nca,
    };

    // 2. assets breakdown: plug the difference into non-current
    let breakdown = ca + nca;
    if breakdown < total_assets {
        nca = total_assets - ca;
    } else if breakdown > total_assets {
        // Breakdown overshoots a reported total; the total wins.
        if ca > total_assets {
            ca = total_assets;
        }
        nca = total_assets - ca;
    }

    // 3. total liabilities from net assets
    let mut total_liabilities = clamp(filled.total_liabilities);
    if total_liabilities <= 0 && na > 0 {
        total_liabilities = total_assets - na;
    }

    // 4. net assets from total liabilities
    if na == 0 && total_liabilities > 0 {
        na = total_assets - total_liabilities;
    }

    // 5. liabilities breakdown: plug the shortfall into non-current
    if cl + ncl < total_liabilities {
        ncl = total_liabilities - cl;
    }

    // 6. force balance; net assets takes the residual
    let residual = total_assets - (cl + ncl + na);
    if residual != 0 {
        tracing::debug!("Balancing residual of {} absorbed by net assets", residual);
        na += residual;
    }

    BalanceSheetSummary {
        company_name: company_name.to_string(),
        current_assets: narrow(ca),
        non_current_assets: narrow(nca),
        current_liabilities: narrow(cl),
        non_current_liabilities: narrow(ncl),
        net_assets: narrow(na),
        total_assets: narrow(total_assets),
    }
}

// Every figure is bounded by a small multiple of FIGURE_LIMIT here.
fn narrow(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_balanced(s: &BalanceSheetSummary) {
        assert_eq!(s.current_assets + s.non_current_assets, s.total_assets, "{:?}", s);
        assert_eq!(
            s.current_liabilities + s.non_current_liabilities + s.net_assets,
            s.total_assets,
            "{:?}",
            s
        );
    }

    #[test]
    fn shortfall_plugs_into_non_current_assets() {
        let raw = RawBalanceFacts {
            current_assets: Some(100),
            non_current_assets: Some(50),
            total_assets: Some(200),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        assert_eq!(s.non_current_assets, 100);
        assert_eq!(s.total_assets, 200);
        assert_balanced(&s);
    }

    #[test]
    fn residual_is_absorbed_by_net_assets() {
        let raw = RawBalanceFacts {
            current_assets: Some(120),
            non_current_assets: Some(80),
            current_liabilities: Some(50),
            non_current_liabilities: Some(30),
            net_assets: Some(100),
            total_assets: Some(200),
            total_liabilities: Some(80),
        };
        let s = reconcile("Test", &raw);
        assert_eq!(s.net_assets, 120);
        assert_balanced(&s);
    }

    #[test]
    fn all_zero_input_gives_empty_summary() {
        let s = reconcile("Empty", &RawBalanceFacts::default());
        assert_eq!(
            s,
            BalanceSheetSummary {
                company_name: "Empty".to_string(),
                current_assets: 0,
                non_current_assets: 0,
                current_liabilities: 0,
                non_current_liabilities: 0,
                net_assets: 0,
                total_assets: 0,
            }
        );
        assert!(!s.has_data());
        assert_eq!(s.equity_ratio(), None);
    }

    #[test]
    fn missing_total_assets_is_derived() {
        let raw = RawBalanceFacts {
            current_assets: Some(300),
            non_current_assets: Some(700),
            current_liabilities: Some(200),
            non_current_liabilities: Some(100),
            net_assets: Some(700),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        assert_eq!(s.total_assets, 1000);
        assert_eq!(s.net_assets, 700);
        assert_balanced(&s);
        assert!(s.has_data());
    }

    #[test]
    fn total_liabilities_derived_from_net_assets_plugs_non_current() {
        let raw = RawBalanceFacts {
            current_assets: Some(400),
            non_current_assets: Some(600),
            current_liabilities: Some(100),
            net_assets: Some(600),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        // total liabilities = 1000 - 600 = 400, so 300 lands in non-current
        assert_eq!(s.non_current_liabilities, 300);
        assert_eq!(s.net_assets, 600);
        assert_balanced(&s);
    }

    #[test]
    fn net_assets_derived_from_total_liabilities() {
        let raw = RawBalanceFacts {
            current_assets: Some(500),
            non_current_assets: Some(500),
            current_liabilities: Some(250),
            non_current_liabilities: Some(150),
            total_liabilities: Some(400),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        assert_eq!(s.net_assets, 600);
        assert_balanced(&s);
    }

    #[test]
    fn overshooting_breakdown_is_capped_by_reported_total() {
        let raw = RawBalanceFacts {
            current_assets: Some(300),
            non_current_assets: Some(900),
            total_assets: Some(1000),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        assert_eq!((s.current_assets, s.non_current_assets), (300, 700));
        assert_balanced(&s);

        let raw = RawBalanceFacts {
            current_assets: Some(1500),
            total_assets: Some(1000),
            ..Default::default()
        };
        let s = reconcile("Test", &raw);
        assert_eq!((s.current_assets, s.non_current_assets), (1000, 0));
        assert_balanced(&s);
    }

    #[test]
    fn negative_net_assets_survive() {
        let raw = RawBalanceFacts {
            current_assets: Some(100),
            non_current_assets: Some(100),
            current_liabilities: Some(150),
            non_current_liabilities: Some(100),
            net_assets: Some(-50),
            total_liabilities: Some(250),
            ..Default::default()
        };
        let s = reconcile("Insolvent", &raw);
        assert_eq!(s.net_assets, -50);
        assert_balanced(&s);
    }

    #[test]
    fn invariants_hold_and_reconcile_is_idempotent() {
        let values = [None, Some(0), Some(40), Some(150), Some(1_000)];
        for &ca in &values {
            for &nca in &values {
                for &ta in &values {
                    for &na in &values {
                        for &tl in &values {
                            let raw = RawBalanceFacts {
                                current_assets: ca,
                                non_current_assets: nca,
                                current_liabilities: Some(60),
                                non_current_liabilities: nca,
                                net_assets: na,
                                total_assets: ta,
                                total_liabilities: tl,
                            };
                            let first = reconcile("Grid", &raw);
                            assert_balanced(&first);
                            assert_eq!(first, reconcile("Grid", &raw));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn extreme_figures_are_clamped_not_overflowed() {
        let raw = RawBalanceFacts {
            current_liabilities: Some(i64::MAX),
            non_current_liabilities: Some(1),
            net_assets: Some(10),
            ..Default::default()
        };
        let s = reconcile("Huge", &raw);
        assert_eq!(s.current_liabilities, FIGURE_LIMIT);
        assert_balanced(&s);

        let raw = RawBalanceFacts {
            current_assets: Some(i64::MAX),
            non_current_assets: Some(i64::MAX),
            current_liabilities: Some(i64::MIN),
            non_current_liabilities: Some(i64::MIN),
            net_assets: Some(i64::MAX),
            total_assets: Some(i64::MIN),
            total_liabilities: Some(i64::MAX),
        };
        let s = reconcile("Huge", &raw);
        assert_eq!(s.total_assets, 2 * FIGURE_LIMIT);
        assert_balanced(&s);
    }

    #[test]
    fn ratios() {
        let s = BalanceSheetSummary {
            company_name: "Ratio".to_string(),
            current_assets: 300,
            non_current_assets: 700,
            current_liabilities: 150,
            non_current_liabilities: 250,
            net_assets: 600,
            total_assets: 1000,
        };
        assert_eq!(s.equity_ratio(), Some(60.0));
        assert_eq!(s.current_ratio(), Some(200.0));
    }

    #[test]
    fn serializes_with_presentation_field_names() {
        let s = reconcile("トヨタ", &RawBalanceFacts::default());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["CompanyName"], "トヨタ");
        assert_eq!(json["TotalAssets"], 0);
        assert!(json.get("NonCurrentLiabilities").is_some());
    }
}
