// src/extractors/facts.rs

// --- Imports ---
use crate::balance::RawBalanceFacts;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns for Context Matching (Lazy Static) ---
// Comparative figures: Prior1YearInstant, Prior1QuarterDuration, ...
static PRIOR_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Prior").expect("Failed to compile PRIOR_PERIOD_RE"));

static CURRENT_INSTANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:CurrentYear|CurrentQuarter|Interim)Instant")
        .expect("Failed to compile CURRENT_INSTANT_RE")
});

static CURRENT_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"CurrentYear|CurrentQuarter|Interim").expect("Failed to compile CURRENT_PERIOD_RE")
});

// --- Data Structures ---
/// One numeric fact as it appears in the instance document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFact {
    pub label: String,       // e.g. "jppfs_cor:CurrentAssets"
    pub context_ref: String, // e.g. "CurrentYearInstant"
    pub raw_value: String,
}

/// How well a fact's reporting context fits a balance-sheet figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextPriority {
    PriorPeriod = 0,
    Other = 1,
    CurrentPeriod = 2,
    CurrentInstant = 3,
}

impl ContextPriority {
    pub fn of(context_ref: &str) -> Self {
        if PRIOR_PERIOD_RE.is_match(context_ref) {
            ContextPriority::PriorPeriod
        } else if CURRENT_INSTANT_RE.is_match(context_ref) {
            ContextPriority::CurrentInstant
        } else if CURRENT_PERIOD_RE.is_match(context_ref) {
            ContextPriority::CurrentPeriod
        } else {
            ContextPriority::Other
        }
    }
}

/// Balance-sheet concepts and the element names they have been filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItem {
    CurrentAssets,
    NonCurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    NetAssets,
    TotalAssets,
    TotalLiabilities,
}

impl LineItem {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            LineItem::CurrentAssets => &["CurrentAssets", "AssetsCurrent"],
            LineItem::NonCurrentAssets => &["NonCurrentAssets", "AssetsNonCurrent"],
            LineItem::CurrentLiabilities => &["CurrentLiabilities", "LiabilitiesCurrent"],
            LineItem::NonCurrentLiabilities => &["NonCurrentLiabilities", "LiabilitiesNonCurrent"],
            LineItem::NetAssets => &["NetAssets", "Equity"],
            LineItem::TotalAssets => &["Assets"],
            LineItem::TotalLiabilities => &["Liabilities"],
        }
    }
}

// --- Parsing ---
/// Collects every element carrying a `contextRef` from an XBRL instance.
pub fn parse_facts(xml: &str) -> Result<Vec<TaggedFact>, ExtractError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ExtractError::MalformedDocument(e.to_string()))?;

    let root = doc.root_element();
    if root.tag_name().name() != "xbrl" {
        return Err(ExtractError::UnexpectedSchema(format!(
            "root element is <{}>, expected <xbrl>",
            root.tag_name().name()
        )));
    }

    let facts: Vec<TaggedFact> = root
        .descendants()
        .filter(|n| n.is_element())
        .filter_map(|node| {
            let context_ref = node.attribute("contextRef")?;
            let local = node.tag_name().name();
            let label = match node
                .tag_name()
                .namespace()
                .and_then(|ns| node.lookup_prefix(ns))
            {
                Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
                _ => local.to_string(),
            };
            Some(TaggedFact {
                label,
                context_ref: context_ref.to_string(),
                raw_value: node.text().unwrap_or("").trim().to_string(),
            })
        })
        .collect();

    tracing::debug!("Parsed {} tagged facts", facts.len());
    Ok(facts)
}

// --- Selection ---
/// `label` names `target`, optionally behind a namespace prefix.
pub fn label_matches(label: &str, target: &str) -> bool {
    match label.strip_suffix(target) {
        Some("") => true,
        Some(head) => head.ends_with(':'),
        None => false,
    }
}

fn numeric_value(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    // Values outside the i64 range are not figures we can use.
    raw.parse::<f64>()
        .ok()
        .map(f64::trunc)
        .filter(|v| v.is_finite() && *v >= i64::MIN as f64 && *v < i64::MAX as f64)
        .map(|v| v as i64)
}

/// Picks the value of the best-placed fact for any of `targets`. Highest
/// context priority wins. Ties go to the earlier spelling in `targets`, then
/// to the first fact seen. Facts without a numeric value are ignored.
/// `None` when nothing qualifies.
pub fn extract_best_fact(facts: &[TaggedFact], targets: &[&str]) -> Option<i64> {
    let mut best: Option<(ContextPriority, i64)> = None;

    for target in targets {
        for fact in facts.iter().filter(|f| label_matches(&f.label, target)) {
            let Some(value) = numeric_value(&fact.raw_value) else {
                continue;
            };
            let priority = ContextPriority::of(&fact.context_ref);
            if best.map_or(true, |(p, _)| priority > p) {
                best = Some((priority, value));
            }
        }
    }

    best.map(|(_, v)| v)
}

/// Runs the extractor once per balance-sheet line item.
pub fn balance_facts(facts: &[TaggedFact]) -> RawBalanceFacts {
    let get = |item: LineItem| extract_best_fact(facts, item.labels());
    let raw = RawBalanceFacts {
        current_assets: get(LineItem::CurrentAssets),
        non_current_assets: get(LineItem::NonCurrentAssets),
        current_liabilities: get(LineItem::CurrentLiabilities),
        non_current_liabilities: get(LineItem::NonCurrentLiabilities),
        net_assets: get(LineItem::NetAssets),
        total_assets: get(LineItem::TotalAssets),
        total_liabilities: get(LineItem::TotalLiabilities),
    };
    tracing::debug!("Raw balance facts: {:?}", raw);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(label: &str, context: &str, value: &str) -> TaggedFact {
        TaggedFact {
            label: label.to_string(),
            context_ref: context.to_string(),
            raw_value: value.to_string(),
        }
    }

    #[test]
    fn suffix_match_respects_separator() {
        assert!(label_matches("jppfs_cor:CurrentAssets", "CurrentAssets"));
        assert!(label_matches("CurrentAssets", "CurrentAssets"));
        assert!(!label_matches("OtherCurrentAssets", "CurrentAssets"));
        assert!(!label_matches("jppfs_cor:OtherCurrentAssets", "CurrentAssets"));
        assert!(!label_matches("jppfs_cor:CurrentAssetsOther", "CurrentAssets"));
    }

    #[test]
    fn context_priorities() {
        assert_eq!(ContextPriority::of("CurrentYearInstant"), ContextPriority::CurrentInstant);
        assert_eq!(ContextPriority::of("CurrentQuarterInstant"), ContextPriority::CurrentInstant);
        assert_eq!(ContextPriority::of("InterimInstant"), ContextPriority::CurrentInstant);
        assert_eq!(ContextPriority::of("CurrentYearDuration"), ContextPriority::CurrentPeriod);
        assert_eq!(ContextPriority::of("FilingDateInstant"), ContextPriority::Other);
        assert_eq!(ContextPriority::of("Prior1YearInstant"), ContextPriority::PriorPeriod);
    }

    #[test]
    fn current_instant_beats_prior_in_either_order() {
        let current = fact("jppfs_cor:CurrentAssets", "CurrentYearInstant", "500");
        let prior = fact("jppfs_cor:CurrentAssets", "Prior1YearInstant", "400");

        let facts = vec![prior.clone(), current.clone()];
        assert_eq!(extract_best_fact(&facts, &["CurrentAssets"]), Some(500));
        let facts = vec![current, prior];
        assert_eq!(extract_best_fact(&facts, &["CurrentAssets"]), Some(500));
    }

    #[test]
    fn earlier_spelling_wins_ties_and_alternate_spellings_count() {
        let facts = vec![
            fact("ifrs:AssetsCurrent", "CurrentYearInstant", "10"),
            fact("jppfs_cor:CurrentAssets", "CurrentYearInstant", "20"),
        ];
        assert_eq!(
            extract_best_fact(&facts, LineItem::CurrentAssets.labels()),
            Some(20)
        );

        let facts = vec![
            fact("x:Equity", "CurrentYearInstant", "10"),
            fact("jppfs_cor:NetAssets", "CurrentYearInstant", "20"),
        ];
        assert_eq!(extract_best_fact(&facts, LineItem::NetAssets.labels()), Some(20));

        // Only an alternate spelling reported for the current period.
        let facts = vec![
            fact("jppfs_cor:NetAssets", "Prior1YearInstant", "15"),
            fact("ifrs:Equity", "CurrentYearInstant", "25"),
        ];
        assert_eq!(extract_best_fact(&facts, LineItem::NetAssets.labels()), Some(25));

        // Same spelling, same priority: first fact seen.
        let facts = vec![
            fact("jppfs_cor:NetAssets", "CurrentYearInstant", "30"),
            fact("jppfs_cor:NetAssets", "CurrentYearInstant_NonConsolidatedMember", "40"),
        ];
        assert_eq!(extract_best_fact(&facts, &["NetAssets"]), Some(30));
    }

    #[test]
    fn non_numeric_values_are_skipped() {
        let facts = vec![
            fact("jppfs_cor:NetAssets", "CurrentYearInstant", ""),
            fact("jppfs_cor:NetAssets", "CurrentYearInstant", "n/a"),
            fact("jppfs_cor:NetAssets", "Prior1YearInstant", "77"),
        ];
        assert_eq!(extract_best_fact(&facts, &["NetAssets"]), Some(77));
        assert_eq!(extract_best_fact(&facts[..2], &["NetAssets"]), None);
        assert_eq!(extract_best_fact(&[], &["NetAssets"]), None);
    }

    #[test]
    fn decimal_values_truncate() {
        let facts = vec![fact("Assets", "CurrentYearInstant", "1234.9")];
        assert_eq!(extract_best_fact(&facts, &["Assets"]), Some(1234));
    }

    #[test]
    fn out_of_range_values_are_skipped() {
        let facts = vec![
            fact("jppfs_cor:CurrentLiabilities", "CurrentYearInstant", "1e30"),
            fact("jppfs_cor:CurrentLiabilities", "Prior1YearInstant", "5"),
        ];
        assert_eq!(extract_best_fact(&facts, &["CurrentLiabilities"]), Some(5));
        assert_eq!(extract_best_fact(&facts[..1], &["CurrentLiabilities"]), None);
        assert_eq!(numeric_value("-9.9e18"), None);
        assert_eq!(numeric_value("9223372036854775807"), Some(i64::MAX));
    }

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:jppfs_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jppfs/2023-12-01/jppfs_cor"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <xbrli:context id="CurrentYearInstant"/>
  <jppfs_cor:CurrentAssets contextRef="Prior1YearInstant" unitRef="JPY" decimals="-6">900</jppfs_cor:CurrentAssets>
  <jppfs_cor:CurrentAssets contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">1000</jppfs_cor:CurrentAssets>
  <jppfs_cor:NoncurrentAssets contextRef="CurrentYearInstant" unitRef="JPY">2000</jppfs_cor:NoncurrentAssets>
  <jppfs_cor:Assets contextRef="CurrentYearInstant" unitRef="JPY">3000</jppfs_cor:Assets>
  <jppfs_cor:Liabilities contextRef="CurrentYearInstant" unitRef="JPY" xsi:nil="true"/>
  <jppfs_cor:NetAssets contextRef="CurrentYearInstant" unitRef="JPY">1200</jppfs_cor:NetAssets>
</xbrli:xbrl>"#;

    #[test]
    fn parses_prefixed_labels() {
        let facts = parse_facts(INSTANCE).unwrap();
        assert_eq!(facts.len(), 6);
        assert_eq!(facts[0].label, "jppfs_cor:CurrentAssets");
        assert_eq!(facts[0].context_ref, "Prior1YearInstant");
        assert_eq!(facts[4].raw_value, "");

        let raw = balance_facts(&facts);
        assert_eq!(raw.current_assets, Some(1000));
        assert_eq!(raw.total_assets, Some(3000));
        assert_eq!(raw.net_assets, Some(1200));
        // "NoncurrentAssets" is not one of the accepted spellings.
        assert_eq!(raw.non_current_assets, None);
        assert_eq!(raw.total_liabilities, None);
    }

    #[test]
    fn malformed_and_foreign_documents_are_distinguished() {
        assert!(matches!(
            parse_facts("<xbrli:xbrl><unclosed>"),
            Err(ExtractError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_facts("<html><body/></html>"),
            Err(ExtractError::UnexpectedSchema(_))
        ));
    }
}
