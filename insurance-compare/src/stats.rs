//! Statistics derived from a contract guarantee and its nested services.
//!
//! Every function here is pure. Missing collections were already turned into
//! empty vectors by the model layer, so nothing in this module needs to
//! special-case absent data.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::{Coverage, CoverageKind, Guarantee, GuaranteeDetail};

const MAX_HIGHLIGHTS: usize = 3;
const HIGH_RISK_AMOUNT: f64 = 1000.0;
const MEDIUM_RISK_AMOUNT: f64 = 200.0;

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[€$£]").expect("currency pattern is valid"));
static NON_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,]").expect("amount pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuaranteeStats {
    pub total_coverages: usize,
    pub total_exclusions: usize,
    pub total_items: usize,
    pub coverage_percentage: u32,
    pub services_count: usize,
    pub has_financial_info: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub service: String,
    pub covered: usize,
    pub excluded: usize,
    pub has_financial_info: bool,
    pub ceiling: Option<String>,
    pub deductible: Option<String>,
    pub deductible_risk: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub has_general_deductible: bool,
    pub has_general_limitation: bool,
    pub has_general_ceiling: bool,
    pub services_with_financial_info: usize,
    pub total_services: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuaranteeHighlights {
    pub key_coverages: Vec<String>,
    pub key_exclusions: Vec<String>,
    pub ceiling: Option<String>,
    pub deductible: Option<String>,
    pub deductible_risk: RiskLevel,
}

/// Trimmed value of an optional text field, `None` when blank.
fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn count_kind(coverages: &[Coverage], kind: CoverageKind) -> usize {
    coverages.iter().filter(|c| c.kind == kind).count()
}

fn guarantee_ceiling(guarantee: &Guarantee) -> Option<&str> {
    filled(&guarantee.ceiling).or_else(|| filled(&guarantee.plafond))
}

fn detail_ceiling(detail: &GuaranteeDetail) -> Option<&str> {
    filled(&detail.ceiling).or_else(|| filled(&detail.plafond))
}

fn detail_deductible(detail: &GuaranteeDetail) -> Option<&str> {
    filled(&detail.deductible).or_else(|| filled(&detail.franchise))
}

fn detail_has_financial_info(detail: &GuaranteeDetail) -> bool {
    detail_ceiling(detail).is_some()
        || detail_deductible(detail).is_some()
        || filled(&detail.limitation).is_some()
}

/// Coverage and exclusion totals across the guarantee and all of its services.
///
/// Guarantee-level and service-level coverages are added together.
pub fn calculate_guarantee_stats(guarantee: &Guarantee) -> GuaranteeStats {
    let (detail_covered, detail_excluded) =
        guarantee
            .details
            .iter()
            .fold((0, 0), |(covered, excluded), detail| {
                (
                    covered + count_kind(&detail.coverages, CoverageKind::Covered),
                    excluded + count_kind(&detail.coverages, CoverageKind::NotCovered),
                )
            });

    let total_coverages = count_kind(&guarantee.coverages, CoverageKind::Covered) + detail_covered;
    let total_exclusions =
        count_kind(&guarantee.coverages, CoverageKind::NotCovered) + detail_excluded;
    let total_items = total_coverages + total_exclusions;

    let coverage_percentage = if total_items > 0 {
        (total_coverages as f64 / total_items as f64 * 100.0).round() as u32
    } else {
        0
    };

    let has_financial_info = filled(&guarantee.deductible).is_some()
        || filled(&guarantee.limitation).is_some()
        || guarantee.details.iter().any(detail_has_financial_info);

    GuaranteeStats {
        total_coverages,
        total_exclusions,
        total_items,
        coverage_percentage,
        services_count: guarantee.details.len(),
        has_financial_info,
    }
}

pub fn calculate_service_stats(guarantee: &Guarantee) -> Vec<ServiceStats> {
    guarantee
        .details
        .iter()
        .map(|detail| {
            let deductible = detail_deductible(detail);
            ServiceStats {
                service: detail.service.clone(),
                covered: count_kind(&detail.coverages, CoverageKind::Covered),
                excluded: count_kind(&detail.coverages, CoverageKind::NotCovered),
                has_financial_info: detail_has_financial_info(detail),
                ceiling: detail_ceiling(detail).map(str::to_string),
                deductible: deductible.map(str::to_string),
                deductible_risk: financial_risk_level(deductible),
            }
        })
        .collect()
}

pub fn calculate_financial_summary(guarantee: &Guarantee) -> FinancialSummary {
    FinancialSummary {
        has_general_deductible: filled(&guarantee.deductible).is_some(),
        has_general_limitation: filled(&guarantee.limitation).is_some(),
        has_general_ceiling: guarantee_ceiling(guarantee).is_some(),
        services_with_financial_info: guarantee
            .details
            .iter()
            .filter(|d| detail_has_financial_info(d))
            .count(),
        total_services: guarantee.details.len(),
    }
}

/// Classifies a deductible or ceiling text by how much it may cost the insured.
pub fn financial_risk_level(value: Option<&str>) -> RiskLevel {
    let Some(text) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return RiskLevel::None;
    };

    let lowered = text.to_lowercase();
    if lowered.contains("sans franchise") || lowered.contains("illimité") {
        return RiskLevel::Low;
    }

    if CURRENCY.is_match(text) {
        let digits = NON_AMOUNT.replace_all(text, "").replace(',', ".");
        return match leading_amount(&digits) {
            Some(amount) if amount >= HIGH_RISK_AMOUNT => RiskLevel::High,
            Some(amount) if amount >= MEDIUM_RISK_AMOUNT => RiskLevel::Medium,
            _ => RiskLevel::Low,
        };
    }

    RiskLevel::Medium
}

/// Longest numeric prefix with at most one decimal point.
fn leading_amount(text: &str) -> Option<f64> {
    let mut seen_point = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| match c {
            '0'..='9' => false,
            '.' if !seen_point => {
                seen_point = true;
                false
            }
            _ => true,
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

pub fn guarantee_highlights(guarantee: &Guarantee) -> GuaranteeHighlights {
    let all_coverages = || {
        guarantee
            .coverages
            .iter()
            .chain(guarantee.details.iter().flat_map(|d| d.coverages.iter()))
    };
    let pick = |kind: CoverageKind| -> Vec<String> {
        all_coverages()
            .filter(|c| c.kind == kind)
            .map(|c| c.description.trim())
            .filter(|d| !d.is_empty())
            .take(MAX_HIGHLIGHTS)
            .map(str::to_string)
            .collect()
    };

    let deductible = filled(&guarantee.deductible);
    GuaranteeHighlights {
        key_coverages: pick(CoverageKind::Covered),
        key_exclusions: pick(CoverageKind::NotCovered),
        ceiling: guarantee_ceiling(guarantee).map(str::to_string),
        deductible: deductible.map(str::to_string),
        deductible_risk: financial_risk_level(deductible),
    }
}
