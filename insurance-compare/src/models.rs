use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Treats an explicit JSON `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// Canonical result of a comparison session, as handed to the results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub status: String,
    pub message: String,
    pub session_id: String,
    pub offers: Vec<Offer>,
    pub scores: HashMap<String, f64>,
    pub total_offers: usize,
    pub filtered_count: usize,
}

impl ComparisonResult {
    pub fn score_for(&self, offer_id: &str) -> Option<f64> {
        self.scores.get(offer_id).copied()
    }

    /// Active offers, best score first. Offers without a score rank as 0.
    pub fn ranked_offers(&self) -> Vec<&Offer> {
        let mut ranked: Vec<&Offer> = self.offers.iter().filter(|o| o.is_active).collect();
        ranked.sort_by(|a, b| {
            let score_a = self.score_for(&a.id).unwrap_or(0.0);
            let score_b = self.score_for(&b.id).unwrap_or(0.0);
            score_b
                .total_cmp(&score_a)
                .then(a.display_order.cmp(&b.display_order))
        });
        ranked
    }
}

/// An insurer's product entry within a comparison session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub insurer_id: String,
    pub category: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, Value>,
    pub insurer: Insurer,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formulas: Vec<Formula>,
}

impl Offer {
    /// Lowest annual premium; ties go to the lower display order, then to the first seen.
    pub fn cheapest_formula(&self) -> Option<&Formula> {
        self.formulas.iter().reduce(|best, f| {
            let cheaper = f.annual_premium_cents < best.annual_premium_cents;
            let same_price_earlier = f.annual_premium_cents == best.annual_premium_cents
                && f.display_order < best.display_order;
            if cheaper || same_price_earlier { f } else { best }
        })
    }

    pub fn recommended_formula(&self) -> Option<&Formula> {
        self.formulas.iter().find(|f| f.is_recommended)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurer {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub rating: f64,
}

/// A coverage tier of an offer with its own price and guarantees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub id: String,
    pub offer_id: String,
    pub name: String,
    pub slug: String,
    pub annual_premium_cents: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_recommended: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guarantees: Vec<FormulaGuarantee>,
}

impl Formula {
    /// Annual premium over twelve, rounded half up (toward positive infinity).
    pub fn monthly_premium_cents(&self) -> i64 {
        self.annual_premium_cents.saturating_add(6).div_euclid(12)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaGuarantee {
    pub id: String,
    pub formula_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,
    #[serde(default)]
    pub ceiling: Option<f64>,
    #[serde(default)]
    pub deductible: Option<f64>,
}

/// A named coverage area of a contract, as extracted by the summarization backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guarantee {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub deductible: Option<String>,
    #[serde(default)]
    pub limitation: Option<String>,
    #[serde(default)]
    pub ceiling: Option<String>,
    /// Legacy name of `ceiling`.
    #[serde(default)]
    pub plafond: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coverages: Vec<Coverage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<GuaranteeDetail>,
}

/// A named service inside a guarantee with its own financial terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuaranteeDetail {
    #[serde(default, alias = "name")]
    pub service: String,
    #[serde(default)]
    pub ceiling: Option<String>,
    /// Legacy name of `ceiling`.
    #[serde(default)]
    pub plafond: Option<String>,
    #[serde(default)]
    pub deductible: Option<String>,
    /// Legacy name of `deductible`.
    #[serde(default)]
    pub franchise: Option<String>,
    #[serde(default)]
    pub limitation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coverages: Vec<Coverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(rename = "type")]
    pub kind: CoverageKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    Covered,
    NotCovered,
    #[serde(other)]
    Other,
}
