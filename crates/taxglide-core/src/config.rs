use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxGlideError;
use crate::rounding::{round_to_step, RoundMode};
use crate::types::{FilingStatus, Money, Rate};
use crate::TaxGlideResult;

/// Schema version this build understands.
pub const SCHEMA_VERSION: &str = "1.0";

const BUILTIN_2025: &str = include_str!("../configs/2025.json");

// ---------------------------------------------------------------------------
// Federal tariff
// ---------------------------------------------------------------------------

/// One federal tariff segment: a half-open income interval `[from, to)` with
/// an anchor income, the tax at that anchor, and the tax added per full 100
/// CHF of income above the anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederalSegment {
    pub from: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Money>,
    pub at_income: Money,
    pub base_tax_at: Money,
    pub per100: Money,
}

impl FederalSegment {
    pub fn contains(&self, income: Money) -> bool {
        income >= self.from && self.to.map_or(true, |to| income < to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederalTable {
    pub segments: Vec<FederalSegment>,
}

impl FederalTable {
    /// Segment covering `income`. Segments are sorted by `from`, so a binary
    /// search on the lower bound suffices.
    pub fn segment_for(&self, income: Money) -> Option<&FederalSegment> {
        let idx = self.segments.partition_point(|s| s.from <= income);
        if idx == 0 {
            return None;
        }
        let seg = &self.segments[idx - 1];
        seg.contains(income).then_some(seg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederalTables {
    pub single: FederalTable,
    pub married_joint: FederalTable,
}

impl FederalTables {
    pub fn for_status(&self, status: FilingStatus) -> &FederalTable {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedJoint => &self.married_joint,
        }
    }
}

// ---------------------------------------------------------------------------
// Cantonal tariff
// ---------------------------------------------------------------------------

/// Progressive bracket covering `[lower, lower + width)` at `rate_percent`
/// of the income portion falling inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CantonalBracket {
    pub lower: Money,
    pub width: Money,
    pub rate_percent: Rate,
}

impl CantonalBracket {
    pub fn upper(&self) -> Money {
        self.lower + self.width
    }

    pub fn contains(&self, income: Money) -> bool {
        income >= self.lower && income < self.upper()
    }
}

/// High-income override: at or above `threshold` the bracket table is
/// bypassed and the whole income is charged `flat_percent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CantonalOverride {
    pub threshold: Money,
    pub flat_percent: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingScope {
    AsOfficial,
    TaxableOnly,
    Both,
}

/// How a canton rounds taxable income before evaluation and the final tax
/// amount after it. A `tax_round_to` of zero keeps the exact amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoundingPolicy {
    pub taxable_step: Money,
    pub tax_round_to: Money,
    pub scope: RoundingScope,
}

impl RoundingPolicy {
    /// Step-ceiling of taxable income, as the official tables do.
    pub fn round_taxable(&self, income: Money) -> Money {
        round_to_step(income, self.taxable_step, RoundMode::CeilStep)
    }

    /// Final tax granularity, nearest step with ties away from zero.
    pub fn round_tax(&self, tax: Money) -> Money {
        match self.scope {
            RoundingScope::TaxableOnly => tax,
            RoundingScope::AsOfficial | RoundingScope::Both => {
                round_to_step(tax, self.tax_round_to, RoundMode::NearestStep)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Municipalities and multipliers
// ---------------------------------------------------------------------------

/// A Steuerfuss entry. Rates are dimensionless factors on the simple tax;
/// selected entries sum, they never compound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Multiplier {
    pub code: String,
    pub name: String,
    pub rate: Rate,
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "default_true")]
    pub default_selected: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Municipality {
    pub name: String,
    pub multipliers: Vec<Multiplier>,
}

impl Municipality {
    pub fn multiplier(&self, code: &str) -> Option<&Multiplier> {
        self.multipliers.iter().find(|m| m.code == code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Canton {
    pub name: String,
    pub abbreviation: String,
    pub rounding: RoundingPolicy,
    pub brackets: Vec<CantonalBracket>,
    #[serde(
        default,
        rename = "override",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_rule: Option<CantonalOverride>,
    pub municipalities: BTreeMap<String, Municipality>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub canton: String,
    pub municipality: String,
}

// ---------------------------------------------------------------------------
// Top-level document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaxConfig {
    pub schema_version: String,
    pub currency: String,
    pub country: String,
    pub federal: FederalTables,
    pub cantons: BTreeMap<String, Canton>,
    pub defaults: Defaults,
}

impl TaxConfig {
    /// Parse a document and check the schema version, without the
    /// structural validation gate. Used by `validate` to report findings.
    pub fn parse(json: &str) -> TaxGlideResult<Self> {
        let config: TaxConfig = serde_json::from_str(json)?;
        if config.schema_version != SCHEMA_VERSION {
            return Err(TaxGlideError::SchemaMismatch {
                supported: SCHEMA_VERSION.to_string(),
                found: config.schema_version.clone(),
            });
        }
        Ok(config)
    }

    /// Parse and fully validate a configuration document.
    pub fn from_json(json: &str) -> TaxGlideResult<Self> {
        let config = Self::parse(json)?;
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(TaxGlideError::ConfigurationInvalid(issues.join("; ")));
        }
        Ok(config)
    }

    /// Years shipped inside the library.
    pub fn builtin_years() -> Vec<i32> {
        vec![2025]
    }

    pub fn builtin(year: i32) -> TaxGlideResult<Self> {
        match year {
            2025 => Self::from_json(BUILTIN_2025),
            _ => Err(TaxGlideError::ConfigurationMissing { year }),
        }
    }

    /// Load `<config_root>/<year>.json`, falling back to the built-in
    /// document for that year.
    pub fn load(config_root: &Path, year: i32) -> TaxGlideResult<Self> {
        Self::load_with(config_root, year, true)
    }

    /// As `load`, but with the structural validation gate optional so that
    /// `validate` can report findings instead of refusing the document.
    pub fn load_with(config_root: &Path, year: i32, strict: bool) -> TaxGlideResult<Self> {
        let path = config_root.join(format!("{year}.json"));
        if path.is_file() {
            log::debug!("loading tax configuration from {}", path.display());
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                TaxGlideError::ConfigurationInvalid(format!(
                    "failed to read {}: {e}",
                    path.display()
                ))
            })?;
            return if strict {
                Self::from_json(&contents)
            } else {
                Self::parse(&contents)
            };
        }
        log::debug!("no configuration file for {year}, using built-in document");
        match year {
            2025 if strict => Self::from_json(BUILTIN_2025),
            2025 => Self::parse(BUILTIN_2025),
            _ => Err(TaxGlideError::ConfigurationMissing { year }),
        }
    }

    /// Resolve a canton key, defaulting from the configuration.
    pub fn canton(&self, key: Option<&str>) -> TaxGlideResult<(&str, &Canton)> {
        let key = key.unwrap_or(&self.defaults.canton);
        match self.cantons.get_key_value(key) {
            Some((k, canton)) => Ok((k.as_str(), canton)),
            None => Err(TaxGlideError::InvalidInput {
                field: "canton".into(),
                reason: format!("unknown canton '{key}'"),
            }),
        }
    }

    /// Resolve a municipality key inside a canton, defaulting from the
    /// configuration.
    pub fn municipality<'a>(
        &self,
        canton: &'a Canton,
        key: Option<&str>,
    ) -> TaxGlideResult<(&'a str, &'a Municipality)> {
        let key = key.unwrap_or(&self.defaults.municipality);
        match canton.municipalities.get_key_value(key) {
            Some((k, m)) => Ok((k.as_str(), m)),
            None => Err(TaxGlideError::InvalidInput {
                field: "municipality".into(),
                reason: format!("unknown municipality '{key}' in canton {}", canton.name),
            }),
        }
    }

    /// Structural validation. Returns human-readable issues; an empty list
    /// means the document is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        validate_federal_table("federal.single", &self.federal.single, &mut issues);
        validate_federal_table(
            "federal.married_joint",
            &self.federal.married_joint,
            &mut issues,
        );

        for (key, canton) in &self.cantons {
            validate_canton(key, canton, &mut issues);
        }

        if !self.cantons.contains_key(&self.defaults.canton) {
            issues.push(format!(
                "defaults.canton '{}' does not name a configured canton",
                self.defaults.canton
            ));
        } else if let Some(canton) = self.cantons.get(&self.defaults.canton) {
            if !canton
                .municipalities
                .contains_key(&self.defaults.municipality)
            {
                issues.push(format!(
                    "defaults.municipality '{}' does not exist in canton '{}'",
                    self.defaults.municipality, self.defaults.canton
                ));
            }
        }

        issues
    }
}

fn validate_federal_table(label: &str, table: &FederalTable, issues: &mut Vec<String>) {
    if table.segments.is_empty() {
        issues.push(format!("{label}: no segments"));
        return;
    }
    for (i, seg) in table.segments.iter().enumerate() {
        if seg.per100 < Decimal::ZERO {
            issues.push(format!("{label}[{i}]: per100 must be >= 0"));
        }
        if seg.base_tax_at < Decimal::ZERO {
            issues.push(format!("{label}[{i}]: base_tax_at must be >= 0"));
        }
        if let Some(to) = seg.to {
            if to <= seg.from {
                issues.push(format!("{label}[{i}]: segment is empty ({} >= {to})", seg.from));
            }
            if seg.at_income < seg.from || seg.at_income >= to {
                issues.push(format!(
                    "{label}[{i}]: at_income {} outside [{}, {to})",
                    seg.at_income, seg.from
                ));
            }
        } else {
            if i + 1 != table.segments.len() {
                issues.push(format!("{label}[{i}]: only the last segment may be unbounded"));
            }
            if seg.at_income < seg.from {
                issues.push(format!(
                    "{label}[{i}]: at_income {} below segment start {}",
                    seg.at_income, seg.from
                ));
            }
        }
        if i > 0 {
            let prev = &table.segments[i - 1];
            match prev.to {
                Some(to) if to != seg.from => issues.push(format!(
                    "{label}[{i}]: gap or overlap (previous ends at {to}, segment starts at {})",
                    seg.from
                )),
                None => issues.push(format!(
                    "{label}[{i}]: segment follows an unbounded segment"
                )),
                _ => {}
            }
        }
    }
}

fn validate_canton(key: &str, canton: &Canton, issues: &mut Vec<String>) {
    if canton.brackets.is_empty() {
        issues.push(format!("canton '{key}': no brackets"));
    }
    for (i, bracket) in canton.brackets.iter().enumerate() {
        if bracket.width <= Decimal::ZERO {
            issues.push(format!("canton '{key}' bracket[{i}]: width must be > 0"));
        }
        if bracket.rate_percent < Decimal::ZERO {
            issues.push(format!(
                "canton '{key}' bracket[{i}]: rate_percent must be >= 0"
            ));
        }
        if i > 0 {
            let prev = &canton.brackets[i - 1];
            if prev.upper() != bracket.lower {
                issues.push(format!(
                    "canton '{key}' bracket[{i}]: gap or overlap (previous ends at {}, bracket starts at {})",
                    prev.upper(),
                    bracket.lower
                ));
            }
        }
    }
    if let Some(ov) = &canton.override_rule {
        if ov.threshold < Decimal::ZERO {
            issues.push(format!("canton '{key}': override threshold must be >= 0"));
        }
        if ov.flat_percent < Decimal::ZERO {
            issues.push(format!("canton '{key}': override flat_percent must be >= 0"));
        }
    }
    for (mkey, municipality) in &canton.municipalities {
        let mut seen = BTreeSet::new();
        for m in &municipality.multipliers {
            if m.rate < Decimal::ZERO {
                issues.push(format!(
                    "municipality '{mkey}' multiplier '{}': rate must be >= 0",
                    m.code
                ));
            }
            if !seen.insert(m.code.as_str()) {
                issues.push(format!(
                    "municipality '{mkey}': duplicate multiplier code '{}'",
                    m.code
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Version surface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub schema_version: String,
    pub supported_years: Vec<i32>,
}

/// Version and schema info, with any extra years found under `config_root`.
pub fn version_info(config_root: &Path) -> VersionInfo {
    let mut years: BTreeSet<i32> = TaxConfig::builtin_years().into_iter().collect();
    if let Ok(entries) = std::fs::read_dir(config_root) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                if let Ok(year) = stem.parse::<i32>() {
                    years.insert(year);
                }
            }
        }
    }
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        supported_years: years.into_iter().collect(),
    }
}
