//! Keyword classification of requirement text.
//!
//! Every derived field has its own ordered list of [`Rule`]s. A rule matches
//! when any of its keywords occurs in the lower-cased text, and the first
//! matching rule decides the field. Fields are evaluated independently,
//! except for the deepest hierarchy level, whose rules are selected by the
//! level above it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    hierarchy::{HierarchyCatalog, HierarchyNode},
    requirement::{
        Classification, HierarchyPath, Priority, RawRequirement, Requirement, RequirementType,
        VerificationMethod,
    },
};

pub mod criteria;
pub use criteria::{derive_acceptance_criteria, FALLBACK_CRITERIA};

/// A set of keywords and the outcome they select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule<T> {
    /// Substrings that trigger the rule. Matching is case-insensitive.
    pub keywords: Vec<String>,
    /// The value assigned when the rule matches.
    pub outcome: T,
}

impl<T> Rule<T> {
    /// Creates a rule.
    pub fn new(keywords: &[&str], outcome: T) -> Self {
        Self {
            keywords: keywords.iter().map(ToString::to_string).collect(),
            outcome,
        }
    }

    /// Whether any keyword occurs in `text`, which must already be lower-case.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    }

    fn normalise(&mut self) {
        for keyword in &mut self.keywords {
            *keyword = keyword.to_lowercase();
        }
    }
}

/// Returns the outcome of the first rule matching `text`.
pub fn first_match<'a, T>(rules: &'a [Rule<T>], text: &str) -> Option<&'a T> {
    rules
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| &rule.outcome)
}

/// An ordered list of rules with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet<T> {
    /// Rules in evaluation order.
    pub rules: Vec<Rule<T>>,
    /// The outcome when no rule matches.
    pub default: T,
}

impl<T> RuleSet<T> {
    /// Creates a rule set.
    pub fn new(rules: Vec<Rule<T>>, default: T) -> Self {
        Self { rules, default }
    }

    /// The outcome for `text`, which must already be lower-case.
    pub fn evaluate(&self, text: &str) -> &T {
        first_match(&self.rules, text).unwrap_or(&self.default)
    }

    /// Every outcome this set can produce, default last.
    pub fn outcomes(&self) -> impl Iterator<Item = &T> {
        self.rules
            .iter()
            .map(|rule| &rule.outcome)
            .chain(std::iter::once(&self.default))
    }

    fn normalise(&mut self) {
        self.rules.iter_mut().for_each(Rule::normalise);
    }
}

/// Rules placing a requirement in the system breakdown structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRules {
    /// Level 0. Always assigned.
    pub level0: RuleSet<String>,
    /// Level 1. Always assigned.
    pub level1: RuleSet<String>,
    /// Level 2 keyword rules.
    pub level2: Vec<Rule<String>>,
    /// Level 2 assignment when no keyword matched, keyed by the level 1
    /// node. Level 1 nodes without an entry leave level 2 unassigned.
    pub level2_fallback: BTreeMap<String, String>,
    /// Level 3 rules, keyed by the level 2 node they apply under.
    pub level3: BTreeMap<String, Vec<Rule<String>>>,
}

impl HierarchyRules {
    /// Assigns `text` (already lower-case) to the hierarchy.
    ///
    /// The path ends at the first level with no assignment, so an empty
    /// outcome in an unchecked table shortens the path instead of leaving a
    /// gap.
    #[must_use]
    pub(crate) fn assign(&self, text: &str) -> HierarchyPath {
        let level0 = self.level0.evaluate(text);
        let level1 = self.level1.evaluate(text);
        let level2 =
            first_match(&self.level2, text).or_else(|| self.level2_fallback.get(level1));
        let level3 = level2
            .and_then(|branch| self.level3.get(branch))
            .and_then(|rules| first_match(rules, text));

        let assigned = [Some(level0), Some(level1), level2, level3]
            .into_iter()
            .map_while(|level| level.filter(|node| !node.is_empty()).cloned())
            .map(Some);
        HierarchyPath::from_levels(assigned).unwrap_or_default()
    }

    fn normalise(&mut self) {
        self.level0.normalise();
        self.level1.normalise();
        self.level2.iter_mut().for_each(Rule::normalise);
        self.level3
            .values_mut()
            .flatten()
            .for_each(Rule::normalise);
    }

    fn check(&self, catalog: &HierarchyCatalog) -> Result<(), RuleError> {
        for node in self.level0.outcomes() {
            expect_level(catalog, node, 0)?;
        }
        for node in self.level1.outcomes() {
            expect_level(catalog, node, 1)?;
        }
        for rule in &self.level2 {
            expect_level(catalog, &rule.outcome, 2)?;
        }
        for (level1, level2) in &self.level2_fallback {
            expect_level(catalog, level1, 1)?;
            expect_level(catalog, level2, 2)?;
        }
        for (branch, rules) in &self.level3 {
            expect_level(catalog, branch, 2)?;
            for rule in rules {
                let node = expect_level(catalog, &rule.outcome, 3)?;
                if node.parent.as_deref() != Some(branch.as_str()) {
                    return Err(RuleError::OutsideBranch {
                        node: rule.outcome.clone(),
                        branch: branch.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn expect_level<'a>(
    catalog: &'a HierarchyCatalog,
    id: &str,
    level: usize,
) -> Result<&'a HierarchyNode, RuleError> {
    let node = catalog.get(id).ok_or_else(|| RuleError::UnknownNode {
        node: id.to_string(),
        level,
    })?;
    if node.level == level {
        Ok(node)
    } else {
        Err(RuleError::WrongLevel {
            node: id.to_string(),
            expected: level,
            actual: node.level,
        })
    }
}

/// The complete rule table used by the [`KeywordClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Hierarchy placement.
    pub hierarchy: HierarchyRules,
    /// Requirement type.
    pub requirement_type: RuleSet<RequirementType>,
    /// Priority.
    pub priority: RuleSet<Priority>,
    /// Verification method.
    pub verification: RuleSet<VerificationMethod>,
    /// Rationale text.
    pub rationale: RuleSet<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let hierarchy = HierarchyRules {
            level0: RuleSet::new(
                vec![Rule::new(
                    &["lifetime", "project", "overall", "system"],
                    "QSYS-PR".to_string(),
                )],
                "QSYS".to_string(),
            ),
            level1: RuleSet::new(
                vec![
                    Rule::new(&["compressor", "compression", "wcs"], "QPLANT".to_string()),
                    Rule::new(&["distribution", "line", "header"], "QDIST".to_string()),
                    Rule::new(&["qcell", "cell", "cryomodule", "qvb"], "QCELL".to_string()),
                    Rule::new(&["infrastructure", "utility"], "QINFRA".to_string()),
                ],
                "QPLANT".to_string(),
            ),
            level2: vec![
                Rule::new(&["warm compressor", "wcs"], "WCS".to_string()),
                Rule::new(&["cold box", "qrb", "refrigeration"], "QRB".to_string()),
            ],
            level2_fallback: BTreeMap::from([("QPLANT".to_string(), "WCS".to_string())]),
            level3: BTreeMap::from([
                (
                    "WCS".to_string(),
                    vec![
                        Rule::new(&["pressure vessel", "piping", "safety"], "PVPS".to_string()),
                        Rule::new(&["high pressure", "hp"], "HP".to_string()),
                    ],
                ),
                (
                    "QRB".to_string(),
                    vec![
                        Rule::new(&["turbine", "expander"], "TURBINES".to_string()),
                        Rule::new(&["4k", "4.5k"], "BATH-4K".to_string()),
                        Rule::new(&["2k"], "BATH-2K".to_string()),
                        Rule::new(&["cold compressor", "cc"], "CC".to_string()),
                    ],
                ),
            ]),
        };

        Self {
            hierarchy,
            requirement_type: RuleSet::new(
                vec![
                    Rule::new(
                        &["performance", "capacity", "power", "efficiency", "flow", "rate"],
                        RequirementType::Performance,
                    ),
                    Rule::new(
                        &["safety", "protection", "interlock", "purge"],
                        RequirementType::Safety,
                    ),
                    Rule::new(
                        &["interface", "connection", "compatibility"],
                        RequirementType::Interface,
                    ),
                    Rule::new(
                        &["operation", "control", "function", "scenarios", "transition"],
                        RequirementType::Functional,
                    ),
                    Rule::new(
                        &["design", "construction", "material", "lifetime"],
                        RequirementType::Design,
                    ),
                ],
                RequirementType::Functional,
            ),
            priority: RuleSet::new(
                vec![
                    Rule::new(&["critical", "safety", "shall", "must"], Priority::High),
                    Rule::new(&["should", "recommended", "may"], Priority::Medium),
                ],
                Priority::High,
            ),
            verification: RuleSet::new(
                vec![
                    Rule::new(&["test", "testing", "acceptance"], VerificationMethod::Test),
                    Rule::new(
                        &["analysis", "calculation", "design"],
                        VerificationMethod::Analysis,
                    ),
                    Rule::new(
                        &["inspection", "review", "document"],
                        VerificationMethod::Inspection,
                    ),
                    Rule::new(
                        &["demonstration", "operation", "functional"],
                        VerificationMethod::Demonstration,
                    ),
                ],
                VerificationMethod::Test,
            ),
            rationale: RuleSet::new(
                vec![
                    Rule::new(
                        &["safety", "purge"],
                        "Required for safe operation of cryogenic system".to_string(),
                    ),
                    Rule::new(
                        &["performance", "capacity", "flow"],
                        "Required to meet operational performance targets".to_string(),
                    ),
                    Rule::new(
                        &["lifetime"],
                        "Required to meet project lifetime objectives".to_string(),
                    ),
                    Rule::new(
                        &["operational", "operation", "scenario"],
                        "Required for proper operational flexibility and system control"
                            .to_string(),
                    ),
                ],
                "Required for proper system functionality".to_string(),
            ),
        }
    }
}

impl ClassifierRules {
    fn keywords(&self) -> impl Iterator<Item = &str> {
        fn of<T>(rules: &[Rule<T>]) -> impl Iterator<Item = &str> {
            rules
                .iter()
                .flat_map(|rule| rule.keywords.iter().map(String::as_str))
        }

        let h = &self.hierarchy;
        of(&h.level0.rules)
            .chain(of(&h.level1.rules))
            .chain(of(&h.level2))
            .chain(h.level3.values().flat_map(|rules| of(rules)))
            .chain(of(&self.requirement_type.rules))
            .chain(of(&self.priority.rules))
            .chain(of(&self.verification.rules))
            .chain(of(&self.rationale.rules))
    }

    /// Checks that every hierarchy outcome names a node of `catalog` at the
    /// right level, and that no keyword is blank.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] found.
    pub fn check(&self, catalog: &HierarchyCatalog) -> Result<(), RuleError> {
        if self.keywords().any(|keyword| keyword.trim().is_empty()) {
            return Err(RuleError::BlankKeyword);
        }
        self.hierarchy.check(catalog)
    }
}

/// Reasons a rule table cannot be used with a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    /// A rule assigns a node the catalog does not contain.
    #[error("level {level} rule assigns unknown node '{node}'")]
    UnknownNode {
        /// The unknown node id.
        node: String,
        /// The level the rule assigns.
        level: usize,
    },
    /// A rule assigns a node at a different level.
    #[error("node '{node}' is at level {actual} but is assigned at level {expected}")]
    WrongLevel {
        /// The node id.
        node: String,
        /// The level the rule assigns.
        expected: usize,
        /// The node's level in the catalog.
        actual: usize,
    },
    /// A level 3 rule assigns a node outside the branch it is filed under.
    #[error("node '{node}' is not a child of '{branch}'")]
    OutsideBranch {
        /// The node id.
        node: String,
        /// The level 2 branch the rule is filed under.
        branch: String,
    },
    /// A keyword is empty and would match every text.
    #[error("rule keywords must not be blank")]
    BlankKeyword,
}

/// Classifies requirement text using a fixed [`ClassifierRules`] table.
///
/// Classification is a pure function of the text and the table.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: ClassifierRules,
}

impl KeywordClassifier {
    /// Creates a classifier after checking `rules` against `catalog`.
    ///
    /// Keywords are lower-cased once here.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if the rules reference nodes missing from the
    /// catalog, or at the wrong level.
    pub fn new(mut rules: ClassifierRules, catalog: &HierarchyCatalog) -> Result<Self, RuleError> {
        rules.check(catalog)?;
        rules.hierarchy.normalise();
        rules.requirement_type.normalise();
        rules.priority.normalise();
        rules.verification.normalise();
        rules.rationale.normalise();
        Ok(Self { rules })
    }

    /// The rule table in use.
    #[must_use]
    pub const fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Derives every classified attribute from a description.
    ///
    /// Never fails: fields with no matching rule take their defaults.
    #[must_use]
    pub fn classify(&self, description: &str) -> Classification {
        let text = description.to_lowercase();
        Classification {
            hierarchy: self.rules.hierarchy.assign(&text),
            kind: *self.rules.requirement_type.evaluate(&text),
            priority: *self.rules.priority.evaluate(&text),
            verification: *self.rules.verification.evaluate(&text),
            acceptance_criteria: derive_acceptance_criteria(&text),
            rationale: self.rules.rationale.evaluate(&text).clone(),
        }
    }

    /// Classifies a raw record into a [`Requirement`] with no links.
    #[instrument(level = "trace", skip_all, fields(id = %raw.id))]
    #[must_use]
    pub fn enrich(&self, raw: RawRequirement) -> Requirement {
        let classification = self.classify(&raw.description);
        tracing::trace!(hierarchy = %classification.hierarchy, kind = %classification.kind);
        Requirement::new(raw, classification)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(ClassifierRules::default(), &HierarchyCatalog::sbs()).unwrap()
    }

    fn levels(path: &HierarchyPath) -> Vec<&str> {
        path.iter().collect()
    }

    #[test]
    fn default_rules_fit_builtin_catalog() {
        ClassifierRules::default()
            .check(&HierarchyCatalog::sbs())
            .expect("default rules should reference catalog nodes");
    }

    #[test]
    fn unmatched_text_gets_defaults() {
        let classification = classifier().classify("Blue");
        assert_eq!(levels(&classification.hierarchy), ["QSYS", "QPLANT", "WCS"]);
        assert_eq!(classification.kind, RequirementType::Functional);
        assert_eq!(classification.priority, Priority::High);
        assert_eq!(classification.verification, VerificationMethod::Test);
        assert_eq!(classification.acceptance_criteria, FALLBACK_CRITERIA);
        assert_eq!(
            classification.rationale,
            "Required for proper system functionality"
        );
    }

    #[test]
    fn empty_text_gets_defaults() {
        let classification = classifier().classify("");
        assert_eq!(classification.hierarchy.depth(), 3);
        assert_eq!(classification.acceptance_criteria, FALLBACK_CRITERIA);
    }

    #[test]
    fn first_matching_rule_wins() {
        // Matches both the performance and the safety type rules.
        let classification = classifier().classify("Safety valves shall limit the flow");
        assert_eq!(classification.kind, RequirementType::Performance);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classification = classifier().classify("The WARM COMPRESSOR shall start");
        assert_eq!(levels(&classification.hierarchy), ["QSYS", "QPLANT", "WCS"]);
    }

    #[test_case("Heat loads on the distribution header", &["QSYS", "QDIST"]; "distribution has no level 2")]
    #[test_case("Each cryomodule shall be cooled", &["QSYS", "QCELL"]; "cell has no level 2")]
    #[test_case("Overall utility supply", &["QSYS-PR", "QINFRA"]; "infrastructure under project")]
    #[test_case("The refrigeration turbine", &["QSYS", "QPLANT", "QRB", "TURBINES"]; "cold box branch")]
    #[test_case("The cold box shall hold 2K", &["QSYS", "QPLANT", "QRB", "BATH-2K"]; "2k bath")]
    #[test_case("The cold box shall hold 4.5K", &["QSYS", "QPLANT", "QRB", "BATH-4K"]; "4.5k bath")]
    #[test_case("The WCS piping", &["QSYS", "QPLANT", "WCS", "PVPS"]; "warm branch")]
    #[test_case("The plant high pressure stage", &["QSYS", "QPLANT", "WCS", "HP"]; "fallback branch")]
    #[test_case("The distribution cold box", &["QSYS", "QDIST", "QRB"]; "level 2 keyword ignores level 1")]
    fn hierarchy_assignment(text: &str, expected: &[&str]) {
        assert_eq!(levels(&classifier().classify(text).hierarchy), expected);
    }

    #[test]
    fn unchecked_empty_outcome_shortens_path() {
        let mut rules = ClassifierRules::default();
        rules.hierarchy.level0.default = String::new();
        assert_eq!(rules.hierarchy.assign("blue").depth(), 0);

        let mut rules = ClassifierRules::default();
        rules.hierarchy.level1.default = String::new();
        assert_eq!(levels(&rules.hierarchy.assign("blue")), ["QSYS"]);
    }

    #[test]
    fn empty_outcome_is_rejected_at_construction() {
        let mut rules = ClassifierRules::default();
        rules.hierarchy.level0.default = String::new();
        assert!(matches!(
            KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap_err(),
            RuleError::UnknownNode { level: 0, .. }
        ));
    }

    #[test]
    fn level3_is_gated_on_level2_branch() {
        // "cold box" selects the QRB branch; "piping" only exists under WCS.
        let classification = classifier().classify("The cold box piping");
        assert_eq!(levels(&classification.hierarchy), ["QSYS", "QPLANT", "QRB"]);
    }

    #[test]
    fn level2_fallback_requires_plant() {
        // Level 1 resolves to QDIST, which has no fallback; the WCS-only
        // keyword cannot be reached without a level 2 node.
        let classification = classifier().classify("The transfer line piping");
        assert_eq!(levels(&classification.hierarchy), ["QSYS", "QDIST"]);
    }

    #[test]
    fn deeper_levels_imply_shallower() {
        let classifier = classifier();
        for text in [
            "",
            "The cold box",
            "distribution piping",
            "the wcs safety valves",
            "cryomodule turbine",
        ] {
            let path = classifier.classify(text).hierarchy;
            for level in 1..4 {
                if path.level(level).is_some() {
                    assert!(path.level(level - 1).is_some(), "{text}: {path}");
                }
            }
        }
    }

    #[test_case("The contractor may implement a manual purging", Priority::Medium; "advisory")]
    #[test_case("The contractor should provide spares", Priority::Medium; "should")]
    #[test_case("The plant shall start", Priority::High; "mandatory")]
    #[test_case("Spares are provided", Priority::High; "default")]
    fn priority(text: &str, expected: Priority) {
        assert_eq!(classifier().classify(text).priority, expected);
    }

    #[test_case("Acceptance testing at site", VerificationMethod::Test; "test")]
    #[test_case("By calculation", VerificationMethod::Analysis; "analysis")]
    #[test_case("A design review", VerificationMethod::Analysis; "design beats review")]
    #[test_case("A document review", VerificationMethod::Inspection; "inspection")]
    #[test_case("During operation", VerificationMethod::Demonstration; "demonstration")]
    fn verification(text: &str, expected: VerificationMethod) {
        assert_eq!(classifier().classify(text).verification, expected);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = classifier();
        let text = "The QPLANT shall support ≥ 50 warm-up/cool-down cycles (300 K ↔ 2 K)";
        assert_eq!(classifier.classify(text), classifier.classify(text));
    }

    #[test]
    fn keywords_are_normalised_to_lower_case() {
        let mut rules = ClassifierRules::default();
        rules.priority = RuleSet::new(vec![Rule::new(&["OPTIONAL"], Priority::Medium)], Priority::High);
        let classifier = KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap();
        assert_eq!(classifier.classify("optional").priority, Priority::Medium);
    }

    #[test]
    fn rejects_unknown_node() {
        let mut rules = ClassifierRules::default();
        rules.hierarchy.level1.default = "QMOON".to_string();
        assert_eq!(
            KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap_err(),
            RuleError::UnknownNode {
                node: "QMOON".to_string(),
                level: 1
            }
        );
    }

    #[test]
    fn rejects_node_at_wrong_level() {
        let mut rules = ClassifierRules::default();
        rules
            .hierarchy
            .level2
            .push(Rule::new(&["turbine"], "TURBINES".to_string()));
        assert!(matches!(
            KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap_err(),
            RuleError::WrongLevel { expected: 2, actual: 3, .. }
        ));
    }

    #[test]
    fn rejects_level3_outside_branch() {
        let mut rules = ClassifierRules::default();
        rules
            .hierarchy
            .level3
            .get_mut("WCS")
            .unwrap()
            .push(Rule::new(&["turbine"], "TURBINES".to_string()));
        assert!(matches!(
            KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap_err(),
            RuleError::OutsideBranch { .. }
        ));
    }

    #[test]
    fn rejects_blank_keyword() {
        let mut rules = ClassifierRules::default();
        rules.rationale.rules.push(Rule::new(&[" "], String::new()));
        assert_eq!(
            KeywordClassifier::new(rules, &HierarchyCatalog::sbs()).unwrap_err(),
            RuleError::BlankKeyword
        );
    }
}
