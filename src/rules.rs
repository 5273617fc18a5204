//! Ordered include/exclude rules deciding which files enter a backup.
//!
//! A rule is a regular expression paired with an action. Rules are evaluated
//! in declaration order against the `/`-separated path relative to the backup
//! root; the last rule whose pattern matches the whole path decides the
//! disposition. A path no rule matches is excluded, so nothing enters an
//! archive without an explicit include.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do with a path a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Include,
    Exclude,
}

/// Uncompiled rule as it appears in configuration or on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub action: RuleAction,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, action: RuleAction) -> Self {
        Self {
            pattern: pattern.into(),
            action,
        }
    }
}

/// One compiled rule
#[derive(Debug, Clone)]
pub struct BackupRule {
    pattern: Regex,
    raw: String,
    action: RuleAction,
}

impl BackupRule {
    /// Compile a rule. The pattern must match the entire relative path, so it
    /// is anchored here rather than trusting callers to write `^...$`.
    pub fn new(pattern: &str, action: RuleAction) -> Result<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let compiled = Regex::new(&anchored).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: compiled,
            raw: pattern.to_string(),
            action,
        })
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn pattern(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.pattern.is_match(relative)
    }
}

/// Ordered rule list with last-match-wins semantics
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<BackupRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<BackupRule>) -> Self {
        Self { rules }
    }

    /// Compile an ordered list of specs into a rule set
    pub fn compile(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|spec| BackupRule::new(&spec.pattern, spec.action))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(rules))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Disposition of a relative path: the action of the last matching rule,
    /// or `None` when no rule matches.
    pub fn disposition(&self, relative: &str) -> Option<RuleAction> {
        self.rules.iter().fold(None, |current, rule| {
            if rule.matches(relative) {
                Some(rule.action)
            } else {
                current
            }
        })
    }

    /// Whether a file at this relative path belongs in the backup
    pub fn includes_file(&self, relative: &str) -> bool {
        self.disposition(relative) == Some(RuleAction::Include)
    }

    /// Whether a directory at this relative path should be skipped entirely,
    /// children included. Only an explicit exclude match prunes; a directory
    /// no rule matches is still descended into, otherwise a rule such as
    /// `logs/.*` could never include anything below an unmatched parent.
    pub fn prunes_directory(&self, relative: &str) -> bool {
        self.disposition(relative) == Some(RuleAction::Exclude)
    }
}

/// Archive entry name for a relative path: forward slashes on every platform
pub fn entry_name(relative: &std::path::Path) -> String {
    let name = relative.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        name.into_owned()
    } else {
        name.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules(specs: &[(&str, RuleAction)]) -> RuleSet {
        RuleSet::compile(
            &specs
                .iter()
                .map(|(p, a)| RuleSpec::new(*p, *a))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn last_matching_rule_wins() {
        let set = rules(&[
            (".*", RuleAction::Exclude),
            ("a\\.txt", RuleAction::Include),
        ]);

        assert_eq!(set.disposition("a.txt"), Some(RuleAction::Include));
        assert_eq!(set.disposition("logs/b.log"), Some(RuleAction::Exclude));
        assert!(set.includes_file("a.txt"));
        assert!(!set.includes_file("logs/b.log"));
    }

    #[test]
    fn unmatched_paths_are_excluded() {
        let set = rules(&[("logs/.*", RuleAction::Include)]);

        assert_eq!(set.disposition("a.txt"), None);
        assert!(!set.includes_file("a.txt"));
        assert!(set.includes_file("logs/b.log"));
    }

    #[test]
    fn empty_rule_set_includes_nothing() {
        let set = RuleSet::default();
        assert!(!set.includes_file("anything"));
        assert!(!set.prunes_directory("anything"));
    }

    #[test]
    fn patterns_match_the_whole_path() {
        let set = rules(&[("a\\.txt", RuleAction::Include)]);

        assert!(set.includes_file("a.txt"));
        assert!(!set.includes_file("za.txt"));
        assert!(!set.includes_file("a.txtx"));
        assert!(!set.includes_file("dir/a.txt"));
    }

    #[test]
    fn anchoring_wraps_alternations() {
        let set = rules(&[("a|b", RuleAction::Include)]);

        assert!(set.includes_file("a"));
        assert!(set.includes_file("b"));
        assert!(!set.includes_file("ab"));
    }

    #[test]
    fn directories_prune_only_on_explicit_exclude() {
        let set = rules(&[("logs/.*", RuleAction::Include)]);
        assert!(!set.prunes_directory("logs"));

        let set = rules(&[
            (".*", RuleAction::Include),
            ("logs(/.*)?", RuleAction::Exclude),
        ]);
        assert!(set.prunes_directory("logs"));
        assert!(!set.prunes_directory("world"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = BackupRule::new("(", RuleAction::Include).unwrap_err();
        match err {
            Error::InvalidPattern { pattern, .. } => assert_eq!(pattern, "("),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let rel: std::path::PathBuf = ["logs", "b.log"].iter().collect();
        assert_eq!(entry_name(&rel), "logs/b.log");
    }
}
