//! Table selection rules.
//!
//! A [`RuleSet`] holds include and exclude selectors in declaration order.
//! Eligibility is a pure function of the whole set: a table is selected when
//! at least one include rule matches its full name and no exclude rule does.
//! Exclusion always wins, whatever order the rules were declared in.

use regex::Regex;
use std::fmt;

/// Pattern that selects every table.
pub const MATCH_ALL: &str = ".*";

/// Whether a rule selects or deselects tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Table is eligible when matched
    Include,
    /// Table is never eligible when matched
    Exclude,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

/// A regular-expression selector over table names.
///
/// The pattern is anchored at both ends, so `Account` matches only the table
/// named `Account` and `.*` matches every name.
#[derive(Debug, Clone)]
pub struct TableRule {
    kind: RuleKind,
    pattern: String,
    regex: Regex,
}

impl TableRule {
    /// Compiles a rule.
    ///
    /// A blank pattern is an error here. Declarations that should skip blank
    /// patterns go through [`RuleSet::include_table`] and
    /// [`RuleSet::exclude_table`], which ignore them instead.
    ///
    /// # Errors
    /// Returns a configuration error for a blank pattern and
    /// `InvalidRulePattern` if it is not a valid regular expression.
    pub fn new(kind: RuleKind, pattern: &str) -> crate::Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(crate::error::CopyError::configuration(
                "table pattern cannot be blank",
            ));
        }

        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            crate::error::CopyError::InvalidRulePattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self {
            kind,
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Compiles an include rule.
    pub fn include(pattern: &str) -> crate::Result<Self> {
        Self::new(RuleKind::Include, pattern)
    }

    /// Compiles an exclude rule.
    pub fn exclude(pattern: &str) -> crate::Result<Self> {
        Self::new(RuleKind::Exclude, pattern)
    }

    /// Rule kind.
    pub const fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Pattern as declared (trimmed, unanchored).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern matches the whole table name.
    pub fn matches(&self, table: &str) -> bool {
        self.regex.is_match(table)
    }
}

impl fmt::Display for TableRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.pattern)
    }
}

/// Ordered collection of table rules.
///
/// # Example
/// ```rust
/// use tablecopy_core::rules::RuleSet;
///
/// let mut rules = RuleSet::new();
/// rules.exclude_table("Contact")?;
/// rules.include_table("Account")?;
/// rules.include_table("Contact")?;
///
/// assert!(rules.is_included("Account"));
/// assert!(!rules.is_included("Contact"));
/// # Ok::<(), tablecopy_core::CopyError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<TableRule>,
}

impl RuleSet {
    /// Creates an empty rule set. It selects no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule set used when no configuration is supplied: one include rule
    /// matching every table.
    pub fn default_rules() -> Self {
        let rules = TableRule::include(MATCH_ALL)
            .map(|rule| vec![rule])
            .unwrap_or_default();
        Self { rules }
    }

    /// Appends an include rule.
    ///
    /// Returns `Ok(false)` without adding anything when the pattern is blank.
    ///
    /// # Errors
    /// Returns `InvalidRulePattern` for an invalid regular expression.
    pub fn include_table(&mut self, pattern: &str) -> crate::Result<bool> {
        self.add(RuleKind::Include, pattern)
    }

    /// Appends an exclude rule.
    ///
    /// Returns `Ok(false)` without adding anything when the pattern is blank.
    ///
    /// # Errors
    /// Returns `InvalidRulePattern` for an invalid regular expression.
    pub fn exclude_table(&mut self, pattern: &str) -> crate::Result<bool> {
        self.add(RuleKind::Exclude, pattern)
    }

    fn add(&mut self, kind: RuleKind, pattern: &str) -> crate::Result<bool> {
        if pattern.trim().is_empty() {
            return Ok(false);
        }
        self.push(TableRule::new(kind, pattern)?);
        Ok(true)
    }

    /// Appends an already compiled rule.
    pub fn push(&mut self, rule: TableRule) {
        self.rules.push(rule);
    }

    /// Whether a table is eligible for transfer.
    pub fn is_included(&self, table: &str) -> bool {
        let included = self
            .rules_of(RuleKind::Include)
            .any(|rule| rule.matches(table));
        let excluded = self
            .rules_of(RuleKind::Exclude)
            .any(|rule| rule.matches(table));
        included && !excluded
    }

    /// Filters table names down to the eligible ones, keeping their order.
    pub fn eligible<'a, I>(&self, tables: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        tables
            .into_iter()
            .filter(|table| self.is_included(table))
            .cloned()
            .collect()
    }

    fn rules_of(&self, kind: RuleKind) -> impl Iterator<Item = &TableRule> {
        self.rules.iter().filter(move |rule| rule.kind() == kind)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[TableRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of include rules.
    pub fn include_count(&self) -> usize {
        self.rules_of(RuleKind::Include).count()
    }

    /// Number of exclude rules.
    pub fn exclude_count(&self) -> usize {
        self.rules_of(RuleKind::Exclude).count()
    }
}
