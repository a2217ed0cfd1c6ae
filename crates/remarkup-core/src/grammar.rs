// SPDX-License-Identifier: AGPL-3.0-or-later
//! Grammar registry
//!
//! Holds the rule descriptors in dispatch order and resolves pseudo-XML tag
//! names back to the rule that owns them.

use crate::token::RuleKind;
use crate::traits::Rule;
use std::collections::HashMap;

/// Registry of grammar rules, ordered by priority
pub struct Grammar {
    rules: Vec<Box<dyn Rule>>,
    owners: HashMap<RuleKind, usize>,
}

impl Grammar {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Create a grammar with the built-in rule set
    pub fn with_defaults() -> Self {
        let mut grammar = Self::new();
        for rule in crate::rules::default_rules() {
            grammar.register(rule);
        }
        grammar
    }

    /// Register a rule
    ///
    /// A rule producing the same kind as an existing one replaces it. Rules
    /// sharing a priority keep their registration order.
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let kind = rule.kind();
        match self.rules.iter().position(|r| r.kind() == kind) {
            Some(index) => self.rules[index] = rule,
            None => self.rules.push(rule),
        }
        self.rules.sort_by_key(|r| r.priority());
        self.reindex();
    }

    /// Remove the rule producing `kind`, returning whether one was registered
    pub fn unregister(&mut self, kind: RuleKind) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.kind() != kind);
        self.reindex();
        before != self.rules.len()
    }

    fn reindex(&mut self) {
        self.owners.clear();
        for (index, rule) in self.rules.iter().enumerate() {
            self.owners.insert(rule.kind(), index);
            for component in rule.component_kinds() {
                self.owners.insert(*component, index);
            }
        }
    }

    /// Rules in the order the dispatcher tries them
    pub fn dispatch_order(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Rule owning tokens of `kind`
    pub fn rule(&self, kind: RuleKind) -> Option<&dyn Rule> {
        self.owners
            .get(&kind)
            .map(|&index| self.rules[index].as_ref())
    }

    /// Rule owning a pseudo-XML tag name
    pub fn rule_for_tag(&self, name: &str) -> Option<(RuleKind, &dyn Rule)> {
        let kind = RuleKind::from_tag_name(name)?;
        self.rule(kind).map(|rule| (kind, rule))
    }

    pub fn has(&self, kind: RuleKind) -> bool {
        self.owners.contains_key(&kind)
    }

    /// Kinds of the registered rules in dispatch order
    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MatchContext;
    use crate::token::Attributes;
    use crate::traits::RuleMatch;

    struct FixedRule {
        kind: RuleKind,
        priority: i32,
    }

    impl Rule for FixedRule {
        fn kind(&self) -> RuleKind {
            self.kind
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn try_match(&self, _ctx: &MatchContext<'_>, _remaining: &str) -> Option<RuleMatch> {
            None
        }
        fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
            inner.to_string()
        }
    }

    fn fixed(kind: RuleKind, priority: i32) -> Box<dyn Rule> {
        Box::new(FixedRule { kind, priority })
    }

    #[test]
    fn test_grammar_creation() {
        let grammar = Grammar::new();
        assert!(grammar.is_empty());
    }

    #[test]
    fn test_dispatch_order_follows_priority() {
        let mut grammar = Grammar::new();
        grammar.register(fixed(RuleKind::Bold, 500));
        grammar.register(fixed(RuleKind::Header, 200));
        grammar.register(fixed(RuleKind::Italic, 500));

        assert_eq!(
            grammar.kinds(),
            vec![RuleKind::Header, RuleKind::Bold, RuleKind::Italic]
        );
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut grammar = Grammar::new();
        grammar.register(fixed(RuleKind::Bold, 500));
        grammar.register(fixed(RuleKind::Bold, 10));

        assert_eq!(grammar.len(), 1);
        assert_eq!(grammar.rule(RuleKind::Bold).map(|r| r.priority()), Some(10));
    }

    #[test]
    fn test_unregister() {
        let mut grammar = Grammar::with_defaults();
        assert!(grammar.unregister(RuleKind::Highlight));
        assert!(!grammar.has(RuleKind::Highlight));
        assert!(!grammar.unregister(RuleKind::Highlight));
    }

    #[test]
    fn test_component_kinds_resolve_to_owner() {
        let grammar = Grammar::with_defaults();
        let (kind, rule) = grammar.rule_for_tag("TableCell").expect("cell owner");
        assert_eq!(kind, RuleKind::TableCell);
        assert_eq!(rule.kind(), RuleKind::Table);

        let (_, rule) = grammar.rule_for_tag("ListItem").expect("item owner");
        assert_eq!(rule.kind(), RuleKind::List);
    }

    #[test]
    fn test_unknown_tag() {
        let grammar = Grammar::with_defaults();
        assert!(grammar.rule_for_tag("Marquee").is_none());
    }
}
