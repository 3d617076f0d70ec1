//! Variable cross-reference check.
//!
//! Substitutes `{{test.<name>}}` placeholders with the declared token values
//! and matches each resulting sentence against the expression catalog.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::{CheckKind, ScenarioCheck};
use crate::catalog::{self, ExpressionMatch};
use crate::observer::ValidationObserver;
use crate::scenario::Scenario;
use crate::ValidationError;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{test\.([A-Za-z0-9_]+)\}\}").unwrap();
}

/// A step after substitution, with the catalog entry it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStep {
    /// 1-based position in the scenario
    pub position: usize,

    /// The sentence with every placeholder substituted
    pub sentence: String,

    /// The first catalog entry the sentence matched
    pub expression: ExpressionMatch,
}

/// Replace every placeholder in `template` with its rendered value.
///
/// Stops at the first name missing from `values`; `step` is only used to
/// label that error.
pub fn substitute(
    template: &str,
    values: &BTreeMap<&str, String>,
    step: usize,
) -> Result<String, ValidationError> {
    let mut sentence = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = values
            .get(name.as_str())
            .ok_or_else(|| ValidationError::UndeclaredToken {
                step,
                key: name.as_str().to_string(),
            })?;
        sentence.push_str(&template[last..whole.start()]);
        sentence.push_str(value);
        last = whole.end();
    }

    sentence.push_str(&template[last..]);
    Ok(sentence)
}

fn rendered_tokens(scenario: &Scenario) -> BTreeMap<&str, String> {
    scenario
        .tokens
        .test
        .iter()
        .map(|(name, value)| (name.as_str(), value.render()))
        .collect()
}

fn resolve(
    template: &str,
    values: &BTreeMap<&str, String>,
    position: usize,
) -> Result<ResolvedStep, ValidationError> {
    let sentence = substitute(template, values, position)?;
    match catalog::find(&sentence) {
        Some(expression) => Ok(ResolvedStep {
            position,
            sentence,
            expression,
        }),
        None => Err(ValidationError::UnmatchedExpression {
            step: position,
            sentence,
        }),
    }
}

/// Every placeholder must be declared and every sentence must be known.
pub struct VariableCheck;

impl VariableCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VariableCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioCheck for VariableCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Variables
    }

    fn check(
        &self,
        scenario: &Scenario,
        observer: &dyn ValidationObserver,
    ) -> Result<(), ValidationError> {
        let values = rendered_tokens(scenario);
        for (index, step) in scenario.steps.iter().enumerate() {
            let resolved = resolve(&step.step, &values, index + 1)?;
            observer.step_resolved(&resolved);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::catalog::ExpressionId;
    use crate::observer::NoopObserver;

    #[derive(Default)]
    struct Collector {
        steps: Mutex<Vec<ResolvedStep>>,
    }

    impl ValidationObserver for Collector {
        fn step_resolved(&self, step: &ResolvedStep) {
            self.steps.lock().unwrap().push(step.clone());
        }
    }

    fn resolve_all(scenario: &Scenario) -> (Result<(), ValidationError>, Vec<ResolvedStep>) {
        let collector = Collector::default();
        let result = VariableCheck::new().check(scenario, &collector);
        (result, collector.steps.into_inner().unwrap())
    }

    const SCENARIO: &str = r#"
scenario: Support bot
description: Semantic and cost checks
tokens:
  test:
    model: gpt-4-1106-preview
    prompt: Where is my shipping?
    compare: Could you please provide me with your order number
    threshold: 0.15
    limit: 100
steps:
  - step: OpenAI model {{test.model}} response to "{{test.prompt}}" semantically compared with "{{test.compare}}" should be greater than {{test.threshold}}
    data:
      __stepOrder: 1
  - step: OpenAI model {{test.model}} input token cost in response to "{{test.prompt}}" should be less than {{test.limit}} tokens
    data:
      __stepOrder: 2
"#;

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let mut values = BTreeMap::new();
        values.insert("x", "1".to_string());
        assert_eq!(substitute("{{test.x}}+{{test.x}}", &values, 1).unwrap(), "1+1");
        assert_eq!(
            substitute("{{test.x}} {{prod.x}}", &values, 1).unwrap(),
            "1 {{prod.x}}"
        );
        assert_eq!(substitute("no placeholders", &values, 1).unwrap(), "no placeholders");
    }

    #[test]
    fn test_substitute_reports_first_missing_name() {
        let values = BTreeMap::new();
        assert_eq!(
            substitute("{{test.first}} {{test.second}}", &values, 3),
            Err(ValidationError::UndeclaredToken {
                step: 3,
                key: "first".to_string()
            })
        );
    }

    #[test]
    fn test_every_step_resolved_in_order() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let (result, resolved) = resolve_all(&scenario);
        assert_eq!(result, Ok(()));
        assert_eq!(resolved.len(), 2);
        assert_eq!(
            resolved[0].expression.id,
            ExpressionId::CompletionSemanticSimilarity
        );
        assert!(resolved[0].sentence.ends_with("greater than 0.15"));
        assert_eq!(resolved[1].expression.id, ExpressionId::CompletionTokenCost);
        assert_eq!(resolved[1].position, 2);
    }

    #[test]
    fn test_undeclared_token_names_step() {
        let yaml = SCENARIO.replace("{{test.limit}}", "{{test.budget}}");
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        assert_eq!(
            VariableCheck::new().check(&scenario, &NoopObserver),
            Err(ValidationError::UndeclaredToken {
                step: 2,
                key: "budget".to_string()
            })
        );
    }

    #[test]
    fn test_unmatched_sentence_fails() {
        let yaml = SCENARIO.replace(" tokens\n", " coins\n");
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        assert!(matches!(
            VariableCheck::new().check(&scenario, &NoopObserver),
            Err(ValidationError::UnmatchedExpression { step: 2, .. })
        ));
    }

    #[test]
    fn test_value_breaking_grammar_fails() {
        // A threshold of 1.5 is outside the 0.x similarity range.
        let yaml = SCENARIO.replace("threshold: 0.15", "threshold: 1.5");
        let scenario = Scenario::from_yaml(&yaml).unwrap();
        let (result, resolved) = resolve_all(&scenario);
        assert!(matches!(
            result,
            Err(ValidationError::UnmatchedExpression { step: 1, .. })
        ));
        assert!(resolved.is_empty());
    }
}
