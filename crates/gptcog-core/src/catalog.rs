//! The expression catalog.
//!
//! Every step sentence in a scenario must, once its placeholders are
//! substituted, match one of the assertion shapes below. The catalog is
//! fixed and ordered; matching is attempted in catalog order and the first
//! match wins.
//!
//! Patterns are assembled from shared fragments so the operator vocabulary,
//! the model identifier shape and the free-text character class stay
//! identical across entries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Model identifier: anything containing `gpt-`, up to the next space.
const MODEL_A: &str = r"(?P<modela>(?:[a-zA-Z0-9_-]*gpt-[a-zA-Z0-9_-]*)[^ ]*)";
const MODEL_B: &str = r"(?P<modelb>(?:[a-zA-Z0-9_-]*gpt-[a-zA-Z0-9_-]*)[^ ]*)";

/// Free text inside quotes: letters, digits, underscore, space, hyphen and
/// any Unicode punctuation or symbol (`+`, `$`, `<`, `=`, `^` and friends).
const TEXT: &str = r"[a-zA-Z0-9_ \-\p{P}\p{S}]";

/// Whole non-negative integer without leading zeros.
const INTEGER: &str = r"0|[1-9][0-9]*";

/// Comparison operators shared by every assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    BeSet,
    NotBeSet,
    BeLessThan,
    BeGreaterThan,
    BeOneOf,
    Be,
    Contain,
    NotBeOneOf,
    NotBe,
    NotContain,
    Match,
    NotMatch,
}

impl Operator {
    /// Full vocabulary in matching-preference order.
    ///
    /// Order matters: alternation is leftmost-first, so `be set` has to be
    /// tried before `be`.
    pub const ALL: [Operator; 12] = [
        Operator::BeSet,
        Operator::NotBeSet,
        Operator::BeLessThan,
        Operator::BeGreaterThan,
        Operator::BeOneOf,
        Operator::Be,
        Operator::Contain,
        Operator::NotBeOneOf,
        Operator::NotBe,
        Operator::NotContain,
        Operator::Match,
        Operator::NotMatch,
    ];

    /// Operators accepted by the school-level assertion.
    pub const READABILITY: [Operator; 6] = [
        Operator::BeLessThan,
        Operator::BeGreaterThan,
        Operator::BeOneOf,
        Operator::Be,
        Operator::NotBeOneOf,
        Operator::NotBe,
    ];

    /// The phrase used in step sentences.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::BeSet => "be set",
            Operator::NotBeSet => "not be set",
            Operator::BeLessThan => "be less than",
            Operator::BeGreaterThan => "be greater than",
            Operator::BeOneOf => "be one of",
            Operator::Be => "be",
            Operator::Contain => "contain",
            Operator::NotBeOneOf => "not be one of",
            Operator::NotBe => "not be",
            Operator::NotContain => "not contain",
            Operator::Match => "match",
            Operator::NotMatch => "not match",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a phrase is not part of the operator vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Stable identifiers of the catalog entries, one per assertion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpressionId {
    CompletionEqualsAb,
    CompletionEquals,
    CompletionReadability,
    CompletionSemanticSimilarity,
    CompletionWordCount,
    EmbeddingsCosineSimilarity,
    CompletionTokenCost,
    CompletionResponseTime,
}

impl ExpressionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionId::CompletionEqualsAb => "CompletionEqualsAb",
            ExpressionId::CompletionEquals => "CompletionEquals",
            ExpressionId::CompletionReadability => "CompletionReadability",
            ExpressionId::CompletionSemanticSimilarity => "CompletionSemanticSimilarity",
            ExpressionId::CompletionWordCount => "CompletionWordCount",
            ExpressionId::EmbeddingsCosineSimilarity => "EmbeddingsCosineSimilarity",
            ExpressionId::CompletionTokenCost => "CompletionTokenCost",
            ExpressionId::CompletionResponseTime => "CompletionResponseTime",
        }
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted assertion shape.
#[derive(Debug)]
struct Expression {
    id: ExpressionId,
    title: &'static str,
    regex: Regex,
    /// A capture that must not contain the given phrase. Stands in for a
    /// negative lookahead, which the regex engine does not support.
    excludes: Option<(&'static str, &'static str)>,
}

impl Expression {
    fn new(id: ExpressionId, title: &'static str, template: &str) -> Self {
        Self {
            id,
            title,
            regex: compile(template),
            excludes: None,
        }
    }

    fn excluding(mut self, group: &'static str, phrase: &'static str) -> Self {
        self.excludes = Some((group, phrase));
        self
    }

    /// Match a fully substituted sentence against this expression.
    fn captures(&self, sentence: &str) -> Option<ExpressionMatch> {
        let caps = self.regex.captures(sentence)?;

        if let Some((group, phrase)) = self.excludes {
            if caps.name(group).is_some_and(|m| m.as_str().contains(phrase)) {
                return None;
            }
        }

        let captures = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();

        Some(ExpressionMatch {
            id: self.id,
            captures,
        })
    }
}

/// A successful match: which expression, and its named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionMatch {
    pub id: ExpressionId,
    pub captures: BTreeMap<String, String>,
}

impl ExpressionMatch {
    /// A named field, if it participated in the match.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    /// The comparison operator of the assertion.
    pub fn operator(&self) -> Option<Operator> {
        self.get("operator").and_then(|s| s.parse().ok())
    }
}

fn operator_group(operators: &[Operator]) -> String {
    let alternatives: Vec<&str> = operators.iter().map(Operator::as_str).collect();
    format!("(?P<operator>{})", alternatives.join("|"))
}

fn compile(template: &str) -> Regex {
    let source = template
        .replace("{MODELA}", MODEL_A)
        .replace("{MODELB}", MODEL_B)
        .replace("{TEXT}", TEXT)
        .replace("{INTEGER}", INTEGER)
        .replace("{OPERATOR}", &operator_group(&Operator::ALL))
        .replace("{READABILITY_OPERATOR}", &operator_group(&Operator::READABILITY));
    Regex::new(&source).unwrap()
}

lazy_static! {
    static ref CATALOG: Vec<Expression> = vec![
        Expression::new(
            ExpressionId::CompletionEqualsAb,
            "Compare OpenAI GPT model A and B prompt responses from completion",
            r#"^OpenAI model {MODELA} and {MODELB} responses to "(?P<prompt>{TEXT}+)" should {OPERATOR} ?(?P<expectation>.+)?"#,
        ),
        Expression::new(
            ExpressionId::CompletionEquals,
            "Check OpenAI GPT prompt response from completion",
            r#"^OpenAI model {MODELA} response to "(?P<prompt>{TEXT}*?)" should {OPERATOR} ?(?P<expectation>.+)?"#,
        )
        // Lazy prompt: the first candidate is the shortest, so if it holds
        // the phrase every longer split does too.
        .excluding("prompt", "semantically compared"),
        Expression::new(
            ExpressionId::CompletionReadability,
            "Check OpenAI GPT prompt response reading ease (school level)",
            r#"^OpenAI model {MODELA} school level of the response to "(?P<prompt>{TEXT}+)" should {READABILITY_OPERATOR} ?(?P<schoollevel>.+)?"#,
        ),
        Expression::new(
            ExpressionId::CompletionSemanticSimilarity,
            "Check OpenAI GPT semantic similarity of response to provided text",
            r#"^OpenAI model {MODELA} response to "(?P<prompt>{TEXT}+)" semantically compared with "(?P<comparetext>{TEXT}+)" should {OPERATOR} ?(?P<semanticsimilarity>0(?:\.[0-9]+)?)"#,
        ),
        Expression::new(
            ExpressionId::CompletionWordCount,
            "Check OpenAI GPT prompt response word count",
            r#"^OpenAI model {MODELA} word count in a response to "(?P<prompt>{TEXT}+)" should {OPERATOR} (?P<expectation>{INTEGER})"#,
        ),
        Expression::new(
            ExpressionId::EmbeddingsCosineSimilarity,
            "Check OpenAI GPT cosine similarity of two texts based on embeddings",
            r#"^OpenAI model {MODELA} cosine similarity of "(?P<text1>{TEXT}+)" and "(?P<text2>{TEXT}+)" should {OPERATOR} ?(?P<cosinesimilarity>.+)?"#,
        ),
        Expression::new(
            ExpressionId::CompletionTokenCost,
            "Check OpenAI GPT prompt token cost given a prompt and model",
            r#"^OpenAI model {MODELA} ?(?P<type>.+)? token cost in response to "(?P<prompt>{TEXT}+)" should {OPERATOR} (?P<expectation>{INTEGER}) tokens$"#,
        ),
        Expression::new(
            ExpressionId::CompletionResponseTime,
            "Check OpenAI GPT prompt response time from request to completion",
            r#"^OpenAI model {MODELA} response time in response to "(?P<prompt>{TEXT}+)" should {OPERATOR} (?P<expectation>{INTEGER}) ms$"#,
        ),
    ];
}

/// A serializable description of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: ExpressionId,
    pub title: &'static str,
    pub pattern: String,
}

/// Describe every catalog entry, in matching order.
pub fn entries() -> Vec<CatalogEntry> {
    CATALOG
        .iter()
        .map(|expr| CatalogEntry {
            id: expr.id,
            title: expr.title,
            pattern: expr.regex.as_str().to_string(),
        })
        .collect()
}

/// Find the first expression matching a sentence.
pub fn find(sentence: &str) -> Option<ExpressionMatch> {
    CATALOG.iter().find_map(|expr| expr.captures(sentence))
}

/// Check whether any expression matches a sentence.
pub fn is_match(sentence: &str) -> bool {
    find(sentence).is_some()
}
