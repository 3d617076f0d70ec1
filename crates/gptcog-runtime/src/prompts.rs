//! Prompts for scenario generation.
//!
//! The conversation sent to the model is:
//! 1. A system prompt fixing the output to YAML only
//! 2. An assistant message with a sample scenario and the accepted step
//!    grammar, rendered from the expression catalog
//! 3. The user's request

use gptcog_core::catalog;
use gptcog_core::Operator;

use crate::providers::ChatMessage;

/// System prompt shared by every generation request.
pub const SYSTEM_PROMPT: &str =
    "You are a YAML scenario generator. You must only output COMPLETELY VALID YAML";

/// Sample scenario showing one step of each accepted shape.
pub const SAMPLE_SCENARIO: &str = r#"scenario: Sample Scenario
description: >
  What the scenario checks, the context it runs in and what a good response looks like.
tokens:
  test:
    modela: gpt-4o
    modelb: gpt-4o-mini
    prompt: The prompt sent to the model.
    operator: be
    expectation: The expected response text, without quote signs.
    schoollevel: 8th & 9th grade
    similarity: 0.8
    wordCount: 50
    type: input
    tokenCost: 200
    responseTime: 3000
steps:
  - step: OpenAI model {{test.modela}} and {{test.modelb}} responses to "{{test.prompt}}" should {{test.operator}} {{test.expectation}}
    data:
      __stepOrder: 1
  - step: OpenAI model {{test.modela}} response to "{{test.prompt}}" should {{test.operator}} {{test.expectation}}
    data:
      __stepOrder: 2
  - step: OpenAI model {{test.modela}} school level of the response to "{{test.prompt}}" should {{test.operator}} {{test.schoollevel}}
    data:
      __stepOrder: 3
  - step: OpenAI model {{test.modela}} response to "{{test.prompt}}" semantically compared with "{{test.expectation}}" should be greater than {{test.similarity}}
    data:
      __stepOrder: 4
  - step: OpenAI model {{test.modela}} word count in a response to "{{test.prompt}}" should be less than {{test.wordCount}}
    data:
      __stepOrder: 5
  - step: OpenAI model {{test.modela}} cosine similarity of "{{test.prompt}}" and "{{test.expectation}}" should be greater than {{test.similarity}}
    data:
      __stepOrder: 6
  - step: OpenAI model {{test.modela}} {{test.type}} token cost in response to "{{test.prompt}}" should be less than {{test.tokenCost}} tokens
    data:
      __stepOrder: 7
  - step: OpenAI model {{test.modela}} response time in response to "{{test.prompt}}" should be less than {{test.responseTime}} ms
    data:
      __stepOrder: 8
"#;

const INSTRUCTIONS: &str = r#"Fill in the structure above for the user's request:
1. Output only YAML. No code fences, no document markers, no text before or after.
2. scenario: a short title. description: what is being checked and why.
3. tokens.test: every value a step refers to. Only the key `test` is allowed under tokens.
4. steps: keep only the steps relevant to the request and renumber __stepOrder as 1, 2, 3 with no gaps.
5. Every step, once its {{test.*}} values are filled in, must match one of the expressions below."#;

/// The assistant message describing the expected output.
pub fn assistant_context() -> String {
    let operators: Vec<&str> = Operator::ALL.iter().map(Operator::as_str).collect();

    let mut content = String::new();
    content.push_str("This is the scenario structure that must be followed.\n\n");
    content.push_str(SAMPLE_SCENARIO);
    content.push('\n');
    content.push_str(INSTRUCTIONS);
    content.push_str(&format!("\n\nOperators: {}\n\nExpressions:\n", operators.join(" | ")));

    for entry in catalog::entries() {
        content.push_str(&format!("- {} ({}): {}\n", entry.title, entry.id, entry.pattern));
    }
    content
}

/// Build the full message list for a user request.
pub fn generation_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::assistant(assistant_context()),
        ChatMessage::user(prompt),
    ]
}
