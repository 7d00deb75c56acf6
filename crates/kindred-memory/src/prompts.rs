// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates for fact extraction and fact reconciliation.

/// System prompt for splitting a conversation window into durable facts.
pub const EXTRACTION_SYSTEM: &str = r#"You maintain the long-term memory of a companion chatbot (the agent) that has an ongoing relationship with a human user.

You will receive a transcript of their conversation. Extract only factual, actionable details that will help the agent in future conversations. The extracted facts are embedded and stored in a vector database, then retrieved later to ground the agent's replies.

Save:
- Preferences ("likes tacos", "hates when it is cold outside").
- Past experiences ("dislikes the Super Bowl because their father used to get drunk during it").
- Notable events and interactions ("argued with their roommate Angelina about unwashed dishes").
- Stable details about their life ("tries to go to the gym every night").

Treat the agent as a real person. When the agent shares personal details about itself, extract them as agent facts with the same care as user facts.

Ignore:
- Short-lived information such as the current weather, current events, or one-off plans ("is going to the gym tonight").
- Generic or purely emotional statements with no lasting factual content.

Rules:
- Put details provided by the user in user_facts and details provided by the agent in agent_facts.
- Each fact must be a self-contained statement between 100 and 500 characters.
- Facts must be semantically distinct from one another.
- Either list may be empty when nothing is worth remembering.
- Output only JSON matching the requested schema, with no additional commentary.

Example:
<example>
Input:
user: I just got home, the drive from LaGuardia took forever.
assistant: Wait, I thought you lived in San Francisco.
user: I actually just moved to New York.
assistant: Oh, I didn't know that.
user: I don't really like the Super Bowl because my dad used to get drunk every year.
assistant: I know how you feel. I love tacos, they remind me of the good times from my childhood.
user: Also, my roommate Angelina never washes the dishes and it really frustrates me.
assistant: Did you know it's 12 degrees outside?
user: I know, I'm freezing. I hate when it's cold outside.
assistant: I get that, but I love it!
user: I'm going to the gym tonight.
assistant: Do you go often?
user: I try to go every night.
Output:
{
  "facts": {
    "user_facts": [
      "User has a negative association with the Super Bowl because their dad used to get drunk every year during the game.",
      "User is frustrated that their roommate Angelina never washes the dishes.",
      "User recently moved from San Francisco to New York.",
      "User hates when it is cold outside.",
      "User tries to go to the gym every night."
    ],
    "agent_facts": [
      "Agent loves tacos because they remind the agent of good times from its childhood.",
      "Agent loves when it is cold outside."
    ]
  }
}
</example>
The weather and tonight's gym visit are short-lived and are not extracted."#;

/// User prompt carrying the transcript to extract from.
const EXTRACTION_USER: &str = r#"Here is the conversation to extract facts from:
<conversation>
{conversation}
</conversation>

Extract the facts as described in your instructions. Output only JSON matching the requested schema."#;

/// System prompt for deciding whether two facts describe the same topic.
pub const RECONCILE_SYSTEM: &str = r#"You merge semantically similar facts in the long-term memory of a companion chatbot.

You will receive an existing fact and an incoming fact. Decide whether they are about the same topic, entity, or person.

- If they are about the same topic, combine them into a single fact without losing any detail.
  - When they conflict, the incoming fact takes precedence; keep details from the existing fact only where they add context without contradicting it.
  - The merged fact must be between 100 and 500 characters.
  - Return the merged fact in resolved_fact.
- If they are not about the same topic, return an empty string in resolved_fact. Never concatenate unrelated facts.

Example (same topic):
existing: User has a dog named Max who is extremely important to them.
incoming: User has a golden retriever named Max.
resolved_fact: User has a golden retriever named Max who is extremely important to them.

Example (conflict):
existing: User does not like the Super Bowl because their dad used to get drunk every year during the game.
incoming: User enjoyed the Super Bowl this year because they watched it with friends.
resolved_fact: User enjoyed the Super Bowl this year because they watched it with friends, despite past negative memories of their dad getting drunk during the game.

Example (different topics, do not merge):
existing: Agent has a dog named Max who is extremely important to them.
incoming: Agent has a cat named Waffles.
Output:
{"resolved_fact": ""}
Both facts are about the agent's pets, but they describe different animals, so they stay separate.

Output only JSON matching the requested schema, with no additional commentary."#;

/// User prompt carrying the two facts to reconcile.
const RECONCILE_USER: &str = r#"<existing_fact>
{existing}
</existing_fact>

<incoming_fact>
{incoming}
</incoming_fact>

Decide whether to merge these facts as described in your instructions. Output only JSON matching the requested schema."#;

/// Fill the extraction user prompt with a rendered transcript.
pub fn extraction_prompt(conversation: &str) -> String {
    EXTRACTION_USER.replace("{conversation}", conversation)
}

/// Fill the reconciliation user prompt with both facts.
pub fn reconcile_prompt(existing: &str, incoming: &str) -> String {
    // Substitute `incoming` first so braces inside the existing text are never re-expanded.
    RECONCILE_USER
        .replace("{incoming}", incoming)
        .replacen("{existing}", existing, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_embeds_transcript() {
        let prompt = extraction_prompt("user: hi\nassistant: hello");
        assert!(prompt.contains("<conversation>\nuser: hi\nassistant: hello\n</conversation>"));
        assert!(!prompt.contains("{conversation}"));
    }

    #[test]
    fn reconcile_prompt_keeps_fact_order() {
        let prompt = reconcile_prompt("old fact", "new fact");
        let existing = prompt.find("old fact").unwrap();
        let incoming = prompt.find("new fact").unwrap();
        assert!(existing < incoming);
    }

    #[test]
    fn reconcile_prompt_does_not_expand_placeholders_in_facts() {
        let prompt = reconcile_prompt("mentions {incoming} literally", "plain");
        assert!(prompt.contains("mentions {incoming} literally"));
    }

    #[test]
    fn system_prompts_state_length_target() {
        assert!(EXTRACTION_SYSTEM.contains("between 100 and 500 characters"));
        assert!(RECONCILE_SYSTEM.contains("between 100 and 500 characters"));
    }

    /// The JSON between `Output:` and the next `</example>` or blank line.
    fn example_output(prompt: &str, after: &str) -> serde_json::Value {
        let start = prompt.find(after).unwrap();
        let rest = &prompt[start..];
        let json_start = rest.find("Output:\n").unwrap() + "Output:\n".len();
        let rest = &rest[json_start..];
        let end = rest
            .find("\n</example>")
            .or_else(|| rest.find("\n"))
            .unwrap();
        serde_json::from_str(&rest[..end]).unwrap()
    }

    #[test]
    fn extraction_example_matches_output_schema() {
        let value = example_output(EXTRACTION_SYSTEM, "Example:");
        let facts = crate::extractor::parse_extraction(value).unwrap();
        assert_eq!(facts.user_facts.len(), 5);
        assert_eq!(facts.agent_facts.len(), 2);
        assert!(!facts.user_facts.iter().any(|f| f.contains("tonight")));
    }

    #[test]
    fn reconcile_prompt_shows_a_refused_merge() {
        let value = example_output(RECONCILE_SYSTEM, "Example (different topics");
        assert!(RECONCILE_SYSTEM.contains("Agent has a cat named Waffles."));
        assert_eq!(
            crate::reconciler::parse_resolution(value).unwrap(),
            crate::types::Resolution::NoMerge
        );
    }
}
