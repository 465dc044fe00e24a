//! Proxy request body and prompt composition.

use serde::{Deserialize, Serialize};

use super::ProxyError;

/// JSON body posted to the proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// The user's goal, trimmed.
    pub goal: String,

    /// Full instruction sent to the generation service. Asks for a bullet
    /// list or JSON array so the normalizer has an easy time.
    pub prompt: String,
}

impl TaskRequest {
    /// Build the request for a goal, composing the prompt.
    ///
    /// Goals written in Cyrillic get a "respond in Russian" instruction so
    /// the checklist comes back in the user's language.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::EmptyGoal` if the goal is empty after trimming.
    pub fn for_goal(goal: &str) -> Result<Self, ProxyError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(ProxyError::EmptyGoal);
        }

        let instruction = if is_cyrillic(goal) {
            "Respond in Russian. Break down this goal into 3\u{2013}5 achievable tasks"
        } else {
            "Break down this goal into 3\u{2013}5 achievable tasks"
        };

        let prompt = format!("{instruction}: {goal}. Return either a bullet list or a JSON array of strings.");

        Ok(Self { goal: goal.to_string(), prompt })
    }
}

/// Whether the text contains any Cyrillic character (U+0400..=U+04FF).
fn is_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_goal_rejected() {
        assert!(matches!(TaskRequest::for_goal(""), Err(ProxyError::EmptyGoal)));
        assert!(matches!(TaskRequest::for_goal("   "), Err(ProxyError::EmptyGoal)));
    }

    #[test]
    fn test_goal_trimmed() {
        let req = TaskRequest::for_goal("  learn sailing  ").unwrap();
        assert_eq!(req.goal, "learn sailing");
    }

    #[test]
    fn test_prompt_composition() {
        let req = TaskRequest::for_goal("learn sailing").unwrap();
        assert!(req.prompt.starts_with("Break down this goal"));
        assert!(req.prompt.contains("learn sailing"));
        assert!(req.prompt.ends_with("JSON array of strings."));
    }

    #[test]
    fn test_cyrillic_goal_gets_russian_instruction() {
        let req = TaskRequest::for_goal("выучить русский язык").unwrap();
        assert!(req.prompt.starts_with("Respond in Russian."));
    }

    #[test]
    fn test_latin_goal_no_russian_instruction() {
        let req = TaskRequest::for_goal("plan a trip").unwrap();
        assert!(!req.prompt.contains("Respond in Russian"));
    }
}
