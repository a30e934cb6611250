//! Offline responder used when no credential is configured.
//!
//! Matching is a plain substring test against the lower-cased input, walked
//! in table order. The first matching rule wins, so reordering the table
//! changes observable replies.

pub const GREETING_REPLY: &str = "Hello! How can I assist you today?";

pub const HELP_REPLY: &str = "I'm here to help! You can ask me questions, request information, or just chat. What would you like to know?";

pub const WEATHER_REPLY: &str = "I don't have access to real-time weather data, but if you had provided an API key, I could integrate with a weather service to give you accurate forecasts.";

pub const NAME_REPLY: &str = "I'm your AI assistant, running in a terminal and speaking the OpenAI chat API. You can call me AI Assistant!";

pub const DEMO_MODE_REPLY: &str = "I'm running in demo mode without an API key. To get more intelligent responses, run 'parlance auth' or set OPENAI_API_KEY.";

/// Model name reported for replies produced here.
pub const SIMULATED_MODEL: &str = "simulated";

struct Rule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["hello", "hi"],
        reply: GREETING_REPLY,
    },
    Rule {
        keywords: &["help"],
        reply: HELP_REPLY,
    },
    Rule {
        keywords: &["weather"],
        reply: WEATHER_REPLY,
    },
    Rule {
        keywords: &["name"],
        reply: NAME_REPLY,
    },
];

pub fn respond(latest_user_text: &str) -> &'static str {
    let lowered = latest_user_text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.reply)
        .unwrap_or(DEMO_MODE_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_stable_across_calls() {
        let first = respond("Hello there");
        for _ in 0..5 {
            assert_eq!(respond("Hello there"), first);
        }
        assert_eq!(first, GREETING_REPLY);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(respond("HI"), GREETING_REPLY);
        assert_eq!(respond("What's the WEATHER like?"), WEATHER_REPLY);
    }

    #[test]
    fn earlier_rules_win() {
        // "help" and "weather" both present: help is checked first.
        assert_eq!(respond("help me with the weather"), HELP_REPLY);
        // "hi" hides inside "this", so the greeting rule fires first.
        assert_eq!(respond("is this weather real"), GREETING_REPLY);
        assert_eq!(respond("what is your name"), NAME_REPLY);
    }

    #[test]
    fn unmatched_input_gets_demo_notice() {
        assert_eq!(respond("tell me a story"), DEMO_MODE_REPLY);
        assert_eq!(respond(""), DEMO_MODE_REPLY);
    }
}
