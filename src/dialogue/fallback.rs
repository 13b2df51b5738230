//! Local responder used when the dialogue service is unavailable
//!
//! Matching is deterministic: the first table key contained in the lower-cased
//! utterance wins, then a fixed sequence of keyword rules, then a generic
//! clarification.

/// Canned answers, in match priority order
pub const CANNED_RESPONSES: &[(&str, &str)] = &[
    // Greetings
    ("hello", "Hello! I'm Millie. How can I help you today?"),
    ("hi", "Hi there! I'm Millie Larsen. I'm not feeling so great today."),
    ("how are you", "I'm not feeling very well. My leg is really hurting me."),
    // Pain location and character
    ("where is your pain", "It's in my right leg, mainly around my shin area. It's pretty bad."),
    ("where does it hurt", "My right leg is really painful, especially around the shin area."),
    (
        "pain location",
        "The pain is concentrated in my right shin, but sometimes it radiates up my leg.",
    ),
    ("describe pain", "It's a sharp, throbbing pain that's worse when I try to put weight on it."),
    (
        "type of pain",
        "It's a combination of sharp and throbbing pain. Sometimes it feels like it's burning.",
    ),
    // Severity
    ("rate your pain", "It's about an 8 out of 10 right now. It's really throbbing."),
    ("pain level", "On a scale of 1 to 10, it's about an 8. It's quite severe."),
    ("scale", "If I had to rate it, I'd say 8 out of 10. It's very painful."),
    (
        "how bad",
        "It's pretty bad - about an 8 out of 10. Makes it hard to think about anything else.",
    ),
    // Onset
    (
        "when did the pain start",
        "It started about two days ago after I was moving some furniture in my apartment.",
    ),
    ("how long", "The pain has been going on for about two days now."),
    (
        "what happened",
        "I was moving furniture in my apartment two days ago, and then my leg started hurting badly.",
    ),
    (
        "what caused",
        "I think it might have been from moving furniture in my apartment. I felt something pull in my leg.",
    ),
    // Relieving and aggravating factors
    (
        "what makes it better",
        "Keeping it elevated helps a little, and ice gave me some temporary relief.",
    ),
    (
        "what helps",
        "Elevating my leg seems to help a bit, and the ice they gave me earlier provided some relief.",
    ),
    (
        "what makes it worse",
        "Standing or walking definitely makes it worse. Any pressure on it is really painful.",
    ),
    (
        "what aggravates",
        "Putting any weight on it makes the pain much worse. Even light touch can be painful.",
    ),
    // Allergies and medication
    ("allergies", "I'm allergic to peanuts, and I had a rash once from penicillin."),
    (
        "medical history",
        "I've been pretty healthy overall. No major surgeries or conditions, except for the peanut and penicillin allergies.",
    ),
    ("medications", "I took some ibuprofen at home for the pain, but it didn't really help much."),
    (
        "medication",
        "I took some ibuprofen at home, but it didn't help much. They gave me something stronger here, but I'm still in pain.",
    ),
    // Hospital context
    ("hospital", "I came to the hospital today because the pain in my leg was getting unbearable."),
    (
        "doctor",
        "The doctor examined my leg earlier and ordered some tests. I'm waiting to hear more.",
    ),
    (
        "nurse",
        "The nurses have been checking on me regularly. They gave me some pain medication about an hour ago.",
    ),
    (
        "tests",
        "They took some blood tests and did an X-ray of my leg. I'm waiting for the results.",
    ),
];

pub const CLARIFICATION: &str =
    "I'm sorry, I couldn't understand that. Could you please rephrase your question? I can tell you about my pain, when it started, what makes it better or worse, or any other concerns you have.";

/// Keyword rule: every word in `all` must appear, and at least one word of
/// `any` (when non-empty)
struct KeywordRule {
    all: &'static [&'static str],
    any: &'static [&'static str],
    key: &'static str,
}

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        all: &["pain"],
        any: &["describe", "what"],
        key: "describe pain",
    },
    KeywordRule {
        all: &["pain"],
        any: &["rate", "scale", "level"],
        key: "rate your pain",
    },
    KeywordRule {
        all: &["pain"],
        any: &["where", "location"],
        key: "where is your pain",
    },
    KeywordRule {
        all: &[],
        any: &["start", "begin", "when"],
        key: "when did the pain start",
    },
    KeywordRule {
        all: &[],
        any: &["better", "help", "relief"],
        key: "what makes it better",
    },
    KeywordRule {
        all: &[],
        any: &["worse", "aggravate", "increase"],
        key: "what makes it worse",
    },
];

impl KeywordRule {
    fn matches(&self, text: &str) -> bool {
        self.all.iter().all(|word| text.contains(word))
            && (self.any.is_empty() || self.any.iter().any(|word| text.contains(word)))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    /// The table key selected for `utterance`, if any
    pub fn matched_key(&self, utterance: &str) -> Option<&'static str> {
        let text = utterance.to_lowercase();

        CANNED_RESPONSES
            .iter()
            .map(|(key, _)| *key)
            .find(|key| text.contains(key))
            .or_else(|| {
                KEYWORD_RULES
                    .iter()
                    .find(|rule| rule.matches(&text))
                    .map(|rule| rule.key)
            })
    }

    pub fn respond(&self, utterance: &str) -> &'static str {
        self.matched_key(utterance)
            .and_then(lookup)
            .unwrap_or(CLARIFICATION)
    }
}

fn lookup(key: &str) -> Option<&'static str> {
    CANNED_RESPONSES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, response)| *response)
}
