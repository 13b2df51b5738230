//! Dialogue service configuration
//!
//! Static generation settings and content modifiers sent with every request.

use serde::{Deserialize, Serialize};

/// Score thresholds the service uses to choose between a predefined response,
/// a rephrased one, or a generated fallback
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub predefined_response: f32,
    pub generate_rephrase: f32,
    pub generate_fallback: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            predefined_response: 0.8,
            generate_rephrase: 0.6,
            generate_fallback: 0.4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Named prompt template on the service side
    pub preprompt_id: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            preprompt_id: "cai-vsim-patient-emotional".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub thresholds: Thresholds,
    pub generator: GeneratorConfig,
}

/// A persona fact handed to the service verbatim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentModifier {
    pub feature: String,
    pub description: String,
}

impl ContentModifier {
    pub fn new(feature: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            description: description.into(),
        }
    }
}

/// Persona facts that hold for the whole scenario
pub fn default_general_modifiers() -> Vec<ContentModifier> {
    vec![
        ContentModifier::new("Agent name", "Millie Larsen"),
        ContentModifier::new("Agent type", "Patient"),
        ContentModifier::new(
            "Agent description",
            "I am a virtual assistant designed to help you with your medical needs.",
        ),
        ContentModifier::new(
            "Food preferences",
            "I really love pizza and then I think icecream is cool, haha. Peanuts is a no go, as I am allergic to it.",
        ),
    ]
}

/// Facts about the patient's situation in the current stage
pub fn default_stage_modifiers() -> Vec<ContentModifier> {
    vec![
        ContentModifier::new(
            "stage_description_subjective",
            "I am Millie Larsen. I am really tired and my leg hurts. I am at the hospital and I am not feeling well.",
        ),
        ContentModifier::new(
            "Current state of mind",
            "At the moment I don't feel well and I am really tired.",
        ),
        ContentModifier::new("Current location", "I am at the hospital, just got here."),
        ContentModifier::new(
            "Most recent received medical treatment",
            "I received some pain medication for my leg at 12:00, but it is still hurting.",
        ),
    ]
}

/// Configuration for the dialogue client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Full URL of the invocation endpoint
    pub endpoint: String,

    /// Bearer token, if the endpoint requires one
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Scenario content identifier
    pub content_id: String,

    /// Number of candidate predefined responses to request
    pub candidate_count: u32,

    pub generation: GenerationConfig,

    pub general_modifiers: Vec<ContentModifier>,

    pub stage_modifiers: Vec<ContentModifier>,

    pub device_id: String,

    pub user_id: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/serving-endpoints/convai-vsim-v0/invocations"
                .to_string(),
            token: None,
            timeout_secs: 10,
            content_id: "vsim-medsurg-patient-millie_larsen".to_string(),
            candidate_count: 5,
            generation: GenerationConfig::default(),
            general_modifiers: default_general_modifiers(),
            stage_modifiers: default_stage_modifiers(),
            device_id: "device-id".to_string(),
            user_id: "user-id".to_string(),
        }
    }
}

impl DialogueConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = content_id.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}
