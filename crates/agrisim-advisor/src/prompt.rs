//! Prompt template loading and rendering via `minijinja`.
//!
//! Built-in templates are compiled into the crate. Operators can override
//! any of them by placing a file of the same name in the configured
//! templates directory, so wording can be tuned without recompiling.

use std::path::Path;

use agrisim_types::{CropKind, EnvironmentState};
use minijinja::Environment;
use serde::Serialize;

use crate::error::AdvisorError;
use crate::subject::AdvisorySubject;

const ANALYSIS_SYSTEM: &str = "You are an expert agricultural AI assistant specializing in crop analysis and farming optimization. Provide detailed, scientific, and actionable advice. Keep responses concise but comprehensive.";

const ANALYSIS_USER: &str = "Analyze this {{ kind }} plant with the following conditions:

Plant Status:
- Growth: {{ growth|int }}%
- Health: {{ health|int }}%
- Water Level: {{ water_level|int }}%
- Soil Moisture: {{ soil_moisture|int }}%
- Nutrient Level: {{ nutrient_level|int }}%
- Disease Level: {{ disease_level|int }}%
- Days since planted: {{ days_planted }}
- Expected maturity: {{ growth_days }} days
- Days to maturity: {{ days_to_maturity }}
- Water requirement: {{ water_need }}
- Environmental stress: {{ (environmental_stress * 100)|int }}%

Please provide:
1. Current plant condition assessment
2. Most urgent action needed
3. Growth optimization recommendations
4. Disease/pest management advice
5. Predicted yield and quality
6. Timeline for next actions

Keep responses concise but detailed, focusing on actionable farming advice.";

const PROBE_SYSTEM: &str = "You are a test. Respond with \"OK\" only.";

const PROBE_USER: &str = "Test connection";

const VARIATION_SYSTEM: &str = "You are an agricultural genetics AI. Respond only with valid JSON.";

const VARIATION_USER: &str = "Generate realistic variations for {{ crop_type }} plants considering:
- Soil quality: {{ soil_quality }}
- Weather conditions: {{ weather }}
- Season: {{ season }}

Provide JSON with: height_variation, color_variation, leaf_count, growth_rate_modifier, disease_resistance";

/// Template names paired with their built-in sources.
const TEMPLATES: [(&str, &str); 6] = [
    ("analysis_system.j2", ANALYSIS_SYSTEM),
    ("analysis_user.j2", ANALYSIS_USER),
    ("probe_system.j2", PROBE_SYSTEM),
    ("probe_user.j2", PROBE_USER),
    ("variation_system.j2", VARIATION_SYSTEM),
    ("variation_user.j2", VARIATION_USER),
];

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    /// System message establishing the assistant persona.
    pub system: String,
    /// User message describing the request.
    pub user: String,
    /// Reply length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl core::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct VariationContext<'a> {
    crop_type: &'a str,
    soil_quality: f64,
    weather: agrisim_types::Weather,
    season: agrisim_types::Season,
}

impl PromptEngine {
    /// Load the built-in templates, replacing any that `templates_dir`
    /// provides a file for.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Template`] if an override cannot be read or
    /// any template fails to compile.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, AdvisorError> {
        let mut env = Environment::new();

        for (name, builtin) in TEMPLATES {
            let source = match templates_dir {
                Some(dir) => load_override(dir, name)?.unwrap_or_else(|| builtin.to_owned()),
                None => builtin.to_owned(),
            };
            env.add_template_owned(name, source)
                .map_err(|e| AdvisorError::Template(format!("failed to add {name}: {e}")))?;
        }

        Ok(Self { env })
    }

    /// Prompt asking for a full analysis of one crop.
    pub fn render_analysis(&self, subject: &AdvisorySubject) -> Result<RenderedPrompt, AdvisorError> {
        Ok(RenderedPrompt {
            system: self.render("analysis_system.j2", subject)?,
            user: self.render("analysis_user.j2", subject)?,
            max_tokens: 1000,
            temperature: 0.7,
        })
    }

    /// Minimal connectivity probe.
    pub fn render_probe(&self) -> Result<RenderedPrompt, AdvisorError> {
        let empty = serde_json::json!({});
        Ok(RenderedPrompt {
            system: self.render("probe_system.j2", &empty)?,
            user: self.render("probe_user.j2", &empty)?,
            max_tokens: 10,
            temperature: 0.1,
        })
    }

    /// Prompt asking for a JSON genetic-variation hint for a species.
    pub fn render_variation(
        &self,
        kind: CropKind,
        environment: &EnvironmentState,
    ) -> Result<RenderedPrompt, AdvisorError> {
        let ctx = VariationContext {
            crop_type: kind.name(),
            soil_quality: environment.soil_quality,
            weather: environment.weather,
            season: environment.season,
        };
        Ok(RenderedPrompt {
            system: self.render("variation_system.j2", &ctx)?,
            user: self.render("variation_user.j2", &ctx)?,
            max_tokens: 300,
            temperature: 0.8,
        })
    }

    fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, AdvisorError> {
        self.env
            .get_template(name)
            .map_err(|e| AdvisorError::Template(format!("missing {name}: {e}")))?
            .render(ctx)
            .map_err(|e| AdvisorError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read `dir/name` if it exists.
fn load_override(dir: &str, name: &str) -> Result<Option<String>, AdvisorError> {
    let path = Path::new(dir).join(name);
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| AdvisorError::Template(format!("failed to read {}: {e}", path.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::subject::tests::subject;

    #[test]
    fn analysis_prompt_lists_floored_vitals() {
        let engine = PromptEngine::new(None).unwrap();
        let mut s = subject(42.7, 88.2, 55.5, 61.9, 12.4);
        s.environmental_stress = 0.256;
        let prompt = engine.render_analysis(&s).unwrap();

        assert!(prompt.system.starts_with("You are an expert agricultural AI assistant"));
        assert!(prompt.user.starts_with("Analyze this tomato plant"));
        assert!(prompt.user.contains("- Growth: 42%"));
        assert!(prompt.user.contains("- Health: 88%"));
        assert!(prompt.user.contains("- Soil Moisture: 60%"));
        assert!(prompt.user.contains("- Days since planted: 20"));
        assert!(prompt.user.contains("- Expected maturity: 75 days"));
        assert!(prompt.user.contains("- Water requirement: medium"));
        assert!(prompt.user.contains("- Environmental stress: 25%"));
        assert_eq!(prompt.max_tokens, 1000);
    }

    #[test]
    fn probe_prompt_is_tiny() {
        let engine = PromptEngine::new(None).unwrap();
        let prompt = engine.render_probe().unwrap();
        assert_eq!(prompt.user, "Test connection");
        assert_eq!(prompt.max_tokens, 10);
    }

    #[test]
    fn variation_prompt_names_species_and_weather() {
        let engine = PromptEngine::new(None).unwrap();
        let prompt = engine
            .render_variation(CropKind::Corn, &EnvironmentState::default())
            .unwrap();
        assert!(prompt.user.starts_with("Generate realistic variations for corn plants"));
        assert!(prompt.user.contains("- Weather conditions: sunny"));
        assert!(prompt.user.contains("- Season: summer"));
        assert!(prompt.system.contains("valid JSON"));
    }

    #[test]
    fn directory_overrides_single_template() {
        let dir = std::env::temp_dir().join(format!("agrisim-prompts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("probe_user.j2"), "ping").ok();

        let engine = PromptEngine::new(dir.to_str()).unwrap();
        let prompt = engine.render_probe().unwrap();
        assert_eq!(prompt.user, "ping");
        // Others keep the built-in text.
        assert!(prompt.system.contains("Respond with"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn broken_override_is_an_error() {
        let dir = std::env::temp_dir().join(format!("agrisim-bad-prompts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("analysis_user.j2"), "{% if %}").ok();

        assert!(matches!(
            PromptEngine::new(dir.to_str()),
            Err(AdvisorError::Template(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
