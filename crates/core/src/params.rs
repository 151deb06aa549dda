//! Generation parameter template shared by every item in a batch.
//!
//! A batch stores one [`GenerationParams`] and derives per-item variation
//! from the seed policy alone; everything else is identical across items.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LEN: usize = 2000;

/// Minimum output dimension (width or height) in pixels.
pub const MIN_DIMENSION: u32 = 64;

/// Maximum output dimension (width or height) in pixels.
pub const MAX_DIMENSION: u32 = 2048;

/// Maximum sampler step count.
pub const MAX_STEPS: u32 = 150;

/// Maximum guidance scale.
pub const MAX_GUIDANCE_SCALE: f32 = 30.0;

// ---------------------------------------------------------------------------
// Seed policy
// ---------------------------------------------------------------------------

/// How the per-item seed is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SeedPolicy {
    /// A fresh random seed for every item.
    #[default]
    Random,
    /// Deterministic seeds: item `i` uses `base + i` (wrapping).
    Fixed { base: u64 },
}

/// Derive the seed for item `index` under `policy`.
///
/// Fixed policies wrap on overflow rather than saturate so that no two
/// indices within a batch collide.
pub fn item_seed<R: rand::Rng + ?Sized>(policy: SeedPolicy, index: u32, rng: &mut R) -> u64 {
    match policy {
        SeedPolicy::Random => rng.random(),
        SeedPolicy::Fixed { base } => base.wrapping_add(u64::from(index)),
    }
}

// ---------------------------------------------------------------------------
// Parameter template
// ---------------------------------------------------------------------------

/// The parameter template applied to every item in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub model: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
}

/// Validate a parameter template before a batch is created.
///
/// Returns `Ok(())` if valid, or a `CoreError::Validation` describing the
/// first issue found.
pub fn validate_params(params: &GenerationParams) -> Result<(), CoreError> {
    if params.prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".to_string()));
    }
    if params.prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "Prompt exceeds the maximum length of {MAX_PROMPT_LEN} characters"
        )));
    }
    if params.model.trim().is_empty() {
        return Err(CoreError::Validation("Model must not be empty".to_string()));
    }
    for (name, value) in [("width", params.width), ("height", params.height)] {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
            return Err(CoreError::Validation(format!(
                "{name} {value} is outside the allowed range {MIN_DIMENSION}-{MAX_DIMENSION}"
            )));
        }
    }
    if let Some(steps) = params.steps {
        if steps == 0 || steps > MAX_STEPS {
            return Err(CoreError::Validation(format!(
                "steps {steps} is outside the allowed range 1-{MAX_STEPS}"
            )));
        }
    }
    if let Some(scale) = params.guidance_scale {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_GUIDANCE_SCALE {
            return Err(CoreError::Validation(format!(
                "guidance_scale {scale} is outside the allowed range 0-{MAX_GUIDANCE_SCALE}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
