/*!
 * Sampling presets attached to prompt categories.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::providers::GenerationOptions;

/// Sampling parameters, without the context window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Repetition penalty window, -1 for the whole context
    pub repeat_last_n: i32,
}

impl SamplingOptions {
    /// Balanced settings
    pub const DEFAULT: SamplingOptions = SamplingOptions {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.9,
        repeat_last_n: 64,
    };

    /// Low-variance settings for translation and structured output
    pub const STRICT: SamplingOptions = SamplingOptions {
        temperature: 0.3,
        top_k: 15,
        top_p: 0.3,
        repeat_last_n: -1,
    };

    /// Middle ground used by reviewers
    pub const LENIENT: SamplingOptions = SamplingOptions {
        temperature: 0.5,
        top_k: 25,
        top_p: 0.5,
        repeat_last_n: -1,
    };

    /// Loose settings for open-ended judgement
    pub const CREATIVE: SamplingOptions = SamplingOptions {
        temperature: 0.9,
        top_k: 50,
        top_p: 0.9,
        repeat_last_n: -1,
    };

    /// Combine with a context window into provider options
    pub fn with_context_window(&self, num_ctx: u32) -> GenerationOptions {
        GenerationOptions {
            num_ctx,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            repeat_last_n: self.repeat_last_n,
        }
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-category sampling overrides, keyed by prompt category name
/// (`article_worker`, `summary_critic`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplingOverrides(HashMap<String, SamplingOptions>);

impl SamplingOverrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the options of one category
    pub fn set(&mut self, category: impl Into<String>, options: SamplingOptions) {
        self.0.insert(category.into(), options);
    }

    /// Builder form of [`SamplingOverrides::set`]
    pub fn with(mut self, category: impl Into<String>, options: SamplingOptions) -> Self {
        self.set(category, options);
        self
    }

    /// Override for a category, if any
    pub fn get(&self, category: &str) -> Option<&SamplingOptions> {
        self.0.get(category)
    }

    /// Category names that have overrides
    pub fn categories(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Whether there are no overrides
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
