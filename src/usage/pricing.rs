//! Model pricing table
//!
//! Cost estimation for recorded usage. Rates are dollars per million
//! tokens; models missing from the table fall back to a flat rate.

/// Pricing for one model family
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// Model name prefix this entry covers
    pub prefix: &'static str,
    /// Input cost per million tokens
    pub input_per_million: f64,
    /// Output cost per million tokens
    pub output_per_million: f64,
}

/// Flat fallback rate per million tokens, both directions
pub const DEFAULT_RATE_PER_MILLION: f64 = 2000.0;

// First prefix match wins, so specific entries sit above general ones
const PRICING_TABLE: &[ModelPricing] = &[
    ModelPricing {
        prefix: "gpt-4o-mini",
        input_per_million: 0.15,
        output_per_million: 0.60,
    },
    ModelPricing {
        prefix: "gpt-4o",
        input_per_million: 2.50,
        output_per_million: 10.00,
    },
    ModelPricing {
        prefix: "gpt-4-turbo",
        input_per_million: 10.00,
        output_per_million: 30.00,
    },
    ModelPricing {
        prefix: "gpt-4",
        input_per_million: 30.00,
        output_per_million: 60.00,
    },
    ModelPricing {
        prefix: "gpt-3.5-turbo",
        input_per_million: 0.50,
        output_per_million: 1.50,
    },
    ModelPricing {
        prefix: "claude-3-5-sonnet",
        input_per_million: 3.00,
        output_per_million: 15.00,
    },
    ModelPricing {
        prefix: "claude-3-5-haiku",
        input_per_million: 0.80,
        output_per_million: 4.00,
    },
    ModelPricing {
        prefix: "claude-3-opus",
        input_per_million: 15.00,
        output_per_million: 75.00,
    },
    ModelPricing {
        prefix: "claude-3-haiku",
        input_per_million: 0.25,
        output_per_million: 1.25,
    },
    ModelPricing {
        prefix: "gemini-1.5-pro",
        input_per_million: 1.25,
        output_per_million: 5.00,
    },
    ModelPricing {
        prefix: "gemini-1.5-flash",
        input_per_million: 0.075,
        output_per_million: 0.30,
    },
];

/// Find the pricing entry for a model
pub fn find_pricing(model: &str) -> Option<&'static ModelPricing> {
    PRICING_TABLE
        .iter()
        .find(|pricing| model.starts_with(pricing.prefix))
}

/// Estimate the cost of a request in dollars
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    match find_pricing(model) {
        Some(pricing) => {
            (input_tokens as f64 / 1_000_000.0) * pricing.input_per_million
                + (output_tokens as f64 / 1_000_000.0) * pricing.output_per_million
        }
        None => {
            ((input_tokens + output_tokens) as f64 / 1_000_000.0) * DEFAULT_RATE_PER_MILLION
        }
    }
}
