//! Validation helpers for generation parameters.
//!
//! The graph assembler calls these before constructing a graph so that
//! an out-of-range snapshot fails fast instead of producing a request
//! the engine will reject.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Smallest allowed output dimension (pixels).
pub const MIN_DIMENSION: u32 = 64;

/// Largest allowed output dimension (pixels).
pub const MAX_DIMENSION: u32 = 4096;

/// Output dimensions must be a multiple of this (latent-space granularity).
pub const DIMENSION_MULTIPLE: u32 = 8;

/// Minimum denoise step count.
pub const MIN_STEPS: u32 = 1;

/// Maximum denoise step count.
pub const MAX_STEPS: u32 = 500;

/// Minimum guidance scale.
pub const MIN_CFG_SCALE: f64 = 1.0;

/// Maximum guidance scale.
pub const MAX_CFG_SCALE: f64 = 200.0;

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate one output dimension: within bounds and a multiple of
/// [`DIMENSION_MULTIPLE`]. `label` names the dimension in the error.
pub fn validate_dimension(label: &str, value: u32) -> Result<(), CoreError> {
    if value < MIN_DIMENSION || value > MAX_DIMENSION {
        return Err(CoreError::Validation(format!(
            "{label} must be between {MIN_DIMENSION} and {MAX_DIMENSION}, got {value}"
        )));
    }
    if value % DIMENSION_MULTIPLE != 0 {
        return Err(CoreError::Validation(format!(
            "{label} must be a multiple of {DIMENSION_MULTIPLE}, got {value}"
        )));
    }
    Ok(())
}

/// Validate the denoise step count.
pub fn validate_steps(steps: u32) -> Result<(), CoreError> {
    if steps < MIN_STEPS || steps > MAX_STEPS {
        return Err(CoreError::Validation(format!(
            "steps must be between {MIN_STEPS} and {MAX_STEPS}, got {steps}"
        )));
    }
    Ok(())
}

/// Validate the guidance scale.
pub fn validate_cfg_scale(cfg_scale: f64) -> Result<(), CoreError> {
    if !(MIN_CFG_SCALE..=MAX_CFG_SCALE).contains(&cfg_scale) {
        return Err(CoreError::Validation(format!(
            "cfg_scale must be between {MIN_CFG_SCALE} and {MAX_CFG_SCALE}, got {cfg_scale}"
        )));
    }
    Ok(())
}

/// Validate a denoising strength (high-res fix second pass).
pub fn validate_denoising_strength(strength: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&strength) {
        return Err(CoreError::Validation(format!(
            "denoising strength must be between 0 and 1, got {strength}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::error::CoreError;

    // -- Dimensions --

    #[test]
    fn dimension_within_bounds_accepted() {
        assert!(validate_dimension("width", 512).is_ok());
        assert!(validate_dimension("height", MIN_DIMENSION).is_ok());
        assert!(validate_dimension("width", MAX_DIMENSION).is_ok());
    }

    #[test]
    fn dimension_out_of_bounds_rejected() {
        assert_matches!(
            validate_dimension("width", 32),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_dimension("height", 8192),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn dimension_not_multiple_of_eight_rejected() {
        let err = validate_dimension("width", 500).unwrap_err();
        assert!(err.to_string().contains("multiple of 8"));
    }

    // -- Steps --

    #[test]
    fn steps_within_bounds_accepted() {
        assert!(validate_steps(1).is_ok());
        assert!(validate_steps(20).is_ok());
        assert!(validate_steps(MAX_STEPS).is_ok());
    }

    #[test]
    fn steps_out_of_bounds_rejected() {
        assert!(validate_steps(0).is_err());
        assert!(validate_steps(MAX_STEPS + 1).is_err());
    }

    // -- Guidance scale --

    #[test]
    fn cfg_scale_within_bounds_accepted() {
        assert!(validate_cfg_scale(1.0).is_ok());
        assert!(validate_cfg_scale(7.5).is_ok());
        assert!(validate_cfg_scale(MAX_CFG_SCALE).is_ok());
    }

    #[test]
    fn cfg_scale_out_of_bounds_rejected() {
        assert!(validate_cfg_scale(0.5).is_err());
        assert!(validate_cfg_scale(201.0).is_err());
    }

    // -- Denoising strength --

    #[test]
    fn denoising_strength_bounds() {
        assert!(validate_denoising_strength(0.0).is_ok());
        assert!(validate_denoising_strength(0.45).is_ok());
        assert!(validate_denoising_strength(1.0).is_ok());
        assert!(validate_denoising_strength(-0.1).is_err());
        assert!(validate_denoising_strength(1.1).is_err());
    }
}
