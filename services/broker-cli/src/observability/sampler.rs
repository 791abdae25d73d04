//! Trace sampler selection from `OTEL_TRACES_SAMPLER`

use opentelemetry_sdk::trace::Sampler;

/// Ratio used when `OTEL_TRACES_SAMPLER_ARG` is absent
pub const DEFAULT_RATIO: f64 = 1.0;

/// Supported samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    /// Sample everything
    AlwaysOn,
    /// Sample nothing
    AlwaysOff,
    /// Sample a fraction of trace ids
    TraceIdRatio,
    /// Follow the parent, sample roots
    ParentBasedAlwaysOn,
    /// Follow the parent, drop roots
    ParentBasedAlwaysOff,
    /// Follow the parent, ratio-sample roots
    ParentBasedTraceIdRatio,
}

impl SamplerKind {
    /// Looks up a sampler by name or alias
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "always" | "always_on" => Some(Self::AlwaysOn),
            "never" | "always_off" => Some(Self::AlwaysOff),
            "ratio" | "traceidratio" => Some(Self::TraceIdRatio),
            "parentbased_always_on" => Some(Self::ParentBasedAlwaysOn),
            "parentbased_always_off" => Some(Self::ParentBasedAlwaysOff),
            "parentbased_traceidratio" => Some(Self::ParentBasedTraceIdRatio),
            _ => None,
        }
    }

    /// Canonical name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysOn => "always_on",
            Self::AlwaysOff => "always_off",
            Self::TraceIdRatio => "traceidratio",
            Self::ParentBasedAlwaysOn => "parentbased_always_on",
            Self::ParentBasedAlwaysOff => "parentbased_always_off",
            Self::ParentBasedTraceIdRatio => "parentbased_traceidratio",
        }
    }

    /// Whether the sampler reads `OTEL_TRACES_SAMPLER_ARG`
    #[must_use]
    pub const fn uses_ratio(self) -> bool {
        matches!(self, Self::TraceIdRatio | Self::ParentBasedTraceIdRatio)
    }

    /// Builds the SDK sampler
    #[must_use]
    pub fn build(self, ratio: f64) -> Sampler {
        match self {
            Self::AlwaysOn => Sampler::AlwaysOn,
            Self::AlwaysOff => Sampler::AlwaysOff,
            Self::TraceIdRatio => Sampler::TraceIdRatioBased(ratio),
            Self::ParentBasedAlwaysOn => Sampler::ParentBased(Box::new(Sampler::AlwaysOn)),
            Self::ParentBasedAlwaysOff => Sampler::ParentBased(Box::new(Sampler::AlwaysOff)),
            Self::ParentBasedTraceIdRatio => {
                Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio)))
            }
        }
    }
}

/// Parses `OTEL_TRACES_SAMPLER_ARG`, clamped to `[0, 1]`
///
/// # Errors
///
/// Returns the raw value when it is not a number.
pub fn parse_ratio(arg: Option<&str>) -> Result<f64, String> {
    let Some(raw) = arg.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_RATIO);
    };

    match raw.parse::<f64>() {
        Ok(ratio) if !ratio.is_nan() => Ok(ratio.clamp(0.0, 1.0)),
        _ => Err(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(SamplerKind::parse("always"), Some(SamplerKind::AlwaysOn));
        assert_eq!(SamplerKind::parse("never"), Some(SamplerKind::AlwaysOff));
        assert_eq!(SamplerKind::parse("ratio"), Some(SamplerKind::TraceIdRatio));
        assert_eq!(
            SamplerKind::parse("parentbased_traceidratio"),
            Some(SamplerKind::ParentBasedTraceIdRatio)
        );
        assert_eq!(SamplerKind::parse("sometimes"), None);
    }

    #[test]
    fn test_ratio_defaults_and_clamps() {
        assert_eq!(parse_ratio(None), Ok(1.0));
        assert_eq!(parse_ratio(Some("  ")), Ok(1.0));
        assert_eq!(parse_ratio(Some("0.25")), Ok(0.25));
        assert_eq!(parse_ratio(Some("7")), Ok(1.0));
        assert_eq!(parse_ratio(Some("-1")), Ok(0.0));
        assert_eq!(parse_ratio(Some("half")), Err("half".to_string()));
        assert_eq!(parse_ratio(Some("NaN")), Err("NaN".to_string()));
    }

    #[test]
    fn test_build_ratio_samplers() {
        assert!(matches!(
            SamplerKind::TraceIdRatio.build(0.5),
            Sampler::TraceIdRatioBased(r) if (r - 0.5).abs() < f64::EPSILON
        ));
        assert!(matches!(
            SamplerKind::ParentBasedAlwaysOff.build(1.0),
            Sampler::ParentBased(_)
        ));
        assert!(SamplerKind::ParentBasedTraceIdRatio.uses_ratio());
        assert!(!SamplerKind::AlwaysOn.uses_ratio());
    }
}
