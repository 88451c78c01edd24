//! The closed set of sampler/scheduler identities accepted by the
//! inference engine.
//!
//! Serde names are the engine's wire values. Keeping this a closed enum
//! (rather than a free-form string) means an unrecognised scheduler is a
//! deserialization error instead of a silently-propagated typo.

use serde::{Deserialize, Serialize};

/// Sampler/scheduler used by the denoise stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduler {
    #[serde(rename = "ddim")]
    Ddim,
    #[serde(rename = "ddpm")]
    Ddpm,
    #[serde(rename = "deis")]
    Deis,
    #[serde(rename = "lms")]
    Lms,
    #[serde(rename = "pndm")]
    Pndm,
    #[serde(rename = "heun")]
    Heun,
    #[serde(rename = "heun_k")]
    HeunKarras,
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "euler_k")]
    EulerKarras,
    #[serde(rename = "euler_a")]
    EulerAncestral,
    #[serde(rename = "kdpm_2")]
    KDpm2,
    #[serde(rename = "kdpm_2_a")]
    KDpm2Ancestral,
    #[serde(rename = "dpmpp_2s")]
    DpmppSingleStep,
    #[serde(rename = "dpmpp_2m")]
    Dpmpp2m,
    #[serde(rename = "dpmpp_2m_k")]
    Dpmpp2mKarras,
    #[serde(rename = "dpmpp_2m_sde")]
    Dpmpp2mSde,
    #[serde(rename = "dpmpp_sde")]
    DpmppSde,
    #[serde(rename = "dpmpp_sde_k")]
    DpmppSdeKarras,
    #[serde(rename = "unipc")]
    UniPc,
    #[serde(rename = "lcm")]
    Lcm,
}

impl Scheduler {
    /// The engine wire name for this scheduler.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheduler::Ddim => "ddim",
            Scheduler::Ddpm => "ddpm",
            Scheduler::Deis => "deis",
            Scheduler::Lms => "lms",
            Scheduler::Pndm => "pndm",
            Scheduler::Heun => "heun",
            Scheduler::HeunKarras => "heun_k",
            Scheduler::Euler => "euler",
            Scheduler::EulerKarras => "euler_k",
            Scheduler::EulerAncestral => "euler_a",
            Scheduler::KDpm2 => "kdpm_2",
            Scheduler::KDpm2Ancestral => "kdpm_2_a",
            Scheduler::DpmppSingleStep => "dpmpp_2s",
            Scheduler::Dpmpp2m => "dpmpp_2m",
            Scheduler::Dpmpp2mKarras => "dpmpp_2m_k",
            Scheduler::Dpmpp2mSde => "dpmpp_2m_sde",
            Scheduler::DpmppSde => "dpmpp_sde",
            Scheduler::DpmppSdeKarras => "dpmpp_sde_k",
            Scheduler::UniPc => "unipc",
            Scheduler::Lcm => "lcm",
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::Euler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheduler_is_euler() {
        assert_eq!(Scheduler::default(), Scheduler::Euler);
    }

    #[test]
    fn serde_name_matches_as_str() {
        for scheduler in [
            Scheduler::Ddim,
            Scheduler::EulerAncestral,
            Scheduler::Dpmpp2mKarras,
            Scheduler::UniPc,
            Scheduler::Lcm,
        ] {
            let json = serde_json::to_string(&scheduler).unwrap();
            assert_eq!(json, format!("\"{}\"", scheduler.as_str()));
        }
    }

    #[test]
    fn unknown_scheduler_rejected() {
        let result: Result<Scheduler, _> = serde_json::from_str(r#""warp_drive""#);
        assert!(result.is_err());
    }
}
