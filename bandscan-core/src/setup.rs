//! Setup classification: reduces the final-bar signals to one tag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SetupPolicy;
use crate::signals::FinalBar;

/// Single-letter setup classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetupTag {
    /// Re-breakout of the upper band after an earlier breakout.
    R,
    /// Close through a prior climax high on confirming volume.
    B,
    /// Squeeze breakout with volume and trend strength.
    A,
    /// Close crossing above the fast average with volume and trend strength.
    C,
    #[default]
    #[serde(rename = "-")]
    None,
}

impl SetupTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupTag::R => "R",
            SetupTag::B => "B",
            SetupTag::A => "A",
            SetupTag::C => "C",
            SetupTag::None => "-",
        }
    }

    /// One-line explanation for reports.
    pub fn describe(self) -> &'static str {
        match self {
            SetupTag::R => "re-breakout: closed above the upper band again within 60 bars of an earlier breakout",
            SetupTag::B => "climax breakout: cleared the high of a 5x-volume bar with volume confirmation",
            SetupTag::A => "squeeze breakout: upper-band break from a compressed band with volume and ADX strength",
            SetupTag::C => "MA20 reclaim: crossed back above the 20-day average with volume and ADX strength",
            SetupTag::None => "baseline: trend and liquidity filters only",
        }
    }

    /// Parse the persisted single-character form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "R" => Some(SetupTag::R),
            "B" => Some(SetupTag::B),
            "A" => Some(SetupTag::A),
            "C" => Some(SetupTag::C),
            "-" | "" => Some(SetupTag::None),
            _ => None,
        }
    }
}

impl fmt::Display for SetupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The inputs the classifier reads, split out so either policy is a pure
/// function of plain booleans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupInputs {
    pub rebreakout: bool,
    pub trigger_a: bool,
    pub trigger_b: bool,
    pub trigger_c: bool,
    pub door_knock: bool,
    pub squeeze: bool,
    pub memory_near: bool,
}

impl From<&FinalBar> for SetupInputs {
    fn from(fb: &FinalBar) -> Self {
        Self {
            rebreakout: fb.rebreakout,
            trigger_a: fb.trigger_a,
            trigger_b: fb.trigger_b,
            trigger_c: fb.trigger_c,
            door_knock: fb.door_knock,
            squeeze: fb.squeeze,
            memory_near: fb.memory_near,
        }
    }
}

pub fn classify(inputs: SetupInputs, policy: SetupPolicy) -> SetupTag {
    match policy {
        SetupPolicy::Priority => {
            if inputs.rebreakout {
                SetupTag::R
            } else if inputs.trigger_b {
                SetupTag::B
            } else if inputs.trigger_a {
                SetupTag::A
            } else if inputs.trigger_c {
                SetupTag::C
            } else {
                SetupTag::None
            }
        }
        SetupPolicy::ConditionCount => {
            let met = [inputs.door_knock, inputs.squeeze, inputs.memory_near]
                .iter()
                .filter(|&&c| c)
                .count();
            match met {
                3 => SetupTag::R,
                2 => SetupTag::A,
                1 => SetupTag::B,
                _ => SetupTag::None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order() {
        let all = SetupInputs {
            rebreakout: true,
            trigger_a: true,
            trigger_b: true,
            trigger_c: true,
            ..Default::default()
        };
        assert_eq!(classify(all, SetupPolicy::Priority), SetupTag::R);

        let b_and_a = SetupInputs {
            trigger_a: true,
            trigger_b: true,
            ..Default::default()
        };
        assert_eq!(classify(b_and_a, SetupPolicy::Priority), SetupTag::B);

        let a_and_c = SetupInputs {
            trigger_a: true,
            trigger_c: true,
            ..Default::default()
        };
        assert_eq!(classify(a_and_c, SetupPolicy::Priority), SetupTag::A);

        let c_only = SetupInputs {
            trigger_c: true,
            ..Default::default()
        };
        assert_eq!(classify(c_only, SetupPolicy::Priority), SetupTag::C);
        assert_eq!(classify(SetupInputs::default(), SetupPolicy::Priority), SetupTag::None);
    }

    #[test]
    fn priority_ignores_location_flags() {
        let inputs = SetupInputs {
            door_knock: true,
            squeeze: true,
            memory_near: true,
            ..Default::default()
        };
        assert_eq!(classify(inputs, SetupPolicy::Priority), SetupTag::None);
    }

    #[test]
    fn condition_count() {
        let mut inputs = SetupInputs {
            rebreakout: true,
            ..Default::default()
        };
        assert_eq!(classify(inputs, SetupPolicy::ConditionCount), SetupTag::None);
        inputs.door_knock = true;
        assert_eq!(classify(inputs, SetupPolicy::ConditionCount), SetupTag::B);
        inputs.squeeze = true;
        assert_eq!(classify(inputs, SetupPolicy::ConditionCount), SetupTag::A);
        inputs.memory_near = true;
        assert_eq!(classify(inputs, SetupPolicy::ConditionCount), SetupTag::R);
    }

    #[test]
    fn display_and_parse() {
        for tag in [SetupTag::R, SetupTag::B, SetupTag::A, SetupTag::C, SetupTag::None] {
            assert_eq!(SetupTag::parse(&tag.to_string()), Some(tag));
            assert!(!tag.describe().is_empty());
        }
        assert_eq!(SetupTag::None.to_string(), "-");
        assert_eq!(SetupTag::parse("X"), None);
    }

    #[test]
    fn serde_uses_letters() {
        assert_eq!(serde_json::to_string(&SetupTag::None).unwrap(), "\"-\"");
        assert_eq!(serde_json::to_string(&SetupTag::B).unwrap(), "\"B\"");
    }
}
