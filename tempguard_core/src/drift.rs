//! Drift detection: is the effective temperature target one we accept?

use crate::config::Targets;

/// Outcome of comparing one observation to the accepted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Correct,
    Incorrect,
}

impl Classification {
    #[inline]
    pub fn is_correct(self) -> bool {
        matches!(self, Classification::Correct)
    }
}

/// `Correct` iff `observation` is `desired_max_temp` or
/// `desired_max_temp + battery_delta`. A missing observation is `Incorrect`.
#[inline]
pub fn classify(observation: Option<i32>, desired_max_temp: i32, battery_delta: i32) -> Classification {
    match observation {
        Some(v) if v == desired_max_temp || v == desired_max_temp.saturating_add(battery_delta) => {
            Classification::Correct
        }
        _ => Classification::Incorrect,
    }
}

impl Targets {
    #[inline]
    pub fn classify(&self, observation: Option<i32>) -> Classification {
        classify(observation, self.desired_max_temp, self.battery_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(98), Classification::Correct)]
    #[case(Some(93), Classification::Correct)]
    #[case(Some(80), Classification::Incorrect)]
    #[case(Some(100), Classification::Incorrect)]
    #[case(None, Classification::Incorrect)]
    fn classifies_against_ac_and_battery_targets(
        #[case] obs: Option<i32>,
        #[case] want: Classification,
    ) {
        assert_eq!(classify(obs, 98, -5), want);
        assert_eq!(Targets::new(98, -5).classify(obs), want);
    }

    #[test]
    fn zero_delta_accepts_single_value() {
        assert!(classify(Some(97), 97, 0).is_correct());
        assert!(!classify(Some(96), 97, 0).is_correct());
    }
}
