//! Weekly legal-threshold check for modulated contracts.
//!
//! Full-time contracts (35h and over) may not exceed 40h worked in a week.
//! Part-time contracts may not exceed 34h, and the hours worked beyond the
//! contract may not exceed a third of it. The 34h ceiling takes precedence.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Compliant,
    #[serde(rename = "OVER_34H")]
    Over34h,
    #[serde(rename = "OVER_40H")]
    Over40h,
    OverOneThird,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Compliant => "COMPLIANT",
            Verdict::Over34h => "OVER_34H",
            Verdict::Over40h => "OVER_40H",
            Verdict::OverOneThird => "OVER_ONE_THIRD",
        }
    }

    pub fn is_alert(self) -> bool {
        self != Verdict::Compliant
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    FullTime,
    PartTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Contracts at or above this many weekly hours are full-time.
    pub full_time_from: f64,
    pub full_time_ceiling: f64,
    pub part_time_ceiling: f64,
    /// Overage allowed is `contracted / overage_divisor`.
    pub overage_divisor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full_time_from: 35.0,
            full_time_ceiling: 40.0,
            part_time_ceiling: 34.0,
            overage_divisor: 3.0,
        }
    }
}

impl Thresholds {
    pub fn classify(&self, contracted: f64) -> ContractKind {
        if contracted >= self.full_time_from {
            ContractKind::FullTime
        } else {
            ContractKind::PartTime
        }
    }

    pub fn evaluate(&self, contracted: f64, worked: f64) -> Result<Verdict, ValidationError> {
        check("contracted", contracted)?;
        check("worked", worked)?;

        let verdict = match self.classify(contracted) {
            ContractKind::FullTime if worked > self.full_time_ceiling => Verdict::Over40h,
            ContractKind::FullTime => Verdict::Compliant,
            ContractKind::PartTime if worked > self.part_time_ceiling => Verdict::Over34h,
            // A zero contract has no one-third allowance to exceed.
            ContractKind::PartTime
                if contracted > 0.0 && worked - contracted > contracted / self.overage_divisor =>
            {
                Verdict::OverOneThird
            }
            ContractKind::PartTime => Verdict::Compliant,
        };
        Ok(verdict)
    }
}

fn check(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

/// Evaluates with the statutory thresholds.
pub fn evaluate(contracted: f64, worked: f64) -> Result<Verdict, ValidationError> {
    Thresholds::default().evaluate(contracted, worked)
}
