use std::f64::consts::LN_10;

use super::measurement::{ChannelReadings, ReferencePower, SplitterArm};
use crate::error::{AnalysisError, DomainViolation};

/// Converts a relative power uncertainty into decibels: `10 / ln 10`.
pub const DB_PER_RELATIVE_UNIT: f64 = 10.0 / LN_10;

/// Quantity plotted on the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    DecibelLoss,
    DetectedPower,
}

/// Computed values of one channel with their absolute uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub channel: String,
    pub values: Vec<f64>,
    pub uncertainties: Vec<f64>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scalar kernels
// ---------------------------------------------------------------------------

fn finite(v: f64) -> Result<f64, DomainViolation> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DomainViolation::NonFinite)
    }
}

fn positive(v: f64) -> Result<f64, DomainViolation> {
    if finite(v)? > 0.0 {
        Ok(v)
    } else {
        Err(DomainViolation::NonPositivePower)
    }
}

fn non_negative(v: f64) -> Result<f64, DomainViolation> {
    if finite(v)? >= 0.0 {
        Ok(v)
    } else {
        Err(DomainViolation::NegativeUncertainty)
    }
}

/// `10 * log10(p / p_ref)`.
pub fn decibel_loss(p: f64, p_ref: f64) -> Result<f64, DomainViolation> {
    Ok(10.0 * (positive(p)? / positive(p_ref)?).log10())
}

/// First-order uncertainty of [`decibel_loss`]:
/// `(10 / ln 10) * sqrt((σp / p)² + (σref / p_ref)²)`.
pub fn decibel_loss_uncertainty(
    p: f64,
    sigma_p: f64,
    p_ref: f64,
    sigma_ref: f64,
) -> Result<f64, DomainViolation> {
    let rel_p = non_negative(sigma_p)? / positive(p)?;
    let rel_ref = non_negative(sigma_ref)? / positive(p_ref)?;
    Ok(DB_PER_RELATIVE_UNIT * rel_p.hypot(rel_ref))
}

/// `a / b`.
pub fn power_ratio(a: f64, b: f64) -> Result<f64, DomainViolation> {
    let a = finite(a)?;
    if finite(b)? == 0.0 {
        return Err(DomainViolation::ZeroDenominator);
    }
    Ok(a / b)
}

/// Quadrature uncertainty of [`power_ratio`],
/// `|a/b| * sqrt((σa / a)² + (σb / b)²)`.
///
/// Evaluated as `sqrt((σa / b)² + (a σb / b²)²)`, which is the same value and
/// stays defined when `a == 0`.
pub fn power_ratio_uncertainty(
    a: f64,
    sigma_a: f64,
    b: f64,
    sigma_b: f64,
) -> Result<f64, DomainViolation> {
    let a = finite(a)?;
    let (sigma_a, sigma_b) = (non_negative(sigma_a)?, non_negative(sigma_b)?);
    if finite(b)? == 0.0 {
        return Err(DomainViolation::ZeroDenominator);
    }
    Ok((sigma_a / b).hypot(a * sigma_b / (b * b)))
}

// ---------------------------------------------------------------------------
// Channel-level derivation
// ---------------------------------------------------------------------------

fn at(channel: &str, index: usize, value: f64) -> impl FnOnce(DomainViolation) -> AnalysisError + '_ {
    move |reason| AnalysisError::Domain {
        channel: channel.to_string(),
        index,
        value,
        reason,
    }
}

/// Decibel loss of every reading against the reference power.
/// The first bad reading fails the whole channel.
pub fn derive_loss(
    readings: &ChannelReadings,
    reference: &ReferencePower,
) -> Result<DerivedSeries, AnalysisError> {
    let mut values = Vec::with_capacity(readings.detector.len());
    let mut uncertainties = Vec::with_capacity(readings.detector.len());

    for (i, (&p, &sigma)) in readings
        .detector
        .iter()
        .zip(&readings.uncertainty)
        .enumerate()
    {
        let sigma = non_negative(sigma).map_err(at(&readings.id, i, sigma))?;
        values.push(decibel_loss(p, reference.value).map_err(at(&readings.id, i, p))?);
        uncertainties.push(
            decibel_loss_uncertainty(p, sigma, reference.value, reference.uncertainty)
                .map_err(at(&readings.id, i, p))?,
        );
    }

    Ok(DerivedSeries {
        channel: readings.id.clone(),
        values,
        uncertainties,
    })
}

/// Detected power as measured, with its own uncertainty.
pub fn derive_power(readings: &ChannelReadings) -> Result<DerivedSeries, AnalysisError> {
    for (i, &p) in readings.detector.iter().enumerate() {
        finite(p).map_err(at(&readings.id, i, p))?;
    }
    Ok(DerivedSeries {
        channel: readings.id.clone(),
        values: readings.detector.clone(),
        uncertainties: readings.uncertainty.clone(),
    })
}

/// FV/FB output ratio of one beam-splitter arm.
pub fn derive_ratio(arm: &SplitterArm) -> Result<DerivedSeries, AnalysisError> {
    let mut values = Vec::with_capacity(arm.fv.len());
    let mut uncertainties = Vec::with_capacity(arm.fv.len());

    for i in 0..arm.fv.len() {
        // Errors carry the operand that failed.
        let a = finite(arm.fv[i]).map_err(at(&arm.id, i, arm.fv[i]))?;
        let b = finite(arm.fb[i]).map_err(at(&arm.id, i, arm.fb[i]))?;
        let sigma_a = non_negative(arm.fv_uncertainty[i])
            .map_err(at(&arm.id, i, arm.fv_uncertainty[i]))?;
        let sigma_b = non_negative(arm.fb_uncertainty[i])
            .map_err(at(&arm.id, i, arm.fb_uncertainty[i]))?;

        values.push(power_ratio(a, b).map_err(at(&arm.id, i, b))?);
        uncertainties.push(
            power_ratio_uncertainty(a, sigma_a, b, sigma_b).map_err(at(&arm.id, i, b))?,
        );
    }

    Ok(DerivedSeries {
        channel: arm.id.clone(),
        values,
        uncertainties,
    })
}
