use super::model::{Table, Workbook};
use crate::config::RunConfig;
use crate::error::{AnalysisError, DomainViolation};

// Sheet column headers as written on the bench workbooks.
pub const LASER_POWER_UW: &str = "POTÊNCIA LASER [µW]";
pub const DETECTOR_POWER_UW: &str = "POTÊNCIA DETECTOR [µW]";
pub const UNCERTAINTY_UW: &str = "INCERTEZA [µW]";

pub const SPLITTER_LASER_MW: &str = "POTÊNCIA DO LASER [mW]";
pub const SPLITTER_FV_UW: &str = "POTÊNCIA DETECTOR - FV [µW]";
pub const SPLITTER_FB_UW: &str = "POTÊNCIA DETECTOR - FB [µW]";
pub const SPLITTER_FV_SIGMA_UW: &str = "INCERTEZA - FV [µW]";
pub const SPLITTER_FB_SIGMA_UW: &str = "INCERTEZA - FB [µW]";

const MICROWATTS_PER_MILLIWATT: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Attenuators
// ---------------------------------------------------------------------------

/// Initial laser power every loss is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePower {
    /// [µW]
    pub value: f64,
    /// [µW]
    pub uncertainty: f64,
}

/// Detector readings of one active channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReadings {
    pub id: String,
    /// Index in the configured channel list; selects plot styling.
    pub position: usize,
    /// [µW]
    pub detector: Vec<f64>,
    /// Absolute uncertainty of each reading [µW].
    pub uncertainty: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttenuatorMeasurement {
    pub reference: ReferencePower,
    pub channels: Vec<ChannelReadings>,
}

impl AttenuatorMeasurement {
    /// Build the model for all active channels present in `workbook`.
    ///
    /// Every series must have `axis_len` points. Active channels whose sheet
    /// was skipped by the loader are left out.
    pub fn from_workbook(
        workbook: &Workbook,
        config: &RunConfig,
        axis_len: usize,
    ) -> Result<Self, AnalysisError> {
        let reference = reference_power(workbook, config)?;

        let mut channels = Vec::new();
        for (position, descriptor) in config.active_channels() {
            let Some(table) = workbook.sheet(&descriptor.id) else {
                continue;
            };
            let detector = table.numeric(DETECTOR_POWER_UW)?;
            let uncertainty = table.numeric(UNCERTAINTY_UW)?;

            expect_len(&descriptor.id, "detector series", axis_len, detector.len())?;
            expect_len(&descriptor.id, "uncertainty series", axis_len, uncertainty.len())?;
            check_uncertainties(&descriptor.id, &uncertainty)?;

            channels.push(ChannelReadings {
                id: descriptor.id.clone(),
                position,
                detector,
                uncertainty,
            });
        }

        Ok(Self {
            reference,
            channels,
        })
    }
}

/// First laser-power row of the reference channel's sheet.
fn reference_power(workbook: &Workbook, config: &RunConfig) -> Result<ReferencePower, AnalysisError> {
    let id = config.reference_channel()?;
    let table = workbook.sheet(id).ok_or_else(|| AnalysisError::SheetMissing {
        sheet: id.to_string(),
    })?;
    let laser = table.numeric(LASER_POWER_UW)?;
    let value = *laser.first().ok_or_else(|| AnalysisError::ShapeMismatch {
        channel: id.to_string(),
        what: "laser power column".into(),
        expected: 1,
        actual: 0,
    })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(AnalysisError::Domain {
            channel: id.to_string(),
            index: 0,
            value,
            reason: DomainViolation::NonPositivePower,
        });
    }

    Ok(ReferencePower {
        value,
        uncertainty: config.reference_uncertainty,
    })
}

// ---------------------------------------------------------------------------
// Beam-splitter
// ---------------------------------------------------------------------------

/// Readings of one beam-splitter arm, detector powers already in mW.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitterArm {
    pub id: String,
    pub position: usize,
    /// [mW]
    pub laser: Vec<f64>,
    /// Red-fibre output [mW].
    pub fv: Vec<f64>,
    /// White-fibre output [mW].
    pub fb: Vec<f64>,
    pub fv_uncertainty: Vec<f64>,
    pub fb_uncertainty: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitterMeasurement {
    pub arms: Vec<SplitterArm>,
}

impl SplitterMeasurement {
    pub fn from_workbook(workbook: &Workbook, config: &RunConfig) -> Result<Self, AnalysisError> {
        let mut arms = Vec::new();
        for (position, descriptor) in config.active_channels() {
            let Some(table) = workbook.sheet(&descriptor.id) else {
                continue;
            };
            arms.push(read_arm(table, &descriptor.id, position)?);
        }
        Ok(Self { arms })
    }
}

fn read_arm(table: &Table, id: &str, position: usize) -> Result<SplitterArm, AnalysisError> {
    let laser = table.numeric(SPLITTER_LASER_MW)?;
    let to_mw = |column: &str| -> Result<Vec<f64>, AnalysisError> {
        let values = table.numeric(column)?;
        expect_len(id, column, laser.len(), values.len())?;
        Ok(values.into_iter().map(|v| v / MICROWATTS_PER_MILLIWATT).collect())
    };

    let fv = to_mw(SPLITTER_FV_UW)?;
    let fb = to_mw(SPLITTER_FB_UW)?;
    let fv_uncertainty = to_mw(SPLITTER_FV_SIGMA_UW)?;
    let fb_uncertainty = to_mw(SPLITTER_FB_SIGMA_UW)?;
    check_uncertainties(id, &fv_uncertainty)?;
    check_uncertainties(id, &fb_uncertainty)?;

    Ok(SplitterArm {
        id: id.to_string(),
        position,
        laser,
        fv,
        fb,
        fv_uncertainty,
        fb_uncertainty,
    })
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

fn expect_len(channel: &str, what: &str, expected: usize, actual: usize) -> Result<(), AnalysisError> {
    if expected != actual {
        return Err(AnalysisError::ShapeMismatch {
            channel: channel.to_string(),
            what: what.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_uncertainties(channel: &str, values: &[f64]) -> Result<(), AnalysisError> {
    match values.iter().position(|v| !(*v >= 0.0)) {
        Some(index) => Err(AnalysisError::Domain {
            channel: channel.to_string(),
            index,
            value: values[index],
            reason: DomainViolation::NegativeUncertainty,
        }),
        None => Ok(()),
    }
}
