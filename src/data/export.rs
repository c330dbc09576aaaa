use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::chart::Chart;
use crate::error::AnalysisError;

/// One plotted point as a CSV row.
#[derive(Debug, Serialize)]
struct Row<'a> {
    channel: &'a str,
    x: f64,
    value: f64,
    uncertainty: f64,
}

/// Write every series of `chart` as `channel,x,value,uncertainty` rows.
pub fn write_series<W: Write>(chart: &Chart, out: W) -> Result<(), AnalysisError> {
    let mut writer = csv::Writer::from_writer(out);
    for series in &chart.series {
        for (p, e) in series.points.iter().zip(&series.errors) {
            writer.serialize(Row {
                channel: &series.channel,
                x: p[0],
                value: p[1],
                uncertainty: *e,
            })?;
        }
    }
    writer
        .flush()
        .map_err(|e| AnalysisError::Export(e.to_string()))?;
    Ok(())
}

/// Export `chart` next to its image name, as `<dir>/<stem>.csv`.
pub fn export_chart(chart: &Chart, dir: &Path) -> Result<PathBuf, AnalysisError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AnalysisError::Export(format!("creating {}: {e}", dir.display())))?;
    let path = dir.join(Path::new(&chart.file_name).with_extension("csv"));
    let file = std::fs::File::create(&path)
        .map_err(|e| AnalysisError::Export(format!("creating {}: {e}", path.display())))?;
    write_series(chart, file)?;
    log::info!("Exported {}", path.display());
    Ok(path)
}
