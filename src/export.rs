// src/export.rs

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs, fs::File, path::Path, sync::Arc};
use tracing::info;

use crate::series::VintageSeries;

fn series_schema() -> Schema {
    Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("value", DataType::Float64, true),
        Field::new("qoq_saar", DataType::Float64, true),
        Field::new("yoy", DataType::Float64, true),
        Field::new("zscore", DataType::Float64, true),
    ])
}

fn days_since_epoch(d: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    d.signed_duration_since(epoch).num_days() as i32
}

/// Columnar view of a series: `date` (Date32) plus nullable Float64 columns.
pub fn series_to_record_batch(series: &VintageSeries) -> Result<RecordBatch> {
    let obs = &series.observations;
    let date = Date32Array::from_iter_values(obs.iter().map(|o| days_since_epoch(o.date)));
    let value = Float64Array::from(obs.iter().map(|o| o.value).collect::<Vec<_>>());
    let qoq = Float64Array::from(obs.iter().map(|o| o.qoq_saar).collect::<Vec<_>>());
    let yoy = Float64Array::from(obs.iter().map(|o| o.yoy).collect::<Vec<_>>());
    let z = Float64Array::from(obs.iter().map(|o| o.zscore).collect::<Vec<_>>());

    let cols: Vec<ArrayRef> = vec![
        Arc::new(date),
        Arc::new(value),
        Arc::new(qoq),
        Arc::new(yoy),
        Arc::new(z),
    ];
    RecordBatch::try_new(Arc::new(series_schema()), cols).context("building series record batch")
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }
    Ok(())
}

/// Write the series as a single SNAPPY-compressed Parquet file.
pub fn write_parquet(series: &VintageSeries, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let batch = series_to_record_batch(series)?;
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for series")?;
    writer.write(&batch).context("writing series batch")?;
    writer.close().context("closing series writer")?;

    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

/// Write the observations and issues as pretty-printed JSON.
pub fn write_json(series: &VintageSeries, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    serde_json::to_writer_pretty(file, series)
        .with_context(|| format!("serializing series to {:?}", path))?;

    info!(path = %path.display(), rows = series.len(), "wrote json");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Observation, SeriesConfig};
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn sample() -> VintageSeries {
        let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day).unwrap();
        VintageSeries {
            config: SeriesConfig::default(),
            observations: vec![
                Observation {
                    date: d(3, 31),
                    value: Some(100.0),
                    qoq_saar: None,
                    yoy: None,
                    zscore: None,
                },
                Observation {
                    date: d(6, 30),
                    value: Some(101.0),
                    qoq_saar: Some(4.06),
                    yoy: None,
                    zscore: None,
                },
            ],
            issues: vec![],
        }
    }

    #[test]
    fn test_record_batch_shape() -> Result<()> {
        let batch = series_to_record_batch(&sample())?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let dates = batch
            .column(0)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value_as_date(0), NaiveDate::from_ymd_opt(2023, 3, 31));

        let qoq = batch.column(2);
        assert!(qoq.is_null(0));
        assert!(qoq.is_valid(1));
        Ok(())
    }

    #[test]
    fn test_write_parquet_roundtrip_rows() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("out").join("series.parquet");
        write_parquet(&sample(), &path)?;

        let file = File::open(&path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let rows: usize = reader
            .map(|b| b.map(|b| b.num_rows()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .sum();
        assert_eq!(rows, 2);
        Ok(())
    }

    #[test]
    fn test_write_json() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("series.json");
        write_json(&sample(), &path)?;

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(v["observations"][1]["date"], "2023-06-30");
        assert_eq!(v["observations"][0]["qoq_saar"], serde_json::Value::Null);
        assert_eq!(v["config"]["mode"], "latest");
        Ok(())
    }
}
