use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryBuilder, Int64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use super::{EdgeRecord, RouteCollectionError};

/// persistence seam for one batch of edge records. the driver writes each
/// batch synchronously before moving to the next.
pub trait ResultWriter {
    fn write_batch(
        &self,
        batch_index: usize,
        records: &[EdgeRecord],
    ) -> Result<(), RouteCollectionError>;
}

/// writes one GeoParquet artifact per batch index under a deterministic
/// name, so re-running a batch overwrites rather than appends. geometries
/// are WKB LineStrings tagged WGS84 via the `geo` file metadata entry.
pub struct GeoParquetWriter {
    output_directory: PathBuf,
}

impl GeoParquetWriter {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn batch_path(&self, batch_index: usize) -> PathBuf {
        self.output_directory
            .join(format!("batch_results_{batch_index}.parquet"))
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::UInt64, false),
            Field::new("source", DataType::Int64, false),
            Field::new("target", DataType::Int64, false),
            Field::new("length", DataType::Int64, false),
            Field::new("tt", DataType::Int64, false),
            Field::new("tt_traffic", DataType::Int64, false),
            Field::new("tt_historical", DataType::Int64, false),
            Field::new("geometry", DataType::Binary, false),
        ]))
    }

    /// GeoParquet `geo` metadata. a null crs denotes OGC:CRS84, the
    /// longitude/latitude WGS84 these records are collected in.
    fn geo_metadata() -> String {
        serde_json::json!({
            "version": "1.1.0",
            "primary_column": "geometry",
            "columns": {
                "geometry": {
                    "encoding": "WKB",
                    "geometry_types": ["LineString"],
                    "crs": null,
                }
            }
        })
        .to_string()
    }

    fn to_record_batch(records: &[EdgeRecord]) -> Result<RecordBatch, RouteCollectionError> {
        let ids = UInt64Array::from(records.iter().map(|r| r.id).collect::<Vec<u64>>());
        let sources = Int64Array::from(records.iter().map(|r| r.source).collect::<Vec<i64>>());
        let targets = Int64Array::from(records.iter().map(|r| r.target).collect::<Vec<i64>>());
        let lengths = Int64Array::from(records.iter().map(|r| r.length).collect::<Vec<i64>>());
        let tts = Int64Array::from(records.iter().map(|r| r.tt).collect::<Vec<i64>>());
        let tts_traffic =
            Int64Array::from(records.iter().map(|r| r.tt_traffic).collect::<Vec<i64>>());
        let tts_historical = Int64Array::from(
            records
                .iter()
                .map(|r| r.tt_historical)
                .collect::<Vec<i64>>(),
        );

        let write_options = wkb::writer::WriteOptions {
            endianness: wkb::Endianness::LittleEndian,
        };
        let mut geometries = BinaryBuilder::new();
        for record in records {
            let mut bytes = vec![];
            let geometry = geo::Geometry::LineString(record.geometry.clone());
            wkb::writer::write_geometry(&mut bytes, &geometry, &write_options).map_err(|e| {
                RouteCollectionError::BatchWriteError(format!(
                    "failed to encode edge {} geometry as WKB: {e}",
                    record.id
                ))
            })?;
            geometries.append_value(&bytes);
        }

        RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(ids) as ArrayRef,
                Arc::new(sources) as ArrayRef,
                Arc::new(targets) as ArrayRef,
                Arc::new(lengths) as ArrayRef,
                Arc::new(tts) as ArrayRef,
                Arc::new(tts_traffic) as ArrayRef,
                Arc::new(tts_historical) as ArrayRef,
                Arc::new(geometries.finish()) as ArrayRef,
            ],
        )
        .map_err(|e| {
            RouteCollectionError::BatchWriteError(format!("failed to assemble record batch: {e}"))
        })
    }
}

impl ResultWriter for GeoParquetWriter {
    fn write_batch(
        &self,
        batch_index: usize,
        records: &[EdgeRecord],
    ) -> Result<(), RouteCollectionError> {
        let path = self.batch_path(batch_index);
        let batch = Self::to_record_batch(records)?;

        let file = File::create(&path).map_err(|e| {
            RouteCollectionError::BatchWriteError(format!(
                "cannot create '{}': {e}",
                path.to_str().unwrap_or_default()
            ))
        })?;
        let properties = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_key_value_metadata(Some(vec![KeyValue::new(
                String::from("geo"),
                Self::geo_metadata(),
            )]))
            .build();
        let mut writer =
            ArrowWriter::try_new(file, Self::schema(), Some(properties)).map_err(|e| {
                RouteCollectionError::BatchWriteError(format!("failed to open writer: {e}"))
            })?;
        writer.write(&batch).map_err(|e| {
            RouteCollectionError::BatchWriteError(format!(
                "failed to write batch {batch_index}: {e}"
            ))
        })?;
        writer.close().map_err(|e| {
            RouteCollectionError::BatchWriteError(format!(
                "failed to finalize batch {batch_index}: {e}"
            ))
        })?;
        log::debug!(
            "wrote {} records to {}",
            records.len(),
            path.to_str().unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BinaryArray};
    use geo::{Geometry, LineString};
    use geozero::{wkb::Wkb, ToGeo};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn record(id: u64) -> EdgeRecord {
        EdgeRecord {
            id,
            source: 11,
            target: 22,
            length: 1000,
            tt: 60,
            tt_traffic: 90,
            tt_historical: 80,
            geometry: LineString::from(vec![(-105.25, 39.73), (-105.20, 39.74)]),
        }
    }

    #[test]
    fn artifact_round_trip() {
        let dir = std::env::temp_dir().join("routeprobe_writer_test");
        std::fs::create_dir_all(&dir).unwrap();
        let writer = GeoParquetWriter::new(&dir);
        writer.write_batch(3, &[record(0), record(1)]).unwrap();

        let file = File::open(writer.batch_path(3)).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();

        let kv = builder
            .metadata()
            .file_metadata()
            .key_value_metadata()
            .unwrap();
        let geo_meta = kv.iter().find(|kv| kv.key == "geo").unwrap();
        assert!(geo_meta.value.as_ref().unwrap().contains("WKB"));

        let batches: Vec<RecordBatch> = builder.build().unwrap().map(|b| b.unwrap()).collect();
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 2);

        let batch = &batches[0];
        let schema = batch.schema();
        let names: Vec<&str> = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(
            names,
            vec!["id", "source", "target", "length", "tt", "tt_traffic", "tt_historical", "geometry"]
        );

        let geometries = batch
            .column_by_name("geometry")
            .unwrap()
            .as_any()
            .downcast_ref::<BinaryArray>()
            .unwrap();
        let decoded = Wkb(geometries.value(0).to_vec()).to_geo().unwrap();
        match decoded {
            Geometry::LineString(ls) => {
                assert_eq!(ls, LineString::from(vec![(-105.25, 39.73), (-105.20, 39.74)]))
            }
            other => panic!("expected a linestring, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_batch_still_produces_an_artifact() {
        let dir = std::env::temp_dir().join("routeprobe_writer_empty_test");
        std::fs::create_dir_all(&dir).unwrap();
        let writer = GeoParquetWriter::new(&dir);
        writer.write_batch(0, &[]).unwrap();

        let file = File::open(writer.batch_path(0)).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let total: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total, 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rerun_overwrites_the_same_batch_index() {
        let dir = std::env::temp_dir().join("routeprobe_writer_overwrite_test");
        std::fs::create_dir_all(&dir).unwrap();
        let writer = GeoParquetWriter::new(&dir);
        writer.write_batch(1, &[record(0), record(1), record(2)]).unwrap();
        writer.write_batch(1, &[record(5)]).unwrap();

        let file = File::open(writer.batch_path(1)).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let total: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total, 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
