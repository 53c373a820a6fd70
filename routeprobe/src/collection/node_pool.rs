use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, BinaryArray, Int64Array, LargeBinaryArray};
use geo::{Geometry, Point};
use geozero::{wkb::Wkb, ToGeo};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::constants::{GEOMETRY_COLUMN, NODE_ID_COLUMN};
use super::RouteCollectionError;

/// candidate nodes available for route synthesis: a node id to point lookup
/// which remembers first-insertion order, so that sampling over the id list
/// is reproducible across runs against the same input table.
#[derive(Debug, Clone, Default)]
pub struct NodePool {
    ids: Vec<i64>,
    geometries: HashMap<i64, Point<f64>>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert a node. a duplicate id keeps its original position in the
    /// sampling order but overwrites the stored geometry.
    pub fn insert(&mut self, id: i64, geometry: Point<f64>) {
        if self.geometries.insert(id, geometry).is_none() {
            self.ids.push(id);
        }
    }

    pub fn get(&self, id: i64) -> Option<&Point<f64>> {
        self.geometries.get(&id)
    }

    /// node ids in first-insertion order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// load a pool from a GeoParquet node table with a `source` int64 id
    /// column and a `geometry` WKB point column.
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<Self, RouteCollectionError> {
        let file = File::open(path.as_ref()).map_err(|e| {
            RouteCollectionError::NodeTableError(format!(
                "cannot open '{}': {e}",
                path.as_ref().to_str().unwrap_or_default()
            ))
        })?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            RouteCollectionError::NodeTableError(format!("not a readable parquet file: {e}"))
        })?;
        let reader = builder.build().map_err(|e| {
            RouteCollectionError::NodeTableError(format!("failed to build parquet reader: {e}"))
        })?;

        let mut pool = Self::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                RouteCollectionError::NodeTableError(format!("failed to read record batch: {e}"))
            })?;
            let id_column = batch
                .column_by_name(NODE_ID_COLUMN)
                .ok_or_else(|| {
                    RouteCollectionError::NodeTableError(format!(
                        "input table has no '{NODE_ID_COLUMN}' column"
                    ))
                })?
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| {
                    RouteCollectionError::NodeTableError(format!(
                        "'{NODE_ID_COLUMN}' column is not int64"
                    ))
                })?;
            let geometry_column = batch.column_by_name(GEOMETRY_COLUMN).ok_or_else(|| {
                RouteCollectionError::NodeTableError(format!(
                    "input table has no '{GEOMETRY_COLUMN}' column"
                ))
            })?;
            if geometry_column.as_any().downcast_ref::<BinaryArray>().is_none()
                && geometry_column
                    .as_any()
                    .downcast_ref::<LargeBinaryArray>()
                    .is_none()
            {
                return Err(RouteCollectionError::NodeTableError(format!(
                    "'{GEOMETRY_COLUMN}' column is not binary WKB (found {:?})",
                    geometry_column.data_type()
                )));
            }

            for row in 0..batch.num_rows() {
                if id_column.is_null(row) {
                    return Err(RouteCollectionError::NodeTableError(format!(
                        "null node id at row {row}"
                    )));
                }
                let id = id_column.value(row);
                let wkb_bytes = binary_value(geometry_column.as_ref(), row).ok_or_else(|| {
                    RouteCollectionError::NodeTableError(format!(
                        "node {id} has null geometry (row {row})"
                    ))
                })?;
                // convert at the boundary of the program into geo types
                let geometry = Wkb(wkb_bytes).to_geo().map_err(|e| {
                    RouteCollectionError::NodeTableError(format!(
                        "could not decode WKB geometry for node {id}: {e}"
                    ))
                })?;
                match geometry {
                    Geometry::Point(p) => pool.insert(id, p),
                    other => {
                        return Err(RouteCollectionError::NodeTableError(format!(
                            "node {id} geometry is not a point: {other:?}"
                        )))
                    }
                }
            }
        }
        Ok(pool)
    }
}

/// read one row of a Binary or LargeBinary arrow column, None when the cell
/// is null. callers check the column type up front, so an unsupported
/// column never reaches here.
fn binary_value(column: &dyn Array, row: usize) -> Option<Vec<u8>> {
    if let Some(arr) = column.as_any().downcast_ref::<BinaryArray>() {
        (!arr.is_null(row)).then(|| arr.value(row).to_vec())
    } else if let Some(arr) = column.as_any().downcast_ref::<LargeBinaryArray>() {
        (!arr.is_null(row)).then(|| arr.value(row).to_vec())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, BinaryBuilder};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn wkb_point(x: f64, y: f64) -> Vec<u8> {
        let mut bytes = vec![];
        let geom = Geometry::Point(Point::new(x, y));
        let options = wkb::writer::WriteOptions {
            endianness: wkb::Endianness::LittleEndian,
        };
        wkb::writer::write_geometry(&mut bytes, &geom, &options).unwrap();
        bytes
    }

    #[test]
    fn duplicate_id_overwrites_geometry_but_keeps_position() {
        let mut pool = NodePool::new();
        pool.insert(7, Point::new(0.0, 0.0));
        pool.insert(9, Point::new(1.0, 1.0));
        pool.insert(7, Point::new(2.0, 2.0));

        assert_eq!(pool.ids(), &[7, 9]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(7), Some(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn from_parquet_round_trip() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(NODE_ID_COLUMN, DataType::Int64, false),
            Field::new(GEOMETRY_COLUMN, DataType::Binary, false),
        ]));
        let ids = Int64Array::from(vec![10, 20, 30]);
        let mut geoms = BinaryBuilder::new();
        geoms.append_value(wkb_point(-105.25, 39.73));
        geoms.append_value(wkb_point(-105.20, 39.78));
        geoms.append_value(wkb_point(-104.99, 39.74));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(ids) as ArrayRef, Arc::new(geoms.finish()) as ArrayRef],
        )
        .unwrap();

        let path = std::env::temp_dir().join("routeprobe_node_pool_test.parquet");
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let pool = NodePool::from_parquet(&path).unwrap();
        assert_eq!(pool.ids(), &[10, 20, 30]);
        assert_eq!(pool.get(20), Some(&Point::new(-105.20, 39.78)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn non_binary_geometry_column_is_a_schema_error() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(NODE_ID_COLUMN, DataType::Int64, false),
            Field::new(GEOMETRY_COLUMN, DataType::Utf8, false),
        ]));
        let ids = Int64Array::from(vec![10]);
        let geoms = arrow::array::StringArray::from(vec!["POINT (-105.25 39.73)"]);
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(ids) as ArrayRef, Arc::new(geoms) as ArrayRef],
        )
        .unwrap();

        let path = std::env::temp_dir().join("routeprobe_node_pool_wkt_test.parquet");
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        match NodePool::from_parquet(&path) {
            Err(RouteCollectionError::NodeTableError(msg)) => {
                assert!(msg.contains("is not binary WKB"), "unexpected message: {msg}")
            }
            other => panic!("expected a schema error, got {other:?}"),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn null_geometry_cell_is_reported_per_node() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(NODE_ID_COLUMN, DataType::Int64, false),
            Field::new(GEOMETRY_COLUMN, DataType::Binary, true),
        ]));
        let ids = Int64Array::from(vec![10, 20]);
        let mut geoms = BinaryBuilder::new();
        geoms.append_value(wkb_point(-105.25, 39.73));
        geoms.append_null();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(ids) as ArrayRef, Arc::new(geoms.finish()) as ArrayRef],
        )
        .unwrap();

        let path = std::env::temp_dir().join("routeprobe_node_pool_null_test.parquet");
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        match NodePool::from_parquet(&path) {
            Err(RouteCollectionError::NodeTableError(msg)) => {
                assert!(msg.contains("node 20 has null geometry"), "unexpected message: {msg}")
            }
            other => panic!("expected a null-geometry error, got {other:?}"),
        }
        std::fs::remove_file(&path).ok();
    }
}
