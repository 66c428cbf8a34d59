//! Feature classes and their GeoJSON persistence.
//!
//! A `FeatureClass` pairs a geometry column with a columnar attribute
//! table, one row per feature. On disk a class is a single GeoJSON
//! feature collection; the spatial reference WKID rides along as a
//! foreign member so a round trip preserves it.
//!
//! Attribute fidelity: properties map to `Int64`, `Float64`, `Text` and
//! `Bool` columns. Integer and float values in the same property are
//! widened to `Float64`; any other mixed typing is a format error rather
//! than a silent coercion.

use std::path::Path;

use geo_types::Geometry;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use proxprep_tabular::{AttrTable, Cell, FieldInfo, FieldType, MergeKind, TableSchema};

use crate::error::{Result, StoreError};

/// WKID assumed for layers that do not carry one.
pub const DEFAULT_WKID: i32 = 4326;

/// A named, WKID-tagged collection of features sharing a schema.
#[derive(Debug, Clone)]
pub struct FeatureClass {
    name: String,
    wkid: i32,
    geometries: Vec<Geometry<f64>>,
    table: AttrTable,
}

impl FeatureClass {
    /// Create an empty feature class.
    pub fn new(name: impl Into<String>, wkid: i32, schema: TableSchema) -> Self {
        Self {
            name: name.into(),
            wkid,
            geometries: Vec::new(),
            table: AttrTable::new(schema),
        }
    }

    /// Layer name (the workspace file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the layer.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Spatial reference WKID.
    pub fn wkid(&self) -> i32 {
        self.wkid
    }

    /// Number of features.
    #[inline]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Check if the class has no features.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Geometry of one feature.
    pub fn geometry(&self, row: usize) -> Option<&Geometry<f64>> {
        self.geometries.get(row)
    }

    /// All geometries, row-parallel with the attribute table.
    pub fn geometries(&self) -> &[Geometry<f64>] {
        &self.geometries
    }

    /// The attribute table.
    pub fn table(&self) -> &AttrTable {
        &self.table
    }

    /// Mutable attribute table (schema-level mutation: add/rename/drop
    /// fields). Row counts must stay feature-parallel; use [`push`](Self::push)
    /// to add rows.
    pub fn table_mut(&mut self) -> &mut AttrTable {
        &mut self.table
    }

    /// Append a feature.
    pub fn push(&mut self, geometry: Geometry<f64>, cells: Vec<Cell>) -> Result<()> {
        self.table.push_row(cells)?;
        self.geometries.push(geometry);
        Ok(())
    }

    /// Merge an attribute mapping onto this class via an i64 key column,
    /// filtering geometries in step with the surviving rows.
    ///
    /// `MergeKind::Inner` drops features without a match; `MergeKind::Left`
    /// keeps them with nulls in the merged fields.
    pub fn merge(&self, mapping: &AttrTable, on: &str, kind: MergeKind) -> Result<FeatureClass> {
        let (table, rows) = self.table.merge_with_rows(mapping, on, kind)?;
        let geometries = rows.iter().map(|&i| self.geometries[i].clone()).collect();
        Ok(FeatureClass {
            name: self.name.clone(),
            wkid: self.wkid,
            geometries,
            table,
        })
    }

    // ------------------------------------------------------------------
    // GeoJSON (de)serialization
    // ------------------------------------------------------------------

    /// Serialize to a GeoJSON feature collection.
    pub fn to_geojson(&self) -> FeatureCollection {
        let fields = self.table.schema().fields().to_vec();
        let features = (0..self.len())
            .map(|row| {
                let mut properties = JsonObject::new();
                for f in &fields {
                    let cell = self.table.cell(row, &f.name).unwrap_or(Cell::Null);
                    properties.insert(f.name.clone(), cell_to_json(cell));
                }
                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(
                        &self.geometries[row],
                    ))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign = JsonObject::new();
        foreign.insert("wkid".to_string(), JsonValue::from(self.wkid));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign),
        }
    }

    /// Deserialize from a GeoJSON feature collection.
    ///
    /// The schema is inferred from the properties: field order follows
    /// first appearance, field types follow the first non-null value
    /// (int widened to float when both appear).
    pub fn from_geojson(name: impl Into<String>, collection: &FeatureCollection) -> Result<Self> {
        let wkid = collection
            .foreign_members
            .as_ref()
            .and_then(|m| m.get("wkid"))
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .unwrap_or(DEFAULT_WKID);

        let fields = infer_schema(collection)?;
        let schema = TableSchema::new(fields.clone())?;
        let mut fc = FeatureClass::new(name, wkid, schema);

        for feature in &collection.features {
            let gj_geom = feature
                .geometry
                .as_ref()
                .ok_or_else(|| StoreError::Format("feature without geometry".into()))?;
            let geom = Geometry::<f64>::try_from(gj_geom)?;

            let empty = JsonObject::new();
            let props = feature.properties.as_ref().unwrap_or(&empty);
            let cells = fields
                .iter()
                .map(|f| json_to_cell(props.get(&f.name), f))
                .collect::<Result<Vec<_>>>()?;
            fc.push(geom, cells)?;
        }
        Ok(fc)
    }

    /// Read a feature class from a GeoJSON file. The layer name is the
    /// file stem.
    pub fn read_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("layer")
            .to_string();
        let raw = std::fs::read_to_string(path)?;
        let collection: FeatureCollection = raw.parse()?;
        Self::from_geojson(name, &collection)
    }

    /// Write this feature class to a GeoJSON file, overwriting any
    /// existing file.
    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, &self.to_geojson())?;
        Ok(())
    }
}

fn cell_to_json(cell: Cell) -> JsonValue {
    match cell {
        Cell::Null => JsonValue::Null,
        Cell::Bool(b) => JsonValue::from(b),
        Cell::I64(v) => JsonValue::from(v),
        Cell::F64(v) => JsonValue::from(v),
        Cell::Text(s) => JsonValue::from(s),
    }
}

fn json_to_cell(value: Option<&JsonValue>, field: &FieldInfo) -> Result<Cell> {
    let Some(value) = value else {
        return Ok(Cell::Null);
    };
    let cell = match (field.field_type, value) {
        (_, JsonValue::Null) => Cell::Null,
        (FieldType::Bool, JsonValue::Bool(b)) => Cell::Bool(*b),
        (FieldType::Int64, JsonValue::Number(n)) => Cell::I64(n.as_i64().ok_or_else(|| {
            StoreError::Format(format!("property '{}': non-integer {}", field.name, n))
        })?),
        (FieldType::Float64, JsonValue::Number(n)) => Cell::F64(n.as_f64().ok_or_else(|| {
            StoreError::Format(format!("property '{}': unrepresentable {}", field.name, n))
        })?),
        (FieldType::Text, JsonValue::String(s)) => Cell::Text(s.clone()),
        (ft, v) => {
            return Err(StoreError::Format(format!(
                "property '{}': expected {:?}, got {}",
                field.name, ft, v
            )))
        }
    };
    Ok(cell)
}

/// Per-property type accumulator for schema inference.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Inferred {
    Unknown,
    Bool,
    Int,
    Float,
    Text,
}

impl Inferred {
    fn update(self, value: &JsonValue, name: &str) -> Result<Inferred> {
        let observed = match value {
            JsonValue::Null => return Ok(self),
            JsonValue::Bool(_) => Inferred::Bool,
            JsonValue::Number(n) if n.is_i64() => Inferred::Int,
            JsonValue::Number(_) => Inferred::Float,
            JsonValue::String(_) => Inferred::Text,
            other => {
                return Err(StoreError::Format(format!(
                    "property '{}': unsupported value {}",
                    name, other
                )))
            }
        };
        match (self, observed) {
            (Inferred::Unknown, o) => Ok(o),
            (s, o) if s == o => Ok(s),
            // Int and Float widen to Float.
            (Inferred::Int, Inferred::Float) | (Inferred::Float, Inferred::Int) => {
                Ok(Inferred::Float)
            }
            (s, o) => Err(StoreError::Format(format!(
                "property '{}': mixed types {:?} and {:?}",
                name, s, o
            ))),
        }
    }

    fn field_type(self) -> FieldType {
        match self {
            Inferred::Bool => FieldType::Bool,
            Inferred::Int => FieldType::Int64,
            Inferred::Float => FieldType::Float64,
            // All-null or absent: text is the least constraining.
            Inferred::Unknown | Inferred::Text => FieldType::Text,
        }
    }
}

fn infer_schema(collection: &FeatureCollection) -> Result<Vec<FieldInfo>> {
    let mut order: Vec<String> = Vec::new();
    let mut inferred: std::collections::HashMap<String, Inferred> = std::collections::HashMap::new();

    for feature in &collection.features {
        let Some(props) = feature.properties.as_ref() else {
            continue;
        };
        for (key, value) in props {
            let state = match inferred.get(key) {
                Some(s) => *s,
                None => {
                    order.push(key.clone());
                    Inferred::Unknown
                }
            };
            inferred.insert(key.clone(), state.update(value, key)?);
        }
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let ft = inferred[&name].field_type();
            FieldInfo::new(name, ft)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ])
    }

    fn sample_class() -> FeatureClass {
        let schema = TableSchema::new(vec![
            FieldInfo::new("PLACE_ID", FieldType::Int64),
            FieldInfo::new("name", FieldType::Text),
        ])
        .unwrap();
        let mut fc = FeatureClass::new("communities", 4326, schema);
        fc.push(square(0.0, 0.0, 1.0), vec![Cell::I64(10), Cell::from("a")])
            .unwrap();
        fc.push(square(5.0, 5.0, 1.0), vec![Cell::I64(20), Cell::Null])
            .unwrap();
        fc
    }

    #[test]
    fn test_geojson_round_trip() {
        let fc = sample_class();
        let gj = fc.to_geojson();
        let back = FeatureClass::from_geojson("communities", &gj).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back.wkid(), 4326);
        assert_eq!(back.table().column("PLACE_ID").unwrap().get_i64(1), Some(20));
        assert_eq!(back.table().column("name").unwrap().get_text(0), Some("a"));
        assert_eq!(back.table().column("name").unwrap().get_text(1), None);
        assert!(matches!(back.geometry(0), Some(Geometry::Polygon(_))));
    }

    #[test]
    fn test_wkid_survives_round_trip() {
        let schema = TableSchema::new(vec![]).unwrap();
        let mut fc = FeatureClass::new("lyr", 3347, schema);
        fc.push(square(0.0, 0.0, 1.0), vec![]).unwrap();
        let back = FeatureClass::from_geojson("lyr", &fc.to_geojson()).unwrap();
        assert_eq!(back.wkid(), 3347);
    }

    #[test]
    fn test_mixed_int_float_widens() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}, "properties": {"v": 1}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}, "properties": {"v": 1.5}}
            ]
        }"#;
        let collection: FeatureCollection = raw.parse().unwrap();
        let fc = FeatureClass::from_geojson("pts", &collection).unwrap();
        assert_eq!(
            fc.table().schema().field("v").unwrap().field_type,
            FieldType::Float64
        );
    }

    #[test]
    fn test_merge_filters_geometries() {
        let fc = sample_class();
        let mut mapping = AttrTable::new(
            TableSchema::new(vec![
                FieldInfo::new("PLACE_ID", FieldType::Int64),
                FieldInfo::new("AUTO_PD_SITE_ID", FieldType::Int64),
            ])
            .unwrap(),
        );
        mapping
            .push_row(vec![Cell::I64(20), Cell::I64(101)])
            .unwrap();

        let merged = fc.merge(&mapping, "PLACE_ID", MergeKind::Inner).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged.table().column("AUTO_PD_SITE_ID").unwrap().get_i64(0),
            Some(101)
        );
        // The surviving geometry is the second square.
        let Some(Geometry::Polygon(p)) = merged.geometry(0) else {
            panic!("expected polygon");
        };
        assert_eq!(p.exterior().0[0].x, 5.0);
    }
}
