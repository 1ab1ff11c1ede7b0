/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “BDQ” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

//! the BDQ export core: translate structured fire-record filters into SQL, drive the
//! external conversion tool (one subprocess per requested output format), bundle the
//! results and keep the download audit ledger

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Serialize,Deserialize};

pub mod request;
pub mod filter;
pub mod ledger;
pub mod workspace;
pub mod archive;
pub mod job;

pub mod errors;
pub use errors::Result;

/* #region configuration *************************************************************************/

/// column layout of the fires occurrence table
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct FiresTableConfig {
    pub schema: String,
    pub table: String,
    pub geometry_col: String,
    pub datetime_col: String,
    pub satellite_col: String,
    pub biome_col: String,
    pub continent_col: String,
    pub country_col: String,
    pub state_col: String,
    pub city_col: String,
    pub risk_col: String,
    pub industrial_col: String, // industrial-fire marker, null for vegetation fires
}

impl FiresTableConfig {
    pub fn qualified_table (&self)->String { format!("{}.{}", self.schema, self.table) }
}

/// one protected-area table family: the base polygons plus the precomputed
/// 5km and 10km buffer-ring variants
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct ProtectedAreaTableConfig {
    pub schema: String,
    pub table: String,
    pub table_5km: String,
    pub table_10km: String,
    pub geometry_col: String,
    pub id_col: String, // holds the concatenation of area id and NGO qualifier
}

impl ProtectedAreaTableConfig {
    pub fn base (&self)->String { format!("{}.{}", self.schema, self.table) }
    pub fn ring_5km (&self)->String { format!("{}.{}", self.schema, self.table_5km) }
    pub fn ring_10km (&self)->String { format!("{}.{}", self.schema, self.table_10km) }
}

/// special regions are named groupings of countries/states stored as one geometry per region
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct SpecialRegionsTableConfig {
    pub schema: String,
    pub table: String,
    pub geometry_col: String,
    pub id_col: String,
}

impl SpecialRegionsTableConfig {
    pub fn qualified_table (&self)->String { format!("{}.{}", self.schema, self.table) }
}

/// the downloads audit table (append-only, written once per export request)
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct DownloadsTableConfig {
    pub schema: String,
    pub table: String,
    pub date_col: String,
    pub time_col: String,
    pub ip_col: String,
    pub filter_begin_col: String,
    pub filter_end_col: String,
    pub filter_satellites_col: String,
    pub filter_biomes_col: String,
    pub filter_countries_col: String,
    pub filter_states_col: String,
    pub filter_cities_col: String,
    pub filter_format_col: String,
}

impl DownloadsTableConfig {
    pub fn qualified_table (&self)->String { format!("{}.{}", self.schema, self.table) }
}

/// schema/table/column names of everything the export subsystem queries.
/// Loaded once at startup and injected - components never reach into ambient config state
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct TablesConfig {
    pub fires: FiresTableConfig,
    pub uce: ProtectedAreaTableConfig,
    pub ucf: ProtectedAreaTableConfig,
    pub ti: ProtectedAreaTableConfig,
    pub special_regions: SpecialRegionsTableConfig,
    pub downloads: DownloadsTableConfig,

    /// attribute columns included in exports, in output order (geometry excluded)
    pub export_cols: Vec<String>,
    /// the subset of export_cols holding numeric values (target of decimal separator rewriting)
    pub numeric_cols: Vec<String>,
}

impl TablesConfig {
    pub fn protected_area (&self, kind: ProtectedAreaKind)->&ProtectedAreaTableConfig {
        match kind {
            ProtectedAreaKind::UCE => &self.uce,
            ProtectedAreaKind::UCF => &self.ucf,
            ProtectedAreaKind::TI => &self.ti,
        }
    }
}

/// PostgreSQL connection parameters - used both for the driver-level pool and for the
/// conversion tool's PG datasource argument
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn pool_url (&self)->String {
        format!("postgres://{}:{}@{}:{}/{}", self.user, self.password, self.host, self.port, self.dbname)
    }

    /// the `PG:` datasource string the conversion tool connects with
    pub fn ogr_datasource (&self)->String {
        format!("PG:host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password)
    }
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct ExportConfig {
    pub ogr2ogr_cmd: String, // pathname of the ogr2ogr executable
    pub tmp_dir: PathBuf,    // root under which per-job scratch dirs are created
    pub base_name: String,   // artifact basename prefix (e.g. "Focos")
}

/* #endregion configuration */

/* #region filter model **************************************************************************/

/// the output formats the conversion tool is asked to produce
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
#[serde(rename_all="lowercase")]
pub enum ExportFormat {
    Csv,
    GeoJson,
    Kml,
    Shapefile,
}

impl ExportFormat {
    /// expansion order of a requested "all" format
    pub const ALL: [ExportFormat;4] = [ExportFormat::Csv, ExportFormat::GeoJson, ExportFormat::Kml, ExportFormat::Shapefile];

    pub fn from_name (name: &str)->Option<ExportFormat> {
        match name {
            "csv" => Some(ExportFormat::Csv),
            "geojson" => Some(ExportFormat::GeoJson),
            "kml" => Some(ExportFormat::Kml),
            "shapefile" => Some(ExportFormat::Shapefile),
            _ => None
        }
    }

    pub fn name (&self)->&'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Kml => "kml",
            ExportFormat::Shapefile => "shapefile",
        }
    }

    pub fn extension (&self)->&'static str {
        match self {
            ExportFormat::Csv => ".csv",
            ExportFormat::GeoJson => ".json",
            ExportFormat::Kml => ".kml",
            ExportFormat::Shapefile => ".shp",
        }
    }

    /// the conversion tool's output format name (its `-f` argument)
    pub fn ogr_name (&self)->&'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::GeoJson => "GeoJSON",
            ExportFormat::Kml => "KML",
            ExportFormat::Shapefile => "ESRI Shapefile",
        }
    }

    /// does the exported select list carry the geometry column
    pub fn is_spatial (&self)->bool {
        !matches!( self, ExportFormat::Csv)
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum ProtectedAreaKind { UCE, UCF, TI }

impl ProtectedAreaKind {
    pub fn from_name (name: &str)->Option<ProtectedAreaKind> {
        match name {
            "UCE" => Some(ProtectedAreaKind::UCE),
            "UCF" => Some(ProtectedAreaKind::UCF),
            "TI" => Some(ProtectedAreaKind::TI),
            _ => None
        }
    }
}

/// protected-area constraint: which area, and which buffer ring combination to test.
/// All three ring flags false is resolved as "10km ring only" during predicate building
#[derive(Debug,Clone,PartialEq)]
pub struct ProtectedAreaFilter {
    pub kind: ProtectedAreaKind,
    pub id: i64,
    pub ngo: String,
    pub buffer_internal: bool,
    pub buffer_five: bool,
    pub buffer_ten: bool,
}

impl ProtectedAreaFilter {
    /// the backing tables are keyed by the concatenation of area id and NGO qualifier,
    /// not by the id alone
    pub fn lookup_key (&self)->String {
        format!("{}{}", self.id, self.ngo)
    }
}

/// named fire-risk bands of the filter UI. Anything unrecognized falls back to the
/// catch-all positive-risk band
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum RiskBand { Minimum, Low, Medium, High, Critic, Any }

impl RiskBand {
    pub fn from_name (name: &str)->RiskBand {
        match name {
            "minimum" => RiskBand::Minimum,
            "low" => RiskBand::Low,
            "medium" => RiskBand::Medium,
            "high" => RiskBand::High,
            "critic" => RiskBand::Critic,
            _ => RiskBand::Any
        }
    }

    pub fn sql_range (&self)->&'static str {
        match self {
            RiskBand::Minimum => " between 0 and 0.15",
            RiskBand::Low => " between 0.15 and 0.4",
            RiskBand::Medium => " between 0.4 and 0.7",
            RiskBand::High => " between 0.7 and 0.95",
            RiskBand::Critic => " > 0.95",
            RiskBand::Any => " > 0",
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum DecimalSeparator { Point, Comma }

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum FieldSeparator { Comma, Semicolon }

impl FieldSeparator {
    /// the conversion tool's CSV SEPARATOR layer-creation option value
    pub fn ogr_name (&self)->&'static str {
        match self {
            FieldSeparator::Comma => "COMMA",
            FieldSeparator::Semicolon => "SEMICOLON",
        }
    }
}

/// the fully-typed, normalized export request. Optional fields that are None contribute
/// nothing to the compiled predicate - set-valued fields are never empty here (the
/// normalization step strips empty transport fields before this value is built)
#[derive(Debug,Clone,PartialEq)]
pub struct FilterOptions {
    pub date_from: NaiveDateTime, // inclusive
    pub date_to: NaiveDateTime,   // inclusive, >= date_from

    pub satellites: Option<Vec<String>>,
    pub biomes: Option<Vec<String>>,
    pub continent: Option<String>,
    pub countries: Option<Vec<String>>,
    pub states: Option<Vec<String>>,
    pub cities: Option<Vec<String>>,
    pub special_regions: Option<Vec<String>>,

    pub extent: Option<[f64;4]>, // minX,minY,maxX,maxY in SRID 4326
    pub risk: Option<RiskBand>,
    pub protected_area: Option<ProtectedAreaFilter>,

    /// when false, exports are restricted to records whose industrial-fire marker is null.
    /// There is no "industrial only" branch - the flag either excludes or is unconstrained
    pub industrial_fires: bool,

    pub decimal_separator: DecimalSeparator,
    pub field_separator: FieldSeparator,

    pub formats: Vec<ExportFormat>, // non-empty, in request order
}

/* #endregion filter model */
