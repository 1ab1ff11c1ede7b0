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

//! the raw export request as it arrives over the websocket, and its normalization into
//! a fully typed [`FilterOptions`] value. All validation happens here, before any SQL
//! or subprocess work is started

use serde::{Serialize,Deserialize};

use bdq_common::datetime::parse_transport_datetime;
use bdq_common::strings::split_comma_list;

use crate::{
    DecimalSeparator, ExportFormat, FieldSeparator, FilterOptions, ProtectedAreaFilter, ProtectedAreaKind, RiskBand,
    errors::{invalid_request,Result},
};

/// the wire shape of a protected-area reference: `{"type": "UCE", "id": 7, "ngo": "X"}`.
/// The id is accepted both as JSON number and as string since clients are not consistent
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct ProtectedAreaRequest {
    #[serde(rename="type")]
    pub kind: String,
    pub id: serde_json::Value,
    #[serde(default)]
    pub ngo: String,
}

/// the untyped option bag of the transport. Everything except the date range and the
/// format list is optional, and empty strings count as absent
#[derive(Deserialize,Serialize,Debug,Clone,Default)]
#[serde(rename_all="camelCase", default)]
pub struct ExportRequest {
    pub date_time_from: String,
    pub date_time_to: String,

    pub satellites: Option<String>,
    pub biomes: Option<String>,
    pub continent: Option<String>,
    pub countries: Option<String>,
    pub states: Option<String>,
    pub cities: Option<String>,
    pub special_regions: Option<String>,

    pub extent: Option<String>, // "minX,minY,maxX,maxY"
    pub risk: Option<String>,
    pub protected_area: Option<ProtectedAreaRequest>,
    pub industrial_fires: Option<String>,

    pub buffer_internal: Option<String>,
    pub buffer_five: Option<String>,
    pub buffer_ten: Option<String>,

    pub decimal_separator: Option<String>,
    pub field_separator: Option<String>,

    pub format: String, // comma joined, "all" expands to every supported format
}

impl ExportRequest {
    /// turn the transport option bag into a validated [`FilterOptions`].
    /// Rejects malformed date ranges, unsupported format names and protected-area kinds
    /// outside the enumerated set
    pub fn normalize (&self)->Result<FilterOptions> {
        let date_from = parse_transport_datetime( &self.date_time_from)
            .map_err( |e| invalid_request(e))?;
        let date_to = parse_transport_datetime( &self.date_time_to)
            .map_err( |e| invalid_request(e))?;
        if date_from > date_to {
            return Err( invalid_request( format!("date range inverted: {} > {}", self.date_time_from, self.date_time_to)));
        }

        let formats = parse_formats( &self.format)?;

        let satellites = opt_list( &self.satellites);
        let biomes = opt_list( &self.biomes);
        let continent = opt_str( &self.continent);
        let countries = opt_list( &self.countries);
        let states = opt_list( &self.states);
        let cities = opt_list( &self.cities);
        let special_regions = opt_list( &self.special_regions);

        let extent = match opt_str( &self.extent) {
            Some(s) => Some( parse_extent( &s)?),
            None => None
        };
        let risk = opt_str( &self.risk).map( |s| RiskBand::from_name( &s));

        let protected_area = match &self.protected_area {
            Some(pa) => Some( self.normalize_protected_area( pa)?),
            None => None
        };

        let industrial_fires = is_true( &self.industrial_fires);
        let decimal_separator = match opt_str( &self.decimal_separator).as_deref() {
            Some("comma") => DecimalSeparator::Comma,
            _ => DecimalSeparator::Point
        };
        let field_separator = match opt_str( &self.field_separator).as_deref() {
            Some("semicolon") => FieldSeparator::Semicolon,
            _ => FieldSeparator::Comma
        };

        Ok( FilterOptions {
            date_from, date_to,
            satellites, biomes, continent, countries, states, cities, special_regions,
            extent, risk, protected_area,
            industrial_fires,
            decimal_separator, field_separator,
            formats
        })
    }

    fn normalize_protected_area (&self, pa: &ProtectedAreaRequest)->Result<ProtectedAreaFilter> {
        let kind = ProtectedAreaKind::from_name( &pa.kind)
            .ok_or_else( || invalid_request( format!("unknown protected area type {:?}", pa.kind)))?;

        let id = match &pa.id {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse::<i64>().ok(),
            _ => None
        }.ok_or_else( || invalid_request( format!("not a valid protected area id: {}", pa.id)))?;

        Ok( ProtectedAreaFilter {
            kind,
            id,
            ngo: pa.ngo.clone(),
            buffer_internal: is_true( &self.buffer_internal),
            buffer_five: is_true( &self.buffer_five),
            buffer_ten: is_true( &self.buffer_ten),
        })
    }
}

/// transport booleans arrive as strings - only the literal "true" counts
fn is_true (opt: &Option<String>)->bool {
    matches!( opt.as_deref(), Some("true"))
}

fn opt_str (opt: &Option<String>)->Option<String> {
    opt.as_deref()
        .map( |s| s.trim())
        .filter( |s| !s.is_empty())
        .map( |s| s.to_string())
}

/// split a comma-separated transport field; an absent, empty or all-empty field is None -
/// absence must be indistinguishable from "no constraint"
fn opt_list (opt: &Option<String>)->Option<Vec<String>> {
    opt.as_deref()
        .map( split_comma_list)
        .filter( |elems| !elems.is_empty())
}

fn parse_formats (requested: &str)->Result<Vec<ExportFormat>> {
    let names = split_comma_list( requested);
    if names.is_empty() {
        return Err( invalid_request("no export format requested"));
    }

    if names.iter().any( |n| n == "all") {
        return Ok( ExportFormat::ALL.to_vec());
    }

    let mut formats: Vec<ExportFormat> = Vec::with_capacity( names.len());
    for name in &names {
        let format = ExportFormat::from_name( name)
            .ok_or_else( || invalid_request( format!("unsupported export format {name:?}")))?;
        if !formats.contains( &format) {
            formats.push( format);
        }
    }
    Ok(formats)
}

fn parse_extent (s: &str)->Result<[f64;4]> {
    let parts = split_comma_list( s);
    if parts.len() != 4 {
        return Err( invalid_request( format!("extent needs 4 bounds, got {}", parts.len())));
    }

    let mut bounds = [0.0; 4];
    for (i,p) in parts.iter().enumerate() {
        bounds[i] = p.parse::<f64>()
            .map_err( |_| invalid_request( format!("not a valid extent bound: {p:?}")))?;
    }
    Ok(bounds)
}
