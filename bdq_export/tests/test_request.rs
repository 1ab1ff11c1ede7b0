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

use bdq_export::{DecimalSeparator,ExportFormat,FieldSeparator,ProtectedAreaKind};
use bdq_export::request::{ExportRequest,ProtectedAreaRequest};

fn base_request ()->ExportRequest {
    ExportRequest {
        date_time_from: "2020-01-01 00:00:00".to_string(),
        date_time_to: "2020-01-31 23:59:59".to_string(),
        format: "csv".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_minimal_request () {
    let options = base_request().normalize().unwrap();

    assert_eq!( options.formats, vec![ExportFormat::Csv]);
    assert!( options.satellites.is_none());
    assert!( options.protected_area.is_none());
    assert!( !options.industrial_fires);
    assert_eq!( options.decimal_separator, DecimalSeparator::Point);
    assert_eq!( options.field_separator, FieldSeparator::Comma);
}

#[test]
fn test_empty_strings_count_as_absent () {
    let mut request = base_request();
    request.satellites = Some("".to_string());
    request.biomes = Some(" , ,".to_string());
    request.countries = Some("33,76".to_string());

    let options = request.normalize().unwrap();
    assert!( options.satellites.is_none());
    assert!( options.biomes.is_none());
    assert_eq!( options.countries, Some( vec!["33".to_string(), "76".to_string()]));
}

#[test]
fn test_all_expands_to_every_format () {
    let mut request = base_request();
    request.format = "all".to_string();

    let options = request.normalize().unwrap();
    assert_eq!( options.formats,
        vec![ExportFormat::Csv, ExportFormat::GeoJson, ExportFormat::Kml, ExportFormat::Shapefile]);
}

#[test]
fn test_format_list_is_deduplicated () {
    let mut request = base_request();
    request.format = "kml,csv,kml".to_string();

    let options = request.normalize().unwrap();
    assert_eq!( options.formats, vec![ExportFormat::Kml, ExportFormat::Csv]);
}

#[test]
fn test_unsupported_format_is_rejected () {
    let mut request = base_request();
    request.format = "csv,xlsx".to_string();
    assert!( request.normalize().is_err());

    request.format = "".to_string();
    assert!( request.normalize().is_err());
}

#[test]
fn test_inverted_date_range_is_rejected () {
    let mut request = base_request();
    request.date_time_from = "2020-02-01 00:00:00".to_string();
    request.date_time_to = "2020-01-01 00:00:00".to_string();

    assert!( request.normalize().is_err());
}

#[test]
fn test_malformed_timestamp_is_rejected () {
    let mut request = base_request();
    request.date_time_from = "01/31/2020".to_string();

    assert!( request.normalize().is_err());
}

#[test]
fn test_string_booleans () {
    let mut request = base_request();
    request.industrial_fires = Some("true".to_string());
    assert!( request.normalize().unwrap().industrial_fires);

    // only the literal "true" counts
    request.industrial_fires = Some("yes".to_string());
    assert!( !request.normalize().unwrap().industrial_fires);

    request.industrial_fires = None;
    assert!( !request.normalize().unwrap().industrial_fires);
}

#[test]
fn test_protected_area_normalization () {
    let mut request = base_request();
    request.protected_area = Some( ProtectedAreaRequest {
        kind: "UCE".to_string(),
        id: serde_json::json!(7),
        ngo: "X".to_string(),
    });
    request.buffer_five = Some("true".to_string());

    let options = request.normalize().unwrap();
    let pa = options.protected_area.unwrap();
    assert_eq!( pa.kind, ProtectedAreaKind::UCE);
    assert_eq!( pa.lookup_key(), "7X");
    assert!( !pa.buffer_internal);
    assert!( pa.buffer_five);
    assert!( !pa.buffer_ten);
}

#[test]
fn test_protected_area_id_accepted_as_string () {
    let mut request = base_request();
    request.protected_area = Some( ProtectedAreaRequest {
        kind: "TI".to_string(),
        id: serde_json::json!("42"),
        ngo: "FUNAI".to_string(),
    });

    let pa = request.normalize().unwrap().protected_area.unwrap();
    assert_eq!( pa.id, 42);
    assert_eq!( pa.lookup_key(), "42FUNAI");
}

#[test]
fn test_protected_area_kind_outside_enumeration_is_rejected () {
    let mut request = base_request();
    request.protected_area = Some( ProtectedAreaRequest {
        kind: "APA".to_string(),
        id: serde_json::json!(7),
        ngo: "X".to_string(),
    });

    assert!( request.normalize().is_err());
}

#[test]
fn test_csv_preferences () {
    let mut request = base_request();
    request.decimal_separator = Some("comma".to_string());
    request.field_separator = Some("semicolon".to_string());

    let options = request.normalize().unwrap();
    assert_eq!( options.decimal_separator, DecimalSeparator::Comma);
    assert_eq!( options.field_separator, FieldSeparator::Semicolon);
}

#[test]
fn test_extent_parsing () {
    let mut request = base_request();
    request.extent = Some("-74.0,-34.0,-28.85,5.27".to_string());
    assert_eq!( request.normalize().unwrap().extent, Some([-74.0, -34.0, -28.85, 5.27]));

    request.extent = Some("-74.0,-34.0".to_string());
    assert!( request.normalize().is_err());

    request.extent = Some("-74.0,-34.0,nope,5.27".to_string());
    assert!( request.normalize().is_err());
}

#[test]
fn test_transport_shape () {
    // the wire shape uses camelCase keys and carries everything as strings except the
    // protected-area reference
    let json = r#"{
        "dateTimeFrom": "2020-01-01 00:00:00",
        "dateTimeTo": "2020-01-31 23:59:59",
        "satellites": "AQUA_M-T,TERRA_M",
        "bufferInternal": "false",
        "bufferFive": "true",
        "bufferTen": "false",
        "protectedArea": { "type": "UCE", "id": 7, "ngo": "X" },
        "industrialFires": "true",
        "format": "csv,kml"
    }"#;

    let request: ExportRequest = serde_json::from_str( json).unwrap();
    let options = request.normalize().unwrap();

    assert_eq!( options.satellites, Some( vec!["AQUA_M-T".to_string(), "TERRA_M".to_string()]));
    assert_eq!( options.formats, vec![ExportFormat::Csv, ExportFormat::Kml]);
    assert!( options.industrial_fires);
    assert!( options.protected_area.unwrap().buffer_five);
}
