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

use chrono::NaiveDate;

use bdq_common::strings::sql_quote;
use bdq_export::{
    DecimalSeparator, ExportFormat, FieldSeparator, FilterOptions, FiresTableConfig,
    ProtectedAreaFilter, ProtectedAreaKind, ProtectedAreaTableConfig, RiskBand,
    SpecialRegionsTableConfig, DownloadsTableConfig, TablesConfig,
    filter::{build_exists_query,build_export_query,build_select_list,build_where_clause,QueryStyle,SqlParam,SqlQuery},
};

fn test_tables ()->TablesConfig {
    let pa_tables = |name: &str| ProtectedAreaTableConfig {
        schema: "public".to_string(),
        table: name.to_string(),
        table_5km: format!("{name}_5km"),
        table_10km: format!("{name}_10km"),
        geometry_col: "geom".to_string(),
        id_col: "id_ngo".to_string(),
    };

    TablesConfig {
        fires: FiresTableConfig {
            schema: "public".to_string(),
            table: "focos".to_string(),
            geometry_col: "geom".to_string(),
            datetime_col: "data_hora_gmt".to_string(),
            satellite_col: "satelite".to_string(),
            biome_col: "bioma".to_string(),
            continent_col: "id_0".to_string(),
            country_col: "pais".to_string(),
            state_col: "estado".to_string(),
            city_col: "municipio".to_string(),
            risk_col: "risco".to_string(),
            industrial_col: "id_foco_industrial".to_string(),
        },
        uce: pa_tables("uce"),
        ucf: pa_tables("ucf"),
        ti: pa_tables("ti"),
        special_regions: SpecialRegionsTableConfig {
            schema: "public".to_string(),
            table: "regioes_especiais".to_string(),
            geometry_col: "geom".to_string(),
            id_col: "id".to_string(),
        },
        downloads: DownloadsTableConfig {
            schema: "public".to_string(),
            table: "downloads".to_string(),
            date_col: "data".to_string(),
            time_col: "hora".to_string(),
            ip_col: "ip".to_string(),
            filter_begin_col: "filtro_inicio".to_string(),
            filter_end_col: "filtro_fim".to_string(),
            filter_satellites_col: "filtro_satelites".to_string(),
            filter_biomes_col: "filtro_biomas".to_string(),
            filter_countries_col: "filtro_paises".to_string(),
            filter_states_col: "filtro_estados".to_string(),
            filter_cities_col: "filtro_municipios".to_string(),
            filter_format_col: "formato".to_string(),
        },
        export_cols: vec![
            "longitude".to_string(), "latitude".to_string(), "data_hora_gmt".to_string(), "satelite".to_string()
        ],
        numeric_cols: vec![ "longitude".to_string(), "latitude".to_string() ],
    }
}

fn base_options ()->FilterOptions {
    FilterOptions {
        date_from: NaiveDate::from_ymd_opt(2020,1,1).unwrap().and_hms_opt(0,0,0).unwrap(),
        date_to: NaiveDate::from_ymd_opt(2020,1,31).unwrap().and_hms_opt(0,0,0).unwrap(),
        satellites: None,
        biomes: None,
        continent: None,
        countries: None,
        states: None,
        cities: None,
        special_regions: None,
        extent: None,
        risk: None,
        protected_area: None,
        industrial_fires: true, // unconstrained unless a test says otherwise
        decimal_separator: DecimalSeparator::Point,
        field_separator: FieldSeparator::Comma,
        formats: vec![ExportFormat::Csv],
    }
}

const DATE_CLAUSE: &str = "where (data_hora_gmt between '2020-01-01 00:00:00' and '2020-01-31 00:00:00')";

/// substitute positional placeholders with their rendered literals, highest index first
/// so that $1 does not clobber $10
fn substitute (q: &SqlQuery)->String {
    let mut text = q.text.clone();
    for (i,p) in q.params.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let literal = match p {
            SqlParam::Text(s) => sql_quote(s),
            SqlParam::Int(v) => v.to_string(),
            SqlParam::Num(v) => v.to_string(),
        };
        text = text.replace( &placeholder, &literal);
    }
    text
}

#[test]
fn test_date_range_only () {
    let tables = test_tables();
    let q = build_where_clause( &base_options(), &tables, QueryStyle::Literal);

    assert_eq!( q.text, DATE_CLAUSE);
    assert!( q.params.is_empty());
}

#[test]
fn test_omitted_fields_leave_no_trace () {
    // absence must be indistinguishable from "no constraint" - no column reference,
    // no always-true clause
    let tables = test_tables();
    let q = build_where_clause( &base_options(), &tables, QueryStyle::Positional);

    for col in ["satelite", "bioma", "id_0", "pais", "estado", "municipio", "risco",
                "ST_Intersects", "ST_MakeEnvelope", "regioes_especiais", "uce", "is null"] {
        assert!( !q.text.contains(col), "unexpected {col:?} in {}", q.text);
    }
    assert_eq!( q.params.len(), 2); // just the date bounds
}

#[test]
fn test_in_list_compilation () {
    let tables = test_tables();
    let mut options = base_options();
    options.satellites = Some( vec!["AQUA_M-T".to_string(), "TERRA_M".to_string()]);

    let q = build_where_clause( &options, &tables, QueryStyle::Positional);
    assert_eq!( q.text, format!("{DATE_CLAUSE} and satelite in ($3,$4)"));
    assert_eq!( q.params[2], SqlParam::Text("AQUA_M-T".to_string()));
    assert_eq!( q.params[3], SqlParam::Text("TERRA_M".to_string()));

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!("{DATE_CLAUSE} and satelite in ('AQUA_M-T','TERRA_M')"));
    assert!( q.params.is_empty());
}

#[test]
fn test_literal_quoting () {
    let tables = test_tables();
    let mut options = base_options();
    options.cities = Some( vec!["O'Higgins".to_string()]);

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert!( q.text.ends_with("and municipio in ('O''Higgins')"));
}

#[test]
fn test_special_regions_widen_country_state_filters () {
    let tables = test_tables();
    let mut options = base_options();
    options.countries = Some( vec!["33".to_string()]);
    options.states = Some( vec!["RJ".to_string(), "SP".to_string()]);
    options.special_regions = Some( vec!["1".to_string()]);

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!(
        "{DATE_CLAUSE} and (pais in ('33') or estado in ('RJ','SP') or \
         ST_Intersects(geom, (select ST_Union(geom) from public.regioes_especiais where id in ('1'))))"
    ));
}

#[test]
fn test_special_regions_alone () {
    let tables = test_tables();
    let mut options = base_options();
    options.special_regions = Some( vec!["1".to_string(), "4".to_string()]);

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!(
        "{DATE_CLAUSE} and (ST_Intersects(geom, (select ST_Union(geom) from public.regioes_especiais where id in ('1','4'))))"
    ));
}

#[test]
fn test_country_state_are_independent_without_special_regions () {
    let tables = test_tables();
    let mut options = base_options();
    options.countries = Some( vec!["33".to_string()]);
    options.states = Some( vec!["RJ".to_string()]);

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!("{DATE_CLAUSE} and pais in ('33') and estado in ('RJ')"));
}

#[test]
fn test_extent_compiles_to_envelope_intersection () {
    let tables = test_tables();
    let mut options = base_options();
    options.extent = Some( [-74.0, -34.0, -28.85, 5.27]);

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!(
        "{DATE_CLAUSE} and ST_Intersects(geom, ST_MakeEnvelope(-74, -34, -28.85, 5.27, 4326))"
    ));

    let q = build_where_clause( &options, &tables, QueryStyle::Positional);
    assert_eq!( q.text, format!(
        "{DATE_CLAUSE} and ST_Intersects(geom, ST_MakeEnvelope($3, $4, $5, $6, 4326))"
    ));
    assert_eq!( q.params.len(), 6);
}

#[test]
fn test_industrial_fires_excluded_unless_requested () {
    let tables = test_tables();

    let mut options = base_options();
    options.industrial_fires = false;
    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!("{DATE_CLAUSE} and id_foco_industrial is null"));

    // there is no "industrial only" branch - true means unconstrained
    options.industrial_fires = true;
    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, DATE_CLAUSE);
}

fn isect (table: &str)->String {
    format!("ST_Intersects(geom, (select geom from {table} where id_ngo = '7X'))")
}

#[test]
fn test_protected_area_buffer_combinations () {
    let tables = test_tables();

    let base = isect("public.uce");
    let ring5 = isect("public.uce_5km");
    let ring10 = isect("public.uce_10km");

    // (internal, five, ten) -> expected clause. The ring tables hold the full buffered
    // polygon, so annuli are "outer and not inner"; all-false defaults to the 10km ring
    let cases: Vec<((bool,bool,bool),String)> = vec![
        ((false,false,false), format!(" and {ring10}")),
        ((true,true,true),    format!(" and {ring10}")),
        ((true,false,false),  format!(" and {base}")),
        ((false,true,false),  format!(" and ({ring5} and not {base})")),
        ((false,false,true),  format!(" and ({ring10} and not {ring5})")),
        ((true,true,false),   format!(" and {ring5}")),
        ((false,true,true),   format!(" and ({ring10} and not {base})")),
        ((true,false,true),   format!(" and ({base} or ({ring10} and not {ring5}))")),
    ];

    for ((internal,five,ten), expected) in &cases {
        let mut options = base_options();
        options.protected_area = Some( ProtectedAreaFilter {
            kind: ProtectedAreaKind::UCE,
            id: 7,
            ngo: "X".to_string(),
            buffer_internal: *internal,
            buffer_five: *five,
            buffer_ten: *ten,
        });

        let q = build_where_clause( &options, &tables, QueryStyle::Literal);
        assert_eq!( q.text, format!("{DATE_CLAUSE}{expected}"),
            "wrong clause for buffer flags ({internal},{five},{ten})");
    }
}

#[test]
fn test_protected_area_kind_selects_backing_table () {
    let tables = test_tables();

    for (kind, table) in [(ProtectedAreaKind::UCF, "public.ucf"), (ProtectedAreaKind::TI, "public.ti")] {
        let mut options = base_options();
        options.protected_area = Some( ProtectedAreaFilter {
            kind, id: 7, ngo: "X".to_string(),
            buffer_internal: true, buffer_five: false, buffer_ten: false,
        });

        let q = build_where_clause( &options, &tables, QueryStyle::Literal);
        assert_eq!( q.text, format!("{DATE_CLAUSE} and {}", isect(table)));
    }
}

#[test]
fn test_clause_order_is_deterministic () {
    let tables = test_tables();
    let mut options = base_options();
    options.satellites = Some( vec!["AQUA_M-T".to_string()]);
    options.biomes = Some( vec!["Cerrado".to_string()]);
    options.continent = Some( "8".to_string());
    options.countries = Some( vec!["33".to_string(), "76".to_string()]);
    options.cities = Some( vec!["3304557".to_string()]);
    options.extent = Some( [-74.0, -34.0, -28.85, 5.27]);
    options.risk = Some( RiskBand::High);
    options.protected_area = Some( ProtectedAreaFilter {
        kind: ProtectedAreaKind::UCE, id: 7, ngo: "X".to_string(),
        buffer_internal: false, buffer_five: true, buffer_ten: false,
    });
    options.industrial_fires = false;

    let q = build_where_clause( &options, &tables, QueryStyle::Literal);
    assert_eq!( q.text, format!(
        "{DATE_CLAUSE} and satelite in ('AQUA_M-T') and bioma in ('Cerrado') and id_0 = '8' \
         and pais in ('33','76') and municipio in ('3304557') \
         and ST_Intersects(geom, ST_MakeEnvelope(-74, -34, -28.85, 5.27, 4326)) \
         and risco between 0.7 and 0.95 \
         and ({} and not {}) \
         and id_foco_industrial is null",
        isect("public.uce_5km"), isect("public.uce")
    ));
}

#[test]
fn test_positional_and_literal_styles_are_equivalent () {
    // same options compiled under both styles must yield the same logical predicate -
    // substituting the positional parameters into their placeholders reproduces the
    // literal rendering
    let tables = test_tables();
    let mut options = base_options();
    options.satellites = Some( vec!["AQUA_M-T".to_string(), "TERRA_M".to_string()]);
    options.biomes = Some( vec!["Amazônia".to_string()]);
    options.countries = Some( vec!["33".to_string()]);
    options.states = Some( vec!["RJ".to_string()]);
    options.special_regions = Some( vec!["1".to_string()]);
    options.cities = Some( vec!["O'Higgins".to_string()]);
    options.extent = Some( [-74.0, -34.0, -28.85, 5.27]);
    options.risk = Some( RiskBand::Medium);
    options.protected_area = Some( ProtectedAreaFilter {
        kind: ProtectedAreaKind::TI, id: 42, ngo: "FUNAI".to_string(),
        buffer_internal: true, buffer_five: false, buffer_ten: true,
    });
    options.industrial_fires = false;

    let positional = build_where_clause( &options, &tables, QueryStyle::Positional);
    let literal = build_where_clause( &options, &tables, QueryStyle::Literal);

    assert!( !positional.params.is_empty());
    assert_eq!( substitute( &positional), literal.text);
}

#[test]
fn test_select_list_per_format () {
    let tables = test_tables();
    let mut options = base_options();

    // spatial formats carry the geometry column, CSV does not
    assert_eq!( build_select_list( &options, &tables, ExportFormat::GeoJson),
        "longitude, latitude, data_hora_gmt, satelite, geom");
    assert_eq!( build_select_list( &options, &tables, ExportFormat::Csv),
        "longitude, latitude, data_hora_gmt, satelite");

    // comma decimal separator rewrites the numeric columns, CSV only
    options.decimal_separator = DecimalSeparator::Comma;
    assert_eq!( build_select_list( &options, &tables, ExportFormat::Csv),
        "replace(cast(longitude as varchar), '.', ',') as longitude, \
         replace(cast(latitude as varchar), '.', ',') as latitude, \
         data_hora_gmt, satelite");
    assert_eq!( build_select_list( &options, &tables, ExportFormat::Kml),
        "longitude, latitude, data_hora_gmt, satelite, geom");
}

#[test]
fn test_export_query_shape () {
    let tables = test_tables();
    let q = build_export_query( &base_options(), &tables, ExportFormat::Csv);

    assert_eq!( q, format!("select longitude, latitude, data_hora_gmt, satelite from public.focos {DATE_CLAUSE}"));
}

#[test]
fn test_exists_query_shape () {
    let tables = test_tables();
    let mut options = base_options();
    options.satellites = Some( vec!["AQUA_M-T".to_string()]);

    let q = build_exists_query( &options, &tables);
    assert_eq!( q.text,
        "select 1 from public.focos where (data_hora_gmt between $1 and $2) and satelite in ($3) limit 1");
    assert_eq!( q.params.len(), 3);
}
