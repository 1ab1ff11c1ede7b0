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

//! the filter predicate builder: compile a [`FilterOptions`] value into a SQL WHERE
//! clause, either with driver-level positional placeholders or with inline-escaped
//! literals (for queries that are handed to the conversion tool on its command line).
//! Both styles produce the same logical predicate.
//!
//! Omitted filter fields contribute nothing to the compiled clause - absence is
//! indistinguishable from "no constraint". Clause order is fixed so that compiled
//! queries are deterministic.

use std::fmt::Write;

use bdq_common::strings::sql_quote;

use crate::{
    ExportFormat, FilterOptions, ProtectedAreaFilter, ProtectedAreaTableConfig, TablesConfig,
    DecimalSeparator,
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum QueryStyle {
    /// `$n` placeholders plus a typed parameter list, for driver-level parameterized calls
    Positional,
    /// values embedded as escaped SQL literals, for subprocess command lines
    Literal,
}

#[derive(Debug,Clone,PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Num(f64),
}

impl SqlParam {
    fn render_literal (&self)->String {
        match self {
            SqlParam::Text(s) => sql_quote(s),
            SqlParam::Int(i) => i.to_string(),
            SqlParam::Num(n) => n.to_string(),
        }
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<SqlParam>, // empty under QueryStyle::Literal
}

/// accumulates clause text and parameters under one placeholder style
struct ClauseWriter {
    style: QueryStyle,
    text: String,
    params: Vec<SqlParam>,
    next: usize, // next positional placeholder index
}

impl ClauseWriter {
    fn new (style: QueryStyle)->Self {
        ClauseWriter { style, text: String::with_capacity(256), params: Vec::new(), next: 1 }
    }

    fn push_str (&mut self, s: &str) {
        self.text.push_str( s);
    }

    fn push_param (&mut self, p: SqlParam) {
        match self.style {
            QueryStyle::Positional => {
                write!( self.text, "${}", self.next);
                self.next += 1;
                self.params.push( p);
            }
            QueryStyle::Literal => {
                self.text.push_str( &p.render_literal());
            }
        }
    }

    fn push_in_list (&mut self, col: &str, values: &[String]) {
        write!( self.text, " and {} in (", col);
        for (i,v) in values.iter().enumerate() {
            if i > 0 { self.text.push(',') }
            self.push_param( SqlParam::Text( v.clone()));
        }
        self.text.push(')');
    }

    fn finish (self)->SqlQuery {
        SqlQuery { text: self.text, params: self.params }
    }
}

/// compile the WHERE clause for the given filter options (starting with the mandatory
/// date range, followed by one `and <clause>` per present optional filter)
pub fn build_where_clause (options: &FilterOptions, tables: &TablesConfig, style: QueryStyle)->SqlQuery {
    let fires = &tables.fires;
    let mut w = ClauseWriter::new( style);

    w.push_str( &format!("where ({} between ", fires.datetime_col));
    w.push_param( SqlParam::Text( options.date_from.format("%Y-%m-%d %H:%M:%S").to_string()));
    w.push_str(" and ");
    w.push_param( SqlParam::Text( options.date_to.format("%Y-%m-%d %H:%M:%S").to_string()));
    w.push_str(")");

    if let Some(satellites) = &options.satellites {
        w.push_in_list( &fires.satellite_col, satellites);
    }

    if let Some(biomes) = &options.biomes {
        w.push_in_list( &fires.biome_col, biomes);
    }

    if let Some(continent) = &options.continent {
        w.push_str( &format!(" and {} = ", fires.continent_col));
        w.push_param( SqlParam::Text( continent.clone()));
    }

    // special regions widen rather than narrow the result: a record matching one of the
    // selected regions is included even if its own country/state is filtered out, so the
    // three conditions are OR-ed inside one group
    if let Some(special_regions) = &options.special_regions {
        w.push_str(" and (");
        let mut first = true;

        if let Some(countries) = &options.countries {
            push_in_group( &mut w, &fires.country_col, countries, &mut first);
        }
        if let Some(states) = &options.states {
            push_in_group( &mut w, &fires.state_col, states, &mut first);
        }

        if !first { w.push_str(" or ") }
        w.push_str( &format!("ST_Intersects({}, (select ST_Union({}) from {} where {} in (",
            fires.geometry_col, tables.special_regions.geometry_col,
            tables.special_regions.qualified_table(), tables.special_regions.id_col));
        for (i,region) in special_regions.iter().enumerate() {
            if i > 0 { w.push_str(",") }
            w.push_param( SqlParam::Text( region.clone()));
        }
        w.push_str(")))");

        w.push_str(")");

    } else {
        if let Some(countries) = &options.countries {
            w.push_in_list( &fires.country_col, countries);
        }
        if let Some(states) = &options.states {
            w.push_in_list( &fires.state_col, states);
        }
    }

    if let Some(cities) = &options.cities {
        w.push_in_list( &fires.city_col, cities);
    }

    if let Some(extent) = &options.extent {
        w.push_str( &format!(" and ST_Intersects({}, ST_MakeEnvelope(", fires.geometry_col));
        for (i,bound) in extent.iter().enumerate() {
            if i > 0 { w.push_str(", ") }
            w.push_param( SqlParam::Num( *bound));
        }
        w.push_str(", 4326))");
    }

    if let Some(risk) = &options.risk {
        w.push_str( &format!(" and {}{}", fires.risk_col, risk.sql_range()));
    }

    if let Some(pa) = &options.protected_area {
        push_protected_area_clause( &mut w, pa, tables);
    }

    // no "explicitly industrial" branch - the flag either excludes industrial records
    // or leaves them unconstrained
    if !options.industrial_fires {
        w.push_str( &format!(" and {} is null", fires.industrial_col));
    }

    w.finish()
}

fn push_in_group (w: &mut ClauseWriter, col: &str, values: &[String], first: &mut bool) {
    if !*first { w.push_str(" or ") }
    *first = false;

    write!( w.text, "{} in (", col);
    for (i,v) in values.iter().enumerate() {
        if i > 0 { w.push_str(",") }
        w.push_param( SqlParam::Text( v.clone()));
    }
    w.push_str(")");
}

/// the buffer-ring combination table. The ring tables store the full buffered polygon
/// (area plus offset), so annuli are expressed as "intersects outer and not inner".
/// All three flags false resolves to the 10km ring, same as all three set
fn push_protected_area_clause (w: &mut ClauseWriter, pa: &ProtectedAreaFilter, tables: &TablesConfig) {
    let pa_tables = tables.protected_area( pa.kind);
    let key = pa.lookup_key();

    let base = pa_tables.base();
    let ring5 = pa_tables.ring_5km();
    let ring10 = pa_tables.ring_10km();

    match (pa.buffer_internal, pa.buffer_five, pa.buffer_ten) {
        (false,true,true) => {
            w.push_str(" and (");
            push_intersects( w, tables, pa_tables, &ring10, &key);
            w.push_str(" and not ");
            push_intersects( w, tables, pa_tables, &base, &key);
            w.push_str(")");
        }
        (true,false,true) => {
            w.push_str(" and (");
            push_intersects( w, tables, pa_tables, &base, &key);
            w.push_str(" or (");
            push_intersects( w, tables, pa_tables, &ring10, &key);
            w.push_str(" and not ");
            push_intersects( w, tables, pa_tables, &ring5, &key);
            w.push_str("))");
        }
        (true,true,false) => {
            w.push_str(" and ");
            push_intersects( w, tables, pa_tables, &ring5, &key);
        }
        (false,false,true) => {
            w.push_str(" and (");
            push_intersects( w, tables, pa_tables, &ring10, &key);
            w.push_str(" and not ");
            push_intersects( w, tables, pa_tables, &ring5, &key);
            w.push_str(")");
        }
        (true,false,false) => {
            w.push_str(" and ");
            push_intersects( w, tables, pa_tables, &base, &key);
        }
        (false,true,false) => {
            w.push_str(" and (");
            push_intersects( w, tables, pa_tables, &ring5, &key);
            w.push_str(" and not ");
            push_intersects( w, tables, pa_tables, &base, &key);
            w.push_str(")");
        }
        (true,true,true) | (false,false,false) => {
            w.push_str(" and ");
            push_intersects( w, tables, pa_tables, &ring10, &key);
        }
    }
}

fn push_intersects (w: &mut ClauseWriter, tables: &TablesConfig, pa_tables: &ProtectedAreaTableConfig, qualified_table: &str, key: &str) {
    w.push_str( &format!("ST_Intersects({}, (select {} from {} where {} = ",
        tables.fires.geometry_col, pa_tables.geometry_col, qualified_table, pa_tables.id_col));
    w.push_param( SqlParam::Text( key.to_string()));
    w.push_str("))");
}

/// the select list for one output format: the configured attribute columns, with the
/// numeric columns rewritten for a comma decimal separator on CSV output, plus the
/// geometry column for spatial formats
pub fn build_select_list (options: &FilterOptions, tables: &TablesConfig, format: ExportFormat)->String {
    let rewrite_decimals = format == ExportFormat::Csv && options.decimal_separator == DecimalSeparator::Comma;

    let mut cols: Vec<String> = Vec::with_capacity( tables.export_cols.len() + 1);
    for col in &tables.export_cols {
        if rewrite_decimals && tables.numeric_cols.contains( col) {
            cols.push( format!("replace(cast({col} as varchar), '.', ',') as {col}"));
        } else {
            cols.push( col.clone());
        }
    }
    if format.is_spatial() {
        cols.push( tables.fires.geometry_col.clone());
    }

    cols.join(", ")
}

/// the full SELECT statement handed to the conversion tool (`-sql` argument) for one
/// output format - necessarily literal style since it crosses a process boundary
pub fn build_export_query (options: &FilterOptions, tables: &TablesConfig, format: ExportFormat)->String {
    let select_list = build_select_list( options, tables, format);
    let where_clause = build_where_clause( options, tables, QueryStyle::Literal);

    format!("select {} from {} {}", select_list, tables.fires.qualified_table(), where_clause.text)
}

/// the existence probe behind the UI's export-button gate: does at least one record
/// match the filter
pub fn build_exists_query (options: &FilterOptions, tables: &TablesConfig)->SqlQuery {
    let where_clause = build_where_clause( options, tables, QueryStyle::Positional);

    SqlQuery {
        text: format!("select 1 from {} {} limit 1", tables.fires.qualified_table(), where_clause.text),
        params: where_clause.params
    }
}
