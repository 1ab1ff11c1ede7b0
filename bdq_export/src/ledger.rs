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

//! the downloads audit ledger: one append-only row per export request, written before
//! any subprocess is spawned so that a request is audited even if generation fails
//! later on. Rows are never mutated or deleted here - removal is an admin operation
//! outside this subsystem

use std::sync::Arc;

use chrono::Local;
use sqlx::{PgPool,Postgres};
use sqlx::postgres::PgArguments;

use crate::{
    FilterOptions, TablesConfig,
    filter::{self,SqlParam},
    errors::Result,
};

/// the audit row recorded for one export request
#[derive(Debug,Clone,PartialEq)]
pub struct DownloadRecord {
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    pub requester_ip: String,
    pub filter_begin: chrono::NaiveDateTime,
    pub filter_end: chrono::NaiveDateTime,
    pub satellites: Option<Vec<String>>,
    pub biomes: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
    pub states: Option<Vec<String>>,
    pub cities: Option<Vec<String>>,
    pub formats: String, // comma joined
}

impl DownloadRecord {
    pub fn new (options: &FilterOptions, requester_ip: &str)->Self {
        let now = Local::now();
        let formats: Vec<&str> = options.formats.iter().map( |f| f.name()).collect();

        DownloadRecord {
            date: now.date_naive(),
            time: now.time(),
            requester_ip: requester_ip.to_string(),
            filter_begin: options.date_from,
            filter_end: options.date_to,
            satellites: options.satellites.clone(),
            biomes: options.biomes.clone(),
            countries: options.countries.clone(),
            states: options.states.clone(),
            cities: options.cities.clone(),
            formats: formats.join(","),
        }
    }
}

/// records export requests and answers the existence probe. Connections are checked out
/// from the pool per call and released on every exit path by the pool itself
#[derive(Clone)]
pub struct DownloadLedger {
    pool: PgPool,
    tables: Arc<TablesConfig>,
}

impl DownloadLedger {
    pub fn new (pool: PgPool, tables: Arc<TablesConfig>)->Self {
        DownloadLedger { pool, tables }
    }

    /// single parameterized INSERT. A ledger failure is reported to the caller but is
    /// independent of export success - the caller decides to proceed
    pub async fn record (&self, options: &FilterOptions, requester_ip: &str)->Result<()> {
        let rec = DownloadRecord::new( options, requester_ip);
        let t = &self.tables.downloads;

        let sql = format!(
            "insert into {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            t.qualified_table(),
            t.date_col, t.time_col, t.ip_col,
            t.filter_begin_col, t.filter_end_col,
            t.filter_satellites_col, t.filter_biomes_col, t.filter_countries_col, t.filter_states_col, t.filter_cities_col,
            t.filter_format_col
        );

        sqlx::query( &sql)
            .bind( rec.date)
            .bind( rec.time)
            .bind( &rec.requester_ip)
            .bind( rec.filter_begin)
            .bind( rec.filter_end)
            .bind( &rec.satellites)
            .bind( &rec.biomes)
            .bind( &rec.countries)
            .bind( &rec.states)
            .bind( &rec.cities)
            .bind( &rec.formats)
            .execute( &self.pool).await?;

        Ok(())
    }

    /// does at least one record match the filter - used to gate export availability in the UI
    pub async fn exists_data (&self, options: &FilterOptions)->Result<bool> {
        let q = filter::build_exists_query( options, &self.tables);

        let mut query = sqlx::query_scalar::<_,i32>( &q.text);
        for p in q.params {
            query = bind_scalar_param( query, p);
        }

        Ok( query.fetch_optional( &self.pool).await?.is_some())
    }
}

fn bind_scalar_param<'q> (query: sqlx::query::QueryScalar<'q, Postgres, i32, PgArguments>, p: SqlParam)
    ->sqlx::query::QueryScalar<'q, Postgres, i32, PgArguments>
{
    match p {
        SqlParam::Text(s) => query.bind( s),
        SqlParam::Int(i) => query.bind( i),
        SqlParam::Num(n) => query.bind( n),
    }
}
