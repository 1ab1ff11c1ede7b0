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

//! the BDQ export server binary: load configs, connect the database pool and serve

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use bdq_common::ron::load_ron_file;
use bdq_export::{DbConfig,ExportConfig,TablesConfig};
use bdq_export::job::ExportService;
use bdq_server::{BdqServer,ServerConfig};

#[derive(Parser,Debug)]
#[command(about="BDQ fires database export server")]
struct Args {
    /// directory holding server.ron, db.ron, tables.ron and export.ron
    #[arg(long, default_value="config")]
    config_dir: PathBuf,

    /// override the configured server port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main ()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env()) // use RUST_LOG to set max level
        .init();

    let args = Args::parse();

    let mut server_config: ServerConfig = load_ron_file( args.config_dir.join("server.ron"))?;
    let db_config: DbConfig = load_ron_file( args.config_dir.join("db.ron"))?;
    let tables_config: TablesConfig = load_ron_file( args.config_dir.join("tables.ron"))?;
    let export_config: ExportConfig = load_ron_file( args.config_dir.join("export.ron"))?;

    if let Some(port) = args.port {
        server_config.sock_addr.set_port( port);
    }

    let pool = PgPoolOptions::new()
        .max_connections( db_config.max_connections)
        .connect( &db_config.pool_url()).await?;

    let service = Arc::new( ExportService::new( export_config, tables_config, db_config, pool));
    service.workspace().ensure_root()?;

    let server = BdqServer::new( server_config, "bdq", service);
    println!("serving fires exports on {}/{}", server.url(), server.name());

    server.spawn().await?;
    Ok(())
}
