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

//! the BDQ serving surface: a websocket endpoint for export and existence-check
//! requests (answered with progress and terminal events on the same connection) plus
//! the artifact download route

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{connect_info::ConnectInfo, ws::{Message,WebSocket,WebSocketUpgrade}, Path as AxumPath},
    http::{header,HeaderMap,StatusCode},
    response::{IntoResponse,Response},
    routing::{get,Router},
};
use bytes::Bytes;
use futures::{sink::SinkExt, stream::{self,StreamExt}};
use serde::{Serialize,Deserialize};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tokio_util::io::ReaderStream;
use tracing::{debug,error,info,warn};

use bdq_common::fs::extension;
use bdq_export::job::{ExportEvent,ExportService};
use bdq_export::workspace::Workspace;

pub mod protocol;
pub use protocol::{WsRequest,WsResponse,GenerateFilePayload};

pub mod ip;

pub mod errors;
use errors::Result;

#[derive(Deserialize,Serialize,Debug)]
pub struct ServerConfig {
    pub sock_addr: SocketAddr,
}

impl ServerConfig {
    pub fn url (&self)->String {
        format!("http://{}", self.sock_addr)
    }
}

pub struct BdqServer {
    config: ServerConfig,
    name: String,
    service: Arc<ExportService>,
}

impl BdqServer {
    pub fn new (config: ServerConfig, name: impl ToString, service: Arc<ExportService>)->Self {
        BdqServer { config, name: name.to_string(), service }
    }

    pub fn url (&self)->String { self.config.url() }
    pub fn name (&self)->&str { self.name.as_str() }

    pub fn spawn (&self)->JoinHandle<()> {
        let router = self.build_router();
        spawn_server_task( &self.config, router)
    }

    fn build_router (&self)->Router {
        Router::new()
            .route( &format!("/{}/ws", self.name.as_str()), get( {
                let service = self.service.clone();
                move |ws: WebSocketUpgrade, ci: ConnectInfo<SocketAddr>, headers: HeaderMap| { ws_handler( ws, ci, headers, service) }
            }))
            .route( &format!("/{}/export/{{token}}/{{file}}", self.name.as_str()), get( {
                let service = self.service.clone();
                move |path: AxumPath<(String,String)>| { download_handler( path, service) }
            }))
            .route( &format!("/{}/health", self.name.as_str()), get( || async { "ok" }))
    }
}

pub fn spawn_server_task (config: &ServerConfig, router: Router)->JoinHandle<()> {
    let sock_addr = config.sock_addr.clone();
    let router_svc = router.into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn( async move {
        let listener = TcpListener::bind(sock_addr).await.unwrap();
        axum::serve( listener, router_svc).await.unwrap();
    })
}

/* #region websocket handling ********************************************************************/

async fn ws_handler (ws: WebSocketUpgrade, ConnectInfo(addr): ConnectInfo<SocketAddr>, headers: HeaderMap, service: Arc<ExportService>)->Response {
    // the proxy headers are only available here, before the upgrade
    let requester_ip = ip::resolve_requester_ip( &headers, &addr);
    ws.on_upgrade( move |socket| handle_socket( socket, requester_ip, service)).into_response()
}

async fn handle_socket (ws: WebSocket, requester_ip: String, service: Arc<ExportService>) {
    let (mut ws_sender, mut ws_receiver) = ws.split();
    let (out_tx, mut out_rx) = mpsc::channel::<WsResponse>(64);

    // one sender task per connection - progress events of concurrently running jobs and
    // direct responses are serialized through the same outbound channel
    let sender_task = tokio::spawn( async move {
        while let Some(response) = out_rx.recv().await {
            match serde_json::to_string( &response) {
                Ok(json) => {
                    if ws_sender.send( Message::text(json)).await.is_err() { break }
                }
                Err(e) => error!("failed to serialize ws response: {e}")
            }
        }
    });

    info!("client connected: {}", requester_ip);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if let Ok(text) = msg.into_text() {
            if text.is_empty() { continue }

            match serde_json::from_str::<WsRequest>( &text) {
                Ok(request) => dispatch_request( request, &requester_ip, &service, &out_tx).await,
                Err(e) => warn!("ignoring unparseable ws message from {}: {e}", requester_ip)
            }
        }
    }

    // connection closed. Running jobs keep going to completion - their events are
    // simply never delivered
    info!("client disconnected: {}", requester_ip);
    drop(out_tx);
    let _ = sender_task.await;
}

async fn dispatch_request (request: WsRequest, requester_ip: &str, service: &Arc<ExportService>, out_tx: &mpsc::Sender<WsResponse>) {
    match request {
        WsRequest::GenerateFileRequest(req) => {
            let (event_tx, mut event_rx) = mpsc::channel::<ExportEvent>(64);

            // bridge job events onto this connection's outbound channel
            let forward_out = out_tx.clone();
            tokio::spawn( async move {
                while let Some(event) = event_rx.recv().await {
                    if forward_out.send( WsResponse::from(event)).await.is_err() { break }
                }
            });

            match service.start_export( &req, requester_ip, event_tx).await {
                Ok(handle) => debug!("export {} started for {}", handle.token, requester_ip),
                Err(e) => {
                    // validation/resource errors surface synchronously
                    warn!("rejected export request of {}: {e}", requester_ip);
                    let _ = out_tx.send( WsResponse::ExportFailed { reason: e.to_string() }).await;
                }
            }
        }

        WsRequest::ExistsDataToExportRequest(req) => {
            let exists = match service.exists_data( &req).await {
                Ok(exists) => exists,
                Err(e) => {
                    warn!("existence check of {} failed: {e}", requester_ip);
                    false
                }
            };
            let _ = out_tx.send( WsResponse::ExistsDataToExportResponse { exists_data_to_export: exists }).await;
        }
    }
}

/* #endregion websocket handling */

/* #region artifact download *********************************************************************/

async fn download_handler (AxumPath((token,file)): AxumPath<(String,String)>, service: Arc<ExportService>)->Response {
    let workspace = service.workspace();

    let dir = match workspace.dir_of( &token) {
        Ok(dir) => dir,
        Err(e) => return (StatusCode::BAD_REQUEST, "invalid download token").into_response()
    };
    if file.contains('/') || file.contains('\\') || file.contains("..") {
        return (StatusCode::BAD_REQUEST, "invalid file name").into_response()
    }

    artifact_response( dir.join( &file), file, token, workspace.clone()).await
}

/// serve the export artifact as an attachment. The scratch dir is removed once the
/// response body has been fully produced - the delivered bytes are taken before the
/// deletion, never a reference into the deleted directory
async fn artifact_response (path: PathBuf, fname: String, token: String, workspace: Workspace)->Response {
    if !path.is_file() {
        return (StatusCode::NOT_FOUND, "no such export").into_response()
    }

    let mut headers = HeaderMap::new();
    headers.insert( header::CONTENT_TYPE, mime_type_for( &path).parse().unwrap());
    headers.insert( header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", fname).parse().unwrap());

    match tokio::fs::File::open( &path).await {
        Ok(file) => {
            let cleanup = stream::once( async move {
                if let Err(e) = workspace.remove_dir( &token) {
                    warn!("failed to remove served scratch dir {}: {e}", token);
                }
                Ok::<Bytes,std::io::Error>( Bytes::new())
            });
            let stream = ReaderStream::new(file).chain( cleanup);

            (StatusCode::OK, headers, Body::from_stream(stream)).into_response()
        }
        Err(e) => {
            error!("cannot open export artifact {:?}: {e}", path);
            (StatusCode::INTERNAL_SERVER_ERROR, "export artifact unreadable").into_response()
        }
    }
}

fn mime_type_for (path: &PathBuf)->&'static str {
    match extension( path) {
        Some("zip") => "application/zip",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("kml") => "application/vnd.google-earth.kml+xml",
        _ => "application/octet-stream"
    }
}

/* #endregion artifact download */
