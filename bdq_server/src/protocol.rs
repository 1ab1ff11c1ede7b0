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

//! the websocket message protocol: JSON messages tagged by event name, carrying the
//! export/existence request shapes inbound and progress/terminal payloads outbound

use serde::{Serialize,Deserialize};

use bdq_export::job::ExportEvent;
use bdq_export::request::ExportRequest;

#[derive(Deserialize,Debug,Clone)]
#[serde(tag="event", content="data", rename_all="camelCase")]
pub enum WsRequest {
    GenerateFileRequest(ExportRequest),
    ExistsDataToExportRequest(ExportRequest),
}

#[derive(Serialize,Debug,Clone,PartialEq)]
#[serde(tag="event", content="data", rename_all="camelCase")]
pub enum WsResponse {
    GenerateFileResponse(GenerateFilePayload),

    #[serde(rename_all="camelCase")]
    ExportFailed { reason: String },

    #[serde(rename_all="camelCase")]
    ExistsDataToExportResponse { exists_data_to_export: bool },
}

/// progress ticks and the terminal availability notification share the same response
/// event - clients tell them apart by payload shape
#[derive(Serialize,Debug,Clone,PartialEq)]
#[serde(untagged)]
pub enum GenerateFilePayload {
    Progress { progress: f32 },
    Ready { folder: String, file: String },
}

impl From<ExportEvent> for WsResponse {
    fn from (event: ExportEvent)->Self {
        match event {
            ExportEvent::Progress { progress } => WsResponse::GenerateFileResponse( GenerateFilePayload::Progress { progress }),
            ExportEvent::Ready { folder, file } => WsResponse::GenerateFileResponse( GenerateFilePayload::Ready { folder, file }),
            ExportEvent::Failed { reason } => WsResponse::ExportFailed { reason },
        }
    }
}
