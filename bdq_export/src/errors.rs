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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BdqExportError>;

#[derive(Error,Debug)]
pub enum BdqExportError {

    /// rejected before any SQL or subprocess work (malformed dates, unknown formats etc.)
    #[error("invalid export request: {0}")]
    InvalidRequestError(String),

    #[error("BDQ common error {0}")]
    BdqCommonError( #[from] bdq_common::errors::BdqCommonError),

    #[error("IO error {0}")]
    IoError( #[from] std::io::Error),

    #[error("database error {0}")]
    DatabaseError( #[from] sqlx::Error),

    #[error("archive error {0}")]
    ArchiveError( #[from] zip::result::ZipError),

    #[error("execution failed {0}")]
    ExecError(String),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

pub fn invalid_request (msg: impl ToString)->BdqExportError {
    BdqExportError::InvalidRequestError(msg.to_string())
}

pub fn exec_error (msg: impl ToString)->BdqExportError {
    BdqExportError::ExecError(msg.to_string())
}

pub fn op_failed (msg: impl ToString)->BdqExportError {
    BdqExportError::OpFailedError(msg.to_string())
}
