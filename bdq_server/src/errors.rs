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

pub type Result<T> = std::result::Result<T, BdqServerError>;

#[derive(Error,Debug)]
pub enum BdqServerError {

    #[error("BDQ common error {0}")]
    BdqCommonError( #[from] bdq_common::errors::BdqCommonError),

    #[error("BDQ export error {0}")]
    BdqExportError( #[from] bdq_export::errors::BdqExportError),

    #[error("IO error {0}")]
    IoError( #[from] std::io::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

pub fn op_failed (msg: impl ToString)->BdqServerError {
    BdqServerError::OpFailedError(msg.to_string())
}
