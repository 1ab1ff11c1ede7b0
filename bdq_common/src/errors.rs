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

pub type Result<T> = std::result::Result<T, BdqCommonError>;

#[derive(Error,Debug)]
pub enum BdqCommonError {

    #[error("IO error {0}")]
    IoError( #[from] std::io::Error),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("datetime error {0}")]
    DatetimeError(String),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

pub fn op_failed (msg: impl ToString)->BdqCommonError {
    BdqCommonError::OpFailedError(msg.to_string())
}

pub fn config_error (msg: impl ToString)->BdqCommonError {
    BdqCommonError::ConfigError(msg.to_string())
}
