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

use std::{fs,path::Path};

use ron::de::from_bytes;
use serde::de::DeserializeOwned;

use crate::errors::{config_error,Result};

/// load a RON config file into its serde deserializable config struct.
/// Configs are loaded once at startup and injected into components - nothing in BDQ
/// reads ambient config state at runtime
pub fn load_ron_file<T: DeserializeOwned> (path: impl AsRef<Path>)->Result<T> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err( |e| config_error( format!("cannot read config {path:?}: {e}")))?;
    from_bytes( &bytes).map_err( |e| config_error( format!("not a valid config {path:?}: {e}")))
}
