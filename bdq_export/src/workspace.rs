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

//! the temporary workspace manager: every export job gets an exclusively owned scratch
//! directory under a configured root, named by the job token, and removed once the
//! artifact has been handed over (or the job died)

use std::path::{Path,PathBuf};

use bdq_common::fs::{ensure_dir,ensure_writable_dir,remove_tree};

use crate::errors::{invalid_request,Result};

#[derive(Debug,Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new (root: impl Into<PathBuf>)->Self {
        Workspace { root: root.into() }
    }

    /// called once at startup - the scratch root has to exist and be writable
    pub fn ensure_root (&self)->Result<()> {
        Ok( ensure_writable_dir( &self.root)?)
    }

    /// resolve a token to its scratch dir. Tokens come back from clients on the download
    /// path, so anything that could traverse out of the root is rejected
    pub fn dir_of (&self, token: &str)->Result<PathBuf> {
        if token.is_empty() || !token.chars().all( |c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err( invalid_request( format!("not a valid workspace token: {token:?}")));
        }
        Ok( self.root.join( token))
    }

    /// create the scratch dir for a token - idempotent, a pre-existing dir is not an error
    pub fn create_dir (&self, token: &str)->Result<PathBuf> {
        let dir = self.dir_of( token)?;
        ensure_dir( &dir)?;
        Ok(dir)
    }

    /// remove a file or directory tree under the scratch root. A path that does not
    /// exist (anymore) is a no-op, not an error
    pub fn remove_recursively (&self, path: impl AsRef<Path>)->Result<()> {
        Ok( remove_tree( path)?)
    }

    /// token-addressed removal, used after the artifact was served
    pub fn remove_dir (&self, token: &str)->Result<()> {
        let dir = self.dir_of( token)?;
        self.remove_recursively( &dir)
    }
}
