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

//! zip bundling of export outputs. Archives are flat ("junk paths") - entry names are
//! the plain filenames no matter how deep the source files sit in the scratch dir

use std::fs::File;
use std::io;
use std::path::Path;

use zip::write::{SimpleFileOptions,ZipWriter};
use zip::CompressionMethod;

use bdq_common::fs::{filename,regular_files_in_tree};

use crate::errors::{op_failed,Result};

/// zip all regular files under `dir` (recursively) into the flat archive `out`.
/// `out` may live inside `dir` - the archive never includes itself
pub fn zip_dir_flat (dir: &Path, out: &Path)->Result<()> {
    let mut files = regular_files_in_tree( dir)?;
    files.retain( |p| p != out);

    let file = File::create( out)?;
    let mut zip = ZipWriter::new( file);
    let opts = SimpleFileOptions::default().compression_method( CompressionMethod::Deflated);

    for path in &files {
        let name = filename( path).ok_or_else( || op_failed( format!("unusable filename {path:?}")))?;
        zip.start_file( name, opts)?;
        let mut src = File::open( path)?;
        io::copy( &mut src, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
