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

use std::fs::{self,File};
use std::io::{self,Error as IOError,ErrorKind};
use std::path::{Path,PathBuf};

use crate::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn extension<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().extension().and_then(|ostr| ostr.to_str())
}

pub fn file_length <P: AsRef<Path>> (path: P) -> Option<u64> {
    fs::metadata(path).ok().map( |meta| meta.len() )
}

pub fn path_to_lossy_string (path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().as_ref().to_string()
}

pub fn file_contents (path: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read( path.as_ref())
}

/// create dir (including parents) if it does not exist yet - a pre-existing dir is not an error
pub fn ensure_dir (path: impl AsRef<Path>)->io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(ErrorKind::PermissionDenied, "dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

/// remove a file, directory tree or symlink bottom-up.
/// A path that does not exist (anymore) is Ok - there is nothing left to remove.
/// Symlink entries are unlinked, never followed, i.e. the removal cannot escape `path`
pub fn remove_tree (path: impl AsRef<Path>)->Result<()> {
    let path = path.as_ref();

    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e)
    };

    if meta.is_dir() {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match fs::symlink_metadata( entry.path()) {
                Ok(emeta) => {
                    if emeta.is_dir() {
                        remove_tree( entry.path())?;
                    } else { // regular files and symlinks alike
                        ok_if_missing( fs::remove_file( entry.path()))?;
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {} // somebody else was faster
                Err(e) => return Err(e)
            }
        }
        ok_if_missing( fs::remove_dir(path))

    } else {
        ok_if_missing( fs::remove_file(path))
    }
}

fn ok_if_missing (res: io::Result<()>)->io::Result<()> {
    match res {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other
    }
}

/// collect the regular files under `dir`, recursing into sub-directories (symlinks are not followed)
pub fn regular_files_in_tree (dir: impl AsRef<Path>)->Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    collect_regular_files( dir.as_ref(), &mut list)?;
    Ok(list)
}

fn collect_regular_files (dir: &Path, list: &mut Vec<PathBuf>)->Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let meta = fs::symlink_metadata(&path)?;
            if meta.is_dir() {
                collect_regular_files( &path, list)?;
            } else if meta.is_file() {
                list.push( path);
            }
        }
    }
    Ok(())
}
