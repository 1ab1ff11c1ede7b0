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

/// split a comma separated transport list into its trimmed, non-empty elements
pub fn split_comma_list (s: &str)->Vec<String> {
    s.split(',')
        .map( |e| e.trim())
        .filter( |e| !e.is_empty())
        .map( |e| e.to_string())
        .collect()
}

/// quote a string as a SQL literal - embedded single quotes are doubled.
/// Only for values that cannot go through driver-level parameter binding (e.g. SQL
/// text that is handed to an external tool on its command line)
pub fn sql_quote (s: &str)->String {
    let mut q = String::with_capacity( s.len() + 2);
    q.push('\'');
    for c in s.chars() {
        if c == '\'' { q.push('\'') }
        q.push(c);
    }
    q.push('\'');
    q
}
