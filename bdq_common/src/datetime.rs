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

use chrono::{DateTime,Local,NaiveDate,NaiveDateTime,NaiveTime,Utc};

use crate::errors::{BdqCommonError,Result};

/// the timestamp format used by the filter/export transport
pub const TRANSPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// parse a `YYYY-MM-DD HH:MM:SS` transport timestamp. A bare `YYYY-MM-DD` date is
/// accepted and resolves to midnight
pub fn parse_transport_datetime (s: &str)->Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str( s, TRANSPORT_DATETIME_FORMAT).ok()
        .or_else( || NaiveDate::parse_from_str( s, "%Y-%m-%d").ok().map( |d| d.and_time( NaiveTime::MIN)))
        .ok_or_else( || BdqCommonError::DatetimeError( format!("not a valid timestamp: {s:?}")))
}

/// the `YYYY-MM-DD` part of a `NaiveDateTime`
pub fn date_string (dt: &NaiveDateTime)->String {
    dt.format("%Y-%m-%d").to_string()
}

pub fn local_date_string ()->String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub fn local_time_string ()->String {
    Local::now().format("%H:%M:%S").to_string()
}

pub fn local_now ()->DateTime<Local> {
    Local::now()
}

pub fn utc_now ()->DateTime<Utc> {
    Utc::now()
}
