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
#![allow(unused)]

use bdq_common::datetime::parse_transport_datetime;
use bdq_common::strings::{split_comma_list,sql_quote};

#[test]
fn test_split_comma_list () {
    assert_eq!( split_comma_list("AQUA,TERRA"), vec!["AQUA".to_string(), "TERRA".to_string()]);
    assert_eq!( split_comma_list(" AQUA , TERRA "), vec!["AQUA".to_string(), "TERRA".to_string()]);
    assert_eq!( split_comma_list("AQUA,,TERRA,"), vec!["AQUA".to_string(), "TERRA".to_string()]);
    assert!( split_comma_list("").is_empty());
    assert!( split_comma_list(" , ,").is_empty());
}

#[test]
fn test_sql_quote () {
    assert_eq!( sql_quote("AQUA_M-T"), "'AQUA_M-T'");
    assert_eq!( sql_quote("O'Higgins"), "'O''Higgins'");
    assert_eq!( sql_quote(""), "''");
}

#[test]
fn test_parse_transport_datetime () {
    let dt = parse_transport_datetime("2020-01-31 23:59:59").unwrap();
    assert_eq!( dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-31 23:59:59");

    // a bare date resolves to midnight
    let dt = parse_transport_datetime("2020-01-31").unwrap();
    assert_eq!( dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-31 00:00:00");

    assert!( parse_transport_datetime("31/01/2020").is_err());
    assert!( parse_transport_datetime("").is_err());
}
