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

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// resolve the requester address for the download ledger. The service usually sits
/// behind a reverse proxy, so proxy headers take precedence over the peer address:
/// a geoip header first, then the first x-forwarded-for hop, then x-real-ip, and only
/// then the socket peer (with the IPv4-mapped prefix stripped)
pub fn resolve_requester_ip (headers: &HeaderMap, peer: &SocketAddr)->String {
    if let Some(ip) = header_str( headers, "geoip_addr") {
        return ip.to_string()
    }

    if let Some(fwd) = header_str( headers, "x-forwarded-for") {
        if let Some(first) = fwd.split(',').next() {
            let first = first.trim();
            if !first.is_empty() { return first.to_string() }
        }
    }

    if let Some(ip) = header_str( headers, "x-real-ip") {
        return ip.to_string()
    }

    let ip = peer.ip().to_string();
    match ip.strip_prefix("::ffff:") {
        Some(v4) => v4.to_string(),
        None => ip
    }
}

fn header_str<'a> (headers: &'a HeaderMap, name: &str)->Option<&'a str> {
    headers.get( name)
        .and_then( |v| v.to_str().ok())
        .filter( |s| !s.is_empty())
}
