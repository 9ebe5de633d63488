//! Derive the AWS service name and region from an endpoint host.

use crate::constants::{AMAZONAWS_COM, DEFAULT_REGION};
use cloudsign_core::{Error, Result};
use log::debug;

/// Global endpoints whose host name carries no region.
const GLOBAL_ENDPOINTS: &[(&str, &str)] = &[
    ("s3.amazonaws.com", "us-east-1"),
    ("s3-external-1.amazonaws.com", "us-east-1"),
    ("iam.amazonaws.com", "us-east-1"),
    ("sts.amazonaws.com", "us-east-1"),
    ("route53.amazonaws.com", "us-east-1"),
    ("cloudfront.amazonaws.com", "us-east-1"),
    ("importexport.amazonaws.com", "us-east-1"),
    ("sdb.amazonaws.com", "us-east-1"),
];

/// Service name and region a request is signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAndRegion {
    /// Service name, e.g. `s3`.
    pub service: String,
    /// Region name, e.g. `us-east-1`.
    pub region: String,
}

impl ServiceAndRegion {
    /// Resolve service and region for `host`.
    ///
    /// Explicit values win; missing ones are parsed from the host. Fails when
    /// no service is given and the host isn't an `amazonaws.com` endpoint.
    pub fn resolve(host: &str, service: Option<&str>, region: Option<&str>) -> Result<Self> {
        let service = match service {
            Some(v) => v.to_string(),
            None => parse_service_name(host).ok_or_else(|| {
                Error::request_invalid(format!(
                    "unable to determine service name from host {host}, configure it explicitly"
                ))
            })?,
        };
        let region = match region {
            Some(v) => v.to_string(),
            None => parse_region_name(host, &service),
        };

        debug!("resolved service {service} and region {region} for host {host}");
        Ok(Self { service, region })
    }
}

/// Parse the service name out of an `amazonaws.com` host.
///
/// S3 virtual-hosted and regional forms (`bucket.s3.amazonaws.com`,
/// `bucket.s3-eu-west-1.amazonaws.com`, `s3-external-1.amazonaws.com`) all
/// yield `s3`. Returns `None` for hosts outside `amazonaws.com`.
pub fn parse_service_name(host: &str) -> Option<String> {
    let host = host.to_ascii_lowercase();
    let fragment = host.strip_suffix(AMAZONAWS_COM)?;

    if fragment.ends_with(".s3") || s3_region(fragment).is_some() {
        return Some("s3".to_string());
    }

    let separator = if fragment.starts_with("s3") { '-' } else { '.' };
    let service = match fragment.find(separator) {
        Some(idx) => &fragment[..idx],
        None => fragment,
    };
    Some(service.to_string())
}

/// Parse the region name out of `host`.
///
/// Rules, first match wins:
///
/// 1. known global endpoints
/// 2. `amazonaws.com` hosts: `*.s3[.-]<region>`, `*.<region>.cloudsearch`,
///    `<service>.<region>`, bare `<service>` → `us-east-1`; `us-gov` means
///    `us-gov-west-1`
/// 3. other hosts: `*<service_hint>[.-]<region>.*`
/// 4. `us-east-1`
pub fn parse_region_name(host: &str, service_hint: &str) -> String {
    let host = host.to_ascii_lowercase();

    if let Some((_, region)) = GLOBAL_ENDPOINTS.iter().find(|(h, _)| *h == host) {
        return region.to_string();
    }

    if let Some(fragment) = host.strip_suffix(AMAZONAWS_COM) {
        return parse_standard_region_name(fragment);
    }

    if !service_hint.is_empty() {
        // CloudSearch domains use the nonstandard `domain.region.cloudsearch.suffix` form.
        if service_hint == "cloudsearch" && !host.starts_with("cloudsearch.") {
            let labels: Vec<&str> = host.split('.').collect();
            if let Some(idx) = labels
                .iter()
                .rposition(|l| *l == "cloudsearch")
                .filter(|idx| *idx > 0 && *idx + 1 < labels.len())
            {
                if is_region_label(labels[idx - 1]) {
                    return labels[idx - 1].to_string();
                }
            }
        }

        if let Some(region) = region_after_service(&host, service_hint) {
            return region.to_string();
        }
    }

    DEFAULT_REGION.to_string()
}

fn parse_standard_region_name(fragment: &str) -> String {
    if let Some(region) = s3_region(fragment) {
        return region.to_string();
    }

    let labels: Vec<&str> = fragment.split('.').collect();
    if labels.len() >= 2
        && labels[labels.len() - 1] == "cloudsearch"
        && is_region_label(labels[labels.len() - 2])
    {
        return labels[labels.len() - 2].to_string();
    }

    let Some((_, region)) = fragment.rsplit_once('.') else {
        // `service.amazonaws.com`
        return DEFAULT_REGION.to_string();
    };

    match region {
        // iam.us-gov.amazonaws.com is a global endpoint of the gov partition.
        "us-gov" => "us-gov-west-1".to_string(),
        // bucket.s3.amazonaws.com
        "s3" => DEFAULT_REGION.to_string(),
        _ => region.to_string(),
    }
}

/// Region of `*.s3-<region>` or `*.s3.<region>`.
fn s3_region(fragment: &str) -> Option<&str> {
    let (prefix, last) = match fragment.rsplit_once('.') {
        Some((prefix, last)) => (Some(prefix), last),
        None => (None, fragment),
    };

    if let Some(region) = last.strip_prefix("s3-") {
        return is_region_label(region).then_some(region);
    }

    let prefix = prefix?;
    let s3 = prefix.rsplit('.').next()?;
    (s3 == "s3" && is_region_label(last)).then_some(last)
}

/// Region in `[*.]<service>[.-]<region>.*`, preferring the rightmost match.
fn region_after_service<'a>(host: &'a str, service: &str) -> Option<&'a str> {
    let mut candidates: Vec<usize> = host.match_indices(service).map(|(i, _)| i).collect();
    candidates.reverse();

    for start in candidates {
        if start > 0 && host.as_bytes()[start - 1] != b'.' {
            continue;
        }
        let rest = &host[start + service.len()..];
        let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix('-')) else {
            continue;
        };
        let Some((region, _)) = rest.split_once('.') else {
            continue;
        };
        if is_region_label(region) {
            return Some(region);
        }
    }

    None
}

fn is_region_label(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
