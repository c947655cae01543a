//! Plain-text rendering for the terminal.

use handlescan_registry::{ProbeDefinition, Registry};
use handlescan_scanner::{Bucket, ScanReport};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render a scan report as a human-readable summary.
pub fn render_report(report: &ScanReport, show_absent: bool) -> String {
    let result = &report.result;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Account: {} (scan {}, {} sites, {} ms)",
        report.account, report.scan_id, report.sites_selected, report.elapsed_ms
    );

    write_bucket(&mut out, "Present", result.bucket(Bucket::Present));
    write_bucket(&mut out, "Indeterminate", result.bucket(Bucket::Indeterminate));

    if show_absent {
        write_bucket(&mut out, "Absent", result.bucket(Bucket::Absent));
    } else {
        let _ = writeln!(out, "\nAbsent: {}", result.absent.len());
    }

    if result.failure_count > 0 {
        let _ = writeln!(
            out,
            "\n{} of {} probes failed (timeouts or transport errors)",
            result.failure_count, result.total_sites
        );
    }

    out
}

fn write_bucket(out: &mut String, title: &str, sites: &BTreeMap<String, String>) {
    let _ = writeln!(out, "\n{title} ({})", sites.len());

    let width = sites.keys().map(String::len).max().unwrap_or(0);
    for (site, url) in sites {
        let _ = writeln!(out, "  {site:<width$}  {url}");
    }
}

/// Render registry statistics, or the sites of one category.
pub fn render_sites(registry: &Registry, category: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(category) = category {
        let sites = registry.get_by_category(category);
        let _ = writeln!(out, "{} sites in category {category}", sites.len());
        for site in &sites {
            let flag = if site.valid { "" } else { " (not valid)" };
            let _ = writeln!(out, "  {}{flag}  {}", site.name, site.check_uri);
        }
        if sites.is_empty() {
            let _ = writeln!(out, "Known categories: {}", registry.categories().join(", "));
        }
        return out;
    }

    let _ = writeln!(
        out,
        "{} sites ({} flagged not valid)",
        registry.count(),
        registry.invalid_count()
    );

    for (category, count) in registry.count_by_category() {
        let label = if category.is_empty() {
            "(uncategorized)"
        } else {
            category.as_str()
        };
        let _ = writeln!(out, "  {label}: {count}");
    }

    if !registry.license().is_empty() {
        let _ = writeln!(out, "License: {}", registry.license().join(" "));
    }
    if !registry.authors().is_empty() {
        let _ = writeln!(out, "Authors: {}", registry.authors().join(", "));
    }

    out
}

/// Render every field of one site definition.
pub fn render_site(site: &ProbeDefinition) -> String {
    let mut out = String::new();
    let code = |code: Option<u16>| code.map_or_else(|| "-".to_string(), |c| c.to_string());

    let _ = writeln!(out, "{}", site.name);
    let _ = writeln!(out, "  check URL:      {}", site.check_uri);
    let _ = writeln!(out, "  category:       {}", site.category);
    let _ = writeln!(out, "  valid:          {}", site.valid);
    let _ = writeln!(
        out,
        "  exists marker:  {:?} (status {})",
        site.exists_marker,
        code(site.exists_code)
    );
    let _ = writeln!(
        out,
        "  missing marker: {:?} (status {})",
        site.missing_marker,
        code(site.missing_code)
    );
    if !site.known_accounts.is_empty() {
        let _ = writeln!(out, "  known accounts: {}", site.known_accounts.join(", "));
    }
    for comment in &site.comments {
        let _ = writeln!(out, "  note: {comment}");
    }

    out
}
