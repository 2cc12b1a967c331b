//! Reload command for rebuilding the usage snapshot from the course catalog.

use std::io::Write;

use anyhow::{Context, Result};
use ru_catalog::{CatalogClient, CrawlReport};
use ru_core::Registry;

use crate::Config;
use crate::commands::util;

/// Source recorded for snapshots built by this command.
const SOURCE: &str = "catalog";

/// Crawls the catalog, saves the rebuilt registry, and returns it.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<Registry> {
    let client = CatalogClient::new(config.catalog.clone()).context("failed to create catalog client")?;

    writeln!(writer, "Contacting {} for term {}", config.catalog.base_url, config.catalog.term)?;
    writer.flush()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let report = runtime
        .block_on(client.crawl())
        .context("failed to crawl course catalog")?;

    let registry = util::build_registry(&report.records)?;
    let blocks = util::save_registry(config, &registry, SOURCE)?;
    write!(writer, "{}", summary(&report, &registry, blocks))?;
    Ok(registry)
}

fn summary(report: &CrawlReport, registry: &Registry, blocks: usize) -> String {
    let mut lines = vec![format!(
        "Scanned {} departments: {} records, {} buildings, {} rooms, {blocks} blocks.",
        report.pages,
        report.records.len(),
        registry.building_count(),
        registry.room_count(),
    )];
    if !report.failed.is_empty() {
        lines.push(format!(
            "Failed to fetch {} departments: {}",
            report.failed.len(),
            report.failed.join(", ")
        ));
    }
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{BufRead, BufReader};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use insta::assert_snapshot;
    use ru_catalog::CatalogConfig;
    use ru_core::{Interval, MinuteOfDay, UsageRecord, Weekday};

    const INDEX_PAGE: &str = r#"<select name="dept">
<option selected="selected" value="">Select a Department</OPTION>
<option value="ACCT ">ACCT - Accounting</option>
<option value="BAD  ">BAD - Broken</option>
</select>"#;

    const ACCT_PAGE: &str = r#"<tr>
<td align="left"> M W 9:00am-9:50am </td> <td align="left"> CARVER 0204 </td>
<td align="left"> M 10:00am-10:50am </td> <td align="left"> CARVER 0204 </td>
</tr>"#;

    /// Serves a two-department catalog on a local port; `BAD` always fails.
    fn serve_catalog() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                thread::spawn(move || respond(stream));
            }
        });
        format!("http://{addr}")
    }

    fn respond(mut stream: TcpStream) {
        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut header = String::new();
        while reader.read_line(&mut header).unwrap() > 2 {
            header.clear();
        }

        let path = request_line.split_whitespace().nth(1).unwrap_or("/");
        let (status, body) = if path.starts_with("/index.jsp") {
            ("200 OK", INDEX_PAGE)
        } else if path.contains("dept=ACCT") {
            ("200 OK", ACCT_PAGE)
        } else {
            ("500 Internal Server Error", "")
        };
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
    }

    fn report(failed: &[&str]) -> CrawlReport {
        CrawlReport {
            records: vec![UsageRecord {
                building: "CARVR".to_string(),
                room: "0204".to_string(),
                days: [Weekday::Monday, Weekday::Wednesday].into(),
                start: MinuteOfDay::new(540).unwrap(),
                end: MinuteOfDay::new(590).unwrap(),
            }],
            pages: 12,
            failed: failed.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn summary_counts_records_and_blocks() {
        let report = report(&[]);
        let registry = util::build_registry(&report.records).unwrap();
        assert_snapshot!(
            summary(&report, &registry, registry.block_count()),
            @"Scanned 12 departments: 1 records, 1 buildings, 1 rooms, 2 blocks."
        );
    }

    #[test]
    fn summary_lists_failed_departments() {
        let report = report(&["ACCT", "COM S"]);
        let registry = util::build_registry(&report.records).unwrap();
        assert_snapshot!(summary(&report, &registry, 2), @r"
        Scanned 12 departments: 1 records, 1 buildings, 1 rooms, 2 blocks.
        Failed to fetch 2 departments: ACCT, COM S
        ");
    }

    #[test]
    fn reload_saves_crawled_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("usage.db"),
            catalog: CatalogConfig {
                base_url: serve_catalog(),
                concurrency: 1,
                ..CatalogConfig::default()
            },
        };

        let mut output = Vec::new();
        let registry = run(&mut output, &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("for term S2013"), "{output}");
        assert!(
            output.contains("Scanned 1 departments: 2 records, 1 buildings, 1 rooms, 2 blocks."),
            "{output}"
        );
        assert!(output.contains("Failed to fetch 1 departments: BAD"), "{output}");

        let saved = util::load_registry(&config).unwrap();
        assert_eq!(saved, registry);
        let monday = saved
            .query_usage("CARVER", "0204", Weekday::Monday, Interval::FULL_DAY)
            .unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].to_string(), "9:00am-10:50am");

        let db = util::open_database(&config).unwrap();
        assert_eq!(db.snapshot_info().unwrap().unwrap().source, "catalog");
    }
}
