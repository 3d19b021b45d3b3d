//! Presentation data and the plain-text table renderer.
//!
//! Reconciliation and settings code only ever produce a neutral
//! [`TableData`] value (ordered columns, ordered rows of strings); turning
//! that into text is a separate consumer. Swapping the renderer can never
//! change what was scanned or diffed.

use lanwatch_core::{HostRecord, Settings};

/// An ordered, untyped table: column names plus rows of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Build the host table, resolving MAC aliases from the settings snapshot.
pub fn host_table(hosts: &[HostRecord], settings: &Settings) -> TableData {
    let rows = hosts
        .iter()
        .map(|h| {
            let alias = h
                .mac
                .as_deref()
                .and_then(|mac| settings.alias_for(mac))
                .unwrap_or("");
            vec![
                h.address.clone(),
                h.hostname.clone(),
                h.mac.clone().unwrap_or_default(),
                alias.to_string(),
                h.status.as_str().to_string(),
            ]
        })
        .collect();

    TableData {
        columns: vec!["Host", "Hostname", "MAC", "Alias", "Status"],
        rows,
    }
}

/// Build the configuration table with effective values.
pub fn config_table(settings: &Settings) -> TableData {
    TableData {
        columns: vec!["Key", "Value"],
        rows: settings
            .config_entries()
            .into_iter()
            .map(|(k, v)| vec![k.to_string(), v])
            .collect(),
    }
}

/// Build the alias table. Indices follow stored key order and are the
/// handle for `alias remove`.
pub fn alias_table(settings: &Settings) -> TableData {
    TableData {
        columns: vec!["Index", "MAC", "Alias"],
        rows: settings
            .alias
            .iter()
            .enumerate()
            .map(|(i, (mac, label))| vec![i.to_string(), mac.clone(), label.clone()])
            .collect(),
    }
}

/// Render a table as aligned plain text: header row, dashed rule, then one
/// line per row, each cell right-padded to its column width.
pub fn render(table: &TableData) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    render_row(&mut out, table.columns.iter().map(|c| *c), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    render_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &table.rows {
        render_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn render_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, w)| pad_right(cell, *w))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn pad_right(s: &str, width: usize) -> String {
    format!("{s:<width$}")
}

#[cfg(test)]
mod tests {
    use lanwatch_core::{HostStatus, SettingsStore};

    use super::*;

    fn sample_host() -> HostRecord {
        HostRecord {
            address: "192.168.1.1".to_string(),
            hostname: "gateway.local".to_string(),
            mac: Some("AA:BB:CC:DD:EE:FF".to_string()),
            status: HostStatus::Up,
        }
    }

    #[test]
    fn test_host_table_resolves_alias() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("lanwatch.toml"));
        let settings = store.add_alias("aa:bb:cc:dd:ee:ff", "router").unwrap();

        let table = host_table(&[sample_host()], &settings);
        assert_eq!(table.columns, vec!["Host", "Hostname", "MAC", "Alias", "Status"]);
        assert_eq!(
            table.rows[0],
            vec![
                "192.168.1.1".to_string(),
                "gateway.local".to_string(),
                "AA:BB:CC:DD:EE:FF".to_string(),
                "router".to_string(),
                "up".to_string(),
            ]
        );
    }

    #[test]
    fn test_host_without_mac_has_empty_cells() {
        let settings = Settings::default();
        let host = HostRecord {
            mac: None,
            ..sample_host()
        };

        let table = host_table(&[host], &settings);
        assert_eq!(table.rows[0][2], "");
        assert_eq!(table.rows[0][3], "");
    }

    #[test]
    fn test_alias_table_indices_follow_stored_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("lanwatch.toml"));
        store.add_alias("BB:00:00:00:00:02", "second").unwrap();
        let settings = store.add_alias("AA:00:00:00:00:01", "first").unwrap();

        let table = alias_table(&settings);
        // BTreeMap order, not insertion order.
        assert_eq!(table.rows[0], vec!["0", "AA:00:00:00:00:01", "first"]);
        assert_eq!(table.rows[1], vec!["1", "BB:00:00:00:00:02", "second"]);
    }

    #[test]
    fn test_render_aligns_columns() {
        let table = TableData {
            columns: vec!["Key", "Value"],
            rows: vec![
                vec!["BASE_IP_NMAP".to_string(), "192.168.1.0".to_string()],
                vec!["NUM_ATTEMPTS".to_string(), "3".to_string()],
            ],
        };

        let text = render(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Key           Value");
        assert_eq!(lines[1], "------------  -----------");
        assert_eq!(lines[2], "BASE_IP_NMAP  192.168.1.0");
        assert_eq!(lines[3], "NUM_ATTEMPTS  3");
    }
}
