// ABOUTME: End-to-end planning scenarios without a live database
// ABOUTME: Checks estimate totals and the generated mysqldump exclusions together

use mysql_backup_monitor::config::{ConnectionSettings, DumpConfig};
use mysql_backup_monitor::export::{summarize_table_sizes, DumpPlan, TableSizeEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn config_for(database: &str, ignore_tables: &[&str]) -> DumpConfig {
    DumpConfig {
        connection: ConnectionSettings {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "backup".to_string(),
            password: "secret".to_string(),
            database: database.to_string(),
        },
        ignore_tables: ignore_tables.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_shop_scenario_excludes_logs_everywhere() {
    let config = config_for("shop", &["logs"]);
    let estimate = summarize_table_sizes(
        &config.connection.database,
        vec![
            TableSizeEntry::new("orders", 10.00),
            TableSizeEntry::new("carts", 5.00),
            TableSizeEntry::new("logs", 50.00),
        ],
        &config.ignore_tables,
    );

    assert_eq!(estimate.total_size_mb, 15.00);
    let expected: Vec<(&str, f64)> = vec![("carts", 5.00), ("orders", 10.00)];
    let actual: Vec<(&str, f64)> = estimate
        .per_table
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    assert_eq!(actual, expected);

    let plan = DumpPlan::new(&config, Path::new("/tmp/x.cnf"), PathBuf::from("out.sql"));
    assert_eq!(plan.exclusion_args(), vec!["--ignore-table=shop.logs"]);
    assert_eq!(plan.args.last().map(String::as_str), Some("shop"));
}

#[test]
fn test_single_table_without_ignore_list() {
    let config = config_for("tiny", &[]);
    let estimate = summarize_table_sizes(
        "tiny",
        vec![TableSizeEntry::new("only", 3.33)],
        &config.ignore_tables,
    );

    assert_eq!(estimate.total_size_mb, 3.33);
    assert_eq!(estimate.per_table.len(), 1);
    assert_eq!(estimate.per_table.get("only"), Some(&3.33));

    let plan = DumpPlan::new(&config, Path::new("/tmp/x.cnf"), PathBuf::from("out.sql"));
    assert!(plan.exclusion_args().is_empty());
}

#[test]
fn test_total_is_sum_of_non_excluded_for_many_combinations() {
    let tables: Vec<(&str, f64)> = vec![
        ("a", 1.25),
        ("b", 0.0),
        ("c", 7.5),
        ("d", 12.75),
        ("e", 0.5),
    ];

    // Every subset of the five tables as an exclusion set
    for mask in 0u32..(1 << tables.len()) {
        let excluded: Vec<String> = tables
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, (name, _))| name.to_string())
            .collect();

        let estimate = summarize_table_sizes(
            "db",
            tables.iter().map(|(n, s)| TableSizeEntry::new(*n, *s)),
            &excluded,
        );

        let expected: HashMap<&str, f64> = tables
            .iter()
            .filter(|(n, _)| !excluded.iter().any(|e| e == n))
            .copied()
            .collect();
        let expected_total: f64 = expected.values().sum();

        assert!(
            (estimate.total_size_mb - expected_total).abs() < 1e-9,
            "mask {:05b}",
            mask
        );
        assert_eq!(estimate.per_table.len(), expected.len());
        for (name, size) in &expected {
            assert_eq!(estimate.per_table.get(*name), Some(size));
        }
    }
}

#[test]
fn test_exclusion_flags_follow_config_order() {
    let config = config_for("shop", &["sessions", "audit", "logs"]);
    let plan = DumpPlan::new(&config, Path::new("/tmp/x.cnf"), PathBuf::from("out.sql"));

    assert_eq!(
        plan.exclusion_args(),
        vec![
            "--ignore-table=shop.sessions",
            "--ignore-table=shop.audit",
            "--ignore-table=shop.logs",
        ]
    );
}
