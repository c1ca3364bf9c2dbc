use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use trustwatch::config::Config;
use trustwatch::detector::{PhishingDetector, ScanType, Verdict};
use trustwatch::store::ScanStore;
use trustwatch::validators;

fn cli() -> Command {
    Command::new("trustwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic phishing detection for URLs, email text, and SMS messages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (YAML)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the default configuration to a file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .help("Scan a URL")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .value_name("TEXT")
                .help("Scan email or message text")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("sms")
                .long("sms")
                .value_name("TEXT")
                .help("Scan an SMS message")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .value_name("LANG")
                .help("Language label for text/SMS verdicts")
                .default_value("english"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("FILE")
                .help("SQLite database for the blacklist and scan log"),
        )
        .arg(
            Arg::new("blacklist-add")
                .long("blacklist-add")
                .value_name("DOMAIN")
                .help("Add a domain to the persisted blacklist and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Show scan statistics from the scan log")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recent")
                .long("recent")
                .value_name("N")
                .help("Show the N most recent scans")
                .value_parser(clap::value_parser!(u32))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-check detail")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() {
    let matches = cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        if let Err(e) = Config::default().save_to_file(generate_path) {
            eprintln!("Error generating configuration: {e}");
            process::exit(1);
        }
        println!("Default configuration written to {generate_path}");
        return;
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    if matches.get_flag("test-config") {
        println!("Configuration is valid");
        return;
    }

    // The store is an enrichment: scans still work when it cannot be opened.
    let db_path = matches
        .get_one::<String>("db")
        .cloned()
        .or_else(|| config.database_path.clone());
    let store: Option<Arc<ScanStore>> = match &db_path {
        Some(path) => match ScanStore::open(path) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                log::warn!("Scan database unavailable, continuing without it: {e}");
                None
            }
        },
        None => None,
    };

    if let Some(domain) = matches.get_one::<String>("blacklist-add") {
        let Some(store) = &store else {
            eprintln!("--blacklist-add requires a database (--db or database_path)");
            process::exit(1);
        };
        if let Err(e) = store.add_blacklist_entry(domain, "phishing") {
            eprintln!("Error updating blacklist: {e}");
            process::exit(1);
        }
        println!("Blacklisted {domain}");
        return;
    }

    if matches.get_flag("stats") {
        let Some(store) = &store else {
            eprintln!("--stats requires a database (--db or database_path)");
            process::exit(1);
        };
        match store.statistics() {
            Ok(stats) => print_json(&stats),
            Err(e) => {
                eprintln!("Error reading statistics: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(&limit) = matches.get_one::<u32>("recent") {
        let Some(store) = &store else {
            eprintln!("--recent requires a database (--db or database_path)");
            process::exit(1);
        };
        match store.recent_scans(limit) {
            Ok(scans) => print_json(&scans),
            Err(e) => {
                eprintln!("Error reading recent scans: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let blacklist = store
        .clone()
        .map(|s| s as Arc<dyn trustwatch::BlacklistStore>);
    let detector = PhishingDetector::new(&config, blacklist);
    let language = matches
        .get_one::<String>("language")
        .map(String::as_str)
        .unwrap_or("english");

    let verdict = if let Some(url) = matches.get_one::<String>("url") {
        let validated = match validators::validate_url(url) {
            Ok(url) => url,
            Err(e) => {
                eprintln!("Invalid input: {e}");
                process::exit(1);
            }
        };
        Some(run_scan(&detector, ScanType::Url, &validated, language))
    } else if let Some(text) = matches.get_one::<String>("text") {
        let validated = match validators::validate_text(text) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Invalid input: {e}");
                process::exit(1);
            }
        };
        Some(run_scan(&detector, ScanType::Text, &validated, language))
    } else if let Some(text) = matches.get_one::<String>("sms") {
        let validated = match validators::validate_text(text) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Invalid input: {e}");
                process::exit(1);
            }
        };
        Some(run_scan(&detector, ScanType::Sms, &validated, language))
    } else {
        None
    };

    match verdict {
        Some(verdict) => {
            if let Some(store) = &store {
                if let Err(e) = store.record_scan(&verdict) {
                    log::warn!("Failed to record scan: {e}");
                }
            }
            log::info!(
                "Scan completed: {} - Risk: {}",
                verdict.scan_type.as_str(),
                verdict.risk_level.as_str()
            );
            print_json(&verdict);
        }
        None => {
            eprintln!("Nothing to do: pass --url, --text, --sms, --stats, or --recent");
            process::exit(1);
        }
    }
}

fn run_scan(
    detector: &PhishingDetector,
    scan_type: ScanType,
    input: &str,
    language: &str,
) -> Verdict {
    let start = Instant::now();
    let mut verdict = match scan_type {
        ScanType::Url => detector.detect_url(input),
        ScanType::Text => detector.detect_text(input, language),
        ScanType::Sms => detector.detect_sms(input, language),
    };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    verdict.response_time_ms = Some((elapsed_ms * 100.0).round() / 100.0);
    verdict
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_rejects_non_numeric_limit() {
        let result = cli().try_get_matches_from(["trustwatch", "--recent", "abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_recent_accepts_numeric_limit() {
        let matches = cli()
            .try_get_matches_from(["trustwatch", "--recent", "5"])
            .unwrap();
        assert_eq!(matches.get_one::<u32>("recent"), Some(&5));
    }
}
