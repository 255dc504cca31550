use eyre::{Result, WrapErr};
use std::io;
use std::time::Duration;

use ssh_auditor::cli::{self, Command, CredentialCommand, DiscoverSource, LogcheckCommand, ScanCommand};
use ssh_auditor::credentials::{add_credential, import_credentials};
use ssh_auditor::logsearch::{LogBackend, build_searcher};
use ssh_auditor::store::{SqliteStore, Store};
use ssh_auditor::{Auditor, Credential, init_logging, pretty};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    if let Err(e) = init_logging(cli.debug, cli.log_file.as_deref()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let store = SqliteStore::open(&cli.db)
        .wrap_err_with(|| format!("failed to open database {}", cli.db.display()))?;
    let mut auditor = Auditor::new(store);
    let concurrency = cli.concurrency;

    match cli.command {
        Command::Discover(args) => {
            let (include, target) = match args.source {
                Some(DiscoverSource::Fromfile(target)) => {
                    let include = cli::read_targets(io::stdin().lock()).wrap_err("failed to read targets")?;
                    (include, target)
                }
                None => (args.include, args.target),
            };
            if include.is_empty() {
                eyre::bail!("no targets given");
            }
            let cfg = target.scan_configuration(include, concurrency);
            let (report, queue) = auditor.discover(&cfg).await.wrap_err("discovery failed")?;
            println!("{}", pretty::format_discovery_report(&report, Some(&queue)));
        }

        Command::Scan(args) => match args.command {
            Some(ScanCommand::Reset) => {
                auditor.store_mut().reset_intervals().wrap_err("failed to reset scan intervals")?;
                println!("all host/credential pairs queued for scanning");
            }
            None => {
                let result = auditor
                    .scan(&args.brute.scan_configuration(concurrency))
                    .await
                    .wrap_err("scan failed")?;
                println!("{}", pretty::format_audit_result(&result));
            }
        },

        Command::Rescan(args) => {
            let result = auditor
                .rescan(&args.scan_configuration(concurrency))
                .await
                .wrap_err("rescan failed")?;
            println!("{}", pretty::format_audit_result(&result));
        }

        Command::Logcheck { command } => match command {
            LogcheckCommand::Run { timeout } => {
                let cfg = ssh_auditor::ScanConfiguration::new()
                    .with_concurrency(concurrency)
                    .with_timeout(Duration::from_millis(timeout));
                let sent = auditor.logcheck(&cfg).await.wrap_err("logcheck failed")?;
                for hostport in &sent {
                    println!("{}", hostport);
                }
            }
            LogcheckCommand::Report { splunk, timeout } => {
                let backend = LogBackend::Splunk {
                    base_url: splunk,
                    username: std::env::var("SPLUNK_USERNAME").ok(),
                    password: std::env::var("SPLUNK_PASSWORD").ok(),
                };
                let searcher = build_searcher(backend, Duration::from_millis(timeout))
                    .wrap_err("failed to build log searcher")?;
                let entries = auditor
                    .logcheck_report(searcher.as_ref())
                    .await
                    .wrap_err("logcheck report failed")?;
                println!("{}", pretty::format_logcheck(&entries));
            }
        },

        Command::Credential { command } => match command {
            CredentialCommand::Add { user, password, scan_interval } => {
                let credential = Credential::new(user, password, scan_interval);
                add_credential(auditor.store_mut(), &credential).wrap_err("failed to add credential")?;
            }
            CredentialCommand::List => {
                let credentials = auditor.store().credentials().wrap_err("failed to list credentials")?;
                pretty::print_credentials(&credentials)?;
            }
            CredentialCommand::Reset => {
                auditor.store_mut().reset_credentials().wrap_err("failed to reset credentials")?;
            }
            CredentialCommand::Import { format, scan_interval } => {
                let stdin = io::stdin();
                let summary = import_credentials(auditor.store_mut(), stdin.lock(), format.into(), scan_interval)
                    .wrap_err("credential import failed")?;
                println!(
                    "imported credentials: {} added, {} updated, {} skipped",
                    summary.added, summary.updated, summary.skipped
                );
            }
        },

        Command::Dupes => {
            let dupes = auditor.dupes().wrap_err("failed to load duplicate keys")?;
            println!("{}", pretty::format_dupes(&dupes));
        }

        Command::Vuln => {
            let vulns = auditor.vulnerabilities().wrap_err("failed to load vulnerabilities")?;
            println!("{}", pretty::format_vulnerabilities(&vulns));
        }

        Command::Report => {
            let report = auditor.get_report().wrap_err("failed to build report")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

