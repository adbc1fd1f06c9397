//! CLI entrypoint for the council deliberation engine
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use council_application::{
    AccessDeliberationsUseCase, AgentResponder, AuditLogger, DeliberateError, DeliberateInput,
    DeliberateUseCase, DeliberationProgress, Dispatcher, HealthMonitor, NoAuditLogger, NoProgress,
    spawn_health_probe,
};
use council_domain::{DeliberationOptions, DeliberationResult};
use council_infrastructure::{
    ConfigLoader, FileConfig, InMemoryDeliberationRepository, JsonlAuditLogger, build_responders,
    trust_weights,
};
use council_presentation::{
    AppState, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, RolePolicy, router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Everything a command needs, built once from the configuration
struct Council {
    deliberate: DeliberateUseCase<InMemoryDeliberationRepository>,
    access: AccessDeliberationsUseCase<InMemoryDeliberationRepository>,
    monitor: Arc<HealthMonitor>,
    responders: Vec<Arc<dyn AgentResponder>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(cli.verbose, &config)?;
    info!("Starting council-engine");

    if let Command::ShowConfig = cli.command {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let council = build_council(&config)?;
    let cancel = CancellationToken::new();
    let probe = config.health.probe_interval().map(|interval| {
        spawn_health_probe(
            Arc::clone(&council.monitor),
            council.responders.clone(),
            interval,
            council.deliberate.params().effective_agent_timeout(),
            cancel.child_token(),
        )
    });

    let outcome = match cli.command {
        Command::Ask {
            query,
            threshold,
            locale,
            context,
            requester,
            output,
            quiet,
        } => {
            let mut options = DeliberationOptions::default().with_context(context);
            if let Some(threshold) = threshold {
                options = options.with_threshold(threshold.value());
            }
            if let Some(locale) = locale {
                options = options.with_locale(locale);
            }
            let input = DeliberateInput::new(query, requester)
                .with_options(options)
                .with_cancellation(cancel.child_token());
            run_ask(&council, input, output, quiet).await
        }
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve(council, &config, &bind, cancel.clone()).await
        }
        Command::ShowConfig => Ok(()),
    };

    cancel.cancel();
    if let Some(probe) = probe {
        let _ = probe.await;
    }
    outcome
}

/// Install the diagnostic subscriber
///
/// `RUST_LOG` wins over `-v`. When `[logging] file` is set, output is also
/// written to a daily-rotated file.
fn init_tracing(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = config.logging.file_path() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let file_name = path
        .file_name()
        .context("[logging] file must name a file")?;
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}

fn build_council(config: &FileConfig) -> Result<Council> {
    let audit: Arc<dyn AuditLogger> = match config.logging.audit_path() {
        Some(path) => match JsonlAuditLogger::new(&path) {
            Some(logger) => {
                info!("Audit log: {}", path.display());
                Arc::new(logger)
            }
            None => {
                warn!("Audit logging disabled, {} is not writable", path.display());
                Arc::new(NoAuditLogger)
            }
        },
        None => Arc::new(NoAuditLogger),
    };

    let responders = build_responders(&config.responders)?;
    if responders.is_empty() {
        warn!("No responders configured; every deliberation will be insufficient_responses");
    }

    let monitor = Arc::new(
        HealthMonitor::new(
            config.health.to_policy(),
            responders.iter().map(|r| r.profile().id.clone()),
        )
        .with_audit_logger(Arc::clone(&audit)),
    );

    let params = config.council.to_params();
    let repository = Arc::new(InMemoryDeliberationRepository::new());
    let dispatcher = Dispatcher::with_params(responders.clone(), Arc::clone(&monitor), &params);

    let deliberate = DeliberateUseCase::new(Arc::clone(&repository), dispatcher, params)
        .with_trust_weights(trust_weights(&config.responders))
        .with_audit_logger(Arc::clone(&audit));
    let access = AccessDeliberationsUseCase::new(repository).with_audit_logger(audit);

    Ok(Council {
        deliberate,
        access,
        monitor,
        responders,
    })
}

async fn run_ask(
    council: &Council,
    input: DeliberateInput,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    // Ctrl-C stops in-flight responder calls; the partial result is still reported
    let cancel = input.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let progress: Box<dyn DeliberationProgress> = if quiet || output == OutputFormat::Json {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };
    let result = council
        .deliberate
        .execute_with_progress(input, progress.as_ref())
        .await;
    interrupt.abort();

    match result {
        Ok(result) => {
            print_result(&result, output);
            Ok(())
        }
        Err(e) => {
            if let DeliberateError::Persistence {
                result: Some(result),
                ..
            } = &e
            {
                print_result(result, output);
            }
            Err(e.into())
        }
    }
}

fn print_result(result: &DeliberationResult, format: OutputFormat) {
    let output = match format {
        OutputFormat::Full => ConsoleFormatter::format(result),
        OutputFormat::Summary => ConsoleFormatter::format_summary(result),
        OutputFormat::Json => ConsoleFormatter::format_json(result),
    };
    println!("{}", output);
}

async fn serve(
    council: Council,
    config: &FileConfig,
    bind: &str,
    cancel: CancellationToken,
) -> Result<()> {
    let state = AppState::new(
        council.deliberate,
        council.access,
        council.monitor,
        Arc::new(RolePolicy::new(config.server.admin_roles.clone())),
    );

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
                _ = cancel.cancelled() => {}
            }
        })
        .await?;
    Ok(())
}
