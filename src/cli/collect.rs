use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::core::config::{Config, Settings, resolve_config_path};
use crate::core::emitter::{EventSink, JsonLinesSink};
use crate::core::query::{QueryTable, compile};
use crate::core::scheduler::Scheduler;
use crate::core::terminal::{print_status, print_success, print_warn};
use crate::logging;
use crate::platform::NativeProvider;

struct Setup {
    config: Config,
    settings: Settings,
    queries: QueryTable,
}

/// Load and validate the config, install logging, compile every class.
/// Any configuration problem surfaces here, before a scheduler exists.
async fn setup(config_flag: Option<&str>) -> Result<Setup> {
    let path = resolve_config_path(config_flag);
    let config = Config::load(&path).await?;
    let settings = Settings::resolve(&config)?;
    // Nothing before this point can log; the subscriber is not installed yet.
    logging::init(settings.log_level, config.logging.file.as_deref())?;
    info!(
        "Loaded config from {}: {} class(es)",
        path.display(),
        config.wmibeat.classes.len()
    );

    let queries = compile(&config.class_queries());
    Ok(Setup {
        config,
        settings,
        queries,
    })
}

async fn build_scheduler(setup: Setup) -> Result<Scheduler<NativeProvider>> {
    let sink: Arc<dyn EventSink> = match &setup.config.output.file {
        Some(path) => {
            info!("Writing events to {}", path.display());
            Arc::new(JsonLinesSink::append_to(path).await?)
        }
        None => Arc::new(JsonLinesSink::stdout()),
    };
    let provider = NativeProvider::new(&setup.settings.namespace);
    Ok(Scheduler::new(
        provider,
        setup.queries,
        sink,
        &setup.settings,
    ))
}

pub async fn run_collector(config_flag: Option<&str>) -> Result<()> {
    let setup = setup(config_flag).await?;
    if setup.queries.is_empty() {
        print_warn("No classes with fields are configured; every event will be empty.");
    }
    let mut scheduler = build_scheduler(setup).await?;

    let stop = scheduler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested, finishing the current cycle");
            stop.stop();
        }
    });

    scheduler.run().await?;
    Ok(())
}

pub async fn run_once(config_flag: Option<&str>) -> Result<()> {
    let setup = setup(config_flag).await?;
    let mut scheduler = build_scheduler(setup).await?;
    let events = scheduler.run_cycle().await?;
    info!("Single cycle complete, {} event(s) published", events);
    Ok(())
}

pub async fn check_config(config_flag: Option<&str>) -> Result<()> {
    let setup = setup(config_flag).await?;

    print_status("Period", &format!("{:?}", setup.settings.period));
    print_status("Namespace", &setup.settings.namespace);
    print_status("Emit", &format!("{:?}", setup.settings.emit));
    print_status("On error", &format!("{:?}", setup.settings.on_error));
    for query in setup.queries.iter() {
        let shape = match &query.title_field {
            Some(title) => format!("keyed by {}", title),
            None => "listed".to_string(),
        };
        print_status(&query.class_name, &format!("{}  [{}]", query.text, shape));
    }

    let skipped = setup.config.wmibeat.classes.len() - setup.queries.len();
    if skipped > 0 {
        print_warn(&format!(
            "Skipped {} class entries (no fields, or a later entry reuses the name)",
            skipped
        ));
    }
    print_success(&format!(
        "Configuration OK, compiled queries: {}",
        setup.queries.len()
    ));
    Ok(())
}
