//! Command handlers

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{warn, Level};

use binroute_app::app::{
    BinAdmin, DashboardSnapshot, OfflineReplayer, ResetPoller, ResetScheduler, RouteDraft,
    RouteLifecycleManager, TickOutcome,
};
use binroute_app::config::Config;
use binroute_app::export::{
    export_to_excel, DirectoryShare, ExportOutcome, NoShare, ReportExporter, ShareTarget,
};
use binroute_app::repository::{
    open_gateway, open_mutation_queue, open_report_store, open_reset_marker,
};
use binroute_domain::model::{Bin, BinFilter, BinPatch, Checklist, Route};
use binroute_domain::repository::{CollectionGateway, MutationQueue, ReportStore};
use binroute_domain::service::lifecycle::parse_weight;
use binroute_domain::service::RouteReport;
use binroute_infra::bin_csv::load_bins_from_csv;
use binroute_infra::persistence::JsonFileGateway;
use binroute_infra::route_plan::{load_route_plan, parse_schedule_time};
use binroute_store::{lock, shared, BinRegistry, SharedRegistry};
use binroute_types::{Error, OutputFormat, Result};

use crate::cli::{BinCommands, BinFilterArgs, Cli, Commands, ReportCommands, RouteCommands};
use crate::output::{
    output_bin, output_bins, output_dashboard, output_next_stops, output_replay, output_route,
    output_routes, output_saved_reports,
};

/// Shared handles for one CLI invocation
struct Context {
    config: Config,
    output_format: OutputFormat,
    offline: bool,
    gateway: Arc<JsonFileGateway>,
    registry: SharedRegistry,
}

impl Context {
    fn open(cli: &Cli, config: Config) -> Result<Self> {
        let output_format = cli.format.unwrap_or(config.output_format);
        let gateway = Arc::new(open_gateway(&config)?);
        Ok(Self {
            config,
            output_format,
            offline: cli.offline,
            gateway,
            registry: shared(BinRegistry::new()),
        })
    }

    fn remote(&self) -> Arc<dyn CollectionGateway> {
        self.gateway.clone()
    }

    fn admin(&self) -> BinAdmin {
        BinAdmin::new(self.remote(), self.registry.clone())
    }

    /// Manager loaded with the current remote state
    fn manager(&self) -> Result<RouteLifecycleManager> {
        let queue = open_mutation_queue(&self.config)?;
        let mut manager = RouteLifecycleManager::new(self.remote(), self.registry.clone())
            .with_queue(Box::new(queue));
        manager.refresh(None)?;
        // --offline: the snapshot is loaded, writes go to the queue
        self.gateway.set_offline(self.offline);
        Ok(manager)
    }

    fn share_target(&self) -> Box<dyn ShareTarget> {
        match &self.config.share_dir {
            Some(dir) => Box::new(DirectoryShare::new(dir.clone())),
            None => Box::new(NoShare),
        }
    }

    fn scheduler(&self) -> Result<ResetScheduler> {
        ResetScheduler::new(self.remote(), self.registry.clone())
            .with_marker(open_reset_marker(&self.config)?)
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    init_logging(&config, cli.verbose);

    if let Commands::Config {
        show,
        set_output,
        set_collector,
        set_share_dir,
        set_data_dir,
        set_reset_poll,
        set_log_level,
        reset,
    } = &cli.command
    {
        return cmd_config(
            *show,
            *set_output,
            set_collector.clone(),
            set_share_dir.clone(),
            set_data_dir.clone(),
            *set_reset_poll,
            set_log_level.clone(),
            *reset,
        );
    }

    let ctx = Context::open(&cli, config)?;

    match &cli.command {
        Commands::Bins { action } => cmd_bins(&ctx, action),
        Commands::Routes { action } => cmd_routes(&ctx, action),
        Commands::Report { action } => cmd_report(&ctx, action),
        Commands::Dashboard => cmd_dashboard(&ctx),
        Commands::Reset { date } => cmd_reset(&ctx, *date),
        Commands::Watch { interval } => cmd_watch(&ctx, *interval),
        Commands::Sync => cmd_sync(&ctx),
        Commands::Config { .. } => Ok(()),
    }
}

fn bin_filter(args: &BinFilterArgs) -> BinFilter {
    BinFilter {
        status: args.status,
        category: args.category,
        zone: args.zone.clone(),
    }
}

fn cmd_bins(ctx: &Context, action: &BinCommands) -> Result<()> {
    let admin = ctx.admin();
    admin.refresh()?;
    ctx.gateway.set_offline(ctx.offline);

    match action {
        BinCommands::List { filter } => {
            let bins = admin.list(&bin_filter(filter))?;
            output_bins(ctx.output_format, &bins)
        }

        BinCommands::Add {
            bin_id,
            location,
            zone,
            category,
            capacity,
            fill,
        } => {
            let mut bin = Bin::new(bin_id.trim(), location.clone(), zone.clone(), *category, *capacity);
            bin.fill_level = *fill;
            let created = admin.create(&bin)?;
            output_bin(ctx.output_format, &created)
        }

        BinCommands::Update {
            bin_id,
            location,
            zone,
            category,
            capacity,
            fill,
            weight,
            status,
            needs_collection,
        } => {
            let updated = if *needs_collection {
                admin.mark_needs_collection(bin_id)?
            } else {
                let patch = BinPatch {
                    location: location.clone(),
                    zone: zone.clone(),
                    category: *category,
                    capacity: *capacity,
                    fill_level: *fill,
                    weight: *weight,
                    status: *status,
                    ..Default::default()
                };
                admin.update(bin_id, &patch)?
            };
            output_bin(ctx.output_format, &updated)
        }

        BinCommands::Remove { bin_id } => {
            admin.delete(bin_id)?;
            println!("Removed bin {}", bin_id);
            Ok(())
        }

        BinCommands::Import { csv } => {
            let bins = load_bins_from_csv(csv)?;
            let summary = admin.import(&bins)?;
            println!("Imported {} bins from {}", summary.created, csv.display());
            if !summary.skipped.is_empty() {
                println!(
                    "Skipped {} existing: {}",
                    summary.skipped.len(),
                    summary.skipped.join(", ")
                );
            }
            Ok(())
        }
    }
}

fn cmd_routes(ctx: &Context, action: &RouteCommands) -> Result<()> {
    let mut manager = ctx.manager()?;
    let output_format = ctx.output_format;

    match action {
        RouteCommands::List { mine, status } => {
            let routes: Vec<&Route> = if *mine {
                let collector = ctx.config.collector.as_deref().ok_or_else(|| {
                    Error::validation(
                        "no collector configured. Set with: binroute config --set-collector <name>",
                    )
                })?;
                manager.routes().for_collector(collector)
            } else {
                manager.routes().list()
            };
            let routes: Vec<&Route> = routes
                .into_iter()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .collect();
            output_routes(output_format, &routes)
        }

        RouteCommands::Create {
            name,
            date,
            time,
            collector,
            bins,
        } => {
            let draft = RouteDraft {
                name: name.clone(),
                scheduled_date: *date,
                scheduled_time: parse_schedule_time(time)?,
                collector: collector.clone().or_else(|| ctx.config.collector.clone()),
                bin_ids: bins.clone(),
            };
            let route = manager.create_route(&draft)?;
            output_route(output_format, route)
        }

        RouteCommands::Import { plan } => {
            let planned = load_route_plan(plan)?;
            println!("Creating {} routes from {}", planned.len(), plan.display());
            for entry in planned {
                let draft = RouteDraft {
                    scheduled_time: entry.scheduled_time()?,
                    name: entry.name,
                    scheduled_date: entry.date,
                    collector: entry.collector,
                    bin_ids: entry.bins,
                };
                let route = manager.create_route(&draft)?;
                println!("  {} {} ({} bins)", route.id, route.name, route.stops.len());
            }
            Ok(())
        }

        RouteCommands::Show { route_id } => {
            output_route(output_format, manager.route(route_id)?)?;
            output_next_stops(output_format, &manager.next_stops(route_id)?)
        }

        RouteCommands::Start {
            route_id,
            checks,
            all_checked,
        } => {
            let checklist = build_checklist(checks, *all_checked)?;
            let route = manager.start_route(route_id, &checklist)?;
            output_route(output_format, route)
        }

        RouteCommands::Collect {
            route_id,
            bin_id,
            weight,
        } => {
            let weight = parse_weight(weight)?;
            let route = manager.collect_bin(route_id, bin_id, weight)?;
            output_route(output_format, route)
        }

        RouteCommands::Skip {
            route_id,
            bin_id,
            reason,
        } => {
            let route = manager.skip_bin(route_id, bin_id, reason)?;
            output_route(output_format, route)
        }

        RouteCommands::Complete { route_id } => {
            let route = manager.complete_route(route_id)?;
            output_route(output_format, route)
        }

        RouteCommands::Cancel { route_id } => {
            let route = manager.cancel_route(route_id)?;
            output_route(output_format, route)
        }

        RouteCommands::Report { route_id, xlsx } => {
            cmd_export_report(ctx, manager.route(route_id)?, xlsx.clone())
        }
    }
}

/// Tick the named items (or all); stamp completion only when everything is ticked
fn build_checklist(checks: &[String], all_checked: bool) -> Result<Checklist> {
    let mut checklist = Checklist::standard();
    if all_checked {
        checklist.check_all();
    }
    for id in checks {
        checklist.check(id)?;
    }
    if checklist.all_checked() {
        checklist.complete(Utc::now())?;
    } else {
        let missing: Vec<_> = checklist.unchecked().iter().map(|i| i.id.as_str()).collect();
        eprintln!("Unchecked: {}", missing.join(", "));
    }
    Ok(checklist)
}

fn cmd_export_report(ctx: &Context, route: &Route, xlsx: Option<PathBuf>) -> Result<()> {
    let store = open_report_store(&ctx.config)?;
    let share = ctx.share_target();
    let exporter = ReportExporter::new(&store, share.as_ref());

    match exporter.export(route)? {
        ExportOutcome::Shared { path } => println!("Report shared to: {}", path.display()),
        ExportOutcome::Inline {
            content,
            saved_path,
        } => {
            println!("{}", content);
            println!("Saved to: {}", saved_path.display());
        }
    }

    if let Some(path) = xlsx {
        export_to_excel(&RouteReport::from_route(route), &path)?;
        println!("Exported to: {}", path.display());
    }
    Ok(())
}

fn cmd_report(ctx: &Context, action: &ReportCommands) -> Result<()> {
    let store = open_report_store(&ctx.config)?;
    match action {
        ReportCommands::Show { route_id } => {
            let report = store
                .load(route_id)?
                .ok_or_else(|| Error::not_found(format!("no saved report for route {}", route_id)))?;
            if ctx.output_format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.content);
            }
            Ok(())
        }
        ReportCommands::List => output_saved_reports(ctx.output_format, &store.find_all()?),
    }
}

fn cmd_dashboard(ctx: &Context) -> Result<()> {
    ctx.admin().refresh()?;
    let bins = lock(&ctx.registry)?.snapshot();
    let mut snapshot = DashboardSnapshot::compute(&bins, Local::now());
    match ctx.gateway.fetch_route_statistics() {
        Ok(stats) => snapshot = snapshot.with_routes(stats),
        Err(e) => warn!(error = %e, "route statistics unavailable"),
    }
    output_dashboard(ctx.output_format, &snapshot)
}

fn print_tick(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::UpToDate => println!("Bins already reset today"),
        TickOutcome::Reset { date, bins } => {
            println!("Reset {} bins to needs-collection for {}", bins, date)
        }
        TickOutcome::Failed { date, error } => {
            eprintln!("Reset for {} failed: {} (will retry)", date, error)
        }
    }
}

fn cmd_reset(ctx: &Context, date: Option<NaiveDate>) -> Result<()> {
    ctx.gateway.set_offline(ctx.offline);
    let mut scheduler = ctx.scheduler()?;
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    print_tick(&scheduler.tick(today));
    Ok(())
}

fn cmd_watch(ctx: &Context, interval: Option<u64>) -> Result<()> {
    let seconds = interval.unwrap_or(ctx.config.reset_poll_seconds).max(1);
    let poller = ResetPoller::spawn(ctx.scheduler()?, Duration::from_secs(seconds));
    println!("Checking for a new day every {}s. Press Enter to stop.", seconds);

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    if let Some(scheduler) = poller.stop() {
        match scheduler.last_reset() {
            Some(date) => println!("Last reset: {}", date),
            None => println!("No reset has succeeded yet"),
        }
    }
    Ok(())
}

fn cmd_sync(ctx: &Context) -> Result<()> {
    let queue = open_mutation_queue(&ctx.config)?;
    let total = queue.len()?;
    if total == 0 {
        println!("Nothing to sync");
        return Ok(());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("replaying");

    let replayer = OfflineReplayer::new(&queue, ctx.gateway.as_ref());
    let summary = replayer.replay_with_progress(|done, _| pb.set_position(done as u64))?;
    pb.finish_and_clear();

    output_replay(ctx.output_format, &summary)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    show: bool,
    set_output: Option<OutputFormat>,
    set_collector: Option<String>,
    set_share_dir: Option<PathBuf>,
    set_data_dir: Option<PathBuf>,
    set_reset_poll: Option<u64>,
    set_log_level: Option<String>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(collector) = set_collector {
        config.collector = Some(collector);
        modified = true;
    }

    if let Some(dir) = set_share_dir {
        config.share_dir = Some(dir);
        modified = true;
    }

    if let Some(dir) = set_data_dir {
        config.data_dir = Some(dir);
        modified = true;
    }

    if let Some(seconds) = set_reset_poll {
        if seconds == 0 {
            return Err(Error::validation("reset poll interval must be at least 1 second"));
        }
        config.reset_poll_seconds = seconds;
        modified = true;
    }

    if let Some(level) = set_log_level {
        if level.parse::<Level>().is_err() {
            return Err(Error::validation(format!("unknown log level: {}", level)));
        }
        config.log_level = level;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_checklist_all() {
        let checklist = build_checklist(&[], true).unwrap();
        assert!(checklist.is_complete());
    }

    #[test]
    fn test_build_checklist_partial_is_not_complete() {
        let checklist = build_checklist(&["vehicle".to_string(), "fuel".to_string()], false).unwrap();
        assert!(!checklist.is_complete());
        assert_eq!(checklist.unchecked().len(), 3);
    }

    #[test]
    fn test_build_checklist_unknown_item() {
        assert!(matches!(
            build_checklist(&["coffee".to_string()], false),
            Err(Error::Validation(_))
        ));
    }
}
