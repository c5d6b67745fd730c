use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use dhis2_client::client::Dhis2Client;
use dhis2_client::config::ConfigLoader;
use dhis2_client::domain::CatalogKind;
use dhis2_client::error::Dhis2Error;
use dhis2_client::output::{BatchSummary, JsonOutput};

#[derive(Parser)]
#[command(name = "dhis2")]
#[command(about = "Fetch DHIS2 catalogs and data value sets, resolved to human-readable names")]
#[command(version, author)]
struct Cli {
    /// Path to a dhis2.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List every entry of a catalog")]
    Catalog { kind: CatalogKind },
    #[command(about = "Look up a catalog entry by id or by name")]
    Lookup(LookupArgs),
    #[command(about = "List the datasets defined on the server")]
    Datasets,
    #[command(about = "Fetch data value sets for every dataset/period/org unit combination")]
    Fetch(FetchArgs),
}

#[derive(Args)]
struct LookupArgs {
    kind: CatalogKind,

    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    id: Option<String>,

    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long = "dataset", required = true, num_args = 1..)]
    datasets: Vec<String>,

    #[arg(long = "period", required = true, num_args = 1..)]
    periods: Vec<String>,

    /// Omit to let the server apply its default org unit scope
    #[arg(long = "org-unit", num_args = 1..)]
    org_units: Vec<String>,

    /// Fetch all catalogs and print resolved rows instead of raw results
    #[arg(long)]
    resolve: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<Dhis2Error>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &Dhis2Error) -> u8 {
    match error {
        Dhis2Error::MissingConfig
        | Dhis2Error::ConfigRead(_)
        | Dhis2Error::ConfigParse(_)
        | Dhis2Error::InvalidConfig(_) => 2,
        err if err.is_remote() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let mut client: Dhis2Client = Dhis2Client::connect(&config)?;

    match cli.command {
        Commands::Catalog { kind } => {
            let entries = client.fetch_catalog(kind)?;
            JsonOutput::print_entries(&entries).into_diagnostic()
        }
        Commands::Lookup(args) => {
            // clap guarantees exactly one of --id and --name.
            let found = match args.id {
                Some(id) => client.name_by_id(args.kind, &id)?,
                None => client.id_by_name(args.kind, &args.name.unwrap_or_default())?,
            };
            JsonOutput::print_lookup(found.as_deref()).into_diagnostic()
        }
        Commands::Datasets => {
            let entries = client.fetch_datasets()?;
            JsonOutput::print_entries(&entries).into_diagnostic()
        }
        Commands::Fetch(args) => run_fetch(&mut client, args),
    }
}

fn run_fetch(client: &mut Dhis2Client, args: FetchArgs) -> miette::Result<()> {
    let org_units = if args.org_units.is_empty() {
        vec![String::new()]
    } else {
        args.org_units
    };
    let results = client.fetch_multiple_datasets(&args.datasets, &args.periods, &org_units);

    let summary = BatchSummary::from_results(&results);
    tracing::info!(
        requested = summary.requested,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch fetch finished"
    );

    if args.resolve {
        client.fetch_all_catalogs()?;
        let rows = client.resolve_dataset_values(&results)?;
        JsonOutput::print_rows(&rows).into_diagnostic()
    } else {
        JsonOutput::print_fetch(&results).into_diagnostic()
    }
}
