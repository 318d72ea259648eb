//! # Flange Helper CLI
//!
//! Command-line front end for `flange_core`: ad-hoc torque calculations,
//! bolt marking orders, nut and washer checks, and the job book with its
//! flange forms and PDF reports.
//!
//! Settings come from `flange.toml` (see `flange config init`); flags and
//! `FLANGE_*` environment variables override the file.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flange_core::advisories::BearingSurface;
use flange_core::config::{AppConfig, CONFIG_FILE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "flange")]
#[command(about = "Flange Helper - bolted flange torque targets, sequences and job records", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "FLANGE_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Storage folder (overrides the config file)
    #[arg(long, global = true, env = "FLANGE_STORAGE")]
    storage: Option<PathBuf>,

    /// Name recorded in the edit lock (overrides the config file)
    #[arg(long, global = true, env = "FLANGE_USER")]
    user: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a target torque
    Torque(TorqueArgs),

    /// Bolt marking order for a flange
    Sequence {
        /// Number of bolt holes (even, 4 or more)
        count: u32,
    },

    /// Check a stud/nut combination
    Nuts {
        /// Stud grade, e.g. "B7" or "A453 660 Class B"
        #[arg(short, long)]
        grade: String,

        /// Nut grade, e.g. "2H"
        #[arg(short, long)]
        nut: Option<String>,

        /// A flat washer is fitted
        #[arg(long)]
        washer: bool,

        /// Condition of the nut bearing surface
        #[arg(long, value_enum, default_value = "unknown")]
        surface: SurfaceArg,
    },

    /// List reference catalogues
    Reference {
        #[arg(value_enum)]
        table: ReferenceTable,
    },

    /// Job management
    #[command(subcommand)]
    Job(JobCommands),

    /// Flange form management
    #[command(subcommand)]
    Form(FormCommands),

    /// Export a job report as PDF
    Export {
        /// Job number or id
        job: String,

        /// Output file (defaults to the storage reports folder)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Storage usage against the limit
    Storage,

    /// Config file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args)]
pub struct TorqueArgs {
    /// Nominal diameter, e.g. "7/8" or "1-1/8"
    #[arg(short, long)]
    pub diameter: String,

    /// Stud grade
    #[arg(short, long)]
    pub grade: String,

    /// Thread series (UNC, UNF, 8UN); defaults by diameter
    #[arg(long)]
    pub series: Option<String>,

    /// Working temperature in °F
    #[arg(long, conflicts_with = "temp_c", allow_hyphen_values = true)]
    pub temp_f: Option<f64>,

    /// Working temperature in °C
    #[arg(long, allow_hyphen_values = true)]
    pub temp_c: Option<f64>,

    /// Gasket type label
    #[arg(long)]
    pub gasket: Option<String>,

    /// Percent of yield, e.g. "50" or "0.5"
    #[arg(long)]
    pub pct_yield: Option<String>,

    /// Target bolt load F in lbf (skips the yield calculation)
    #[arg(long)]
    pub bolt_load: Option<f64>,

    /// Threads are lubricated
    #[arg(long, requires = "lubricant")]
    pub wet: bool,

    /// Lubricant name
    #[arg(long)]
    pub lubricant: Option<String>,

    /// Specified target torque in ft-lb
    #[arg(long)]
    pub specified: Option<f64>,

    /// Use the specified torque instead of the calculated one
    #[arg(long, requires = "specified")]
    pub custom: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SurfaceArg {
    Unknown,
    Painted,
    Rough,
    Smooth,
}

impl From<SurfaceArg> for BearingSurface {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Unknown => BearingSurface::Unknown,
            SurfaceArg::Painted => BearingSurface::Painted,
            SurfaceArg::Rough => BearingSurface::Rough,
            SurfaceArg::Smooth => BearingSurface::Smooth,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReferenceTable {
    Grades,
    Nuts,
    Diameters,
    Gaskets,
    Lubricants,
}

#[derive(Subcommand)]
enum JobCommands {
    /// Create a job
    New {
        /// Job number
        number: String,

        #[arg(short, long, default_value = "")]
        location: String,

        /// Job date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List jobs
    List,

    /// Show a job and its forms
    Show {
        /// Job number or id
        job: String,
    },

    /// Change a job's number, location or date
    Edit {
        /// Job number or id
        job: String,

        #[arg(long)]
        number: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a job and its forms
    Delete {
        /// Job number or id
        job: String,
    },
}

#[derive(Subcommand)]
enum FormCommands {
    /// Print a blank form as JSON to fill in
    Template,

    /// Add a form from a JSON file ("-" for stdin)
    Add {
        /// Job number or id
        job: String,

        file: PathBuf,

        /// Accept a nut that is not the usual pairing for the stud
        #[arg(long)]
        acknowledge_nut: bool,
    },

    /// Show a form with its calculation and advisories
    Show {
        /// Job number or id
        job: String,

        /// Form id, id prefix or position in the job (1, 2, ...)
        form: String,
    },

    /// Remove a form
    Remove {
        job: String,
        form: String,
    },

    /// Sign off (or clear) a tightening pass
    Pass {
        job: String,
        form: String,

        /// Pass number, 1-3 or 4 for the check pass
        #[arg(value_parser = clap::value_parser!(u8).range(1..=4))]
        pass: u8,

        /// Technician initials
        #[arg(required_unless_present = "clear")]
        initials: Option<String>,

        #[arg(long)]
        clear: bool,
    },

    /// Attach a photo
    Photo {
        job: String,
        form: String,
        path: PathBuf,
    },

    /// Record a representative's sign-off
    Sign {
        job: String,
        form: String,

        #[arg(value_enum)]
        role: SignerRole,

        /// Printed name
        #[arg(long)]
        name: String,

        /// Signature image to attach
        #[arg(long)]
        image: Option<PathBuf>,

        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SignerRole {
    Contractor,
    Facility,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective settings
    Show,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "flange=debug,flange_core=debug"
    } else {
        "flange=info,flange_core=warn"
    };
    let filter = EnvFilter::try_from_env("FLANGE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Config(ConfigCommands::Init { force }) = &cli.command {
        return commands::config_init(&cli.config, *force);
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(storage) = &cli.storage {
        config.storage_dir = storage.clone();
    }
    if let Some(user) = &cli.user {
        config.user_id = user.clone();
    }

    let app = commands::App::new(config, cli.json)?;
    match cli.command {
        Commands::Torque(args) => app.torque(&args),
        Commands::Sequence { count } => app.sequence(count),
        Commands::Nuts { grade, nut, washer, surface } => app.nuts(&grade, nut.as_deref(), washer, surface.into()),
        Commands::Reference { table } => match table {
            ReferenceTable::Grades => app.list_grades(),
            ReferenceTable::Nuts => app.list_nuts(),
            ReferenceTable::Diameters => app.list_diameters(),
            ReferenceTable::Gaskets => app.list_gaskets(),
            ReferenceTable::Lubricants => app.list_lubricants(),
        },
        Commands::Job(cmd) => match cmd {
            JobCommands::New { number, location, date } => app.job_new(&number, &location, date.as_deref()),
            JobCommands::List => app.job_list(),
            JobCommands::Show { job } => app.job_show(&job),
            JobCommands::Edit { job, number, location, date } => {
                app.job_edit(&job, number, location, date.as_deref())
            }
            JobCommands::Delete { job } => app.job_delete(&job),
        },
        Commands::Form(cmd) => match cmd {
            FormCommands::Template => app.form_template(),
            FormCommands::Add { job, file, acknowledge_nut } => app.form_add(&job, &file, acknowledge_nut),
            FormCommands::Show { job, form } => app.form_show(&job, &form),
            FormCommands::Remove { job, form } => app.form_remove(&job, &form),
            FormCommands::Pass { job, form, pass, initials, clear } => {
                app.form_pass(&job, &form, pass, initials.as_deref(), clear)
            }
            FormCommands::Photo { job, form, path } => app.form_photo(&job, &form, &path),
            FormCommands::Sign { job, form, role, name, image, date } => {
                app.form_sign(&job, &form, role, &name, image.as_deref(), date.as_deref())
            }
        },
        Commands::Export { job, out } => app.export(&job, out.as_deref()),
        Commands::Storage => app.storage(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Init { force } => commands::config_init(&cli.config, force),
            ConfigCommands::Show => app.config_show(),
        },
    }
}
