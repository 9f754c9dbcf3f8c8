use anyhow::{anyhow, Error, Result};
use clap::{Parser, Subcommand};
use ldo::convert::quads_to_json_ld;
use ldo::parse::{json_ld_format, parse_quads};
use ldo::sparql::changes_to_sparql_update;
use ldo::util::read_location;
use ldo::{
    Context, LdoFactory, OutputFormat, ParseOptions, SerializeOptions, ShapeDescriptor,
    SharedDataset,
};
use log::{debug, info};
use oxigraph::io::RdfFormat;
use oxigraph::model::Quad;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "ldo")]
#[command(about = "Convert, diff and validate linked data objects")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Base IRI used to resolve relative IRIs in the input
    #[clap(long, short, global = true)]
    base: Option<String>,
    /// Input format (turtle, ntriples, nquads, trig, rdfxml, jsonld); guessed from the file extension by default
    #[clap(long, global = true)]
    input_format: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the version of the ldo binary
    Version,
    /// Convert an RDF file or URL to another format
    Convert {
        /// File path or URL to read
        input: String,
        /// Output format: turtle, ntriples, nquads, trig or jsonld
        #[clap(long, short, default_value = "turtle")]
        format: String,
        /// JSON-LD context file used to compact jsonld output
        #[clap(long)]
        context: Option<PathBuf>,
        /// Prefix declarations for the output, as name=iri
        #[clap(long = "prefix", short = 'p')]
        prefixes: Vec<String>,
        /// The file to write to, defaults to stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the SPARQL Update that turns one RDF document into another
    Diff {
        before: String,
        after: String,
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate a subject against the shape in a shape descriptor file
    Validate {
        /// Shape descriptor JSON file ({"schema", "shape", "context"})
        #[clap(long, short)]
        shape: PathBuf,
        input: String,
        /// The IRI of the node to validate
        subject: String,
    },
    /// Print a subject as JSON-LD using a shape descriptor's context
    Show {
        #[clap(long, short)]
        shape: PathBuf,
        input: String,
        subject: String,
        /// Print every quad of the input instead of only the subject
        #[clap(long, action, default_value = "false")]
        all: bool,
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Set fields on a subject and print the resulting SPARQL Update
    Edit {
        #[clap(long, short)]
        shape: PathBuf,
        input: String,
        subject: String,
        /// Field assignments as field=value; a value that parses as JSON is used as JSON
        #[clap(long = "set", required = true)]
        assignments: Vec<String>,
        /// Print the edited document in this format instead of the SPARQL Update
        #[clap(long, short)]
        format: Option<String>,
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}

impl ToString for Commands {
    fn to_string(&self) -> String {
        match self {
            Commands::Version => "Version".to_string(),
            Commands::Convert { .. } => "Convert".to_string(),
            Commands::Diff { .. } => "Diff".to_string(),
            Commands::Validate { .. } => "Validate".to_string(),
            Commands::Show { .. } => "Show".to_string(),
            Commands::Edit { .. } => "Edit".to_string(),
        }
    }
}

pub fn run() -> Result<()> {
    ldo::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    ldo::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn parse_input_format(name: &str) -> Result<RdfFormat> {
    match name.to_ascii_lowercase().as_str() {
        "turtle" | "ttl" => Ok(RdfFormat::Turtle),
        "ntriples" | "nt" => Ok(RdfFormat::NTriples),
        "nquads" | "nq" => Ok(RdfFormat::NQuads),
        "trig" => Ok(RdfFormat::TriG),
        "rdfxml" | "xml" => Ok(RdfFormat::RdfXml),
        "jsonld" | "json-ld" => Ok(json_ld_format()),
        other => Err(anyhow!(
            "Unsupported format '{}'. Use one of: turtle, ntriples, nquads, trig, rdfxml, jsonld",
            other
        )),
    }
}

struct Loader {
    base: Option<String>,
    format: Option<RdfFormat>,
}

impl Loader {
    fn load(&self, location: &str) -> Result<Vec<Quad>> {
        info!("Loading {}", location);
        match self.format {
            Some(format) => {
                let text = std::fs::read_to_string(location)?;
                parse_quads(&text, format, self.base.as_deref())
            }
            None => read_location(location, self.base.as_deref()),
        }
    }
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            debug!("Writing output to {}", path.display());
            std::fs::write(path, text)?;
        }
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}

fn serialize_options(format: &str, prefixes: &[String]) -> Result<SerializeOptions> {
    let mut options = SerializeOptions::new(OutputFormat::from_name(format)?);
    for prefix in prefixes {
        let (name, iri) = prefix
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid prefix '{}', expected name=iri", prefix))?;
        options = options.with_prefix(name, iri);
    }
    Ok(options)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if LDO_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let loader = Loader {
        base: cmd.base.clone(),
        format: cmd
            .input_format
            .as_deref()
            .map(parse_input_format)
            .transpose()?,
    };
    info!("Running {}", cmd.command.to_string());

    match cmd.command {
        Commands::Version => {
            println!("ldo {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Convert {
            input,
            format,
            context,
            prefixes,
            output,
        } => {
            let quads = loader.load(&input)?;
            let text = if matches!(format.to_ascii_lowercase().as_str(), "jsonld" | "json-ld") {
                let context = match context {
                    Some(path) => {
                        let file = std::fs::File::open(path)?;
                        Context::from_json(&serde_json::from_reader(file)?)?
                    }
                    None => Context::default(),
                };
                serde_json::to_string_pretty(&quads_to_json_ld(&quads, &context))?
            } else {
                let options = serialize_options(&format, &prefixes)?;
                ldo::convert::quads_to_string(quads.iter().map(Quad::as_ref), &options)?
            };
            emit(&text, output.as_deref())?;
        }
        Commands::Diff {
            before,
            after,
            output,
        } => {
            let before = SharedDataset::from_quads(loader.load(&before)?);
            let after = SharedDataset::from_quads(loader.load(&after)?);
            let transaction = before.start_transaction();
            for quad in before.quads() {
                if !after.contains(&quad) {
                    transaction.remove(&quad);
                }
            }
            for quad in after.quads() {
                transaction.insert(&quad);
            }
            let changes = transaction.changes();
            info!(
                "{} quads added, {} removed",
                changes.num_added(),
                changes.num_removed()
            );
            emit(&changes_to_sparql_update(&changes)?, output.as_deref())?;
        }
        Commands::Validate {
            shape,
            input,
            subject,
        } => {
            let factory = LdoFactory::new(ShapeDescriptor::from_file(&shape)?);
            let ldo = factory.parse(
                subject.as_str(),
                loader.load(&input)?,
                &ParseOptions::default(),
            )?;
            let report = ldo.validate()?;
            if !report.is_valid() {
                for error in &report.errors {
                    eprintln!("{}", error);
                }
                return Err(anyhow!(
                    "{} does not conform to {} ({} errors)",
                    subject,
                    factory.shape().shape(),
                    report.errors.len()
                ));
            }
            println!("{} conforms to {}", subject, factory.shape().shape());
        }
        Commands::Show {
            shape,
            input,
            subject,
            all,
            output,
        } => {
            let factory = LdoFactory::new(ShapeDescriptor::from_file(&shape)?);
            let ldo = factory.parse(
                subject.as_str(),
                loader.load(&input)?,
                &ParseOptions::default(),
            )?;
            let document = if all {
                ldo.to_json_ld()
            } else {
                ldo.fields().to_json()
            };
            emit(&serde_json::to_string_pretty(&document)?, output.as_deref())?;
        }
        Commands::Edit {
            shape,
            input,
            subject,
            assignments,
            format,
            output,
        } => {
            let factory = LdoFactory::new(ShapeDescriptor::from_file(&shape)?);
            let ldo = factory.parse(
                subject.as_str(),
                loader.load(&input)?,
                &ParseOptions::default(),
            )?;
            let fields = ldo.fields();
            for assignment in &assignments {
                let (field, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Invalid assignment '{}', expected field=value", assignment))?;
                let value = serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
                fields.set_json(field, &value)?;
            }
            let text = match format {
                Some(format) => ldo.serialize(&SerializeOptions::new(OutputFormat::from_name(&format)?))?,
                None => ldo.to_sparql_update()?,
            };
            emit(&text, output.as_deref())?;
        }
    }

    Ok(())
}
