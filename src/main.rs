//! SVAT command-line front end.
//!
//! Usage:
//!   svat load <FILE>                  Load an SVG, replacing the session
//!   svat keys                         List interactive element keys
//!   svat show [KEY]                   Print annotations
//!   svat annotate <KEY> [--title T] [--notes N]
//!   svat comment add <KEY> <TEXT>
//!   svat comment rm <KEY> <ID>
//!   svat clear                        Remove every annotation
//!   svat export [--format F] [--out PATH] [--dialog] [--copy]
//!   svat config show|path|get|set

/// Native entry point.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{Parser, Subcommand};

    use svat::config::AppConfig;
    use svat::delivery::{DeliveryAction, DeliveryPlan, DeliveryStrategy, NativeDelivery, deliver};
    use svat::format::{FormatRegistry, WarningSeverity};
    use svat::model::FieldUpdate;
    use svat::state::Session;
    use svat::storage::FileStorage;

    #[derive(Parser)]
    #[command(name = "svat")]
    #[command(about = "Annotate the elements of an SVG drawing and export the result")]
    struct Cli {
        /// More log output (repeat for more)
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        /// Directory holding the saved session
        #[arg(long, global = true)]
        storage_dir: Option<PathBuf>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Load an SVG file, replacing the current document and annotations
        Load {
            /// SVG file
            file: PathBuf,
        },
        /// List the keys of interactive elements
        Keys,
        /// Print the annotation of one key, or all annotations
        Show {
            /// Element key
            key: Option<String>,
        },
        /// Set the label and notes of an element
        Annotate {
            /// Element key
            key: String,
            /// Label
            #[arg(short, long)]
            title: Option<String>,
            /// Notes
            #[arg(short, long)]
            notes: Option<String>,
        },
        /// Manage comments
        Comment {
            #[command(subcommand)]
            action: CommentAction,
        },
        /// Remove every annotation
        Clear,
        /// Export the annotated document
        Export {
            /// Format id (html, svg, json)
            #[arg(short, long)]
            format: Option<String>,
            /// Output path
            #[arg(short, long)]
            out: Option<PathBuf>,
            /// Choose the output file in a dialog
            #[arg(long, conflicts_with = "out")]
            dialog: bool,
            /// Print to standard output instead of writing a file
            #[arg(long, conflicts_with_all = ["out", "dialog"])]
            copy: bool,
        },
        /// Show or change settings
        Config {
            #[command(subcommand)]
            action: ConfigAction,
        },
    }

    #[derive(Subcommand)]
    enum CommentAction {
        /// Append a comment
        Add {
            /// Element key
            key: String,
            /// Comment text
            text: String,
        },
        /// Delete a comment by id
        Rm {
            /// Element key
            key: String,
            /// Comment id
            id: String,
        },
    }

    #[derive(Subcommand)]
    enum ConfigAction {
        /// Print the whole configuration
        Show,
        /// Print the configuration file path
        Path,
        /// Print one setting
        Get {
            /// Setting name
            key: String,
        },
        /// Change one setting
        Set {
            /// Setting name
            key: String,
            /// New value
            value: String,
        },
    }

    pub fn main() -> ExitCode {
        let cli = Cli::parse();
        let config = AppConfig::load_from_default_path().unwrap_or_default();

        let level = config.preferences.log_level.raised(cli.verbose);
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .init();

        match run(cli, config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        }
    }

    fn open_session(cli_dir: Option<PathBuf>, config: &AppConfig) -> Result<Session<FileStorage>, Box<dyn Error>> {
        let storage = match cli_dir {
            Some(dir) => FileStorage::new(dir),
            None if !config.preferences.storage_dir.is_empty() => {
                FileStorage::new(&config.preferences.storage_dir)
            }
            None => FileStorage::open_default()?,
        };
        log::debug!("Using session storage in {:?}", storage.dir());
        Ok(Session::restore(storage))
    }

    fn run(cli: Cli, mut config: AppConfig) -> Result<(), Box<dyn Error>> {
        if let Command::Config { action } = cli.command {
            return run_config(action, &mut config);
        }

        let mut session = open_session(cli.storage_dir, &config)?;

        match cli.command {
            Command::Load { file } => {
                let text = std::fs::read_to_string(&file)?;
                let name = file.file_name().and_then(|n| n.to_str());
                let loaded = session.load_svg(name, &text)?;
                println!(
                    "Loaded {} with {} interactive element(s) ({:?} keys)",
                    file.display(),
                    loaded.keys.len(),
                    loaded.strategy
                );
            }
            Command::Keys => {
                let loaded = session.require_document()?;
                for key in &loaded.keys {
                    let annotation = session.annotation(key);
                    if annotation.is_empty() {
                        println!("{}", key);
                    } else {
                        println!("{}\t{}", key, annotation.label_or(key));
                    }
                }
            }
            Command::Show { key: Some(key) } => {
                let annotation = session.annotation(&key);
                println!("{}", serde_json::to_string_pretty(&annotation)?);
            }
            Command::Show { key: None } => {
                println!("{}", serde_json::to_string_pretty(session.annotations())?);
            }
            Command::Annotate { key, title, notes } => {
                session.require_key(&key)?;
                let update = FieldUpdate {
                    title,
                    description: notes,
                };
                if session.set_fields(&key, update) {
                    println!("Updated {}", key);
                } else {
                    println!("Nothing to change for {}", key);
                }
            }
            Command::Comment {
                action: CommentAction::Add { key, text },
            } => {
                session.require_key(&key)?;
                match session.append_comment(&key, &text) {
                    Some(comment) => println!("{}", comment.id),
                    None => return Err("comment text is empty".into()),
                }
            }
            Command::Comment {
                action: CommentAction::Rm { key, id },
            } => {
                if !session.delete_comment(&key, &id) {
                    return Err(format!("no comment '{}' on '{}'", id, key).into());
                }
            }
            Command::Clear => {
                session.clear_all();
                println!("Cleared all annotations");
            }
            Command::Export {
                format,
                out,
                dialog,
                copy,
            } => {
                let registry = FormatRegistry::new();
                let format_id = format.unwrap_or_else(|| config.preferences.default_format.clone());
                let output = session.export_as(&registry, &format_id)?;
                for warning in &output.warnings {
                    match warning.severity {
                        WarningSeverity::Info => log::info!("{}", warning.message),
                        _ => eprintln!("Warning: {}", warning.message),
                    }
                }

                let export_dir = if config.preferences.export_dir.is_empty() {
                    PathBuf::from(".")
                } else {
                    PathBuf::from(&config.preferences.export_dir)
                };
                let mut target = NativeDelivery::new(export_dir, io::stdout()).with_out(out);

                let plan = if copy {
                    DeliveryPlan::for_action(DeliveryAction::Copy, output.content_type)
                } else if dialog {
                    DeliveryPlan::for_action(DeliveryAction::Save, output.content_type)
                } else {
                    DeliveryPlan::for_action(DeliveryAction::Save, output.content_type)
                        .without(DeliveryStrategy::SavePicker)
                };
                let report = deliver(&mut target, &plan, &output);
                if !report.is_delivered() {
                    return Err(report.status.into());
                }
                if !copy {
                    println!("{}", report.status);
                }
            }
            Command::Config { .. } => {}
        }
        Ok(())
    }

    fn run_config(action: ConfigAction, config: &mut AppConfig) -> Result<(), Box<dyn Error>> {
        match action {
            ConfigAction::Show => println!("{}", config.to_json()?),
            ConfigAction::Path => match AppConfig::default_path() {
                Some(path) => println!("{}", path.display()),
                None => return Err("could not determine the config directory".into()),
            },
            ConfigAction::Get { key } => match config.preferences.get(&key) {
                Some(value) => println!("{}", value),
                None => {
                    return Err(format!(
                        "unknown setting '{}' (expected one of {})",
                        key,
                        svat::config::UserPreferences::KEYS.join(", ")
                    )
                    .into());
                }
            },
            ConfigAction::Set { key, value } => {
                config.preferences.set(&key, &value)?;
                config.save_to_default_path()?;
            }
        }
        Ok(())
    }
}
