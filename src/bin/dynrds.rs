//! Command-line interface for dynrds
//!
//! Usage:
//!   dynrds render `<style>` [--title ..] [--artist ..] [--frame ps|rt]   - Evaluate a style string
//!   dynrds inspect `<style>` [--format `<format>`]                        - Show a compiler stage
//!   dynrds inspect --list-formats                                         - List inspection formats
//!   dynrds engine [--config `<file>`] [--plugin-config `<file>`] [--fifo `<path>`]
//!   dynrds notify `<media|playlist|raw>` `<payload>` [--fifo `<path>`]    - Write engine commands

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dynrds::rds::engine::{Engine, EngineSettings, RunOutcome};
use dynrds::rds::framing::{ps_fragments, rt_frame};
use dynrds::rds::metadata::{MediaEvent, MetadataContext, PlaylistEvent};
use dynrds::rds::processor::{available_formats, process_style, ProcessingSpec};
use dynrds::rds::style::{evaluate, parse, FieldKind};
use dynrds::rds::transmitter::LogTransmitter;
use dynrds_config::{default_plugin_file, ConfigError, DynRdsConfig, Loader, CONFIG_FILE_NAME};
use std::io::Write;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("dynrds")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dynamic RDS text for FM transmitters")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(metadata_args(
            Command::new("render")
                .about("Evaluate a style string against the given values")
                .arg(Arg::new("style").help("Style string").required(true).index(1))
                .arg(
                    Arg::new("frame")
                        .long("frame")
                        .help("Show the screens a transmitter would send")
                        .value_parser(["ps", "rt"]),
                )
                .arg(
                    Arg::new("rt-size")
                        .long("rt-size")
                        .help("RadioText buffer size used with --frame rt")
                        .value_parser(value_parser!(usize))
                        .default_value("32"),
                ),
        ))
        .subcommand(metadata_args(
            Command::new("inspect")
                .about("Show a style string at one compiler stage")
                .arg(
                    Arg::new("style")
                        .help("Style string")
                        .required_unless_present("list-formats")
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (e.g. 'token-simple', 'template-treeviz', 'output-json')")
                        .default_value("template-treeviz"),
                )
                .arg(
                    Arg::new("list-formats")
                        .long("list-formats")
                        .help("List available formats")
                        .action(ArgAction::SetTrue),
                ),
        ))
        .subcommand(config_args(
            Command::new("engine")
                .about("Read player commands from a FIFO and drive the transmitter"),
        ))
        .subcommand(config_args(
            Command::new("notify")
                .about("Translate a player callback into engine commands")
                .arg(
                    Arg::new("kind")
                        .help("Payload kind")
                        .required(true)
                        .value_parser(["media", "playlist", "raw"])
                        .index(1),
                )
                .arg(
                    Arg::new("payload")
                        .help("Callback JSON, or a raw command line")
                        .required(true)
                        .index(2),
                ),
        ))
        .get_matches();

    match matches.subcommand() {
        Some(("render", sub)) => handle_render_command(sub),
        Some(("inspect", sub)) => handle_inspect_command(sub),
        Some(("engine", sub)) => handle_engine_command(sub),
        Some(("notify", sub)) => handle_notify_command(sub),
        _ => unreachable!("a subcommand is required"),
    }
}

const METADATA_ARGS: &[(&str, FieldKind)] = &[
    ("title", FieldKind::Title),
    ("artist", FieldKind::Artist),
    ("album", FieldKind::Album),
    ("genre", FieldKind::Genre),
];

fn metadata_args(command: Command) -> Command {
    let command = METADATA_ARGS.iter().fold(command, |command, (name, kind)| {
        command.arg(
            Arg::new(*name)
                .long(*name)
                .help(format!("Value for {}", kind)),
        )
    });
    command
        .arg(
            Arg::new("track")
                .long("track")
                .help("Track number for {N}")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("length")
                .long("length")
                .help("Track length in seconds for {L}")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("position")
                .long("position")
                .help("Playlist position for {P}")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .help("Playlist item count for {C}")
                .value_parser(value_parser!(u32)),
        )
}

fn config_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration layered over the defaults (default: ./dynrds.toml if present)"),
        )
        .arg(
            Arg::new("plugin-config")
                .long("plugin-config")
                .help("Plugin settings file (DynRDS* keys) layered last (default: $CFGDIR/plugin.Dynamic_RDS if present)"),
        )
        .arg(
            Arg::new("fifo")
                .long("fifo")
                .help("Command FIFO path ('-' is stdin/stdout); defaults to engine.fifo_path"),
        )
}

fn metadata_from(matches: &ArgMatches) -> MetadataContext {
    let mut context = MetadataContext::new();
    for (name, kind) in METADATA_ARGS {
        if let Some(value) = matches.get_one::<String>(name) {
            context.set(*kind, value.as_str());
        }
    }
    if let Some(track) = matches.get_one::<u32>("track") {
        context.set_track_number(*track);
    }
    if let Some(length) = matches.get_one::<u64>("length") {
        context.set_track_length(*length);
    }
    if let Some(position) = matches.get_one::<u32>("position") {
        context.set_playlist_position(*position);
    }
    if let Some(count) = matches.get_one::<u32>("count") {
        context.set_playlist_count(*count);
    }
    context
}

/// Handle the render command
fn handle_render_command(matches: &ArgMatches) {
    let style = matches
        .get_one::<String>("style")
        .expect("style is required");
    let output = evaluate(&parse(style), &metadata_from(matches));
    let rt_size = *matches.get_one::<usize>("rt-size").unwrap_or(&32);

    for line in output.lines() {
        match matches.get_one::<String>("frame").map(String::as_str) {
            Some("ps") => {
                for screen in ps_fragments(line) {
                    println!("[{}]", screen);
                }
            }
            Some(_) => println!("[{}]", rt_frame(line, rt_size).replace('\r', "\\r")),
            None => println!("{}", line),
        }
    }
}

/// Handle the inspect command
fn handle_inspect_command(matches: &ArgMatches) {
    if matches.get_flag("list-formats") {
        println!("Available formats:\n");
        for format in available_formats() {
            println!("  {}", format);
        }
        return;
    }

    let style = matches
        .get_one::<String>("style")
        .expect("style is required unless listing formats");
    let format = matches
        .get_one::<String>("format")
        .expect("format has a default");
    let spec = ProcessingSpec::from_string(format).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available formats: {}", available_formats().join(", "));
        std::process::exit(1);
    });
    match process_style(style, &metadata_from(matches), &spec) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            eprintln!("Processing error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<DynRdsConfig, ConfigError> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(CONFIG_FILE_NAME),
    };
    loader = match matches.get_one::<String>("plugin-config") {
        Some(path) => loader.with_plugin_file(path)?,
        None => loader.with_optional_plugin_file(default_plugin_file())?,
    };
    loader.build()
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fifo_path(matches: &ArgMatches, config: &DynRdsConfig) -> String {
    matches
        .get_one::<String>("fifo")
        .cloned()
        .unwrap_or_else(|| config.engine.fifo_path.clone())
}

async fn open_input(path: &str) -> std::io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path).await?;
    Ok(Box::new(BufReader::new(file)))
}

/// Handle the engine command
fn handle_engine_command(matches: &ArgMatches) {
    let config = load_config(matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    init_tracing(&config.engine.log_level);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to start runtime: {}", e);
        std::process::exit(1);
    });
    let path = fifo_path(matches, &config);
    let settings = EngineSettings::from(&config);
    let transmitter = LogTransmitter::new(settings.rt_size);
    let mut engine = Engine::new(settings, transmitter);
    info!(fifo = %path, "engine starting");

    let result = runtime.block_on(async {
        loop {
            let input = open_input(&path).await?;
            let reload = || load_config(matches).map(|config| EngineSettings::from(&config));
            match engine.run(input, reload).await? {
                RunOutcome::Exit => break,
                RunOutcome::InputClosed if path == "-" => break,
                RunOutcome::InputClosed => info!("reopening {}", path),
            }
        }
        Ok::<_, dynrds::rds::engine::EngineError>(())
    });

    if let Err(e) = result {
        error!("engine stopped: {}", e);
        std::process::exit(1);
    }
    info!("engine exited");
}

/// Handle the notify command
fn handle_notify_command(matches: &ArgMatches) {
    let kind = matches.get_one::<String>("kind").expect("kind is required");
    let payload = matches
        .get_one::<String>("payload")
        .expect("payload is required");

    let commands = match kind.as_str() {
        "media" => serde_json::from_str::<MediaEvent>(payload).map(|e| e.to_commands()),
        "playlist" => serde_json::from_str::<PlaylistEvent>(payload).map(|e| e.to_commands()),
        _ => Ok(vec![payload.clone()]),
    }
    .unwrap_or_else(|e| {
        eprintln!("Invalid {} payload: {}", kind, e);
        std::process::exit(1);
    });

    let config = load_config(matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    let path = fifo_path(matches, &config);
    let written = if path == "-" {
        write_commands(&mut std::io::stdout(), &commands)
    } else {
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut fifo| write_commands(&mut fifo, &commands))
    };
    if let Err(e) = written {
        eprintln!("Failed to write to {}: {}", path, e);
        std::process::exit(1);
    }
}

fn write_commands(out: &mut impl Write, commands: &[String]) -> std::io::Result<()> {
    let mut buffer = commands.join("\n");
    buffer.push('\n');
    out.write_all(buffer.as_bytes())?;
    out.flush()
}
