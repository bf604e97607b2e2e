use clap::{Arg, ArgMatches, Command};
use clap_complete::{generate, shells};
use clap_complete_nushell::Nushell;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_MAX_TURNS, DEFAULT_RUNNER_TIMEOUT_SECS, get_default_model, get_dotnet_program,
    get_max_turns, get_runner_timeout,
};

/// What the process should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Ask the model a question; it may call the tools
    Agent { query: String },
    /// Call one tool directly with JSON arguments, no model involved
    Invoke { tool: String, args: String },
    /// Print tool names, descriptions and schemas
    ListTools,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub cwd: PathBuf,
    pub model: String,
    pub system_prompt: Option<PathBuf>,
    pub max_turns: usize,
    pub dotnet: String,
    pub runner_timeout: u64, // seconds
    pub max_locations: Option<usize>, // None = list every location
    pub tool_disable: Vec<String>,
}

impl Config {
    pub fn from_args() -> Self {
        let matches = Self::build_cli().get_matches();

        // Handle completions generation immediately
        if let Some(shell) = matches.get_one::<String>("completions") {
            Self::handle_completions(shell);
            std::process::exit(0);
        }

        match Self::from_matches(&matches) {
            Ok(config) => config,
            Err(e) => e.exit(),
        }
    }

    /// Parse from an explicit argument list (first item is the binary name)
    pub fn try_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::build_cli().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let query_parts: Vec<String> = matches
            .get_many::<String>("query")
            .unwrap_or_default()
            .cloned()
            .collect();
        let query = query_parts.join(" ");

        let mode = if matches.get_flag("list-tools") {
            Mode::ListTools
        } else if let Some(tool) = matches.get_one::<String>("invoke") {
            Mode::Invoke {
                tool: tool.clone(),
                args: matches
                    .get_one::<String>("args")
                    .cloned()
                    .unwrap_or_else(|| "{}".to_string()),
            }
        } else if query.trim().is_empty() {
            return Err(Self::build_cli().error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "No query provided. Pass a question, --invoke TOOL or --list-tools.",
            ));
        } else {
            Mode::Agent { query }
        };

        let max_locations = matches
            .get_one::<usize>("max-locations")
            .copied()
            .filter(|&n| n > 0);

        Ok(Self {
            mode,
            cwd: matches
                .get_one::<PathBuf>("cwd")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
            model: matches
                .get_one::<String>("model")
                .cloned()
                .unwrap_or_else(get_default_model),
            system_prompt: matches.get_one::<PathBuf>("system-prompt").cloned(),
            max_turns: matches
                .get_one::<usize>("max-turns")
                .copied()
                .unwrap_or(DEFAULT_MAX_TURNS),
            dotnet: matches
                .get_one::<String>("dotnet")
                .cloned()
                .unwrap_or_else(get_dotnet_program),
            runner_timeout: matches
                .get_one::<u64>("runner-timeout")
                .copied()
                .unwrap_or(DEFAULT_RUNNER_TIMEOUT_SECS),
            max_locations,
            tool_disable: matches
                .get_many::<String>("tool-disable")
                .unwrap_or_default()
                .cloned()
                .collect(),
        })
    }

    fn build_cli() -> Command {
        Command::new("tda")
            .version(env!("TDA_VERSION"))
            .about("Technical Debt Agent - ask an AI about diagnostics in your .NET projects")
            .after_help(
                "Examples:\n  \
                 tda \"Give me a summary of style diagnostics in ../path/to/project\"\n  \
                 tda \"What are the most common analyzer diagnostics?\" --cwd /path/to/project\n  \
                 tda --invoke extract_style_diagnostics --args '{\"severity\":\"error\"}'\n\n\
                 Logs are written to {tempdir}/tda.log (override with TDA_LOG_FILE).\n\
                 Set TDA_LOG_LEVEL (debug, info, warn, error) to also log to stderr.",
            )
            .next_help_heading("Query")
            .arg(
                Arg::new("query")
                    .help("Question for the agent")
                    .num_args(0..)
                    .required(false),
            )
            .arg(
                Arg::new("cwd")
                    .long("cwd")
                    .help("Working directory for the agent; tools cannot reach outside it")
                    .value_name("DIR")
                    .value_parser(clap::value_parser!(PathBuf))
                    .default_value(".")
                    .action(clap::ArgAction::Set),
            )
            .next_help_heading("Model Options")
            .arg(
                Arg::new("model")
                    .short('m')
                    .long("model")
                    .help("Model to use, e.g. 'gemini-2.5-flash', 'gpt-4o-mini'. Can be set via TDA_MODEL environment variable.")
                    .value_name("MODEL")
                    .default_value(get_default_model())
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("system-prompt")
                    .long("system-prompt")
                    .help("Replace the bundled system prompt with a prompty or text file")
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("max-turns")
                    .long("max-turns")
                    .help("Maximum model round trips (TDA_MAX_TURNS)")
                    .value_name("N")
                    .value_parser(clap::value_parser!(usize))
                    .default_value(get_max_turns().to_string())
                    .action(clap::ArgAction::Set),
            )
            .next_help_heading("Tool Options")
            .arg(
                Arg::new("dotnet")
                    .long("dotnet")
                    .help("dotnet executable used to run 'dotnet format' (TDA_DOTNET)")
                    .value_name("PATH")
                    .default_value(get_dotnet_program())
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("runner-timeout")
                    .long("runner-timeout")
                    .help("Seconds before an analyzer run is abandoned (TDA_RUNNER_TIMEOUT)")
                    .value_name("SECS")
                    .value_parser(clap::value_parser!(u64).range(1..))
                    .default_value(get_runner_timeout().as_secs().to_string())
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("max-locations")
                    .long("max-locations")
                    .help("List at most N locations per diagnostic id (0 = all)")
                    .value_name("N")
                    .value_parser(clap::value_parser!(usize))
                    .default_value("0")
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("tool-disable")
                    .long("tool-disable")
                    .help("Disable specific tools (comma-separated: extract_style_diagnostics,extract_analyzers_diagnostics)")
                    .value_name("TOOLS")
                    .value_delimiter(',')
                    .action(clap::ArgAction::Append),
            )
            .arg(
                Arg::new("list-tools")
                    .long("list-tools")
                    .help("Print the available tools with their input schemas and exit")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("invoke")
                    .long("invoke")
                    .help("Call a tool directly, without a model, and print its response")
                    .value_name("TOOL")
                    .conflicts_with("list-tools")
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("args")
                    .long("args")
                    .help("JSON arguments for --invoke (default: {})")
                    .value_name("JSON")
                    .requires("invoke")
                    .action(clap::ArgAction::Set),
            )
            .next_help_heading("Other Options")
            .arg(
                Arg::new("completions")
                    .long("completions")
                    .help("Generate shell completion script")
                    .value_name("SHELL")
                    .value_parser(["bash", "zsh", "fish", "powershell", "nushell"])
                    .action(clap::ArgAction::Set),
            )
    }

    fn handle_completions(shell: &str) {
        let mut cmd = Self::build_cli();
        let bin_name = "tda";

        match shell {
            "bash" => generate(shells::Bash, &mut cmd, bin_name, &mut std::io::stdout()),
            "zsh" => generate(shells::Zsh, &mut cmd, bin_name, &mut std::io::stdout()),
            "fish" => generate(shells::Fish, &mut cmd, bin_name, &mut std::io::stdout()),
            "powershell" => generate(
                shells::PowerShell,
                &mut cmd,
                bin_name,
                &mut std::io::stdout(),
            ),
            "nushell" => generate(Nushell, &mut cmd, bin_name, &mut std::io::stdout()),
            _ => eprintln!("Unsupported shell: {}", shell),
        }
    }
}
