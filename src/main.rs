use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use netviewer::config::Config;
use netviewer::render::{self, OutputFormat};
use netviewer::shell::ToolPage;
use netviewer::{
    ApplicationShell, CertificateLookupView, FailureSink, FaviconFetcher, NoopOpener,
    OpenWithDefaultApplication, OpensslProvider, ReminderEventBuilder, SystemOpener, TracingSink,
};

const DEFAULT_CONFIG_FILE: &str = "netviewer.toml";

#[derive(Parser)]
#[command(name = "NetViewer")]
#[command(version, author, about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// Configuration file (defaults to ./netviewer.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Page shown at startup: dns, ssl or ip
    #[arg(long, value_name = "PAGE")]
    start_page: Option<String>,

    /// Days between the renewal reminder and the certificate expiry
    #[arg(long, value_name = "DAYS")]
    lead_days: Option<i64>,

    /// Do not fetch favicons
    #[arg(long)]
    no_favicon: bool,

    /// Write reminder files without opening them
    #[arg(long)]
    no_open: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one certificate and exit
    Ssl {
        /// Domain to inspect (host, host:port or URL)
        domain: String,

        /// Output format: table or json
        #[arg(short, long)]
        output: Option<String>,

        /// Also create a renewal reminder
        #[arg(long)]
        remind: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.generate_config {
        println!("{}", Config::example_toml());
        return ExitCode::SUCCESS;
    }

    let output = match &cli.command {
        Some(Command::Ssl { output, .. }) => output.clone(),
        None => None,
    };
    let config = match load_config(&cli, output) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let sink: Arc<dyn FailureSink> = Arc::new(TracingSink);
    let view = build_view(&config, Arc::clone(&sink));
    let opener: Box<dyn OpenWithDefaultApplication> = if config.open_file() {
        Box::new(SystemOpener::detect())
    } else {
        Box::new(NoopOpener)
    };
    let reminders = ReminderEventBuilder::new(opener, sink).with_lead_days(config.lead_days());

    match cli.command {
        Some(Command::Ssl { domain, remind, .. }) => {
            // validated in load_config
            let format = config.output_format().unwrap_or(OutputFormat::Table);
            run_once(view, &config, &reminders, &domain, format, remind)
        }
        None => {
            let mut shell = ApplicationShell::new(view);
            if let Ok(kind) = config.start_tool() {
                shell.select_kind(kind);
            }
            run_interactive(shell, &reminders)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "netviewer=debug" } else { "netviewer=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli, output: Option<String>) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::defaults();

    let file = cli.config.clone().or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.exists().then(|| default.to_path_buf())
    });
    if let Some(path) = file {
        info!(path = %path.display(), "loading configuration");
        config = config.merge_with(Config::from_file(&path)?);
    }

    config = config.merge_with(Config::from_cli_args(
        cli.start_page.clone(),
        output,
        cli.lead_days,
        cli.no_favicon.then_some(false),
        cli.no_open.then_some(false),
    ));
    config.validate()?;
    Ok(config)
}

fn build_view(config: &Config, sink: Arc<dyn FailureSink>) -> CertificateLookupView {
    let provider = OpensslProvider::new(config.provider_port(), config.provider_timeout());
    let view = CertificateLookupView::new(Box::new(provider), Arc::clone(&sink));
    match config.favicon_settings() {
        Some(settings) => match FaviconFetcher::new(settings, sink) {
            Ok(fetcher) => view.with_favicons(fetcher),
            Err(e) => {
                warn!(error = %e, "favicons disabled");
                view
            }
        },
        None => view,
    }
}

fn run_once(
    mut view: CertificateLookupView,
    config: &Config,
    reminders: &ReminderEventBuilder,
    domain: &str,
    format: OutputFormat,
    remind: bool,
) -> ExitCode {
    view.lookup(domain);
    if let Some(settings) = config.favicon_settings() {
        view.wait_for_favicon(settings.timeout);
    }

    match format {
        OutputFormat::Json => match render::render_json(&view) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "cannot serialize lookup");
                return ExitCode::FAILURE;
            }
        },
        OutputFormat::Table => println!("{}", render::render_certificate(&view)),
    }

    if remind {
        match view.add_renewal_reminder(reminders) {
            Some(path) => eprintln!("Reminder written to {}", path.display()),
            None => eprintln!("No reminder created"),
        }
    }

    if view.panel().error_line().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Select(usize),
    Remind,
    Help,
    Quit,
    Unknown(&'a str),
    Text(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Text(line);
    };
    match command.to_ascii_lowercase().as_str() {
        "1" | "dns" => Input::Select(0),
        "2" | "ssl" => Input::Select(1),
        "3" | "ip" => Input::Select(2),
        "remind" => Input::Remind,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Unknown(line),
    }
}

const HELP: &str = "/1 /dns  /2 /ssl  /3 /ip   switch tool\n\
                    /remind                   add a renewal reminder\n\
                    /help  /quit\n\
                    anything else on the SSL page looks up that domain";

fn draw(shell: &mut ApplicationShell) {
    if let Some(view) = shell.certificate_view_mut() {
        view.poll_favicon();
    }
    println!("{}\n", render::render_sidebar(shell));
    println!("{}", render::render_page(shell));
}

fn run_interactive(mut shell: ApplicationShell, reminders: &ReminderEventBuilder) -> ExitCode {
    draw(&mut shell);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        if let Err(e) = io::stdout().flush() {
            error!(error = %e, "stdout closed");
            return ExitCode::FAILURE;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!(error = %e, "cannot read input");
                return ExitCode::FAILURE;
            }
            None => return ExitCode::SUCCESS,
        };

        match parse_input(&line) {
            Input::Quit => return ExitCode::SUCCESS,
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Unknown(command) => {
                println!("unknown command {}; try /help", command);
                continue;
            }
            Input::Select(index) => {
                shell.select_tool(index);
            }
            Input::Remind => {
                let created = match shell.current_page() {
                    ToolPage::Certificate(view) => view.add_renewal_reminder(reminders),
                    ToolPage::Placeholder(_) => None,
                };
                if let Some(path) = created {
                    println!("Reminder written to {}", path.display());
                }
                continue;
            }
            Input::Text(text) => match shell.current_page_mut() {
                ToolPage::Certificate(view) => view.lookup(text),
                ToolPage::Placeholder(_) => {}
            },
        }
        draw(&mut shell);
    }
}
