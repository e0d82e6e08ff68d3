use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;
use lectern_core::{
    Article, FetchConfig, HttpImageFetcher, Options, OutputFormat, Sanitizer, fetch_file, fetch_stdin, fetch_url,
};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for sanitized content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format(OutputFormat);

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self(OutputFormat::Html)),
            "markdown" | "md" => Ok(Self(OutputFormat::Markdown)),
            "text" | "txt" => Ok(Self(OutputFormat::PlainText)),
            "json" => Ok(Self(OutputFormat::Json)),
            _ => Err(format!("Invalid format: {}. Valid options: html, markdown, text, json", s)),
        }
    }
}

/// Turn web pages into clean, reader-mode HTML
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author = "Lectern Contributors")]
#[command(version)]
#[command(about = "Turn web pages into clean, reader-mode HTML", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, markdown, text, json)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: Format,

    /// Document URL used to resolve relative links (required for stdin)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// JSON options file (default: the user config directory, if present)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Per-image size probe timeout in milliseconds (0 waits indefinitely)
    #[arg(long, value_name = "MS")]
    image_timeout: Option<u64>,

    /// Infer image sizes from markup only, never over the network
    #[arg(long)]
    no_image_fetch: bool,

    /// Keep iframe, embed and object elements
    #[arg(long)]
    preserve_embeds: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// The URL relative links in the document are resolved against.
fn document_url(args: &Args) -> anyhow::Result<Url> {
    if let Some(url) = &args.url {
        return Url::parse(url).with_context(|| format!("Invalid document URL: {}", url));
    }
    if is_remote(&args.input) {
        return Url::parse(&args.input).with_context(|| format!("Invalid URL: {}", args.input));
    }
    if args.input == "-" {
        bail!("--url is required when reading from stdin");
    }

    let path = fs::canonicalize(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
    Url::from_file_path(&path).map_err(|_| anyhow::anyhow!("Cannot express {} as a file URL", path.display()))
}

fn load_options(args: &Args) -> anyhow::Result<Options> {
    let mut options = match &args.options {
        Some(path) => Options::from_file(path).with_context(|| format!("Failed to load options: {}", path.display()))?,
        None => Options::load_default().context("Failed to load default options")?,
    };

    if args.preserve_embeds {
        options.preserve_embeds = true;
    }
    if let Some(ms) = args.image_timeout {
        options.image_fetch_timeout = (ms > 0).then(|| Duration::from_millis(ms));
    }
    Ok(options)
}

async fn read_input(args: &Args, config: &FetchConfig) -> anyhow::Result<String> {
    if args.input == "-" {
        fetch_stdin().context("Failed to read from stdin")
    } else if is_remote(&args.input) {
        fetch_url(&args.input, config).await.context("Failed to fetch URL")
    } else {
        fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))
    }
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        echo::print_banner();
    }
    let started = Instant::now();
    let mut timings = Vec::new();

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let url = document_url(&args)?;
    let options = load_options(&args)?;
    tracing::debug!(%url, preserve_embeds = options.preserve_embeds, "starting sanitize");

    if args.verbose {
        echo::print_step(1, 3, &format!("Reading {}", args.input.bright_white()));
    }
    let step = Instant::now();
    let html = read_input(&args, &fetch_config).await?;
    timings.push(("read".to_string(), step.elapsed()));
    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
        eprintln!("  {} {}\n", "Base:".dimmed(), url.as_str().bright_white());
    }

    if args.verbose {
        echo::print_step(2, 3, "Sanitizing document");
    }
    let step = Instant::now();
    let sanitizer = Sanitizer::with_options(options);
    let article = if args.no_image_fetch {
        sanitizer.sanitize(&html, url.as_str())
    } else {
        let fetcher = HttpImageFetcher::new(&fetch_config).context("Failed to build image fetcher")?;
        sanitizer.sanitize_with_fetcher(&html, url.as_str(), &fetcher).await
    }
    .context("Failed to sanitize document")?;
    timings.push(("sanitize".to_string(), step.elapsed()));

    if args.verbose {
        echo::print_article_details(&article);
    }
    if article.text_content.trim().is_empty() {
        echo::print_warning("No readable text survived sanitizing");
    }

    if args.verbose {
        echo::print_step(3, 3, &format!("Writing {:?}", args.format.0));
    }
    let output = render(&article, args.format.0)?;
    write_output(args.output.as_deref(), &output)?;

    if args.verbose {
        echo::print_timing_summary(started.elapsed(), &timings);
    }
    Ok(())
}

fn render(article: &Article, format: OutputFormat) -> anyhow::Result<String> {
    let mut output = article.to_format(format).context("Failed to format output")?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}
