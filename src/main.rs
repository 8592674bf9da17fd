use clap::{Parser, Subcommand};
use ninepints::routing::{Router, Status};
use ninepints::{config, enumerate, generate, output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "ninepints")]
#[command(about = "Blog engine with dated post URLs and paginated listings")]
#[command(long_about = "\
Blog engine with dated post URLs and paginated listings

Your filesystem is the data source. Every directory is a page described by a
page.toml; blog posts live directly under a blog index and are served at
<index>/YYYY/MM/<slug>/.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── page.toml                    # Home page (optional)
  ├── assets/                      # Copied to the build root
  ├── 010-blog/                    # Blog index (numbered = shown in nav)
  │   ├── page.toml                # kind = \"index\"
  │   └── hello-world/
  │       └── page.toml            # kind = \"post\", pub_date, tags, body
  └── 020-about/
      ├── page.toml
      └── body.md                  # Markdown body

Listing URLs under an index:

  <index>/                  all posts
  <index>/tag/<tag>/        posts with a tag
  <index>/YYYY/             posts from a year
  <index>/YYYY/MM/          posts from a month
  .../page/N/               page N of any of the above

Run 'ninepints gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log progress (otherwise RUST_LOG decides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the content directory and show the page tree
    Scan,
    /// List every URL a static build renders
    Paths {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Show post counts per listing bucket instead
        #[arg(long)]
        counts: bool,
    },
    /// Show what a request path resolves to
    Resolve {
        /// Request path, e.g. /blog/2022/03/hello/
        path: String,
    },
    /// Render the site to the output directory
    Build,
    /// Validate content and confirm every enumerated URL resolves
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Scan => {
            let site = scan::scan(&cli.source)?;
            output::print_scan_output(&site);
        }
        Command::Paths { json, counts } => {
            let site = scan::scan(&cli.source)?;
            if counts {
                for line in output::format_bucket_counts(&site.tree) {
                    println!("{}", line);
                }
            } else {
                let enumeration = enumerate::enumerate(&site.tree);
                if json {
                    println!("{}", serde_json::to_string_pretty(&enumeration)?);
                } else {
                    output::print_paths_output(&enumeration);
                }
            }
        }
        Command::Resolve { path } => {
            let site = scan::scan(&cli.source)?;
            let router = Router::new(&site.tree);
            output::print_resolution(&path, &router.resolve(&path));
        }
        Command::Build => {
            let site = scan::scan(&cli.source)?;
            init_thread_pool(&site.config.processing);
            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let report = generate::build(&site, &cli.output)?;
            output::print_build_output(&report, &cli.output);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            output::print_scan_output(&site);

            let enumeration = enumerate::enumerate(&site.tree);
            let router = Router::new(&site.tree);
            let broken: Vec<&String> = enumeration
                .paths
                .iter()
                .filter(|path| router.resolve(path).status() != Status::Ok)
                .collect();
            for path in &broken {
                println!("    Does not resolve: {path}");
            }
            if !enumeration.is_complete() || !broken.is_empty() {
                return Err(format!(
                    "{} skipped listing bucket(s), {} unresolvable path(s)",
                    enumeration.skipped.len(),
                    broken.len()
                )
                .into());
            }
            println!("==> Content is valid ({} paths)", enumeration.paths.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
