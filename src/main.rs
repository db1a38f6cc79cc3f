use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tabula::{config, generate, output, publications, scan, verify};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Static site generator driven by content-control tables")]
#[command(long_about = "\
Static site generator driven by content-control tables

A CSV control table decides which pages exist and which sections they show,
in what order. Section prose lives in markdown blocks.

Content structure:

  content/
  ├── control.csv                  # page_slug,kind,status,title,order,section,source_md,...
  ├── links.csv                    # label,url,kind,order (optional)
  ├── site.json                    # Site settings and theme (optional)
  ├── blocks/                      # Markdown blocks, referenced by bare name
  │   └── welcome.md
  ├── blog/
  │   ├── posts.csv                # source_md,title,date,slug (optional)
  │   └── 2024-notes.txt           # Legacy post: title line, blank line, body
  ├── digests/
  │   └── index.json               # [{date,title,slug,source_md}]
  ├── assets/                      # Copied to site/assets/
  └── media/                       # Copied to site/assets/img/

Rows with status draft/hidden/archived/inactive or active != true are skipped.

Run 'tabula gen-config' to print a documented site.json.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "site", global = true)]
    output: PathBuf,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the content directory and generate the site
    Build,
    /// Validate the content directory and print the content dashboard
    Check,
    /// Check an existing site for broken and forbidden links
    Verify,
    /// Print a stock site.json with every option at its default
    GenConfig,
    /// Render a BibTeX file into a publications block under the content directory
    Publications {
        /// BibTeX input
        bib: PathBuf,
        /// Block file name inside blocks/
        #[arg(long, default_value = "publications.md")]
        block: String,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    tabula::init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            println!("==> Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            println!("==> Generating {}", cli.output.display());
            let report = generate::generate(&manifest, &cli.output)?;
            output::print_generate_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            output::print_dashboard(&manifest);
            println!("==> Content is valid");
        }
        Command::Verify => {
            // Forbidden targets come from site.json when the content root is at hand.
            let site = config::load_config(&cli.source)?;
            let report = verify::verify(&cli.output, &site.forbidden_link_targets)?;
            output::print_verify_output(&report);
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_json());
        }
        Command::Publications { bib, block } => {
            let report = publications::write_block(&bib, &cli.source, &block)?;
            println!(
                "==> Wrote {} entries to {}",
                report.entries,
                report.block.display()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
