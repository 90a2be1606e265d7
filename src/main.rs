use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sample_library_manager::{
    cli::commands::{Cli, Commands},
    library::import::collect_items,
    utils::reporting::Reporter,
    DirectoryNavigator, ImportPipeline, LibraryConfig, LibraryPath, LocalFileSystem, LogNotifier,
    SampleEdit, SampleLibrary,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = LibraryConfig::with_root(cli.library);
    config.include_hidden = cli.include_hidden;
    config.persist_hashes = !cli.no_persist_hashes;
    if let Commands::Import { allow_batch_duplicates: true, .. } = cli.command {
        config.dedup_within_batch = false;
    }

    let fs = Arc::new(LocalFileSystem);
    let mut library = match SampleLibrary::open(config, fs.clone()).await {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error opening library: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::List { path } => {
            let mut navigator = DirectoryNavigator::new();
            for segment in LibraryPath::parse(&path).segments() {
                navigator.enter(segment);
            }

            let crumbs: Vec<String> = navigator.breadcrumbs().into_iter().map(|c| c.label).collect();
            println!("{}", crumbs.join(" / "));

            let view = match library.reload(navigator.current()).await {
                Ok(view) => view,
                Err(e) => {
                    eprintln!("Error listing {}: {}", navigator.current(), e);
                    return ExitCode::FAILURE;
                }
            };

            for dir in &view.directories {
                println!("  [dir] {}", dir.name());
            }
            for sample in &view.samples {
                let tags = if sample.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", sample.tags.join(", "))
                };
                println!(
                    "  {} ({:.2}s, {} Hz, {:.0} kbps){}",
                    sample.title,
                    sample.media.duration,
                    sample.media.sample_rate,
                    sample.media.bit_rate,
                    tags
                );
            }
            if view.directories.is_empty() && view.samples.is_empty() {
                println!("  (empty)");
            }
        }

        Commands::Import { sources, target, report, .. } => {
            let target = LibraryPath::parse(&target);
            println!("=== Importing into {} ===", target);

            let items = match collect_items(fs.as_ref(), &sources).await {
                Ok(items) => items,
                Err(e) => {
                    eprintln!("Error reading sources: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            println!("Collected {} file(s)", items.len());

            let pipeline = ImportPipeline::new(Arc::new(LogNotifier));
            let outcomes = match pipeline.import_batch(&mut library, items, &target).await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    eprintln!("Error scanning library: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            for outcome in &outcomes {
                match outcome {
                    Ok(sample) => println!("  Imported: {}", sample.relative_path),
                    Err(e) => println!("  Rejected: {}", e),
                }
            }
            let imported = outcomes.iter().filter(|o| o.is_ok()).count();
            println!("\n{} imported, {} rejected", imported, outcomes.len() - imported);

            if let Some(report_path) = report {
                match Reporter::new().generate_import_report(&outcomes, &report_path) {
                    Ok(_) => println!("Report saved to: {}", report_path.display()),
                    Err(e) => eprintln!("Error generating report: {}", e),
                }
            }
        }

        Commands::Edit { path, title, description, tags, clear_tags } => {
            let edit = SampleEdit {
                title,
                description,
                tags: if clear_tags {
                    Some(Vec::new())
                } else if tags.is_empty() {
                    None
                } else {
                    Some(tags)
                },
            };

            match library.edit(&LibraryPath::parse(&path), edit).await {
                Ok(sample) => println!("Saved {} ({})", sample.title, sample.relative_path),
                Err(e) => {
                    eprintln!("Error editing {}: {}", path, e);
                    return ExitCode::FAILURE;
                }
            }
        }

        Commands::Export { output, scope } => {
            let scope = LibraryPath::parse(&scope);
            let samples = match library.known_samples(&scope).await {
                Ok(samples) => samples,
                Err(e) => {
                    eprintln!("Error scanning {}: {}", scope, e);
                    return ExitCode::FAILURE;
                }
            };

            match Reporter::new().generate_catalog(&samples, &output) {
                Ok(_) => println!("Exported {} sample(s) to {}", samples.len(), output.display()),
                Err(e) => {
                    eprintln!("Error generating catalog: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
