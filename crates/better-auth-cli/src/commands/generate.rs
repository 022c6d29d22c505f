// `better-auth generate`: write Payload collection configs for the auth models.
//
// Runs the adapter's schema generator offline over the core auth schema and
// writes the resulting TypeScript module into the project.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;

use better_auth_core::db::adapter::SchemaFile;
use better_auth_core::db::schema::AuthSchema;
use better_auth_payload::naming::NameResolver;
use better_auth_payload::schema_gen::schema_file;
use better_auth_payload::PayloadAdapterConfig;

#[derive(Args)]
pub struct GenerateArgs {
    /// Working directory
    #[arg(short, long, default_value = ".")]
    cwd: PathBuf,

    /// Output file path, relative to the working directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pluralize collection slugs (user → users)
    #[arg(long)]
    plural: bool,

    /// Automatically answer yes to all prompts
    #[arg(short, long)]
    yes: bool,
}

/// What happened to the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Created,
    Overwritten,
    Appended,
}

pub fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = if args.cwd.is_relative() {
        std::env::current_dir()?.join(&args.cwd)
    } else {
        args.cwd.clone()
    };

    if !cwd.exists() {
        return Err(format!("The directory \"{}\" does not exist.", cwd.display()).into());
    }

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("Preparing schema…");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let schema = AuthSchema::core_schema();
    let config = PayloadAdapterConfig {
        use_plural: args.plural,
        ..Default::default()
    };
    let resolver = NameResolver::new(&schema, &config);
    let output = args.output.as_ref().map(|p| p.to_string_lossy().into_owned());
    let file = schema_file(&schema, &resolver, output.as_deref());

    spinner.finish_and_clear();

    let path = cwd.join(&file.path);
    let filename = path.display().to_string();

    if path.exists() && !file.append && !file.overwrite {
        return Err(format!("{filename} already exists.").into());
    }

    if !args.yes {
        let prompt = if path.exists() && !file.append {
            format!("Overwrite {}?", filename.yellow())
        } else {
            format!("Generate schema to {}?", filename.yellow())
        };
        let confirm = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        if !confirm {
            println!("Schema generation aborted.");
            return Ok(());
        }
    }

    let written = write_schema(&path, &file)?;
    tracing::debug!(path = %filename, ?written, bytes = file.code.len(), "schema written");

    let verb = match written {
        Written::Appended => "appended",
        Written::Created | Written::Overwritten => "generated",
    };
    println!(
        "{}",
        format!("🚀 Schema was {verb} successfully → {filename}").green()
    );
    Ok(())
}

/// Write `file` to `path`, appending or replacing per the file's flags.
fn write_schema(path: &Path, file: &SchemaFile) -> std::io::Result<Written> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let existed = path.exists();
    if existed && file.append {
        let mut out = OpenOptions::new().append(true).open(path)?;
        out.write_all(b"\n")?;
        out.write_all(file.code.as_bytes())?;
        return Ok(Written::Appended);
    }

    std::fs::write(path, &file.code)?;
    Ok(if existed {
        Written::Overwritten
    } else {
        Written::Created
    })
}
