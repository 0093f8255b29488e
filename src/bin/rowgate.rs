use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rowgate::{FieldMap, MetaKey, MetadataRegistry, RuleSet, ValidationDispatcher};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rowgate")]
#[command(about = "Inspect entity declarations and validate records against them")]
struct Cli {
    /// JSON declarations file
    #[arg(long, short = 'd')]
    declarations: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List declared entity types
    Entities,
    /// Print metadata for an entity type
    Meta {
        entity: String,
        /// table_name, primary_key, validation_rules or field_list
        #[arg(long)]
        key: Option<String>,
    },
    /// Validate a JSON record as if it were loaded and its fields changed
    Validate {
        entity: String,
        #[arg(long)]
        record: String,
        /// Fields to mark dirty; defaults to every declared field in the record
        #[arg(long, value_delimiter = ',')]
        dirty: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = load_registry(&cli.declarations)?;

    match cli.command {
        Command::Entities => {
            for name in registry.entity_names() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Meta { entity, key } => print_meta(&registry, &entity, key.as_deref()),
        Command::Validate {
            entity,
            record,
            dirty,
        } => validate_record(&registry, &entity, &record, &dirty),
    }
}

fn load_registry(path: &Path) -> Result<MetadataRegistry> {
    MetadataRegistry::load(path)
        .with_context(|| format!("Failed to load declarations from '{}'", path.display()))
}

fn print_meta(registry: &MetadataRegistry, entity: &str, key: Option<&str>) -> Result<()> {
    let key = key.map(str::parse::<MetaKey>).transpose()?;
    let value = registry.get_metadata(entity, key)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn validate_record(registry: &MetadataRegistry, entity: &str, record: &str, dirty: &[String]) -> Result<()> {
    let record: FieldMap =
        serde_json::from_str(record).context("Record must be a flat JSON object")?;

    let dirty_fields: Vec<String> = if dirty.is_empty() {
        let entity_type = registry.entity_type(entity)?;
        record
            .keys()
            .filter(|k| entity_type.declares(k))
            .cloned()
            .collect()
    } else {
        dirty.to_vec()
    };

    let mut instance = registry.load_entity(entity, record)?;
    for field in &dirty_fields {
        instance.mark_dirty(field)?;
    }

    let dispatcher = ValidationDispatcher::new(registry.clone(), RuleSet::new());
    let errors = dispatcher.validate(&instance)?;

    if errors.has_errors() {
        println!("{}", serde_json::to_string_pretty(&errors)?);
        return Err(anyhow!("{} validation error(s)", errors.len()));
    }

    println!("ok");
    Ok(())
}
