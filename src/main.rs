//! Locadan - Entry Point
//!
//! Kommandoradsgränssnitt mot det lokala datalagret.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use locadan::models::{AppSettings, Collection, Record, StoredRecord};
use locadan::services::{
    find_duplicates, find_orphan_references, BackupService, ReportKind, ReportService,
    RestoreService,
};
use locadan::utils::date::format_optional_fr;
use locadan::utils::path::{display_path, get_config_path};
use locadan::Locadan;

#[derive(Parser)]
#[command(name = "locadan")]
#[command(about = "Locadan - gestion locative locale")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Journalisation détaillée (debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fichier de paramètres alternatif
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tableau de bord : effectifs, totaux et taux
    Summary,
    /// Lister les éléments d'une collection
    #[command(alias = "ls")]
    List {
        /// Collection (nom anglais ou français)
        collection: Collection,
    },
    /// Ajouter un élément depuis du JSON
    Add {
        collection: Collection,
        /// Champs de l'élément en objet JSON
        json: String,
    },
    /// Remplacer l'élément à une position
    Update {
        collection: Collection,
        index: usize,
        json: String,
    },
    /// Supprimer l'élément à une position
    #[command(alias = "rm")]
    Delete { collection: Collection, index: usize },
    /// Afficher ou changer la devise d'affichage
    Currency {
        #[command(subcommand)]
        command: Option<CurrencyCommands>,
    },
    /// Créer une sauvegarde JSON
    Backup {
        /// Fichier cible (par défaut : dossier de sauvegarde)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lister les sauvegardes existantes
    Backups,
    /// Restaurer depuis une sauvegarde
    Restore {
        file: PathBuf,
        /// Afficher ce qui serait remplacé sans rien modifier
        #[arg(long)]
        dry_run: bool,
    },
    /// Gérer les documents
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },
    /// Générer un rapport PDF
    Report {
        /// receipt, revision, payment, expense, payments, expenses, receipts, revisions
        kind: ReportKind,
        /// Position pour les rapports unitaires
        #[arg(short, long)]
        index: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rechercher les références orphelines et les doublons
    Check,
    /// Afficher les paramètres en TOML
    Config {
        /// Écrire les paramètres dans le fichier de paramètres
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand, Clone)]
enum CurrencyCommands {
    Show,
    Toggle,
}

#[derive(Subcommand)]
enum DocCommands {
    /// Importer des fichiers
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    #[command(alias = "ls")]
    List,
    /// Enregistrer un document sur disque
    Get {
        id: i64,
        /// Fichier ou dossier (par défaut : dossier courant)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    #[command(alias = "rm")]
    Delete { id: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path),
        None => AppSettings::load(),
    };

    // Initiera logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        settings.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Startar Locadan v{}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(get_config_path);
    let mut app = Locadan::open(settings).context("Impossible d'ouvrir la base de données")?;
    run(&mut app, cli.command, &config_path)
}

fn run(app: &mut Locadan, command: Commands, config_path: &Path) -> Result<()> {
    match command {
        Commands::Summary => {
            for line in app.dashboard().lines(app.currency()) {
                println!("{}", line);
            }
            let docs = app.documents();
            println!(
                "Documents : {} ({} o)",
                docs.count()?,
                docs.total_size()?
            );
            println!("Schéma : v{}", app.database().schema_version()?);
        }

        Commands::List { collection } => {
            let records = app.records();
            let items = records.list_for_display(collection);
            if items.is_empty() {
                println!("Aucun élément dans {}", collection.label());
            }
            for stored in items {
                let index = records
                    .position_of(stored.id)
                    .map(|(_, i)| i)
                    .unwrap_or_default();
                println!("{}", format_row(app, index, stored));
            }
        }

        Commands::Add { collection, json } => {
            let record = parse_record(collection, &json)?;
            let id = app.records_mut().upsert(collection, None, record)?;
            println!("Ajouté {} dans {}", id, collection.label());
        }

        Commands::Update {
            collection,
            index,
            json,
        } => {
            let record = parse_record(collection, &json)?;
            let id = app.records_mut().upsert(collection, Some(index), record)?;
            println!("Modifié {} dans {}", id, collection.label());
        }

        Commands::Delete { collection, index } => {
            let removed = app.records_mut().delete(collection, index)?;
            println!("Supprimé {} : {}", removed.id, removed.record.summary());
        }

        Commands::Currency { command } => {
            if let Some(CurrencyCommands::Toggle) = command {
                app.toggle_currency()?;
            }
            let currency = app.currency();
            println!("Devise : {} ({})", currency.symbol(), currency.code());
        }

        Commands::Backup { output } => {
            let service = app.backup();
            let result = match output {
                Some(path) => service.write_to(&path)?,
                None => service.create_backup(&app.settings().backup_directory)?,
            };
            println!(
                "Sauvegarde : {} ({}, {} enregistrements)",
                display_path(&result.path),
                result.size_display(),
                result.record_count
            );
        }

        Commands::Backups => {
            let backups = BackupService::list_backups(&app.settings().backup_directory)?;
            if backups.is_empty() {
                println!("Aucune sauvegarde");
            }
            for backup in backups {
                println!(
                    "{}  {}  {}",
                    backup.date.as_deref().unwrap_or("-"),
                    backup.size_display(),
                    backup.filename
                );
            }
        }

        Commands::Restore { file, dry_run } => {
            if dry_run {
                let json = locadan::utils::file_ops::read_text_file(&file)?;
                let preview = RestoreService::preview(&json)?;
                for (collection, count) in &preview.replaced {
                    println!("{} : remplacé ({} enregistrements)", collection.label(), count);
                }
                for collection in &preview.untouched {
                    println!("{} : inchangé", collection.label());
                }
                print_unknown_keys(&preview.unknown_keys);
            } else {
                let result = app.restore().restore_file(&file)?;
                println!(
                    "Restauré {} collections ({} enregistrements)",
                    result.restored.len(),
                    result.record_count()
                );
                print_unknown_keys(&result.unknown_keys);
            }
        }

        Commands::Doc { command } => run_doc(app, command)?,

        Commands::Report {
            kind,
            index,
            output,
        } => {
            if kind.is_single() && index.is_none() {
                bail!("Le rapport {} exige --index", kind);
            }
            let path = output.unwrap_or_else(|| {
                app.settings()
                    .report_directory
                    .join(ReportService::generate_filename(kind))
            });
            let result = app.reports().export_to_file(kind, index, &path)?;
            println!("{} : {}", result.summary(), display_path(&path));
        }

        Commands::Config { init } => run_config(app.settings(), config_path, init)?,

        Commands::Check => {
            let orphans = find_orphan_references(app.records());
            let duplicates = find_duplicates(app.records());

            for orphan in &orphans {
                println!(
                    "{}[{}] {} : {} « {} » introuvable",
                    orphan.collection,
                    orphan.index,
                    orphan.id,
                    orphan.kind.label(),
                    orphan.value
                );
            }
            for group in &duplicates {
                println!("{} : doublons aux positions {:?}", group.collection, group.indices);
            }
            if orphans.is_empty() && duplicates.is_empty() {
                println!("Aucun problème détecté");
            }
        }
    }

    Ok(())
}

fn run_config(settings: &AppSettings, path: &Path, init: bool) -> Result<()> {
    if init {
        settings.save_to(path)?;
        println!("Paramètres enregistrés : {}", display_path(path));
    } else {
        print!("{}", toml::to_string_pretty(settings)?);
    }
    Ok(())
}

fn run_doc(app: &mut Locadan, command: DocCommands) -> Result<()> {
    match command {
        DocCommands::Add { files } => {
            let result = app.import_documents(&files)?;
            for id in &result.ids {
                println!("Ajouté document #{}", id);
            }
            println!("{}", result.summary());
        }
        DocCommands::List => {
            for info in app.document_files().list()? {
                println!(
                    "#{}  {}  {}  {}  {}  {}",
                    info.id,
                    info.kind_label(),
                    info.name,
                    info.file_size_display(),
                    info.mime_type,
                    info.created_at
                );
            }
        }
        DocCommands::Get { id, output } => {
            let target = output.unwrap_or_else(|| PathBuf::from("."));
            let path = app.document_files().export(id, &target)?;
            println!("Enregistré : {}", display_path(&path));
        }
        DocCommands::Delete { id } => {
            if app.delete_document(id)? {
                println!("Supprimé document #{}", id);
            } else {
                println!("Fichier introuvable (#{})", id);
            }
        }
    }
    Ok(())
}

fn parse_record(collection: Collection, json: &str) -> Result<Record> {
    let value = serde_json::from_str(json).context("JSON invalide")?;
    Ok(Record::from_value(collection, value)?)
}

fn format_row(app: &Locadan, index: usize, stored: &StoredRecord) -> String {
    let mut row = format!("[{}] {} {}", index, stored.id, stored.record.summary());
    if let Some(date) = stored.record.date() {
        row.push_str(&format!(" · {}", format_optional_fr(Some(date))));
    }
    if let Some(amount) = stored.record.amount() {
        row.push_str(&format!(" · {}", app.format_amount(amount)));
    }
    row
}

fn print_unknown_keys(keys: &[String]) {
    if !keys.is_empty() {
        println!("Clés ignorées : {}", keys.join(", "));
    }
}
