use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use odb_memory::{IStream, MemoryDb, MemoryDbConfig, ObjectDbRead, ObjectDbWrite};
use odb_types::{ObjectId, ObjectInfo, ObjectType};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut db = open_db(cli.config.as_deref(), cli.level)?;
    match cli.command {
        Command::HashObject(args) => {
            let hashed = hash_files(&mut db, args.kind, &args.paths)?;
            print_hashed(&hashed, &cli.format)
        }
        Command::Dedup(args) => {
            let report = dedup(&mut db, &args.paths)?;
            print_report(&report, &cli.format)
        }
    }
}

fn open_db(config: Option<&Path>, level: Option<i32>) -> anyhow::Result<MemoryDb> {
    let mut config = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            MemoryDbConfig::from_toml_str(&text)?
        }
        None => MemoryDbConfig::default(),
    };
    if let Some(level) = level {
        config.compression_level = level;
    }
    Ok(MemoryDb::with_config(config)?)
}

#[derive(Debug, Serialize)]
pub struct HashedFile {
    pub path: PathBuf,
    #[serde(flatten)]
    pub info: ObjectInfo,
}

#[derive(Debug, Serialize)]
pub struct DuplicateGroup {
    pub id: ObjectId,
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct DedupReport {
    pub files: usize,
    pub distinct: usize,
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
    pub duplicates: Vec<DuplicateGroup>,
}

fn store_file(db: &mut MemoryDb, kind: ObjectType, path: &Path) -> anyhow::Result<ObjectInfo> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("reading metadata of {}", path.display()))?
        .len();
    let info = db
        .store(IStream::new(kind, len, BufReader::new(file)))
        .with_context(|| format!("storing {}", path.display()))?;
    Ok(info)
}

pub fn hash_files(
    db: &mut MemoryDb,
    kind: ObjectType,
    paths: &[PathBuf],
) -> anyhow::Result<Vec<HashedFile>> {
    paths
        .iter()
        .map(|path| {
            Ok(HashedFile {
                path: path.clone(),
                info: store_file(db, kind, path)?,
            })
        })
        .collect()
}

pub fn dedup(db: &mut MemoryDb, paths: &[PathBuf]) -> anyhow::Result<DedupReport> {
    let hashed = hash_files(db, ObjectType::Blob, paths)?;

    let mut groups: BTreeMap<ObjectId, Vec<PathBuf>> = BTreeMap::new();
    for file in &hashed {
        groups.entry(file.info.id).or_default().push(file.path.clone());
    }

    let mut raw_bytes = 0;
    let mut duplicates = Vec::new();
    for (id, paths) in groups {
        let size = db.info(id)?.size;
        raw_bytes += size;
        if paths.len() > 1 {
            duplicates.push(DuplicateGroup { id, size, paths });
        }
    }

    Ok(DedupReport {
        files: hashed.len(),
        distinct: db.size(),
        raw_bytes,
        compressed_bytes: db.compressed_bytes(),
        duplicates,
    })
}

fn print_hashed(hashed: &[HashedFile], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(hashed)?),
        OutputFormat::Text => {
            for file in hashed {
                println!("{}  {}", file.info.id.to_string().yellow(), file.path.display());
            }
        }
    }
    Ok(())
}

fn print_report(report: &DedupReport, format: &OutputFormat) -> anyhow::Result<()> {
    if *format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} files, {} distinct objects",
        report.files.to_string().bold(),
        report.distinct.to_string().bold()
    );
    println!(
        "  {} bytes of content, {} bytes compressed",
        report.raw_bytes, report.compressed_bytes
    );
    if report.duplicates.is_empty() {
        println!("{} No duplicates.", "✓".green());
        return Ok(());
    }
    for group in &report.duplicates {
        println!("{} ({} bytes)", group.id.to_string().yellow().bold(), group.size);
        for path in &group.paths {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
