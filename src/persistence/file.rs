use super::{LoadedProject, PersistenceResult, migration::migrate, restore_project};
use crate::config::EngineConfig;
use crate::project::Project;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let snapshot = project.to_snapshot();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(
    path: P,
    config: &EngineConfig,
) -> PersistenceResult<LoadedProject> {
    let file = File::open(path)?;
    let root: Value = serde_json::from_reader(BufReader::new(file))?;
    load_value(root, config)
}

pub fn load_project_from_str(
    input: &str,
    config: &EngineConfig,
) -> PersistenceResult<LoadedProject> {
    let root: Value = serde_json::from_str(input)?;
    load_value(root, config)
}

fn load_value(root: Value, config: &EngineConfig) -> PersistenceResult<LoadedProject> {
    let (snapshot, mut report) = migrate(root)?;
    let mut loaded = restore_project(snapshot, config);
    report.warnings.append(&mut loaded.report.warnings);
    loaded.report = report;
    Ok(loaded)
}
