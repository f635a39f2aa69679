//! STACKPLAN CLI
//!
//! Inspect and verify persisted stack plans.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use indexmap::IndexMap;
use serde::Serialize;
use stackplan_log::{registry, PlanFileReader, RawRecord};
use stackplan_plans::Value;
use stackplan_replay::{LoadConfig, Plan, PlanLoader};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackplan")]
#[command(about = "STACKPLAN - inspect and verify persisted stack plans", long_about = None)]
struct Cli {
    /// Load configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log decoding progress
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records in a plan file without decoding them
    Records {
        /// Path to plan file
        #[arg(short, long)]
        plan: PathBuf,
    },
    /// Load a plan and summarize it
    Inspect {
        /// Path to plan file
        #[arg(short, long)]
        plan: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a plan and report whether it can be trusted
    Verify {
        /// Path to plan file
        #[arg(short, long)]
        plan: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let mut out = std::io::stdout().lock();
    run(cli.command, &config, &mut out)
}

fn init_tracing(verbose: u8) {
    let level = if verbose > 0 { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<LoadConfig> {
    let Some(path) = path else {
        return Ok(LoadConfig::default());
    };
    let file = File::open(path).wrap_err_with(|| format!("cannot open config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("invalid config {}", path.display()))
}

fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let records = PlanFileReader::read_file(path)
        .wrap_err_with(|| format!("cannot read plan file {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "read plan file");
    Ok(records)
}

fn run(command: Commands, config: &LoadConfig, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Records { plan } => {
            let records = read_records(&plan)?;
            for (index, record) in records.iter().enumerate() {
                let known = if registry().is_known(&record.type_id) { "" } else { "  (unknown)" };
                writeln!(out, "{:>4}  {}  {} bytes{}", index, record.type_id, record.len(), known)?;
            }
            Ok(())
        }
        Commands::Inspect { plan, json } => {
            let records = read_records(&plan)?;
            let loaded = PlanLoader::new()
                .with_config(config.clone())
                .load(&records)
                .wrap_err_with(|| format!("cannot load plan {}", plan.display()))?;
            let summary = PlanSummary::new(&loaded, config);
            if json {
                serde_json::to_writer_pretty(&mut *out, &summary)?;
                writeln!(out)?;
            } else {
                summary.write_text(out)?;
            }
            Ok(())
        }
        Commands::Verify { plan } => {
            let records = read_records(&plan)?;
            match PlanLoader::new().with_config(config.clone()).load(&records) {
                Ok(loaded) => {
                    writeln!(
                        out,
                        "plan OK: {} records, {} components",
                        records.len(),
                        loaded.components().len()
                    )?;
                    Ok(())
                }
                Err(err) => bail!("plan {} cannot be trusted: {}", plan.display(), err),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanSummary {
    version: String,
    applyable: bool,
    prev_run_state_bytes: usize,
    inputs: IndexMap<String, Value>,
    components: Vec<ComponentSummary>,
}

#[derive(Debug, Serialize)]
struct ComponentSummary {
    addr: String,
    plan_timestamp: String,
    objects: usize,
    changes: usize,
    without_prior_state: usize,
    actions: IndexMap<&'static str, usize>,
}

impl PlanSummary {
    fn new(plan: &Plan, config: &LoadConfig) -> Self {
        let components = plan
            .components()
            .iter()
            .map(|(addr, component)| {
                let mut actions = IndexMap::new();
                for change in component.planned_changes().values() {
                    *actions.entry(change.action.as_str()).or_insert(0) += 1;
                }
                ComponentSummary {
                    addr: addr.to_string(),
                    plan_timestamp: component.plan_timestamp().to_rfc3339(),
                    objects: component.objects().count(),
                    changes: component.planned_changes().len(),
                    without_prior_state: component.prior_states().values().filter(|s| s.is_none()).count(),
                    actions,
                }
            })
            .collect();

        Self {
            version: config.running_version.to_string(),
            applyable: plan.applyable(),
            prev_run_state_bytes: plan.prev_run_state_raw().len(),
            inputs: plan
                .root_input_values()
                .iter()
                .map(|(variable, value)| (variable.name.clone(), value.clone()))
                .collect(),
            components,
        }
    }

    fn write_text(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "version: {}", self.version)?;
        writeln!(out, "applyable: {}", self.applyable)?;
        writeln!(out, "previous run state: {} bytes", self.prev_run_state_bytes)?;
        writeln!(out, "inputs: {}", self.inputs.len())?;
        for (name, value) in &self.inputs {
            writeln!(out, "  var.{} = {}", name, serde_json::to_string(value)?)?;
        }
        writeln!(out, "components: {}", self.components.len())?;
        for component in &self.components {
            writeln!(out, "  {} (planned {})", component.addr, component.plan_timestamp)?;
            writeln!(
                out,
                "    objects: {}, changes: {}, without prior state: {}",
                component.objects, component.changes, component.without_prior_state
            )?;
            for (action, count) in &component.actions {
                writeln!(out, "    {}: {}", action, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_core::version;
    use stackplan_log::{
        PlanApplyable, PlanComponentInstance, PlanFileWriter, PlanHeader,
        PlanResourceInstanceChangePlanned, PlanRootInputValue, ResourceInstanceChangeWire,
    };
    use stackplan_plans::{DynamicValue, ValueType};

    const PROVIDER: &str = r#"provider["registry.terraform.io/hashicorp/null"]"#;

    fn sample_records(version: &str) -> Vec<RawRecord> {
        let after = DynamicValue::encode(&Value::from("x"), &ValueType::String).unwrap();
        vec![
            RawRecord::pack(&PlanHeader {
                version: version.to_string(),
                prev_run_state_raw: vec![0; 4],
            })
            .unwrap(),
            RawRecord::pack(&PlanApplyable { applyable: true }).unwrap(),
            RawRecord::pack(&PlanRootInputValue {
                name: "region".to_string(),
                value: DynamicValue::encode(&Value::from("eu"), &ValueType::Dynamic).unwrap().into(),
            })
            .unwrap(),
            RawRecord::pack(&PlanComponentInstance {
                component_instance_addr: "component.app".to_string(),
                plan_timestamp: "2024-01-01T00:00:00Z".to_string(),
            })
            .unwrap(),
            RawRecord::pack(&PlanResourceInstanceChangePlanned {
                component_instance_addr: "component.app".to_string(),
                resource_instance_addr: "null_resource.a".to_string(),
                deposed_key: String::new(),
                provider_config_addr: PROVIDER.to_string(),
                change: Some(ResourceInstanceChangeWire {
                    addr: "null_resource.a".to_string(),
                    provider: PROVIDER.to_string(),
                    action: 1,
                    after: Some(after.into()),
                    ..Default::default()
                }),
                prior_state: None,
            })
            .unwrap(),
        ]
    }

    fn write_plan(dir: &tempfile::TempDir, records: &[RawRecord]) -> PathBuf {
        let path = dir.path().join("plan.spln");
        PlanFileWriter::write_file(&path, records).unwrap();
        path
    }

    fn run_to_string(command: Commands, config: &LoadConfig) -> Result<String> {
        let mut out = Vec::new();
        run(command, config, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_records_lists_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = sample_records("0.1.0");
        records.push(RawRecord::new("stackplan.v2.Later", vec![1, 2]));
        let plan = write_plan(&dir, &records);

        let output = run_to_string(Commands::Records { plan }, &LoadConfig::default()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("stackplan.v1.PlanHeader"));
        assert!(!lines[0].contains("(unknown)"));
        assert!(lines[5].ends_with("stackplan.v2.Later  2 bytes  (unknown)"));
    }

    #[test]
    fn test_inspect_text() {
        let dir = tempfile::tempdir().unwrap();
        let plan = write_plan(&dir, &sample_records(&version::running().to_string()));

        let output = run_to_string(Commands::Inspect { plan, json: false }, &LoadConfig::default()).unwrap();
        assert!(output.contains("applyable: true"));
        assert!(output.contains("previous run state: 4 bytes"));
        assert!(output.contains("  var.region = \"eu\""));
        assert!(output.contains("  component.app (planned 2024-01-01T00:00:00Z)"));
        assert!(output.contains("    objects: 1, changes: 1, without prior state: 1"));
        assert!(output.contains("    create: 1"));
    }

    #[test]
    fn test_inspect_json() {
        let dir = tempfile::tempdir().unwrap();
        let plan = write_plan(&dir, &sample_records(&version::running().to_string()));

        let output = run_to_string(Commands::Inspect { plan, json: true }, &LoadConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["applyable"], true);
        assert_eq!(json["inputs"]["region"], "eu");
        assert_eq!(json["components"][0]["addr"], "component.app");
        assert_eq!(json["components"][0]["actions"]["create"], 1);
    }

    #[test]
    fn test_verify() {
        let dir = tempfile::tempdir().unwrap();
        let plan = write_plan(&dir, &sample_records(&version::running().to_string()));
        let output = run_to_string(Commands::Verify { plan }, &LoadConfig::default()).unwrap();
        assert_eq!(output, "plan OK: 5 records, 1 components\n");

        let plan = write_plan(&dir, &sample_records("0.0.0"));
        let err = run_to_string(Commands::Verify { plan }, &LoadConfig::default()).unwrap_err();
        assert!(err.to_string().contains("invalid plan record 0: plan was created by version 0.0.0"));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"running_version": "0.0.0", "max_records": 10}"#).unwrap();

        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.max_records, 10);

        let plan = write_plan(&dir, &sample_records("0.0.0"));
        assert!(run_to_string(Commands::Verify { plan }, &config).is_ok());

        std::fs::write(&config_path, "{").unwrap();
        assert!(load_config(Some(&config_path)).is_err());
        assert!(load_config(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn test_unreadable_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.spln");
        std::fs::write(&path, b"JUNK").unwrap();
        let err = run_to_string(Commands::Verify { plan: path }, &LoadConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("cannot read plan file"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["stackplan", "-vv", "inspect", "--plan", "p.spln", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Inspect { json: true, .. }));

        let cli = Cli::try_parse_from(["stackplan", "verify", "-p", "p.spln", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }
}
