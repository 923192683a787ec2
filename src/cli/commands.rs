//! CLI command implementations
//!
//! Both commands read one [`EntityQuery`] from stdin and write one JSON
//! object to stdout. Failures are written as an error object as well, then
//! returned so the process exits non-zero.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::MemoryConnection;
use crate::query::{EntityQuery, QueryCompiler, QueryExecutor, QueryOutput};
use crate::schema::{Catalog, CatalogLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog JSON (required)
    pub catalog_path: String,

    /// Dataset JSON (required by `query`)
    #[serde(default)]
    pub dataset_path: Option<String>,

    /// Access checking for requests that do not set it (default: true)
    #[serde(default = "default_access_check")]
    pub access_check: bool,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_access_check() -> bool {
    true
}

impl Config {
    /// Load configuration from file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.catalog_path.trim().is_empty() {
            return Err(CliError::config_error("catalog_path must not be empty"));
        }
        if let Some(dataset) = &self.dataset_path {
            if dataset.trim().is_empty() {
                return Err(CliError::config_error(
                    "dataset_path must not be empty when set",
                ));
            }
        }
        Ok(())
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.base_dir.join(&self.catalog_path)
    }

    pub fn dataset_file(&self) -> Option<PathBuf> {
        self.dataset_path.as_ref().map(|p| self.base_dir.join(p))
    }

    fn catalog(&self) -> CliResult<Catalog> {
        Ok(CatalogLoader::load(&self.catalog_file())?)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Runs one command, reporting any failure on stdout before returning it.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Explain { config } => explain(&config),
        Command::Query { config } => query(&config),
    };
    match result {
        Ok(data) => write_response(data),
        Err(err) => {
            tracing::error!(code = err.code(), error = %err, "command failed");
            write_error(err.code(), &err.to_string())?;
            Err(err)
        }
    }
}

/// Compiles the request and returns its explain plan
pub fn explain(config_path: &Path) -> CliResult<Value> {
    let config = Config::load(config_path)?;
    let request: EntityQuery = read_request()?;
    explain_request(&config, request)
}

/// Executes the request against the configured dataset
pub fn query(config_path: &Path) -> CliResult<Value> {
    let config = Config::load(config_path)?;
    let request: EntityQuery = read_request()?;
    query_request(&config, request)
}

pub fn explain_request(config: &Config, request: EntityQuery) -> CliResult<Value> {
    let catalog = config.catalog()?;
    let request = request.inherit_access_check(config.access_check);

    let plan = QueryCompiler::new(&catalog).explain(&request)?;
    tracing::debug!(plan = %plan, "explained entity query");
    Ok(serde_json::to_value(&plan)?)
}

pub fn query_request(config: &Config, request: EntityQuery) -> CliResult<Value> {
    let catalog = config.catalog()?;
    let dataset = config
        .dataset_file()
        .ok_or_else(|| CliError::config_error("dataset_path is required for query"))?;
    let connection = MemoryConnection::load(&dataset)?;
    let request = request.inherit_access_check(config.access_check);

    let output = QueryExecutor::new(&catalog, &connection).execute(&request)?;
    Ok(match output {
        QueryOutput::Count(count) => json!({ "count": count }),
        QueryOutput::Entities { ids, pager } => {
            let mut data = json!({ "results": ids });
            if let Some(pager) = pager {
                data["pager"] = serde_json::to_value(pager)?;
            }
            data
        }
    })
}
