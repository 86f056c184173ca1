//! Argument parsing and command execution for the `cyoda` binary.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cyoda_client::{
    AuthProvider, ClientConfig, ClientCredentialsAuth, DateTime, StaticTokenAuth, Utc,
};
use cyoda_query::{LogicalOperator, SearchConditionRequest, SearchOperator};
use cyoda_service::EntityServiceImpl;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "cyoda")]
#[command(about = "Query and manage entities on a Cyoda platform")]
pub struct Cli {
    /// JSON config file (defaults to CYODA_* environment variables)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Entity model name
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Entity model version (defaults to the configured version)
    #[arg(long, global = true)]
    pub version: Option<String>,

    /// Bearer token used instead of the client-credentials grant
    #[arg(long, global = true, env = "CYODA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch one entity
    Get {
        id: String,
        /// Read the entity as it was at this RFC 3339 instant
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List every entity of the model
    List,
    /// Search with field conditions
    Search {
        /// `field=value` or `field:op=value`, repeatable
        #[arg(short = 'w', long = "where")]
        conditions: Vec<String>,
        /// Match any condition instead of all
        #[arg(long)]
        or: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Count entities of the model
    Count {
        /// Use the platform statistics endpoint
        #[arg(long)]
        stats: bool,
        #[arg(long, requires = "stats")]
        at: Option<DateTime<Utc>>,
    },
    /// List transitions available to an entity
    Transitions { id: String },
    /// Fire a workflow transition
    Transition { id: String, name: String },
    /// Delete one entity, or all of them with --all
    Delete {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

impl Cli {
    pub fn model(&self) -> Result<&str> {
        self.model
            .as_deref()
            .filter(|model| !model.is_empty())
            .context("--model is required")
    }
}

/// One parsed `--where` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub field: String,
    pub operator: SearchOperator,
    pub value: Value,
}

/// Parses `field=value` or `field:op=value`.
///
/// The value is read as JSON when it parses as such (`42`, `true`,
/// `["a","b"]`), otherwise it is taken as a plain string.
pub fn parse_where(clause: &str) -> Result<WhereClause> {
    let Some((lhs, raw_value)) = clause.split_once('=') else {
        bail!("condition '{clause}' must look like field=value or field:op=value");
    };

    let (field, operator) = match lhs.split_once(':') {
        Some((field, op)) => (field, op.parse::<SearchOperator>()?),
        None => (lhs, SearchOperator::Equals),
    };
    if field.trim().is_empty() {
        bail!("condition '{clause}' has no field name");
    }

    let value = serde_json::from_str(raw_value).unwrap_or_else(|_| json!(raw_value));
    Ok(WhereClause {
        field: field.trim().to_string(),
        operator,
        value,
    })
}

/// Builds the search request for the `search` subcommand.
pub fn build_condition(
    clauses: &[String],
    or: bool,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<SearchConditionRequest> {
    let mut builder = SearchConditionRequest::builder();
    for clause in clauses {
        let parsed = parse_where(clause)?;
        builder = builder.add_condition(parsed.field, parsed.operator, parsed.value);
    }
    if or {
        builder = builder.operator(LogicalOperator::Or);
    }
    if let Some(limit) = limit {
        builder = builder.limit(limit);
    }
    if let Some(offset) = offset {
        builder = builder.offset(offset);
    }
    Ok(builder.build())
}

/// Reads the config file when given, else the environment.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::from_env().context("Failed to read CYODA_* environment")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// A fixed token when one is given, else the client-credentials grant.
pub fn auth_provider(config: &ClientConfig, token: Option<&str>) -> Result<Arc<dyn AuthProvider>> {
    match token {
        Some(token) if !token.is_empty() => Ok(Arc::new(StaticTokenAuth::new(token))),
        _ => {
            let auth = ClientCredentialsAuth::new(config)
                .context("No token given and client credentials are not configured")?;
            Ok(Arc::new(auth))
        }
    }
}

/// Runs one subcommand and returns its JSON output.
pub async fn execute(
    service: &EntityServiceImpl,
    model: &str,
    version: Option<&str>,
    command: &Command,
) -> Result<Value> {
    let output = match command {
        Command::Get { id, at } => {
            let found = match at {
                Some(at) => service.get_by_id_at_time(id, model, *at, version).await?,
                None => service.get_by_id(id, model, version).await?,
            };
            match found {
                Some(entity) => serde_json::to_value(entity)?,
                None => bail!("{model} {id} not found"),
            }
        }
        Command::List => serde_json::to_value(service.find_all(model, version).await?)?,
        Command::Search {
            conditions,
            or,
            limit,
            offset,
            at,
        } => {
            let condition = build_condition(conditions, *or, *limit, *offset)?;
            let found = match at {
                Some(at) => service.search_at_time(model, &condition, *at, version).await?,
                None => service.search(model, &condition, version).await?,
            };
            serde_json::to_value(found)?
        }
        Command::Count { stats, at } => {
            let count = if *stats {
                service.get_entity_count(model, version, *at).await?
            } else {
                service.count(model, version).await?
            };
            json!({ "count": count })
        }
        Command::Transitions { id } => {
            let names = service.get_transitions(id, model, version).await?;
            json!(names)
        }
        Command::Transition { id, name } => {
            serde_json::to_value(service.execute_transition(id, name, model, version).await?)?
        }
        Command::Delete { id: Some(id), .. } => {
            let deleted = service.delete_by_id(id, model, version).await?;
            json!({ "deleted": deleted })
        }
        Command::Delete { id: None, .. } => {
            service.delete_all(model, version).await?;
            json!({ "deleted": "all" })
        }
    };
    Ok(output)
}
